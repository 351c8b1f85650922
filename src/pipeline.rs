// src/pipeline.rs

use crate::config::Config;
use crate::duck::BankStore;
use crate::fetch;
use crate::load::csv_file;
use crate::progress::ProgressLog;
use crate::report;
use crate::table::Table;
use crate::transform;
use anyhow::Result;
use reqwest::Client;
use tracing::info;

/// Everything after extraction: transform, both sinks, the three reports.
/// Returns the transformed table. The store is released on every path:
/// closed explicitly on success, dropped on error.
pub fn load_and_report(cfg: &Config, log: &ProgressLog, extracted: Table) -> Result<Table> {
    let table = transform::transform(extracted, &cfg.rate_path)?;
    println!("{}", table);
    log.log("Data transformation complete. Initiating Loading process")?;

    csv_file::write_csv(&table, &cfg.csv_output_path)?;
    log.log("Data saved to CSV file")?;

    let mut store = BankStore::open(&cfg.db_path)?;
    log.log("SQL Connection initiated")?;

    store.write_table(&table, &cfg.table_name)?;
    log.log("Data loaded to Database as a table, Executing queries")?;

    for statement in report::report_queries(&cfg.table_name) {
        report::run_query(&store, &statement)?;
    }
    log.log("Process Complete")?;

    store.close()?;
    log.log("Server Connection closed")?;
    Ok(table)
}

/// Run the whole ETL pass once, then print the progress log.
pub async fn run(cfg: &Config) -> Result<()> {
    run_with_client(cfg, &Client::new()).await
}

/// [`run`] with a caller-supplied HTTP client.
pub async fn run_with_client(cfg: &Config, client: &Client) -> Result<()> {
    let log = ProgressLog::new(&cfg.log_path);
    log.log("Preliminaries complete. Initiating ETL process")?;

    let extracted = fetch::extract(client, &cfg.source_url, &cfg.columns).await?;
    println!("{}", extracted);
    log.log("Data extraction complete. Initiating Transformation process")?;

    let table = load_and_report(cfg, &log, extracted)?;
    info!(rows = table.len(), "pipeline finished");

    println!("{}", log.read_all()?);
    Ok(())
}
