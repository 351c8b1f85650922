// src/fetch/mod.rs

pub mod schema;
#[cfg(test)]
pub(crate) mod testing;

pub use schema::{Bank, ExtractionSchema};

use crate::table::{Column, Table, Value};
use anyhow::{bail, Context, Result};
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

/// GET `url` and return the body. Non-success status is an error; no retry.
pub async fn fetch_page(client: &Client, url: &Url) -> Result<String> {
    debug!("Fetching text from {}", url);
    client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading text from {}", url))
}

/// Build the two-column bank table from parsed rows. `columns` only labels
/// the name and market-cap fields.
pub fn banks_to_table(banks: Vec<Bank>, columns: &[String]) -> Result<Table> {
    let (name_col, cap_col) = match columns {
        [name, cap] => (name, cap),
        other => bail!("expected two column labels, got {:?}", other),
    };

    let mut table = Table::new(vec![Column::text(name_col), Column::double(cap_col)]);
    for bank in banks {
        table.push_row(vec![
            Value::Text(bank.name),
            Value::Float(bank.mc_usd_billion),
        ])?;
    }
    Ok(table)
}

/// Fetch the source page and extract the banks table.
#[instrument(level = "info", skip(client, source, columns), fields(url = %source))]
pub async fn extract(client: &Client, source: &Url, columns: &[String]) -> Result<Table> {
    let html = fetch_page(client, source).await?;
    let banks = ExtractionSchema::default()
        .parse_banks(&html)
        .with_context(|| format!("extracting banks table from {}", source))?;
    info!(rows = banks.len(), "extracted banks");
    banks_to_table(banks, columns)
}
