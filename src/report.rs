// src/report.rs

use crate::duck::{quote_ident, BankStore};
use crate::table::Table;
use anyhow::Result;
use tracing::debug;

/// The three fixed reports: whole table, average GBP market cap, first five names.
pub fn report_queries(table_name: &str) -> [String; 3] {
    let t = quote_ident(table_name);
    [
        format!("SELECT * FROM {}", t),
        format!("SELECT AVG(MC_GBP_Billion) FROM {}", t),
        format!("SELECT Name FROM {} LIMIT 5", t),
    ]
}

/// Run `statement`, print it and its full result set, and return the result.
pub fn run_query(store: &BankStore, statement: &str) -> Result<Table> {
    println!("{}", statement);
    let result = store.query(statement)?;
    println!("{}", result.to_text_table(true));
    debug!(rows = result.len(), "query finished");
    Ok(result)
}
