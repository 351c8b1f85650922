// src/load/csv_file.rs

use crate::table::{Column, ColumnType, Table, Value};
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{fs, path::Path};
use tracing::{debug, instrument};

/// Write `table` with a leading unnamed row-index column, overwriting `path`.
#[instrument(level = "info", skip(table), fields(rows = table.len()))]
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }

    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating CSV {:?}", path))?;

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push(String::new());
    header.extend(table.columns().iter().map(|c| c.name.clone()));
    wtr.write_record(&header)?;

    for (i, row) in table.rows().iter().enumerate() {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(i.to_string());
        record.extend(row.iter().map(csv_field));
        wtr.write_record(&record)
            .with_context(|| format!("writing row {} to {:?}", i, path))?;
    }

    wtr.flush().with_context(|| format!("flushing {:?}", path))?;
    debug!(path = %path.display(), "wrote CSV");
    Ok(())
}

fn csv_field(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Read a file written by [`write_csv`], dropping the index column. The
/// header must name exactly `columns`, in order; values are parsed by each
/// column's declared type, so a `Text` column stays text whatever it holds.
pub fn read_csv(path: &Path, columns: &[Column]) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("opening CSV {:?}", path))?;

    let headers = rdr.headers()?.clone();
    if headers.get(0) != Some("") {
        bail!("{:?} has no leading index column", path);
    }
    let names: Vec<&str> = headers.iter().skip(1).collect();
    let expected: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    if names != expected {
        bail!("{:?} has columns {:?}, expected {:?}", path, names, expected);
    }

    let mut table = Table::new(columns.to_vec());
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("reading row {} of {:?}", i, path))?;
        let values = record
            .iter()
            .skip(1)
            .zip(columns)
            .map(|(s, column)| -> Result<Value> {
                Ok(match column.kind {
                    _ if s.is_empty() => Value::Null,
                    ColumnType::Text => Value::Text(s.to_string()),
                    ColumnType::Double => Value::Float(s.parse().with_context(|| {
                        format!("row {}: {} is not a number ({:?})", i, column.name, s)
                    })?),
                    ColumnType::BigInt => Value::Int(s.parse().with_context(|| {
                        format!("row {}: {} is not an integer ({:?})", i, column.name, s)
                    })?),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        table.push_row(values)?;
    }
    Ok(table)
}
