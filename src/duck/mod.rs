use crate::table::{Column, ColumnType, Table, Value};
use anyhow::{anyhow, bail, Context, Result};
use duckdb::types::{ToSql, ToSqlOutput, Value as DuckValue, ValueRef};
use duckdb::{params, Connection};
use std::path::Path;
use tracing::{debug, info, instrument};

impl ToSql for Value {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(match self {
            Value::Null => DuckValue::Null,
            Value::Int(i) => DuckValue::BigInt(*i),
            Value::Float(f) => DuckValue::Double(*f),
            Value::Text(s) => DuckValue::Text(s.clone()),
        }))
    }
}

/// Double-quote an identifier for use in generated SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A DuckDB database holding the loaded banks table. The connection is
/// closed when the store is dropped; [`BankStore::close`] does the same but
/// reports errors.
pub struct BankStore {
    conn: Connection,
}

impl BankStore {
    /// Open a DuckDB database on disk at `path`, creating the file if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn =
            Connection::open(path).with_context(|| format!("opening DuckDB at {:?}", path))?;
        debug!(db = %path.display(), "opened store");
        Ok(Self { conn })
    }

    /// Open a DuckDB in‐memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("opening in-memory DuckDB")?;
        Ok(Self { conn })
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| anyhow!(e))
            .context("closing DuckDB connection")
    }

    /// Replace table `name` with the contents of `table`: drop, recreate from
    /// the table's column types, bulk insert. No keys or indexes.
    #[instrument(level = "info", skip(self, table), fields(rows = table.len()))]
    pub fn write_table(&mut self, table: &Table, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            bail!("table name must not be empty");
        }
        if table.columns().is_empty() {
            bail!("cannot create table {} without columns", name);
        }

        let ident = quote_ident(name);
        let column_defs = table
            .columns()
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {ident};\nCREATE TABLE {ident} ({column_defs});"
        ))
        .with_context(|| format!("recreating table {}", name))?;

        {
            let mut appender = tx
                .appender(name)
                .with_context(|| format!("creating appender for {}", name))?;
            for row in table.rows() {
                let values: Vec<&dyn ToSql> = row.iter().map(|v| v as &dyn ToSql).collect();
                appender.append_row(values.as_slice())?;
            }
            appender.flush()?;
        }

        tx.commit()
            .with_context(|| format!("committing table {}", name))?;
        info!(table = name, rows = table.len(), "loaded table");
        Ok(())
    }

    /// Run `sql` and collect every row and column.
    pub fn query(&self, sql: &str) -> Result<Table> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .with_context(|| format!("preparing {}", sql))?;
        let mut result_rows = stmt.query([]).with_context(|| format!("running {}", sql))?;

        let mut rows: Vec<Vec<Value>> = Vec::new();
        let mut column_count = 0;
        while let Some(row) = result_rows.next()? {
            if rows.is_empty() {
                column_count = row.as_ref().column_count();
            }
            rows.push((0..column_count).map(|i| column_value(row, i)).collect());
        }
        // release the borrow on stmt before reading column names
        drop(result_rows);

        if rows.is_empty() {
            column_count = stmt.column_count();
        }
        let names: Vec<String> = (0..column_count)
            .map(|i| {
                stmt.column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col{}", i))
            })
            .collect();

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let kind = rows
                    .iter()
                    .find_map(|r| r[i].kind())
                    .unwrap_or(ColumnType::Text);
                Column::new(name, kind)
            })
            .collect();

        let mut out = Table::new(columns);
        for row in rows {
            out.push_row(row)?;
        }
        Ok(out)
    }

    pub fn row_count(&self, name: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(name));
        self.conn
            .query_row(&sql, [], |r| r.get(0))
            .with_context(|| format!("counting rows of {}", name))
    }

    /// How many tables called `name` exist in the database.
    pub fn table_count(&self, name: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
                params![name],
                |r| r.get(0),
            )
            .with_context(|| format!("looking up table {}", name))
    }
}

fn column_value(row: &duckdb::Row, idx: usize) -> Value {
    match row.get_ref(idx) {
        Ok(ValueRef::Null) => Value::Null,
        Ok(ValueRef::Boolean(b)) => Value::Text(b.to_string()),
        Ok(ValueRef::TinyInt(i)) => Value::Int(i as i64),
        Ok(ValueRef::SmallInt(i)) => Value::Int(i as i64),
        Ok(ValueRef::Int(i)) => Value::Int(i as i64),
        Ok(ValueRef::BigInt(i)) => Value::Int(i),
        Ok(ValueRef::UTinyInt(i)) => Value::Int(i as i64),
        Ok(ValueRef::USmallInt(i)) => Value::Int(i as i64),
        Ok(ValueRef::UInt(i)) => Value::Int(i as i64),
        Ok(ValueRef::UBigInt(i)) => i64::try_from(i)
            .map(Value::Int)
            .unwrap_or(Value::Float(i as f64)),
        Ok(ValueRef::HugeInt(i)) => i64::try_from(i)
            .map(Value::Int)
            .unwrap_or(Value::Float(i as f64)),
        Ok(ValueRef::Float(f)) => Value::Float(f as f64),
        Ok(ValueRef::Double(f)) => Value::Float(f),
        Ok(ValueRef::Decimal(d)) => d
            .to_string()
            .parse()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::Text(d.to_string())),
        Ok(ValueRef::Text(bytes)) => Value::Text(String::from_utf8_lossy(bytes).to_string()),
        Ok(other) => Value::Text(format!("{:?}", other)),
        Err(e) => Value::Text(format!("<error: {}>", e)),
    }
}
