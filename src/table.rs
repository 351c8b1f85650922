// src/table.rs

use anyhow::{anyhow, bail, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table as TextTable};
use std::fmt;

/// Storage type of a column. Carried by the table so an empty table still
/// knows what to create in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Double,
    BigInt,
}

impl ColumnType {
    /// Column type as DuckDB spells it.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Double => "DOUBLE",
            ColumnType::BigInt => "BIGINT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Double)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The type this value would be stored as, `None` for nulls.
    pub fn kind(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(ColumnType::BigInt),
            Value::Float(_) => Some(ColumnType::Double),
            Value::Text(_) => Some(ColumnType::Text),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(i) => write!(f, "{}", i),
            // whole floats keep one decimal so `80.0` doesn't read back as an integer
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered, column-typed, in-memory table. Row order is insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Append a row; its arity must match the column count and every
    /// non-null value must fit the declared column type.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            bail!(
                "row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            );
        }
        for (value, column) in row.iter().zip(&self.columns) {
            match (value.kind(), column.kind) {
                (None, _) => {}
                (Some(ColumnType::BigInt), ColumnType::Double) => {}
                (Some(k), c) if k == c => {}
                (Some(k), c) => bail!(
                    "value {} of type {:?} does not fit column {} ({:?})",
                    value,
                    k,
                    column.name,
                    c
                ),
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// All values of a numeric column, in row order.
    pub fn float_column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| anyhow!("no column named {}", name))?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row[idx]
                    .as_f64()
                    .ok_or_else(|| anyhow!("row {}: {} is not numeric ({})", i, name, row[idx]))
            })
            .collect()
    }

    /// Return a new table with `column` appended, one value per existing row.
    pub fn with_column(self, column: Column, values: Vec<Value>) -> Result<Table> {
        if self.column_index(&column.name).is_some() {
            bail!("column {} already exists", column.name);
        }
        if values.len() != self.rows.len() {
            bail!(
                "column {} has {} values but table has {} rows",
                column.name,
                values.len(),
                self.rows.len()
            );
        }

        let Table { mut columns, rows } = self;
        columns.push(column);
        let mut out = Table::new(columns);
        for (mut row, value) in rows.into_iter().zip(values) {
            row.push(value);
            out.push_row(row)?;
        }
        Ok(out)
    }

    /// Render with a leading row-index column, the way the pipeline echoes
    /// tables to stdout.
    pub fn to_text_table(&self, with_index: bool) -> TextTable {
        let mut text = TextTable::new();
        text.load_preset(UTF8_FULL_CONDENSED);
        text.set_content_arrangement(ContentArrangement::Dynamic);

        let mut header: Vec<String> = Vec::with_capacity(self.columns.len() + 1);
        if with_index {
            header.push(String::new());
        }
        header.extend(self.columns.iter().map(|c| c.name.clone()));
        text.set_header(header);

        for (i, row) in self.rows.iter().enumerate() {
            let mut cells: Vec<String> = Vec::with_capacity(row.len() + 1);
            if with_index {
                cells.push(i.to_string());
            }
            cells.extend(row.iter().map(|v| v.to_string()));
            text.add_row(cells);
        }
        text
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.to_text_table(true))?;
        write!(f, "[{} rows x {} columns]", self.len(), self.columns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banks() -> Table {
        let mut t = Table::new(vec![Column::text("Name"), Column::double("MC_USD_Billion")]);
        t.push_row(vec![Value::Text("Bank A".into()), Value::Float(100.0)])
            .unwrap();
        t.push_row(vec![Value::Text("Bank B".into()), Value::Float(2.5)])
            .unwrap();
        t
    }

    #[test]
    fn push_row_checks_arity_and_types() {
        let mut t = banks();
        assert!(t.push_row(vec![Value::Text("only name".into())]).is_err());
        assert!(t
            .push_row(vec![Value::Float(1.0), Value::Float(1.0)])
            .is_err());
        assert!(t.push_row(vec![Value::Null, Value::Int(3)]).is_ok());
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn with_column_appends_without_reordering() {
        let t = banks()
            .with_column(
                Column::double("Doubled"),
                vec![Value::Float(200.0), Value::Float(5.0)],
            )
            .unwrap();
        assert_eq!(t.column_names(), vec!["Name", "MC_USD_Billion", "Doubled"]);
        assert_eq!(t.rows()[0][0], Value::Text("Bank A".into()));
        assert_eq!(t.float_column("Doubled").unwrap(), vec![200.0, 5.0]);
    }

    #[test]
    fn with_column_rejects_wrong_length_and_duplicates() {
        assert!(banks()
            .with_column(Column::double("X"), vec![Value::Float(1.0)])
            .is_err());
        assert!(banks()
            .with_column(
                Column::double("Name"),
                vec![Value::Float(1.0), Value::Float(2.0)]
            )
            .is_err());
    }

    #[test]
    fn float_display_keeps_one_decimal() {
        assert_eq!(Value::Float(80.0).to_string(), "80.0");
        assert_eq!(Value::Float(432.92).to_string(), "432.92");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn display_includes_index_and_shape() {
        let out = banks().to_string();
        assert!(out.contains("Bank B"));
        assert!(out.contains("MC_USD_Billion"));
        assert!(out.ends_with("[2 rows x 2 columns]"));
    }
}
