// src/transform.rs

use crate::table::{Column, Table, Value};
use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::{collections::BTreeMap, fs::File, path::Path};
use tracing::{debug, info, instrument};

/// Column the conversions are computed from.
pub const USD_COLUMN: &str = "MC_USD_Billion";

/// Target currencies, in the order their columns are appended.
pub const TARGET_CURRENCIES: [&str; 3] = ["GBP", "EUR", "INR"];

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Rate")]
    rate: f64,
}

/// Currency code → units per 1 USD. Loaded once and never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRates {
    rates: BTreeMap<String, f64>,
}

impl ExchangeRates {
    /// Read a `Currency,Rate` CSV.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening exchange rates {:?}", path))?;
        Self::from_reader(file).with_context(|| format!("reading exchange rates {:?}", path))
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut rates = BTreeMap::new();

        for (i, record) in rdr.deserialize::<RateRow>().enumerate() {
            let RateRow { currency, rate } =
                record.with_context(|| format!("parsing exchange rate row {}", i + 1))?;
            if !(rate.is_finite() && rate > 0.0) {
                bail!("rate for {} must be positive, got {}", currency, rate);
            }
            if rates.insert(currency.clone(), rate).is_some() {
                bail!("duplicate exchange rate for {}", currency);
            }
        }

        let out = Self { rates };
        out.require(&TARGET_CURRENCIES)?;
        Ok(out)
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    fn require(&self, codes: &[&str]) -> Result<()> {
        let missing: Vec<&str> = codes
            .iter()
            .copied()
            .filter(|c| !self.rates.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            bail!("exchange rates missing required currencies {:?}", missing);
        }
        Ok(())
    }
}

/// Round to two decimals, ties away from zero (`f64::round` semantics on the
/// scaled binary value).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn converted_column_name(code: &str) -> String {
    format!("MC_{}_Billion", code)
}

/// Append one converted column per target currency.
pub fn convert(table: Table, rates: &ExchangeRates) -> Result<Table> {
    let usd = table.float_column(USD_COLUMN)?;
    let mut out = table;

    for code in TARGET_CURRENCIES {
        let rate = rates
            .get(code)
            .ok_or_else(|| anyhow!("no exchange rate for {}", code))?;
        let values = usd.iter().map(|v| Value::Float(round2(v * rate))).collect();
        out = out.with_column(Column::double(converted_column_name(code)), values)?;
        debug!(currency = code, rate, "added converted column");
    }
    Ok(out)
}

/// Load the rate file and add the GBP, EUR and INR market-cap columns.
#[instrument(level = "info", skip(table), fields(rows = table.len()))]
pub fn transform(table: Table, rate_path: &Path) -> Result<Table> {
    let rates = ExchangeRates::from_csv(rate_path)?;
    info!(currencies = rates.len(), "loaded exchange rates");
    convert(table, &rates)
}
