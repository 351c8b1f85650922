// src/fetch/schema.rs
//
// Positional layout of the banks table: first <tbody> on the page, one bank
// per <tr> that has <td> cells.

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

/// One bank as read from the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Bank {
    pub name: String,
    pub mc_usd_billion: f64,
}

/// Where each field lives inside a data row. All indices are 0-based.
///
/// - `name`: the `title` attribute of link `name_link` inside cell `name_cell`
///   (the first link in that cell is the flag icon)
/// - `market_cap`: leading number of the first text node in `market_cap_cell`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionSchema {
    pub name_cell: usize,
    pub name_link: usize,
    pub market_cap_cell: usize,
}

impl Default for ExtractionSchema {
    fn default() -> Self {
        Self {
            name_cell: 1,
            name_link: 1,
            market_cap_cell: 2,
        }
    }
}

struct Selectors {
    tbody: Selector,
    tr: Selector,
    td: Selector,
    a: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            tbody: Selector::parse("tbody").expect("tbody selector should parse"),
            tr: Selector::parse("tr").expect("tr selector should parse"),
            td: Selector::parse("td").expect("td selector should parse"),
            a: Selector::parse("a").expect("a selector should parse"),
        }
    }
}

impl ExtractionSchema {
    /// Parse every data row of the first table body. Any row that does not
    /// fit the schema fails the whole parse.
    pub fn parse_banks(&self, html: &str) -> Result<Vec<Bank>> {
        let sel = Selectors::new();
        let number = Regex::new(r"^\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
            .expect("number regex should compile");

        let document = Html::parse_document(html);
        let body = document
            .select(&sel.tbody)
            .next()
            .ok_or_else(|| anyhow!("no <tbody> found in document"))?;

        let mut banks = Vec::new();
        for (row_no, row) in body.select(&sel.tr).enumerate() {
            let cells: Vec<ElementRef> = row.select(&sel.td).collect();
            if cells.is_empty() {
                trace!(row = row_no, "skipping row without data cells");
                continue;
            }

            let name = self
                .name(&cells, &sel)
                .with_context(|| format!("row {}: extracting name", row_no))?;
            let mc_usd_billion = self
                .market_cap(&cells, &number)
                .with_context(|| format!("row {}: extracting market cap", row_no))?;

            banks.push(Bank {
                name,
                mc_usd_billion,
            });
        }

        debug!(rows = banks.len(), "parsed banks table");
        Ok(banks)
    }

    fn name(&self, cells: &[ElementRef], sel: &Selectors) -> Result<String> {
        let cell = cells
            .get(self.name_cell)
            .ok_or_else(|| anyhow!("missing cell {} (have {})", self.name_cell, cells.len()))?;
        let link = cell.select(&sel.a).nth(self.name_link).ok_or_else(|| {
            anyhow!(
                "cell {} has fewer than {} links",
                self.name_cell,
                self.name_link + 1
            )
        })?;
        let title = link
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("link {} has no title", self.name_link))?;
        Ok(title.to_string())
    }

    fn market_cap(&self, cells: &[ElementRef], number: &Regex) -> Result<f64> {
        let cell = cells.get(self.market_cap_cell).ok_or_else(|| {
            anyhow!(
                "missing cell {} (have {})",
                self.market_cap_cell,
                cells.len()
            )
        })?;
        let text = cell
            .children()
            .next()
            .and_then(|n| n.value().as_text())
            .map(|t| String::from(&**t))
            .ok_or_else(|| anyhow!("cell {} does not start with text", self.market_cap_cell))?;

        let caps = match number.captures(&text) {
            Some(c) => c,
            None => bail!("{:?} is not numeric", text),
        };
        let value: f64 = caps[1]
            .replace(',', "")
            .parse()
            .with_context(|| format!("parsing {:?}", &caps[1]))?;
        Ok(value)
    }
}
