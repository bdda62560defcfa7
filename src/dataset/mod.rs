use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::StatsError;

pub mod models;
use models::*;

/// A CSV table addressable by column name. Rows keep file order.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    positions: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl Table {
    /// Parse a CSV document with a header line. Ragged rows are rejected.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, StatsError> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(rdr);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, csv::Error>>()?;
        Ok(Self::with_rows(headers, rows))
    }

    /// Open and parse the CSV file at `path`
    pub fn from_path(path: &Path) -> Result<Self, StatsError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn with_rows(headers: Vec<String>, rows: Vec<StringRecord>) -> Self {
        let mut positions = HashMap::with_capacity(headers.len());
        for (i, name) in headers.iter().enumerate() {
            // First occurrence wins on duplicated header names
            positions.entry(name.clone()).or_insert(i);
        }
        Table {
            headers,
            positions,
            rows,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Names from `required` that this table does not carry, in the given order.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Cells of one column in row order; absent cells come back as `None`.
    /// Returns `None` when the column does not exist.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = Option<&'a str>> + 'a> {
        let idx = *self.positions.get(name)?;
        Some(self.rows.iter().map(move |row| {
            row.get(idx).filter(|v| !is_absent(v))
        }))
    }

    /// Remove a column. Returns `false` when it was not present.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.positions.get(name).copied() else {
            return false;
        };
        let headers: Vec<String> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, h)| h.clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, v)| v)
                    .collect::<StringRecord>()
            })
            .collect();
        *self = Self::with_rows(headers, rows);
        true
    }

    /// Replace absent cells of `name` with `value`; returns how many were filled.
    pub fn fill_absent(&mut self, name: &str, value: &str) -> usize {
        let Some(idx) = self.positions.get(name).copied() else {
            return 0;
        };
        let mut filled = 0;
        for row in self.rows.iter_mut() {
            let absent = row.get(idx).map(is_absent).unwrap_or(false);
            if !absent {
                continue;
            }
            *row = row
                .iter()
                .enumerate()
                .map(|(i, v)| if i == idx { value } else { v })
                .collect();
            filled += 1;
        }
        filled
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// The cleaned pair of tables every query runs against.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub matches: Table,
    pub deliveries: Table,
}

impl Dataset {
    /// Wrap freshly parsed tables, applying the match-table cleaning steps.
    pub fn new(mut matches: Table, deliveries: Table) -> Self {
        clean_matches(&mut matches);
        Dataset {
            matches,
            deliveries,
        }
    }

    /// Load both tables from local CSV files
    pub fn load(matches_path: &Path, deliveries_path: &Path) -> Result<Self, StatsError> {
        let matches = Table::from_path(matches_path)?;
        let deliveries = Table::from_path(deliveries_path)?;
        log_columns(&matches, &deliveries);
        Ok(Self::new(matches, deliveries))
    }

    /// Load both tables from uploaded file contents
    pub fn from_bytes(matches: &[u8], deliveries: &[u8]) -> Result<Self, StatsError> {
        let matches = Table::from_reader(matches)?;
        let deliveries = Table::from_reader(deliveries)?;
        log_columns(&matches, &deliveries);
        Ok(Self::new(matches, deliveries))
    }
}

fn log_columns(matches: &Table, deliveries: &Table) {
    info!(
        "Matches columns ({} rows): {:?}",
        matches.len(),
        matches.headers()
    );
    info!(
        "Deliveries columns ({} rows): {:?}",
        deliveries.len(),
        deliveries.headers()
    );
}

/// Fill absent winners with the no-result sentinel and drop `umpire3`.
fn clean_matches(table: &mut Table) {
    let filled = table.fill_absent(matches::WINNER, NO_RESULT);
    if filled > 0 {
        debug!("Filled {} absent winner(s) with '{}'", filled, NO_RESULT);
    }
    if table.drop_column(matches::UMPIRE3) {
        debug!("Dropped column '{}'", matches::UMPIRE3);
    }
}
