//! Hourly machine prices loaded from a tab-separated price list.
//!
//! The file has a header row and at least the columns `type` and `cost`:
//!
//! ```text
//! type            cost    region
//! n1-standard-4   $0.20   us-east1
//! n1-standard-8   $0.40   us-east1
//! ```
//!
//! Every `cost` carries exactly one leading currency-symbol character which
//! is stripped before the remainder is parsed as a number. The file is read
//! once per invocation and never cached.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CostError;

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "type")]
    machine_type: String,
    cost: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEntry {
    pub machine_type: String,
    pub hourly_cost: f64,
}

/// Machine type to hourly price. Lookup is by exact string match; if a
/// machine type appears more than once the first row wins.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    entries: Vec<PriceEntry>,
}

impl PriceTable {
    pub fn load(path: &Path) -> Result<Self, CostError> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        if table.is_empty() {
            warn!(path = %path.display(), "price list has no entries");
        } else {
            info!(path = %path.display(), entries = table.len(), "loaded price list");
        }
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CostError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(reader);

        let entries = reader
            .deserialize()
            .map(|record| {
                let row: PriceRow = record?;
                Ok(PriceEntry {
                    hourly_cost: parse_price(&row.cost)?,
                    machine_type: row.machine_type,
                })
            })
            .collect::<Result<Vec<_>, CostError>>()?;

        Ok(Self { entries })
    }

    /// Hourly cost of `machine_type`. A miss is fatal; there is no default price.
    pub fn hourly_cost(&self, machine_type: &str) -> Result<f64, CostError> {
        let cost = self
            .entries
            .iter()
            .find(|e| e.machine_type == machine_type)
            .map(|e| e.hourly_cost)
            .ok_or_else(|| CostError::UnknownMachineType(machine_type.to_string()))?;
        debug!(machine_type, hourly_cost = cost, "price lookup");
        Ok(cost)
    }

    pub fn entries(&self) -> &[PriceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, f64)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(machine_type, hourly_cost)| PriceEntry {
                    machine_type,
                    hourly_cost,
                })
                .collect(),
        }
    }
}

/// Strips the single leading currency symbol from `raw` and parses the rest.
///
/// A value that starts with a digit, sign or decimal point has no symbol and
/// is rejected instead of silently losing its first digit.
pub fn parse_price(raw: &str) -> Result<f64, CostError> {
    let malformed = || CostError::MalformedPriceRow(raw.to_string());

    let mut chars = raw.chars();
    let symbol = chars.next().ok_or_else(malformed)?;
    if symbol.is_ascii_digit() || matches!(symbol, '.' | '-' | '+') {
        return Err(malformed());
    }
    chars.as_str().parse::<f64>().map_err(|_| malformed())
}
