//! CSV dataset loading and preview.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::results::TableData;

pub const PREVIEW_ROWS: usize = 5;

/// One uploaded dataset: raw bytes for the sandbox, parsed rows for display.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub bytes: Vec<u8>,
}

pub fn load(path: &Path) -> Result<Dataset> {
    let is_csv = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        bail!("only CSV files are supported: {}", path.display());
    }

    let bytes =
        fs::read(path).with_context(|| format!("cannot read dataset {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset.csv".to_string());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes.as_slice());
    let headers = reader
        .headers()
        .with_context(|| format!("cannot parse header row of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("cannot parse {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Dataset { name, headers, rows, bytes })
}

impl Dataset {
    /// Deterministic in-sandbox location derived from the original file name.
    pub fn sandbox_path(&self) -> String {
        format!("./{}", self.name)
    }

    /// Display table: all rows, or just the first `limit`.
    pub fn table(&self, limit: Option<usize>) -> TableData {
        let take = limit.unwrap_or(self.rows.len());
        TableData {
            columns: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .take(take)
                .map(|r| r.iter().map(|c| Value::String(c.clone())).collect())
                .collect(),
        }
    }
}
