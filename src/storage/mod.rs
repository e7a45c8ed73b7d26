pub mod google;
pub mod local;
pub mod record;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

pub use google::GoogleSheet;
pub use local::LocalSheet;
pub use record::{header_row, AcceptedRecord, HEADER_RANGE};

/// One data row keyed by the header row's column names.
pub type SheetRecord = BTreeMap<String, String>;

/// Append-only spreadsheet the pipeline writes accepted posts into.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Overwrites the cells of an `A1`-style range, e.g. `A1:L1`.
    async fn update(&self, range: &str, rows: Vec<Vec<Value>>) -> Result<()>;

    async fn append_row(&self, row: Vec<Value>) -> Result<()>;

    /// Every data row below the header, keyed by header name.
    async fn all_records(&self) -> Result<Vec<SheetRecord>>;
}

/// Turns a raw grid (header first) into header-keyed records.
/// Fully empty rows are skipped and short rows are padded with "".
pub fn records_from_grid(grid: Vec<Vec<String>>) -> Vec<SheetRecord> {
    let mut rows = grid.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    rows.filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| {
            header
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Renders a cell the way a spreadsheet displays it.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Zero-based (row, column) of the top-left cell of an `A1`-style range.
pub fn range_origin(range: &str) -> Result<(usize, usize)> {
    let start = range.split(':').next().unwrap_or_default().trim();
    let split = start
        .find(|c: char| c.is_ascii_digit())
        .with_context(|| format!("Range {:?} has no row number", range))?;
    let (letters, digits) = start.split_at(split);

    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        anyhow::bail!("Range {:?} has no column letters", range);
    }

    let column = letters
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1));
    let row: usize = digits
        .parse()
        .with_context(|| format!("Range {:?} has an invalid row number", range))?;
    if row == 0 {
        anyhow::bail!("Range {:?} rows start at 1", range);
    }

    Ok((row - 1, column - 1))
}
