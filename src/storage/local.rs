use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{cell_text, range_origin, records_from_grid, SheetRecord, SheetStore};

/// Sheet kept on disk as JSON lines, one JSON array of cells per row.
pub struct LocalSheet {
    path: PathBuf,
}

impl LocalSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn ensure_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .context("Failed to create sheet directory")?;
        }
        Ok(())
    }

    async fn read_grid(&self) -> Result<Vec<Vec<Value>>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("Failed to read sheet file"),
        };

        text.lines()
            .enumerate()
            .map(|(i, line)| {
                if line.trim().is_empty() {
                    return Ok(Vec::new());
                }
                serde_json::from_str(line)
                    .with_context(|| format!("Malformed row {} in {}", i + 1, self.path.display()))
            })
            .collect()
    }

    async fn write_grid(&self, grid: &[Vec<Value>]) -> Result<()> {
        let mut text = String::new();
        for row in grid {
            text.push_str(&serde_json::to_string(row).context("Failed to serialize row")?);
            text.push('\n');
        }

        // Write beside the target, then swap it in.
        let tmp = self.path.with_extension("jsonl.tmp");
        tokio::fs::write(&tmp, text)
            .await
            .context("Failed to write sheet file")?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .context("Failed to replace sheet file")?;
        Ok(())
    }
}

#[async_trait]
impl SheetStore for LocalSheet {
    async fn update(&self, range: &str, rows: Vec<Vec<Value>>) -> Result<()> {
        self.ensure_dir().await?;
        let (top, left) = range_origin(range)?;
        let mut grid = self.read_grid().await?;

        for (offset, cells) in rows.into_iter().enumerate() {
            let index = top + offset;
            if grid.len() <= index {
                grid.resize(index + 1, Vec::new());
            }
            let row = &mut grid[index];
            if row.len() < left + cells.len() {
                row.resize(left + cells.len(), Value::from(""));
            }
            for (col, cell) in cells.into_iter().enumerate() {
                row[left + col] = cell;
            }
        }

        self.write_grid(&grid).await?;
        debug!("Updated {} in {}", range, self.path.display());
        Ok(())
    }

    async fn append_row(&self, row: Vec<Value>) -> Result<()> {
        self.ensure_dir().await?;
        let line = format!(
            "{}\n",
            serde_json::to_string(&row).context("Failed to serialize row")?
        );

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .context("Failed to open sheet file")?;

        file.write_all(line.as_bytes())
            .await
            .context("Failed to append to sheet file")?;

        Ok(())
    }

    async fn all_records(&self) -> Result<Vec<SheetRecord>> {
        let grid = self
            .read_grid()
            .await?
            .into_iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Ok(records_from_grid(grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{header_row, HEADER_RANGE};
    use serde_json::json;

    #[tokio::test]
    async fn test_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = LocalSheet::new(dir.path().join("data").join("sheet.jsonl"));

        sheet.update(HEADER_RANGE, vec![header_row()]).await.unwrap();
        let mut row: Vec<Value> = vec![json!("CRM"), json!("Best CRM?")];
        row.resize(12, json!(""));
        row[6] = json!(0.8);
        sheet.append_row(row).await.unwrap();

        let records = sheet.all_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Keyword"], "CRM");
        assert_eq!(records[0]["Relevance"], "0.8");
        assert_eq!(records[0]["Feedback"], "");
    }

    #[tokio::test]
    async fn test_header_rewrite_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = LocalSheet::new(dir.path().join("sheet.jsonl"));

        sheet.update("A1:B1", vec![vec![json!("Old"), json!("Cols")]]).await.unwrap();
        sheet.append_row(vec![json!("CRM"), json!("0.9")]).await.unwrap();
        sheet.update("A1:B1", vec![vec![json!("Keyword"), json!("Relevance")]]).await.unwrap();

        let records = sheet.all_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Keyword"], "CRM");
        assert_eq!(records[0]["Relevance"], "0.9");
    }

    #[tokio::test]
    async fn test_update_offset_range() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = LocalSheet::new(dir.path().join("sheet.jsonl"));

        sheet.update("B2", vec![vec![json!("x")]]).await.unwrap();
        let grid = sheet.read_grid().await.unwrap();
        assert_eq!(grid.len(), 2);
        assert!(grid[0].is_empty());
        assert_eq!(grid[1], vec![json!(""), json!("x")]);
    }

    #[tokio::test]
    async fn test_missing_file_has_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = LocalSheet::new(dir.path().join("absent.jsonl"));
        assert!(sheet.all_records().await.unwrap().is_empty());
    }
}
