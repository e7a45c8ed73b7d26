pub mod chart;
pub mod stats;

use anyhow::{Context, Result};
use askama::Template;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::storage::SheetStore;
use stats::ReportRow;

#[derive(Debug, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The sheet had no data rows; nothing was written
    NoData,
    Written(PathBuf),
}

/// Renders the dashboard image from every row in the sheet.
pub async fn generate(sheet: &dyn SheetStore, output: &Path) -> Result<ReportOutcome> {
    let records = sheet
        .all_records()
        .await
        .context("Failed to read sheet records")?;

    if records.is_empty() {
        info!("No data available to generate a dashboard.");
        return Ok(ReportOutcome::NoData);
    }

    let rows: Vec<ReportRow> = records.iter().map(ReportRow::from).collect();
    let svg = chart::build(&rows)
        .render()
        .context("Failed to render dashboard")?;

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .context("Failed to create report directory")?;
    }
    tokio::fs::write(output, svg)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    debug!("Rendered dashboard from {} rows", rows.len());
    Ok(ReportOutcome::Written(output.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{header_row, LocalSheet, HEADER_RANGE};
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_sheet_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = LocalSheet::new(dir.path().join("sheet.jsonl"));
        sheet.update(HEADER_RANGE, vec![header_row()]).await.unwrap();
        let output = dir.path().join("dashboard.svg");

        let outcome = generate(&sheet, &output).await.unwrap();

        assert_eq!(outcome, ReportOutcome::NoData);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_writes_dashboard_for_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = LocalSheet::new(dir.path().join("sheet.jsonl"));
        sheet.update(HEADER_RANGE, vec![header_row()]).await.unwrap();
        for (keyword, intent, sentiment, relevance) in [
            ("CRM", "vendor search", "positive", 0.8),
            ("CRM", "complaint", "negative", 0.6),
            ("helpdesk", "question", "neutral", 0.9),
        ] {
            sheet
                .append_row(vec![
                    json!(keyword), json!("t"), json!("https://r/1"), json!("a"), json!("s"),
                    json!("2024-01-01 00:00:00"), json!(relevance), json!(intent), json!(sentiment),
                    json!("sum"), json!("sug"), json!(""),
                ])
                .await
                .unwrap();
        }
        let output = dir.path().join("out").join("dashboard.svg");

        let outcome = generate(&sheet, &output).await.unwrap();

        assert_eq!(outcome, ReportOutcome::Written(output.clone()));
        let svg = std::fs::read_to_string(&output).unwrap();
        assert!(svg.contains("Sentiment Breakdown by Keyword"));
        assert!(svg.contains("vendor search"));
    }
}
