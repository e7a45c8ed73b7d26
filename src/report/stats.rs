use std::collections::BTreeMap;

use crate::storage::SheetRecord;

/// The columns the dashboard reads from a sheet record.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub keyword: String,
    pub intent: String,
    pub sentiment: String,
    /// `None` when the cell is not a number
    pub relevance: Option<f64>,
}

impl From<&SheetRecord> for ReportRow {
    fn from(record: &SheetRecord) -> Self {
        let field = |name: &str| record.get(name).map(|v| v.trim().to_string()).unwrap_or_default();
        ReportRow {
            keyword: field("Keyword"),
            intent: field("Intent"),
            sentiment: field("Sentiment"),
            relevance: field("Relevance").parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }
}

/// Counts per category, in order of first appearance.
pub fn count_by<F>(rows: &[ReportRow], key: F) -> Vec<(String, usize)>
where
    F: Fn(&ReportRow) -> &str,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in rows {
        let value = key(row);
        match counts.iter_mut().find(|(k, _)| k == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value.to_string(), 1)),
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Tukey box: whiskers reach the furthest points within 1.5 × IQR.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let reach = 1.5 * (q3 - q1);
    let (low_fence, high_fence) = (q1 - reach, q3 + reach);

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= low_fence && *v <= high_fence)
        .collect();
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();

    Some(BoxStats {
        q1,
        median,
        q3,
        whisker_low: inside.first().copied().unwrap_or(q1),
        whisker_high: inside.last().copied().unwrap_or(q3),
        outliers,
    })
}

/// Relevance spread per intent, intents in order of first appearance.
/// Rows without a numeric relevance are left out.
pub fn relevance_by_intent(rows: &[ReportRow]) -> Vec<(String, BoxStats)> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for row in rows {
        let Some(relevance) = row.relevance else { continue };
        match groups.iter_mut().find(|(k, _)| *k == row.intent) {
            Some((_, values)) => values.push(relevance),
            None => groups.push((row.intent.clone(), vec![relevance])),
        }
    }
    groups
        .into_iter()
        .filter_map(|(intent, values)| box_stats(&values).map(|stats| (intent, stats)))
        .collect()
}

/// Keyword × sentiment counts, both axes sorted.
pub struct CrossTab {
    pub keywords: Vec<String>,
    pub sentiments: Vec<String>,
    /// `counts[keyword][sentiment]`
    pub counts: Vec<Vec<usize>>,
}

pub fn keyword_sentiment(rows: &[ReportRow]) -> CrossTab {
    let mut table: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    let mut sentiments: Vec<String> = Vec::new();
    for row in rows {
        *table
            .entry(row.keyword.as_str())
            .or_default()
            .entry(row.sentiment.as_str())
            .or_insert(0) += 1;
        if !sentiments.contains(&row.sentiment) {
            sentiments.push(row.sentiment.clone());
        }
    }
    sentiments.sort();

    let counts = table
        .values()
        .map(|by_sentiment| {
            sentiments
                .iter()
                .map(|s| by_sentiment.get(s.as_str()).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    CrossTab {
        keywords: table.keys().map(|k| k.to_string()).collect(),
        sentiments,
        counts,
    }
}
