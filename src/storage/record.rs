use serde_json::Value;

use crate::analysis::AnalysisResult;
use crate::reddit::CandidatePost;

/// Sheet columns, in order. `Feedback` is left blank for manual annotation.
pub const SHEET_HEADERS: [&str; 12] = [
    "Keyword",
    "Title",
    "Link",
    "Author",
    "Subreddit",
    "Timestamp",
    "Relevance",
    "Intent",
    "Sentiment",
    "Summary",
    "Engagement Suggestion",
    "Feedback",
];

/// Range covering the header row.
pub const HEADER_RANGE: &str = "A1:L1";

pub fn header_row() -> Vec<Value> {
    SHEET_HEADERS.iter().map(|h| Value::from(*h)).collect()
}

/// A post that passed the relevance gate, with the keyword that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedRecord {
    pub keyword: String,
    pub post: CandidatePost,
    pub analysis: AnalysisResult,
}

impl AcceptedRecord {
    pub fn new(keyword: &str, post: CandidatePost, analysis: AnalysisResult) -> Self {
        Self {
            keyword: keyword.to_string(),
            post,
            analysis,
        }
    }

    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::from(self.keyword.as_str()),
            Value::from(self.post.title.as_str()),
            Value::from(self.post.url.as_str()),
            Value::from(self.post.author.as_str()),
            Value::from(self.post.subreddit.as_str()),
            Value::from(self.post.timestamp()),
            Value::from(self.analysis.relevance),
            Value::from(self.analysis.intent.label()),
            Value::from(self.analysis.sentiment.label()),
            Value::from(self.analysis.summary.as_str()),
            Value::from(self.analysis.suggestion.as_str()),
            Value::from(""),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Intent, Sentiment};

    #[test]
    fn test_row_matches_header_schema() {
        let record = AcceptedRecord::new(
            "CRM",
            CandidatePost {
                title: "Best CRM?".to_string(),
                body: "Looking for one".to_string(),
                url: "https://reddit.com/r/sales/1".to_string(),
                author: "alice".to_string(),
                subreddit: "sales".to_string(),
                created_utc: 1_700_000_000.0,
            },
            AnalysisResult {
                relevance: 0.8,
                intent: Intent::VendorSearch,
                sentiment: Sentiment::Positive,
                summary: "User seeks CRM tool".to_string(),
                suggestion: "Recommend our product".to_string(),
            },
        );

        let row = record.to_row();
        assert_eq!(row.len(), SHEET_HEADERS.len());
        assert_eq!(row[0], "CRM");
        assert_eq!(row[5], "2023-11-14 22:13:20");
        assert_eq!(row[6], 0.8);
        assert_eq!(row[7], "vendor search");
        assert_eq!(row[8], "positive");
        assert_eq!(row[10], "Recommend our product");
        assert_eq!(row[11], "");
    }
}
