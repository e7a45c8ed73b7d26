use chrono::{DateTime, Utc};

/// A submission returned by a keyword search.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePost {
    pub title: String,
    pub body: String,
    pub url: String,
    /// `[deleted]` when the account is gone
    pub author: String,
    pub subreddit: String,
    /// Seconds since the epoch, as reported by Reddit
    pub created_utc: f64,
}

impl CandidatePost {
    /// Title and body joined the way the classifier sees them.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.body).trim().to_string()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created_utc as i64, 0).unwrap_or_default()
    }

    /// `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn timestamp(&self) -> String {
        self.created_at().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
