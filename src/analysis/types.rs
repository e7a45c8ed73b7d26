use super::intent::{Intent, Sentiment};

/// Classifier verdict for one post.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Nominally 0.0-1.0; passed through as the classifier returned it
    pub relevance: f64,
    pub intent: Intent,
    pub sentiment: Sentiment,
    pub summary: String,
    pub suggestion: String,
}
