pub mod gate;
pub mod groq;
pub mod intent;
pub mod types;

use async_trait::async_trait;

use crate::error::ScoutError;

pub use gate::RelevanceGate;
pub use groq::GroqClassifier;
pub use intent::{Intent, Sentiment};
pub use types::AnalysisResult;

/// External text classifier.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Any failure, including malformed output, is `ClassificationUnavailable`.
    async fn classify(&self, text: &str, keywords: &[String]) -> Result<AnalysisResult, ScoutError>;
}
