pub mod client;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use client::RedditSearch;
pub use types::CandidatePost;

/// Keyword search over the social platform.
#[async_trait]
pub trait PostSearch: Send + Sync {
    /// Returns at most `limit` posts, in the platform's order.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<CandidatePost>>;
}
