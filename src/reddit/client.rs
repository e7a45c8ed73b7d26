use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::RedditConfig;
use super::types::CandidatePost;
use super::PostSearch;

/// Refresh the token this long before Reddit says it expires.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

pub struct RedditSearch {
    client: Client,
    client_id: String,
    client_secret: String,
    api_base: String,
    auth_url: String,
    subreddit: String,
    sort: String,
    time_filter: String,
    token: Mutex<Option<AccessToken>>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expiry")]
    expires_in: u64,
}

fn default_expiry() -> u64 {
    3600
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Deserialize)]
struct Thing {
    data: Submission,
}

#[derive(Deserialize)]
struct Submission {
    title: String,
    #[serde(default)]
    selftext: String,
    url: String,
    author: Option<String>,
    subreddit: String,
    created_utc: f64,
}

impl From<Submission> for CandidatePost {
    fn from(s: Submission) -> Self {
        CandidatePost {
            title: s.title,
            body: s.selftext,
            url: s.url,
            author: s.author.unwrap_or_else(|| "[deleted]".to_string()),
            subreddit: s.subreddit,
            created_utc: s.created_utc,
        }
    }
}

impl RedditSearch {
    pub fn new(config: &RedditConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build Reddit HTTP client")?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            auth_url: config.auth_url.clone(),
            subreddit: config.subreddit.clone(),
            sort: config.sort.clone(),
            time_filter: config.time_filter.clone(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Reddit application token");
        let response = self
            .client
            .post(&self.auth_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Reddit token request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Reddit token endpoint returned {}: {}", status, body);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Reddit token response")?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_MARGIN);
        *cached = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        info!("Reddit client authorized");
        Ok(token.access_token)
    }
}

#[async_trait]
impl PostSearch for RedditSearch {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<CandidatePost>> {
        let token = self.access_token().await?;
        let url = format!("{}/r/{}/search", self.api_base, self.subreddit);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("limit", limit.as_str()),
                ("sort", self.sort.as_str()),
                ("t", self.time_filter.as_str()),
                ("restrict_sr", "on"),
                ("raw_json", "1"),
            ])
            .send()
            .await
            .context("Reddit search request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Reddit search returned {}: {}", status, body);
        }

        let listing: Listing = response
            .json()
            .await
            .context("Failed to parse Reddit search listing")?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|thing| CandidatePost::from(thing.data))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(base: &str) -> RedditConfig {
        RedditConfig {
            api_base: base.to_string(),
            auth_url: format!("{}/api/v1/access_token", base),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            user_agent: "keyword-scout-test".to_string(),
            ..RedditConfig::default()
        }
    }

    #[tokio::test]
    async fn test_search_maps_listing_in_order() {
        let router = Router::new()
            .route(
                "/api/v1/access_token",
                post(|| async { Json(json!({"access_token": "tok", "expires_in": 3600})) }),
            )
            .route(
                "/r/all/search",
                get(|| async {
                    Json(json!({"data": {"children": [
                        {"data": {"title": "Best CRM?", "selftext": "Looking for one", "url": "https://r/1",
                                  "author": "alice", "subreddit": "sales", "created_utc": 1700000000.0}},
                        {"data": {"title": "CRM rant", "url": "https://r/2",
                                  "author": null, "subreddit": "smallbusiness", "created_utc": 1700000100.0}}
                    ]}}))
                }),
            );
        let base = serve(router).await;

        let search = RedditSearch::new(&config(&base)).unwrap();
        let posts = search.search("CRM", 5).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "Best CRM?");
        assert_eq!(posts[0].body, "Looking for one");
        assert_eq!(posts[1].author, "[deleted]");
        assert_eq!(posts[1].body, "");
        assert_eq!(posts[1].subreddit, "smallbusiness");
    }

    #[tokio::test]
    async fn test_search_surfaces_http_errors() {
        let router = Router::new()
            .route(
                "/api/v1/access_token",
                post(|| async { Json(json!({"access_token": "tok"})) }),
            )
            .route(
                "/r/all/search",
                get(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "slow down") }),
            );
        let base = serve(router).await;

        let search = RedditSearch::new(&config(&base)).unwrap();
        let err = search.search("CRM", 5).await.unwrap_err();
        assert!(format!("{:#}", err).contains("429"));
    }
}
