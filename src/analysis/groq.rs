use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GroqConfig;
use crate::error::ScoutError;
use super::intent::{Intent, Sentiment};
use super::types::AnalysisResult;
use super::Classifier;

pub struct GroqClassifier {
    client: Client,
    api_key: String,
    model: String,
    api_url: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Shape the model is told to produce. Every field is required.
#[derive(Deserialize)]
struct RawAnalysis {
    relevance: f64,
    intent: String,
    sentiment: String,
    summary: String,
    suggestion: String,
}

fn system_prompt(keywords: &[String]) -> String {
    format!(
        r#"You are an expert GTM analyst. Analyze a social media post and provide JSON:
1. "relevance": 0.0-1.0 relevant to keywords: {}
2. "intent": "question", "complaint", "vendor search", "general chatter"
3. "sentiment": "positive", "negative", "neutral"
4. "summary": concise one-sentence summary
5. "suggestion": short engagement suggestion
Response must be a single valid JSON object."#,
        keywords.join(", ")
    )
}

/// Strictly decodes the model's JSON object; nothing partial gets through.
pub fn decode_analysis(content: &str) -> Result<AnalysisResult> {
    let raw: RawAnalysis =
        serde_json::from_str(content.trim()).context("Failed to parse analysis JSON")?;

    let intent: Intent = raw.intent.parse().map_err(anyhow::Error::msg)?;
    let sentiment: Sentiment = raw.sentiment.parse().map_err(anyhow::Error::msg)?;

    if !(0.0..=1.0).contains(&raw.relevance) {
        warn!("Classifier returned out-of-range relevance {}", raw.relevance);
    }

    Ok(AnalysisResult {
        relevance: raw.relevance,
        intent,
        sentiment,
        summary: raw.summary,
        suggestion: raw.suggestion,
    })
}

impl GroqClassifier {
    pub fn new(config: &GroqConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_url: config.api_url.clone(),
            max_tokens: config.max_tokens,
        }
    }

    async fn analyze(&self, text: &str, keywords: &[String]) -> Result<AnalysisResult> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt(keywords),
                },
                Message {
                    role: "user",
                    content: format!("Analyze the following post:\n\nTEXT: {}", text),
                },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Groq API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Groq API returned {}: {}", status, body);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse Groq response")?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("Empty Groq response")?;

        debug!("Groq analysis: {}", content);
        decode_analysis(&content)
    }
}

#[async_trait]
impl Classifier for GroqClassifier {
    async fn classify(&self, text: &str, keywords: &[String]) -> Result<AnalysisResult, ScoutError> {
        if text.trim().is_empty() {
            return Err(ScoutError::ClassificationUnavailable("post has no text".to_string()));
        }
        self.analyze(text, keywords)
            .await
            .map_err(|e| ScoutError::ClassificationUnavailable(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/chat", addr)
    }

    fn classifier(api_url: &str) -> GroqClassifier {
        GroqClassifier::new(&GroqConfig {
            api_url: api_url.to_string(),
            api_key: "gsk_test".to_string(),
            ..GroqConfig::default()
        })
    }

    fn completion(content: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    fn keywords() -> Vec<String> {
        vec!["CRM".to_string(), "sales automation".to_string()]
    }

    const GOOD: &str = r#"{"relevance": 0.8, "intent": "vendor search", "sentiment": "positive",
        "summary": "User seeks CRM tool", "suggestion": "Recommend our product"}"#;

    #[test]
    fn test_decode_valid_analysis() {
        let analysis = decode_analysis(GOOD).unwrap();
        assert_eq!(analysis.relevance, 0.8);
        assert_eq!(analysis.intent, Intent::VendorSearch);
        assert_eq!(analysis.sentiment, Sentiment::Positive);
        assert_eq!(analysis.summary, "User seeks CRM tool");
    }

    #[test]
    fn test_decode_rejects_malformed_output() {
        let cases = [
            "not json at all",
            "[0.8]",
            r#"{"intent": "question", "sentiment": "neutral", "summary": "s", "suggestion": "x"}"#,
            r#"{"relevance": "0.8", "intent": "question", "sentiment": "neutral", "summary": "s", "suggestion": "x"}"#,
            r#"{"relevance": 0.8, "intent": 3, "sentiment": "neutral", "summary": "s", "suggestion": "x"}"#,
            r#"{"relevance": 0.8, "intent": "question", "sentiment": "neutral", "summary": null, "suggestion": "x"}"#,
            r#"{"relevance": 0.8, "intent": "question", "sentiment": "neutral", "summary": "s"}"#,
            r#"{"relevance": 0.8, "intent": "shopping", "sentiment": "neutral", "summary": "s", "suggestion": "x"}"#,
            r#"{"relevance": 0.8, "intent": "question", "sentiment": "ecstatic", "summary": "s", "suggestion": "x"}"#,
        ];
        for case in cases {
            assert!(decode_analysis(case).is_err(), "accepted malformed output: {case}");
        }
    }

    #[test]
    fn test_decode_passes_out_of_range_relevance_through() {
        let analysis = decode_analysis(
            r#"{"relevance": 1.4, "intent": "complaint", "sentiment": "negative", "summary": "s", "suggestion": "x"}"#,
        )
        .unwrap();
        assert_eq!(analysis.relevance, 1.4);
    }

    #[test]
    fn test_decode_accepts_integer_relevance() {
        let analysis = decode_analysis(
            r#"{"relevance": 1, "intent": "question", "sentiment": "neutral", "summary": "s", "suggestion": "x"}"#,
        )
        .unwrap();
        assert_eq!(analysis.relevance, 1.0);
    }

    #[tokio::test]
    async fn test_classify_sends_deterministic_json_request() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let router = Router::new().route(
            "/chat",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(completion(GOOD))
                }
            }),
        );
        let url = serve(router).await;

        let analysis = classifier(&url)
            .classify("Need a CRM for my team", &keywords())
            .await
            .unwrap();
        assert_eq!(analysis.intent, Intent::VendorSearch);

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["temperature"], json!(0.0));
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][0]["content"].as_str().unwrap().contains("CRM, sales automation"));
        assert!(body["messages"][1]["content"].as_str().unwrap().ends_with("TEXT: Need a CRM for my team"));
    }

    #[tokio::test]
    async fn test_classify_non_success_status() {
        let router = Router::new().route(
            "/chat",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let url = serve(router).await;

        let err = classifier(&url).classify("text", &keywords()).await.unwrap_err();
        assert!(matches!(err, ScoutError::ClassificationUnavailable(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_classify_malformed_content() {
        let router = Router::new().route(
            "/chat",
            post(|| async { Json(completion(r#"{"relevance": 0.9, "intent": "question"}"#)) }),
        );
        let url = serve(router).await;

        let err = classifier(&url).classify("text", &keywords()).await.unwrap_err();
        assert!(matches!(err, ScoutError::ClassificationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_classify_non_json_body() {
        let router = Router::new().route("/chat", post(|| async { "<html>oops</html>" }));
        let url = serve(router).await;

        let err = classifier(&url).classify("text", &keywords()).await.unwrap_err();
        assert!(matches!(err, ScoutError::ClassificationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_classify_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = classifier(&format!("http://{}/chat", addr))
            .classify("text", &keywords())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::ClassificationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_classify_skips_empty_text() {
        let err = classifier("http://127.0.0.1:9/chat")
            .classify("   ", &keywords())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::ClassificationUnavailable(_)));
    }
}
