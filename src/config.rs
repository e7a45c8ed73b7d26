use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ScoutError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub reddit: RedditConfig,
    pub groq: GroqConfig,
    pub sheet: SheetConfig,
    pub slack: SlackConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub relevance_threshold: f64,
    pub pacing_delay_secs: u64,
    pub search_limit: u32,
    pub keywords_file: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.5,
            pacing_delay_secs: 3,
            search_limit: 5,
            keywords_file: PathBuf::from("keywords.txt"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub subreddit: String,
    pub api_base: String,
    pub auth_url: String,
    pub sort: String,
    pub time_filter: String,
    // Loaded from env
    #[serde(skip)]
    pub client_id: String,
    #[serde(skip)]
    pub client_secret: String,
    #[serde(skip)]
    pub user_agent: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            subreddit: "all".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
            auth_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            sort: "relevance".to_string(),
            time_filter: "all".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GroqConfig {
    pub model: String,
    pub api_url: String,
    pub max_tokens: u32,
    // Loaded from env
    #[serde(skip)]
    pub api_key: String,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            max_tokens: 512,
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetBackend {
    Google,
    Local,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub backend: SheetBackend,
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub local_path: PathBuf,
    pub sheets_api: String,
    // Loaded from env when backend = "google"
    #[serde(skip)]
    pub service_account_file: Option<PathBuf>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            backend: SheetBackend::Local,
            spreadsheet_id: String::new(),
            worksheet: String::new(),
            local_path: PathBuf::from("data/sheet.jsonl"),
            sheets_api: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            service_account_file: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SlackConfig {
    // Loaded from env
    #[serde(skip)]
    pub webhook_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("gtm_dashboard.svg"),
        }
    }
}

impl AppConfig {
    /// Reads `path` (defaults when absent), applies env overrides and pulls secrets.
    pub fn load(path: &Path) -> Result<Self, ScoutError> {
        dotenvy::dotenv().ok();

        let mut config = Self::from_file(path)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ScoutError> {
        if !path.exists() {
            tracing::info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ScoutError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ScoutError> {
        toml::from_str(text).map_err(|e| ScoutError::Config(format!("failed to parse config: {}", e)))
    }

    /// `lookup` abstracts the environment so overrides can be tested.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ScoutError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String, ScoutError> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ScoutError::ConfigurationMissing(name.to_string()))
        };

        if let Some(raw) = lookup("RELEVANCE_THRESHOLD") {
            self.pipeline.relevance_threshold = raw
                .trim()
                .parse()
                .map_err(|_| ScoutError::Config(format!("RELEVANCE_THRESHOLD must be a number, got {:?}", raw)))?;
        }
        if let Some(raw) = lookup("API_RATE_LIMIT_DELAY") {
            self.pipeline.pacing_delay_secs = raw.trim().parse().map_err(|_| {
                ScoutError::Config(format!("API_RATE_LIMIT_DELAY must be whole seconds, got {:?}", raw))
            })?;
        }
        if !self.pipeline.relevance_threshold.is_finite() {
            return Err(ScoutError::Config("relevance_threshold must be finite".to_string()));
        }

        self.reddit.client_id = required("REDDIT_CLIENT_ID")?;
        self.reddit.client_secret = required("REDDIT_CLIENT_SECRET")?;
        self.reddit.user_agent = required("REDDIT_USER_AGENT")?;
        self.groq.api_key = required("GROQ_API_KEY")?;
        self.slack.webhook_url = required("SLACK_WEBHOOK_URL")?;

        if self.sheet.backend == SheetBackend::Google {
            self.sheet.service_account_file = Some(PathBuf::from(required("GOOGLE_SERVICE_ACCOUNT_FILE")?));
            if self.sheet.spreadsheet_id.trim().is_empty() {
                return Err(ScoutError::ConfigurationMissing("sheet.spreadsheet_id".to_string()));
            }
        }

        Ok(())
    }
}
