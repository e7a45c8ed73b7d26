use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use crate::config::SheetConfig;
use super::{cell_text, records_from_grid, SheetRecord, SheetStore};

const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Google Sheets worksheet accessed through a service account.
/// An empty `worksheet` means the spreadsheet's first tab, whatever its title.
pub struct GoogleSheet {
    client: Client,
    account: ServiceAccount,
    sheets_api: String,
    spreadsheet_id: String,
    worksheet: String,
    first_sheet: OnceCell<String>,
    token: Mutex<Option<(String, Instant)>>,
}

#[derive(Deserialize)]
struct ServiceAccount {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl GoogleSheet {
    pub fn new(config: &SheetConfig, service_account_file: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(service_account_file).with_context(|| {
            format!(
                "Failed to read service account file {}",
                service_account_file.display()
            )
        })?;
        let account: ServiceAccount =
            serde_json::from_str(&text).context("Failed to parse service account file")?;

        Ok(Self {
            client: Client::new(),
            account,
            sheets_api: config.sheets_api.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            worksheet: config.worksheet.trim().to_string(),
            first_sheet: OnceCell::new(),
            token: Mutex::new(None),
        })
    }

    fn assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.account.client_email,
            scope: SCOPE,
            aud: &self.account.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.account.private_key.as_bytes())
            .context("Service account private key is not a valid RSA PEM")?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .context("Failed to sign service account assertion")
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some((token, expires_at)) = cached.as_ref() {
            if Instant::now() < *expires_at {
                return Ok(token.clone());
            }
        }

        let assertion = self.assertion()?;
        let response = self
            .client
            .post(&self.account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .context("Google token request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google token endpoint returned {}: {}", status, body);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Google token response")?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600)).saturating_sub(Duration::from_secs(60));
        *cached = Some((token.access_token.clone(), Instant::now() + lifetime));

        info!("Google Sheets client authorized as {}", self.account.client_email);
        Ok(token.access_token)
    }

    /// `{api}/{spreadsheet}/{segments...}`, each segment percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.sheets_api).context("Invalid Sheets API URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Sheets API URL cannot be a base"))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    /// `{api}/{spreadsheet}/values/{worksheet}!{range}{suffix}`
    fn values_url(&self, worksheet: &str, range: &str, suffix: &str) -> Result<Url> {
        self.api_url(&["values", &format!("{}!{}{}", worksheet, range, suffix)])
    }

    async fn worksheet(&self) -> Result<&str> {
        if !self.worksheet.is_empty() {
            return Ok(self.worksheet.as_str());
        }
        let title = self
            .first_sheet
            .get_or_try_init(|| self.first_sheet_title())
            .await?;
        Ok(title.as_str())
    }

    async fn first_sheet_title(&self) -> Result<String> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.api_url(&[])?)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await
            .context("Sheets metadata request failed")?;
        let spreadsheet: Spreadsheet = Self::check(response, "metadata")
            .await?
            .json()
            .await
            .context("Failed to parse spreadsheet metadata")?;

        let title = spreadsheet
            .sheets
            .into_iter()
            .next()
            .map(|sheet| sheet.properties.title)
            .context("Spreadsheet has no worksheets")?;
        info!("Writing to first worksheet {:?}", title);
        Ok(title)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sheets {} returned {}: {}", what, status, body);
        }
        Ok(response)
    }
}

#[async_trait]
impl SheetStore for GoogleSheet {
    async fn update(&self, range: &str, rows: Vec<Vec<Value>>) -> Result<()> {
        let worksheet = self.worksheet().await?;
        let token = self.access_token().await?;
        let url = self.values_url(worksheet, range, "")?;

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "range": format!("{}!{}", worksheet, range), "values": rows }))
            .send()
            .await
            .context("Sheets update request failed")?;
        Self::check(response, "update").await?;

        debug!("Updated {}!{}", worksheet, range);
        Ok(())
    }

    async fn append_row(&self, row: Vec<Value>) -> Result<()> {
        let worksheet = self.worksheet().await?;
        let token = self.access_token().await?;
        let url = self.values_url(worksheet, "A1", ":append")?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .context("Sheets append request failed")?;
        Self::check(response, "append").await?;

        Ok(())
    }

    async fn all_records(&self) -> Result<Vec<SheetRecord>> {
        let worksheet = self.worksheet().await?;
        let token = self.access_token().await?;
        let url = self.api_url(&["values", worksheet])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("Sheets read request failed")?;
        let range: ValueRange = Self::check(response, "read")
            .await?
            .json()
            .await
            .context("Failed to parse Sheets values")?;

        let grid = range
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Ok(records_from_grid(grid))
    }
}
