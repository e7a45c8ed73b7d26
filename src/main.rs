mod alert;
mod analysis;
mod config;
mod error;
mod keywords;
mod pipeline;
mod reddit;
mod report;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

use config::{AppConfig, SheetBackend};
use pipeline::{Pipeline, Services, SleepPacer};
use storage::SheetStore;

/// Searches Reddit for keywords, scores posts with an LLM, records the
/// relevant ones in a sheet and alerts Slack.
#[derive(Parser, Debug)]
#[command(name = "keyword-scout", version, about)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "SCOUT_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Keyword file, overriding `pipeline.keywords_file`
    #[arg(short, long, env = "SCOUT_KEYWORDS")]
    keywords: Option<PathBuf>,

    /// Dashboard output path, overriding `report.output`
    #[arg(long)]
    dashboard: Option<PathBuf>,

    /// Do not render the dashboard after the run
    #[arg(long)]
    skip_report: bool,
}

impl Args {
    /// Loads `.env` (or `env_file`) before parsing so `SCOUT_*` values set there apply.
    fn with_env_file<I, T>(env_file: Option<&Path>, argv: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        if let Some(path) = env_file {
            dotenvy::from_path(path).ok();
        } else {
            dotenvy::dotenv().ok();
        }
        Args::parse_from(argv)
    }
}

fn build_services(config: &AppConfig) -> Result<Services> {
    let sheet: Box<dyn SheetStore> = match config.sheet.backend {
        SheetBackend::Google => {
            let account_file = config
                .sheet
                .service_account_file
                .as_deref()
                .context("GOOGLE_SERVICE_ACCOUNT_FILE not set")?;
            Box::new(storage::GoogleSheet::new(&config.sheet, account_file)?)
        }
        SheetBackend::Local => Box::new(storage::LocalSheet::new(&config.sheet.local_path)),
    };

    Ok(Services {
        search: Box::new(reddit::RedditSearch::new(&config.reddit)?),
        classifier: Box::new(analysis::GroqClassifier::new(&config.groq)),
        sheet,
        alerts: Box::new(alert::SlackWebhook::new(&config.slack.webhook_url)),
        pacer: Box::new(SleepPacer::from_secs(config.pipeline.pacing_delay_secs)),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyword_scout=info".into()),
        )
        .init();

    let args = Args::with_env_file(None, std::env::args_os());

    info!("Loading configuration...");
    let config = AppConfig::load(&args.config)?;
    let keyword_file = args.keywords.unwrap_or_else(|| config.pipeline.keywords_file.clone());
    let keywords = keywords::load_keywords(&keyword_file)?;
    info!("Loaded {} keywords from {}", keywords.len(), keyword_file.display());

    let services = build_services(&config)?;
    let pipeline = Pipeline::new(
        &services,
        analysis::RelevanceGate::new(config.pipeline.relevance_threshold),
        config.pipeline.search_limit,
    );

    pipeline.prepare_sheet().await?;
    pipeline.run(&keywords).await;

    if !args.skip_report {
        let output = args.dashboard.unwrap_or_else(|| config.report.output.clone());
        if let report::ReportOutcome::Written(path) =
            report::generate(services.sheet.as_ref(), &output).await?
        {
            info!("Dashboard saved as '{}'", path.display());
        }
    }

    Ok(())
}
