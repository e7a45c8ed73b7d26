use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::alert::{format_notification, AlertSink};
use crate::analysis::{Classifier, RelevanceGate};
use crate::error::ScoutError;
use crate::reddit::{CandidatePost, PostSearch};
use crate::storage::{header_row, AcceptedRecord, SheetStore, HEADER_RANGE};

/// Wait inserted after every candidate.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

pub struct SleepPacer {
    delay: Duration,
}

impl SleepPacer {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            delay: Duration::from_secs(secs),
        }
    }
}

#[async_trait]
impl Pacer for SleepPacer {
    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// External collaborators, built once and shared by reference.
pub struct Services {
    pub search: Box<dyn PostSearch>,
    pub classifier: Box<dyn Classifier>,
    pub sheet: Box<dyn SheetStore>,
    pub alerts: Box<dyn AlertSink>,
    pub pacer: Box<dyn Pacer>,
}

/// Terminal state of one candidate post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    Accepted,
    Rejected,
    ClassificationFailed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub keywords: usize,
    pub search_failures: usize,
    pub candidates: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub classification_failures: usize,
    pub persist_failures: usize,
    pub alert_failures: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: CandidateOutcome) {
        self.candidates += 1;
        match outcome {
            CandidateOutcome::Accepted => self.accepted += 1,
            CandidateOutcome::Rejected => self.rejected += 1,
            CandidateOutcome::ClassificationFailed => self.classification_failures += 1,
        }
    }
}

pub struct Pipeline<'a> {
    services: &'a Services,
    gate: RelevanceGate,
    search_limit: u32,
}

impl<'a> Pipeline<'a> {
    pub fn new(services: &'a Services, gate: RelevanceGate, search_limit: u32) -> Self {
        Self {
            services,
            gate,
            search_limit,
        }
    }

    /// Writes the header row; the run must not append rows without it.
    pub async fn prepare_sheet(&self) -> Result<()> {
        self.services
            .sheet
            .update(HEADER_RANGE, vec![header_row()])
            .await
            .context("Failed to write sheet header")
    }

    /// One sequential pass over keywords × search results.
    pub async fn run(&self, keywords: &[String]) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(
            "Starting run over {} keywords (threshold {}, limit {})",
            keywords.len(),
            self.gate.threshold(),
            self.search_limit
        );

        for keyword in keywords {
            summary.keywords += 1;
            let posts = match self.services.search.search(keyword, self.search_limit).await {
                Ok(posts) => posts,
                Err(e) => {
                    error!("Search for {:?} failed: {:#}", keyword, e);
                    summary.search_failures += 1;
                    continue;
                }
            };
            debug!("{:?}: {} candidates", keyword, posts.len());

            for post in posts {
                let outcome = self.process(keyword, keywords, post, &mut summary).await;
                summary.record(outcome);
                self.services.pacer.pause().await;
            }
        }

        info!(
            "Run finished: {} keywords ({} search failures), {} candidates, {} accepted, {} rejected, {} classification failures, {} persist failures, {} alert failures",
            summary.keywords,
            summary.search_failures,
            summary.candidates,
            summary.accepted,
            summary.rejected,
            summary.classification_failures,
            summary.persist_failures,
            summary.alert_failures
        );
        summary
    }

    async fn process(
        &self,
        keyword: &str,
        keywords: &[String],
        post: CandidatePost,
        summary: &mut RunSummary,
    ) -> CandidateOutcome {
        let analysis = match self.services.classifier.classify(&post.text(), keywords).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Skipping {}: {}", post.url, e);
                return CandidateOutcome::ClassificationFailed;
            }
        };

        if !self.gate.accepts(&analysis) {
            debug!("Rejected {} (relevance {:.2})", post.url, analysis.relevance);
            return CandidateOutcome::Rejected;
        }

        let record = AcceptedRecord::new(keyword, post, analysis);
        info!(
            "Relevant post for {:?}: [{}] {:.2} {}",
            keyword, record.analysis.intent, record.analysis.relevance, record.post.url
        );

        if let Err(e) = self.services.sheet.append_row(record.to_row()).await {
            let failure = ScoutError::Delivery(format!("row for {}: {:#}", record.post.url, e));
            error!("{}", failure);
            summary.persist_failures += 1;
        }

        let notification = format_notification(&record);
        if let Err(e) = self.services.alerts.dispatch(&notification).await {
            let failure = ScoutError::Delivery(format!("alert for {}: {:#}", record.post.url, e));
            error!("{}", failure);
            summary.alert_failures += 1;
        }

        CandidateOutcome::Accepted
    }
}
