//! Gene description augmentation
//!
//! Gene records that failed resolution usually carry a bare number or a
//! placeholder as their name. Before the retry pass, the NCBI E-utilities
//! esummary service is asked for the gene's description, which replaces the
//! name when one comes back.
//!
//! # API Reference
//! - Endpoint: `esummary.fcgi?db=gene&id=<numeric-id>&retmode=json`
//! - Response: `{"result": {"uids": [...], "<id>": {"description": "..."}}}`
//! - Courtesy limit: one request per `min_interval` (default 500 ms)
//!
//! Every failure here is soft: the record keeps its name and moves on.

use crate::models::Batch;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use microkg_common::config::AugmentationConfig;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Identifier namespace the stage applies to
pub const GENE_NAMESPACE: &str = "NCBIGene";

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("microkg-ns/", env!("CARGO_PKG_VERSION"));

/// Description service errors
#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Gene ID not found in response: {0}")]
    NotFound(String),

    #[error("No description available for gene {0}")]
    MissingDescription(String),
}

/// Source of human-readable gene descriptions
#[async_trait]
pub trait GeneDescriptionSource: Send + Sync {
    async fn fetch_description(&self, gene_id: &str) -> Result<String, AugmentError>;
}

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// E-utilities esummary client
pub struct EutilsClient {
    http_client: reqwest::Client,
    base_url: String,
    /// `None` when the configured interval is zero
    rate_limiter: Option<DirectLimiter>,
}

impl EutilsClient {
    pub fn new(config: &AugmentationConfig) -> Result<Self, AugmentError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AugmentError::Network(e.to_string()))?;

        let rate_limiter = Quota::with_period(Duration::from_millis(config.min_interval_ms))
            .map(RateLimiter::direct);

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            rate_limiter,
        })
    }

    async fn wait_for_slot(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }
}

/// esummary envelope; `result` mixes the `uids` list with one entry per id
#[derive(Debug, Deserialize)]
struct EsummaryResponse {
    #[serde(default)]
    result: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct GeneSummary {
    #[serde(default)]
    description: Option<String>,
}

/// Pull `result.<id>.description` out of an esummary body
pub fn extract_description(body: &Value, gene_id: &str) -> Result<String, AugmentError> {
    let response =
        EsummaryResponse::deserialize(body).map_err(|e| AugmentError::Parse(e.to_string()))?;

    let entry = response
        .result
        .get(gene_id)
        .ok_or_else(|| AugmentError::NotFound(gene_id.to_string()))?;

    let summary =
        GeneSummary::deserialize(entry).map_err(|e| AugmentError::Parse(e.to_string()))?;

    summary
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AugmentError::MissingDescription(gene_id.to_string()))
}

#[async_trait]
impl GeneDescriptionSource for EutilsClient {
    async fn fetch_description(&self, gene_id: &str) -> Result<String, AugmentError> {
        self.wait_for_slot().await;

        debug!(gene_id = %gene_id, url = %self.base_url, "Querying esummary");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("db", "gene"), ("id", gene_id), ("retmode", "json")])
            .send()
            .await
            .map_err(|e| AugmentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AugmentError::Api(status.as_u16(), body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AugmentError::Parse(e.to_string()))?;

        extract_description(&body, gene_id)
    }
}

/// Bare numeric id of a gene identifier (`NCBIGene:7157` → `7157`)
pub fn gene_number(id: &str) -> Option<&str> {
    match id.split_once(':') {
        Some((GENE_NAMESPACE, number))
            if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) =>
        {
            Some(number)
        }
        _ => None,
    }
}

/// Counts from one augmentation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AugmentationStats {
    /// Gene records seen
    pub candidates: usize,
    /// Names replaced by a description
    pub augmented: usize,
    /// Requests that failed softly
    pub failed: usize,
    /// Gene records whose id has no numeric body
    pub skipped: usize,
}

/// Replaces gene record names with fetched descriptions
pub struct GeneAugmenter<'a> {
    source: &'a dyn GeneDescriptionSource,
}

impl<'a> GeneAugmenter<'a> {
    pub fn new(source: &'a dyn GeneDescriptionSource) -> Self {
        Self { source }
    }

    /// Augment every gene record of a batch, in order
    pub async fn augment_batch(&self, batch: &mut Batch) -> AugmentationStats {
        let mut stats = AugmentationStats::default();

        for record in &mut batch.records {
            if record.namespace() != Some(GENE_NAMESPACE) {
                continue;
            }
            stats.candidates += 1;

            let Some(number) = gene_number(&record.raw_id).map(str::to_string) else {
                warn!(id = %record.raw_id, "Gene identifier has no numeric id, skipping augmentation");
                stats.skipped += 1;
                continue;
            };

            match self.source.fetch_description(&number).await {
                Ok(description) => {
                    debug!(id = %record.raw_id, description = %description, "Gene name augmented");
                    record.rewrite_name(description);
                    stats.augmented += 1;
                }
                Err(e) => {
                    warn!(id = %record.raw_id, "Error fetching description for gene ID {}: {}", number, e);
                    stats.failed += 1;
                }
            }
        }

        info!(
            candidates = stats.candidates,
            augmented = stats.augmented,
            failed = stats.failed,
            skipped = stats.skipped,
            "Gene augmentation complete"
        );

        stats
    }
}
