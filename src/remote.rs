use crate::error::{ImporterError, Result};
use crate::storage::SiteStore;
use crate::types::{CanonicalSite, SiteYearMetrics, UpsertOutcome};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// REST adapter for the live GreenAtlas site registry.
pub struct HttpSiteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSiteStore {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SiteStore for HttpSiteStore {
    #[instrument(skip(self))]
    async fn list_sites(&self) -> Result<Vec<CanonicalSite>> {
        let url = format!("{}/api/sites", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImporterError::Api {
                message: format!("site listing failed: {status}"),
            });
        }
        let sites: Vec<CanonicalSite> = response.json().await?;
        debug!("Fetched {} sites from {}", sites.len(), url);
        Ok(sites)
    }

    #[instrument(skip(self, metrics), fields(site_id = metrics.site_id, year = metrics.year))]
    async fn upsert_year_metrics(&self, metrics: &SiteYearMetrics) -> Result<UpsertOutcome> {
        let url = format!("{}/api/site-year-data", self.base_url);
        let response = self.client.post(&url).json(metrics).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImporterError::Api {
                message: format!("upsert failed: {status} - {body}"),
            });
        }

        // 201 is the registry's only create-vs-overwrite hint.
        if status == reqwest::StatusCode::CREATED {
            Ok(UpsertOutcome::Created)
        } else {
            Ok(UpsertOutcome::Updated)
        }
    }
}
