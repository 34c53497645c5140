use crate::error::Result;
use crate::types::{CanonicalSite, SiteYearMetrics, UpsertOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Port to the site registry. `list_sites` supplies the full catalog once
/// per run; `upsert_year_metrics` is idempotent on the (site, year) natural
/// key, and fields omitted from the payload are left untouched on the far
/// side. Both calls are individually atomic.
#[async_trait]
pub trait SiteStore: Send + Sync {
    async fn list_sites(&self) -> Result<Vec<CanonicalSite>>;
    async fn upsert_year_metrics(&self, metrics: &SiteYearMetrics) -> Result<UpsertOutcome>;
}

/// In-memory registry for development and testing.
pub struct InMemorySiteStore {
    sites: Arc<Mutex<Vec<CanonicalSite>>>,
    records: Arc<Mutex<HashMap<(i64, i32), SiteYearMetrics>>>,
}

impl InMemorySiteStore {
    pub fn new(sites: Vec<CanonicalSite>) -> Self {
        Self {
            sites: Arc::new(Mutex::new(sites)),
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Snapshot of one stored record, for assertions.
    pub fn get(&self, site_id: i64, year: i32) -> Option<SiteYearMetrics> {
        self.records.lock().unwrap().get(&(site_id, year)).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl SiteStore for InMemorySiteStore {
    async fn list_sites(&self) -> Result<Vec<CanonicalSite>> {
        Ok(self.sites.lock().unwrap().clone())
    }

    async fn upsert_year_metrics(&self, metrics: &SiteYearMetrics) -> Result<UpsertOutcome> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&(metrics.site_id, metrics.year)) {
            Some(existing) => {
                existing.merge_from(metrics);
                debug!(
                    "Updated metrics for site {} year {}",
                    metrics.site_id, metrics.year
                );
                Ok(UpsertOutcome::Updated)
            }
            None => {
                records.insert((metrics.site_id, metrics.year), metrics.clone());
                debug!(
                    "Created metrics for site {} year {}",
                    metrics.site_id, metrics.year
                );
                Ok(UpsertOutcome::Created)
            }
        }
    }
}
