use crate::constants;
use crate::error::{ImporterError, Result};
use crate::extractor;
use crate::matcher;
use crate::storage::SiteStore;
use crate::types::{LegacyRecord, UpsertOutcome, YearRange};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Synchronous progress notification: (current position, total operation
/// count, human-readable label). Invoked before each (record, year)
/// extraction attempt; not a cancellation point.
pub type ProgressFn = dyn Fn(usize, usize, &str) + Send + Sync;

/// Accumulated outcome of one import run. Owned by exactly one in-flight
/// run and returned once at the end; never persisted by the engine.
#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub success: bool,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    /// One `"<location> (<year>): <message>"` entry per failed write, in
    /// processing order.
    pub errors: Vec<String>,
    /// Legacy locations no site could be resolved for. Kept separate from
    /// `errors`: these usually mean "create or rename this site first".
    pub unmatched_locations: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportResult {
    fn new() -> Self {
        Self {
            success: false,
            created: 0,
            updated: 0,
            skipped: 0,
            errors: Vec::new(),
            unmatched_locations: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Single attribution point for successful writes. The store reports
    /// create vs. overwrite, but consumers of this report expect every
    /// successful write under `created`; split the counters here if that
    /// ever changes.
    fn record_write(&mut self, _outcome: UpsertOutcome) {
        self.created += 1;
    }

    fn finish(&mut self) {
        self.success = self.errors.is_empty();
        self.finished_at = Some(Utc::now());
    }
}

/// Reconciliation orchestrator: matches each legacy record to a site once,
/// extracts each supported year, and performs one idempotent write per
/// non-empty extraction. Strictly sequential — the ordered error list and
/// the progress stream assume a total order of operations.
pub struct Importer {
    store: Arc<dyn SiteStore>,
    years: YearRange,
    progress: Option<Box<ProgressFn>>,
}

impl Importer {
    pub fn new(store: Arc<dyn SiteStore>, years: YearRange) -> Self {
        Self {
            store,
            years,
            progress: None,
        }
    }

    /// Attach a progress callback for the run.
    pub fn with_progress(mut self, progress: Box<ProgressFn>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run one import. Fatal outcomes (site listing failure, empty
    /// catalog) propagate as errors before any write is attempted; every
    /// per-record and per-year failure is captured in the result instead,
    /// and the run always completes. Failed writes are never retried here —
    /// writes are idempotent, so re-running the batch is the retry.
    #[instrument(skip(self, records))]
    pub async fn run(&self, records: &[LegacyRecord]) -> Result<ImportResult> {
        let run_id = Uuid::new_v4();
        let started = std::time::Instant::now();
        info!(
            run_id = %run_id,
            "Starting import run for {} legacy records",
            records.len()
        );
        counter!("atlas_import_runs_total").increment(1);

        let sites = self.store.list_sites().await?;
        if sites.is_empty() {
            error!(run_id = %run_id, "Site registry returned no sites; nothing to match against");
            return Err(ImporterError::EmptySiteCatalog);
        }
        info!("Fetched {} sites from the registry", sites.len());

        let years: Vec<i32> = self.years.years().collect();
        let total_ops = records.len() * years.len();
        let mut result = ImportResult::new();
        let mut position = 0usize;

        for (index, record) in records.iter().enumerate() {
            let label = display_location(record, index);

            let Some(site) = matcher::match_site(&record.location, &sites) else {
                warn!("No site matches \"{}\"; skipping all years for this record", label);
                result.unmatched_locations.push(label);
                // Unmatched years stay in the denominator so progress
                // positions line up with the operation count.
                position += years.len();
                continue;
            };
            debug!("Resolved \"{}\" to site {} ({})", label, site.id, site.name);

            for &year in &years {
                position += 1;
                self.report_progress(position, total_ops, &format!("{label} ({year})"));

                let Some(metrics) = extractor::extract(record, site.id, year) else {
                    result.skipped += 1;
                    continue;
                };

                match self.store.upsert_year_metrics(&metrics).await {
                    Ok(outcome) => result.record_write(outcome),
                    Err(e) => {
                        error!("Write failed for \"{}\" year {}: {}", label, year, e);
                        result.errors.push(format!("{label} ({year}): {e}"));
                    }
                }
            }
        }

        result.finish();
        let duration_secs = started.elapsed().as_secs_f64();
        counter!("atlas_rows_written_total").increment(result.created as u64);
        counter!("atlas_rows_skipped_total").increment(result.skipped as u64);
        counter!("atlas_row_errors_total").increment(result.errors.len() as u64);
        histogram!("atlas_import_duration_seconds").record(duration_secs);
        info!(
            run_id = %run_id,
            "Finished import run: {} created, {} skipped, {} errors, {} unmatched in {:.2}s",
            result.created,
            result.skipped,
            result.errors.len(),
            result.unmatched_locations.len(),
            duration_secs
        );

        Self::push_pushgateway_metrics(&result, duration_secs).await;

        Ok(result)
    }

    fn report_progress(&self, current: usize, total: usize, label: &str) {
        if let Some(progress) = &self.progress {
            progress(current, total, label);
        }
    }

    /// Push a minimal metrics snapshot to a Pushgateway if one is
    /// configured. Failures are logged and swallowed; metrics delivery
    /// never fails an import.
    async fn push_pushgateway_metrics(result: &ImportResult, duration_secs: f64) {
        let base = match std::env::var(constants::PUSHGATEWAY_URL_ENV) {
            Ok(v) if !v.trim().is_empty() => v,
            _ => return,
        };
        let push_url = format!(
            "{}/metrics/job/atlas_importer",
            base.trim_end_matches('/')
        );

        let body = format!(
            "# TYPE atlas_import_runs_total counter\n\
             atlas_import_runs_total 1\n\
             # TYPE atlas_rows_written_total counter\n\
             atlas_rows_written_total {}\n\
             # TYPE atlas_rows_skipped_total counter\n\
             atlas_rows_skipped_total {}\n\
             # TYPE atlas_row_errors_total counter\n\
             atlas_row_errors_total {}\n\
             # TYPE atlas_unmatched_locations_total counter\n\
             atlas_unmatched_locations_total {}\n\
             # TYPE atlas_import_duration_seconds gauge\n\
             atlas_import_duration_seconds {}\n",
            result.created,
            result.skipped,
            result.errors.len(),
            result.unmatched_locations.len(),
            duration_secs
        );

        let client = reqwest::Client::new();
        let push_res = client
            .post(&push_url)
            .header("Content-Type", "text/plain; version=0.0.4")
            .body(body)
            .send()
            .await;

        match push_res {
            Ok(r) if r.status().is_success() => {
                info!("Pushed metrics snapshot to Pushgateway");
            }
            Ok(r) => {
                warn!(
                    "Pushgateway push responded with status {}",
                    r.status().as_u16()
                );
            }
            Err(e) => {
                warn!("Failed to push metrics to Pushgateway: {}", e);
            }
        }
    }
}

/// Display label for a record: its location text, or a positional
/// placeholder when blank. The placeholder keeps report lines readable; it
/// never participates in matching, which still fails for blank text.
pub fn display_location(record: &LegacyRecord, index: usize) -> String {
    if record.location.trim().is_empty() {
        format!("Location {}", index + 1)
    } else {
        record.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemorySiteStore;
    use crate::types::{CanonicalSite, SiteYearMetrics};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn sites() -> Vec<CanonicalSite> {
        vec![
            CanonicalSite {
                id: 7,
                name: "Shangri-La North Lake".to_string(),
                slug: "shangri-la-north-lake".to_string(),
            },
            CanonicalSite {
                id: 8,
                name: "Cedar Flats".to_string(),
                slug: "cedar-flats".to_string(),
            },
        ]
    }

    fn batch(rows: serde_json::Value) -> Vec<LegacyRecord> {
        serde_json::from_value(rows).unwrap()
    }

    fn importer(store: Arc<InMemorySiteStore>, start: i32, end: i32) -> Importer {
        Importer::new(store, YearRange::new(start, end).unwrap())
    }

    #[tokio::test]
    async fn single_record_end_to_end() {
        let store = Arc::new(InMemorySiteStore::new(sites()));
        let records = batch(json!([
            { "location": "Shangri-La, North Lake", "TreeCanopy2021": 42.5, "Water2021": 10.0 }
        ]));

        let result = importer(store.clone(), 2021, 2021).run(&records).await.unwrap();

        assert!(result.success);
        assert_eq!(result.created, 1);
        assert_eq!(result.updated, 0);
        assert_eq!(result.skipped, 0);
        assert!(result.errors.is_empty());
        assert!(result.unmatched_locations.is_empty());

        let stored = store.get(7, 2021).unwrap();
        assert_eq!(stored.tree_canopy, Some(42.5));
        assert_eq!(stored.water, Some(10.0));
    }

    #[tokio::test]
    async fn blank_location_is_unmatched_and_never_written() {
        let store = Arc::new(InMemorySiteStore::new(sites()));
        let records = batch(json!([
            { "location": "", "TreeCanopy2021": 42.5 }
        ]));

        let result = importer(store.clone(), 2021, 2021).run(&records).await.unwrap();

        assert_eq!(result.unmatched_locations, vec!["Location 1"]);
        assert_eq!(result.created, 0);
        assert_eq!(result.skipped, 0);
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn missing_year_counts_as_skip_not_error() {
        let store = Arc::new(InMemorySiteStore::new(sites()));
        let records = batch(json!([
            { "location": "Cedar Flats", "Snow2021": 5.0, "Snow2023": 4.0 }
        ]));

        let result = importer(store.clone(), 2021, 2023).run(&records).await.unwrap();

        assert_eq!(result.created, 2);
        assert_eq!(result.skipped, 1);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn empty_site_catalog_is_fatal() {
        let store = Arc::new(InMemorySiteStore::new(Vec::new()));
        let records = batch(json!([
            { "location": "Cedar Flats", "Snow2021": 5.0 }
        ]));

        let err = importer(store, 2021, 2021).run(&records).await.unwrap_err();
        assert!(matches!(err, ImporterError::EmptySiteCatalog));
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let store = Arc::new(InMemorySiteStore::new(sites()));
        let records = batch(json!([
            { "location": "Cedar Flats", "Snow2021": 5.0, "Rock2022": 1.5 }
        ]));

        let importer = importer(store.clone(), 2021, 2022);
        importer.run(&records).await.unwrap();
        let second = importer.run(&records).await.unwrap();

        assert!(second.success);
        assert_eq!(second.created, 2);
        assert_eq!(store.record_count(), 2);
        assert_eq!(store.get(8, 2021).unwrap().snow, Some(5.0));
    }

    #[tokio::test]
    async fn progress_reports_positions_over_the_full_denominator() {
        let store = Arc::new(InMemorySiteStore::new(sites()));
        // Record 1 never matches, so its years are counted but not reported.
        let records = batch(json!([
            { "location": "Juniper Ridge", "Snow2021": 5.0 },
            { "location": "Cedar Flats", "Snow2021": 5.0 }
        ]));

        let seen: Arc<Mutex<Vec<(usize, usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let importer = importer(store, 2021, 2022).with_progress(Box::new(
            move |current, total, label| {
                sink.lock().unwrap().push((current, total, label.to_string()));
            },
        ));

        importer.run(&records).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (3, 4, "Cedar Flats (2021)".to_string()),
                (4, 4, "Cedar Flats (2022)".to_string()),
            ]
        );
    }

    /// Store whose writes fail for one site, to prove row isolation.
    struct FlakyStore {
        inner: InMemorySiteStore,
        failing_site: i64,
    }

    #[async_trait]
    impl SiteStore for FlakyStore {
        async fn list_sites(&self) -> crate::error::Result<Vec<CanonicalSite>> {
            self.inner.list_sites().await
        }

        async fn upsert_year_metrics(
            &self,
            metrics: &SiteYearMetrics,
        ) -> crate::error::Result<UpsertOutcome> {
            if metrics.site_id == self.failing_site {
                return Err(ImporterError::Api {
                    message: "registry rejected the write".to_string(),
                });
            }
            self.inner.upsert_year_metrics(metrics).await
        }
    }

    #[tokio::test]
    async fn a_failed_write_never_aborts_the_batch() {
        let store = Arc::new(FlakyStore {
            inner: InMemorySiteStore::new(sites()),
            failing_site: 7,
        });
        let records = batch(json!([
            { "location": "Shangri-La North Lake", "Water2021": 1.0 },
            { "location": "Cedar Flats", "Water2021": 2.0 }
        ]));

        let result = Importer::new(store, YearRange::new(2021, 2021).unwrap())
            .run(&records)
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.created, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Shangri-La North Lake (2021):"));
    }
}
