use crate::constants;
use crate::error::{ImporterError, Result};
use serde::{Deserialize, Serialize};

/// One row of the legacy per-location export. Metric values live in the
/// flattened residual map under `<MetricPrefix><FourDigitYear>` keys
/// (e.g. `TreeCanopy2022`); keys outside that convention are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRecord {
    #[serde(default)]
    pub location: String,
    #[serde(flatten)]
    pub values: serde_json::Map<String, serde_json::Value>,
}

/// Read-only projection of a site in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalSite {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Canonical per-site, per-year land-cover payload. (site_id, year) is the
/// registry's natural upsert key; `None` fields are omitted on the wire so
/// the write leaves them untouched on the far side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteYearMetrics {
    pub site_id: i64,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub green_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_canopy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barren_land: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wet_land: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snow: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rock: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buildup: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solar_panels: Option<f64>,
}

impl SiteYearMetrics {
    pub fn new(site_id: i64, year: i32) -> Self {
        Self {
            site_id,
            year,
            green_area: None,
            tree_canopy: None,
            barren_land: None,
            wet_land: None,
            snow: None,
            rock: None,
            water: None,
            buildup: None,
            solar_panels: None,
        }
    }

    /// Overlay the populated fields of `other` onto this record, leaving
    /// fields absent in `other` untouched.
    pub fn merge_from(&mut self, other: &SiteYearMetrics) {
        let fields = [
            (&mut self.green_area, other.green_area),
            (&mut self.tree_canopy, other.tree_canopy),
            (&mut self.barren_land, other.barren_land),
            (&mut self.wet_land, other.wet_land),
            (&mut self.snow, other.snow),
            (&mut self.rock, other.rock),
            (&mut self.water, other.water),
            (&mut self.buildup, other.buildup),
            (&mut self.solar_panels, other.solar_panels),
        ];
        for (slot, incoming) in fields {
            if incoming.is_some() {
                *slot = incoming;
            }
        }
    }
}

/// Outcome reported by the store for an idempotent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Inclusive, contiguous range of export years supported by an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(ImporterError::Config(format!(
                "invalid year range: {start} is after {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Years oldest to newest.
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start..=self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start: constants::DEFAULT_YEAR_START,
            end: constants::DEFAULT_YEAR_END,
        }
    }
}
