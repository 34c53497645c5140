use crate::types::{LegacyRecord, SiteYearMetrics};

/// The closed set of land-cover fields carried by the legacy export. Each
/// field is stored in the flat rows under `<prefix><year>` (e.g.
/// `TreeCanopy2022`); unknown keys are never forwarded to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    GreenArea,
    TreeCanopy,
    BarrenLand,
    WetLand,
    Snow,
    Rock,
    Water,
    Buildup,
    SolarPanels,
}

impl MetricField {
    pub const ALL: [MetricField; 9] = [
        MetricField::GreenArea,
        MetricField::TreeCanopy,
        MetricField::BarrenLand,
        MetricField::WetLand,
        MetricField::Snow,
        MetricField::Rock,
        MetricField::Water,
        MetricField::Buildup,
        MetricField::SolarPanels,
    ];

    /// Legacy column prefix for this field.
    pub fn prefix(self) -> &'static str {
        match self {
            MetricField::GreenArea => "GreenArea",
            MetricField::TreeCanopy => "TreeCanopy",
            MetricField::BarrenLand => "BarrenLand",
            MetricField::WetLand => "WetLand",
            MetricField::Snow => "Snow",
            MetricField::Rock => "Rock",
            MetricField::Water => "Water",
            MetricField::Buildup => "Buildup",
            MetricField::SolarPanels => "SolarPanels",
        }
    }

    fn slot(self, metrics: &mut SiteYearMetrics) -> &mut Option<f64> {
        match self {
            MetricField::GreenArea => &mut metrics.green_area,
            MetricField::TreeCanopy => &mut metrics.tree_canopy,
            MetricField::BarrenLand => &mut metrics.barren_land,
            MetricField::WetLand => &mut metrics.wet_land,
            MetricField::Snow => &mut metrics.snow,
            MetricField::Rock => &mut metrics.rock,
            MetricField::Water => &mut metrics.water,
            MetricField::Buildup => &mut metrics.buildup,
            MetricField::SolarPanels => &mut metrics.solar_panels,
        }
    }
}

/// Extract the year-keyed fields of one record into a canonical payload.
/// Returns `None` when the record carries no numeric value for any of the
/// nine fields in that year ("no data for this year", distinct from a
/// failure). Non-numeric values under a matching key are treated as absent;
/// legacy exports are known to blank numeric columns with stray text.
pub fn extract(record: &LegacyRecord, site_id: i64, year: i32) -> Option<SiteYearMetrics> {
    let mut metrics = SiteYearMetrics::new(site_id, year);
    let mut populated = false;

    for field in MetricField::ALL {
        let key = format!("{}{}", field.prefix(), year);
        if let Some(value) = record.values.get(&key).and_then(|v| v.as_f64()) {
            *field.slot(&mut metrics) = Some(value);
            populated = true;
        }
    }

    populated.then_some(metrics)
}
