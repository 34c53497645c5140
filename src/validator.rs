use crate::extractor::MetricField;
use crate::types::{LegacyRecord, YearRange};
use once_cell::sync::Lazy;
use regex::Regex;

static METRIC_KEY: Lazy<Regex> = Lazy::new(|| {
    let prefixes = MetricField::ALL
        .iter()
        .map(|field| field.prefix())
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("^({prefixes})([0-9]{{4}})$")).expect("metric key pattern is valid")
});

/// Advisory pre-import scan, run before any writes. Returns one
/// human-readable warning per structurally weak row: a blank location, or
/// no field matching the prefix+year convention for any supported year.
/// Flagged rows are still attempted by the import; the operator decides
/// what to do with the warnings.
pub fn validate_batch(records: &[LegacyRecord], years: &YearRange) -> Vec<String> {
    let mut warnings = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let row = index + 1;
        let blank = record.location.trim().is_empty();

        if blank {
            warnings.push(format!("Row {row}: location is empty"));
        }

        if !has_year_keyed_field(record, years) {
            if blank {
                warnings.push(format!(
                    "Row {row}: no metric fields for any supported year"
                ));
            } else {
                warnings.push(format!(
                    "Row {row} ({}): no metric fields for any supported year",
                    record.location
                ));
            }
        }
    }

    warnings
}

fn has_year_keyed_field(record: &LegacyRecord, years: &YearRange) -> bool {
    record.values.keys().any(|key| {
        METRIC_KEY
            .captures(key)
            .and_then(|caps| caps.get(2))
            .and_then(|year| year.as_str().parse::<i32>().ok())
            .map(|year| years.contains(year))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(rows: serde_json::Value) -> Vec<LegacyRecord> {
        serde_json::from_value(rows).unwrap()
    }

    fn years() -> YearRange {
        YearRange::new(2019, 2024).unwrap()
    }

    #[test]
    fn clean_rows_produce_no_warnings() {
        let records = batch(json!([
            { "location": "North Lake", "TreeCanopy2021": 42.5 }
        ]));
        assert!(validate_batch(&records, &years()).is_empty());
    }

    #[test]
    fn flags_blank_locations() {
        let records = batch(json!([
            { "location": "  ", "Water2020": 1.0 }
        ]));
        let warnings = validate_batch(&records, &years());
        assert_eq!(warnings, vec!["Row 1: location is empty"]);
    }

    #[test]
    fn flags_rows_without_any_usable_year_field() {
        let records = batch(json!([
            { "location": "Cedar Flats", "Comment": "no data yet" },
            { "location": "Mill Creek", "Water2018": 1.0 }
        ]));
        let warnings = validate_batch(&records, &years());
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Cedar Flats"));
        // 2018 is outside the supported range, so the field does not count.
        assert!(warnings[1].contains("Mill Creek"));
    }

    #[test]
    fn a_row_can_collect_both_warnings() {
        let records = batch(json!([
            { "location": "" }
        ]));
        let warnings = validate_batch(&records, &years());
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn string_values_still_count_as_present_fields() {
        // The validator checks shape, not type; type coercion is the
        // extractor's concern.
        let records = batch(json!([
            { "location": "North Lake", "TreeCanopy2021": "n/a" }
        ]));
        assert!(validate_batch(&records, &years()).is_empty());
    }
}
