use crate::error::{ImporterError, Result};
use crate::types::LegacyRecord;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Decode a raw batch export. The payload must be a JSON array of flat
/// objects; anything else fails the whole batch with `MalformedBatch` —
/// there is no partial recovery at this stage. No side effects.
pub fn parse_batch(raw: &str) -> Result<Vec<LegacyRecord>> {
    let payload: Value = serde_json::from_str(raw)
        .map_err(|e| ImporterError::MalformedBatch(format!("batch is not valid JSON: {e}")))?;

    let rows = match payload {
        Value::Array(rows) => rows,
        other => {
            return Err(ImporterError::MalformedBatch(format!(
                "expected a top-level array of records, got {}",
                json_type_name(&other)
            )))
        }
    };

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let record: LegacyRecord = serde_json::from_value(row).map_err(|e| {
            ImporterError::MalformedBatch(format!("row {} is not a flat record: {e}", index + 1))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read and decode a batch export from disk.
pub fn read_batch_file(path: impl AsRef<Path>) -> Result<Vec<LegacyRecord>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let records = parse_batch(&raw)?;
    info!("Parsed {} legacy records from {}", records.len(), path.display());
    Ok(records)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
