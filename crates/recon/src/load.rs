use crate::error::ReconError;
use crate::model::{AnomalyLog, StorageUnit};

/// Parse the catalog feed: a JSON array of cauldrons.
pub fn load_catalog(json: &str) -> Result<Vec<StorageUnit>, ReconError> {
    serde_json::from_str(json).map_err(|e| json_err("catalog", e))
}

/// Parse the anomaly/match feed. Missing `anomalies`/`matches` read as empty.
///
/// Anomaly `type` must be `DRAIN_ANOMALY` or `TICKET_ANOMALY`; a single record
/// with any other type fails the whole load rather than becoming a diagnostic.
/// Match records are not checked beyond being JSON objects.
pub fn load_log(json: &str) -> Result<AnomalyLog, ReconError> {
    serde_json::from_str(json).map_err(|e| json_err("anomaly log", e))
}

fn json_err(source_name: &str, e: serde_json::Error) -> ReconError {
    ReconError::Json {
        source_name: source_name.into(),
        message: e.to_string(),
    }
}
