use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::diagnostics::Diagnostic;
use crate::window::DateWindow;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A cauldron as published by the catalog feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUnit {
    pub id: String,
    pub name: String,
    pub max_volume: f64,
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Anomaly log
// ---------------------------------------------------------------------------

/// Which feed flagged an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    /// Found in the level readings, no ticket accounts for it.
    DrainAnomaly,
    /// Found in the transport tickets, no drain accounts for it.
    TicketAnomaly,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DrainAnomaly => write!(f, "DRAIN_ANOMALY"),
            Self::TicketAnomaly => write!(f, "TICKET_ANOMALY"),
        }
    }
}

/// One unexplained drain or ticket on one date for one cauldron.
///
/// `date` is absent in the feed; the engine stamps it from the bucket key.
/// Fields not named here ride along in `extra` and are written back as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnomalyRecord {
    /// Volume in liters; a missing volume counts as zero everywhere.
    pub fn volume_or_zero(&self) -> f64 {
        self.volume.unwrap_or(0.0)
    }
}

/// A drain already tied to one or more tickets upstream.
///
/// Passed through untouched: every field is optional and unknown fields are
/// kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// `1-to-1` or `Many-to-One` in the upstream feed.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drain_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_sum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drain_end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cauldron_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// date → cauldron id → records.
pub type Bucketed<T> = BTreeMap<String, BTreeMap<String, Vec<T>>>;

/// Range the upstream matcher analysed when it produced the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMetadata {
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_tolerance: Option<f64>,
}

/// The anomaly/match feed, bucketed by ISO date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyLog {
    #[serde(default)]
    pub anomalies: Bucketed<AnomalyRecord>,
    #[serde(default)]
    pub matches: Bucketed<MatchRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LogMetadata>,
}

/// Both feeds, already parsed.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub catalog: Vec<StorageUnit>,
    pub log: AnomalyLog,
}

// ---------------------------------------------------------------------------
// Pairing
// ---------------------------------------------------------------------------

/// A drain and a ticket collapsed into one record carrying their delta.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "mismatch", rename_all = "camelCase")]
pub struct MismatchRecord {
    pub difference: f64,
    pub original_volumes: BTreeMap<AnomalyKind, f64>,
    pub date: String,
    pub merged: bool,
}

/// An entry of `allAnomalies`: either left alone or merged with a partner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReconciledAnomaly {
    Unpaired(AnomalyRecord),
    Mismatch(MismatchRecord),
}

impl ReconciledAnomaly {
    pub fn as_mismatch(&self) -> Option<&MismatchRecord> {
        match self {
            Self::Mismatch(m) => Some(m),
            Self::Unpaired(_) => None,
        }
    }

    pub fn as_unpaired(&self) -> Option<&AnomalyRecord> {
        match self {
            Self::Unpaired(a) => Some(a),
            Self::Mismatch(_) => None,
        }
    }

    pub fn date(&self) -> Option<&str> {
        match self {
            Self::Unpaired(a) => a.date.as_deref(),
            Self::Mismatch(m) => Some(&m.date),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Everything the window holds for one cauldron.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedUnit {
    pub details: StorageUnit,
    pub all_anomalies: Vec<ReconciledAnomaly>,
    pub all_matches: Vec<MatchRecord>,
    pub anomaly_count: usize,
    pub match_count: usize,
}

/// Output of [`crate::engine::reconcile`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub units: Vec<AggregatedUnit>,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconSummary {
    pub units: usize,
    pub units_with_activity: usize,
    pub anomalies: usize,
    pub mismatches: usize,
    pub unpaired_drains: usize,
    pub unpaired_tickets: usize,
    pub matches: usize,
    pub total_mismatch_difference: f64,
    pub matched_drain_volume: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub window: DateWindow,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub units: Vec<AggregatedUnit>,
    pub diagnostics: Vec<Diagnostic>,
}
