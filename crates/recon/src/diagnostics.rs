use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// Input the engine skipped. Never fatal; reported alongside the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An in-window bucket names a cauldron the catalog does not have.
    UnknownUnit {
        date: String,
        unit_id: String,
        anomalies: usize,
        matches: usize,
    },
    /// A bucket key that is not a `YYYY-MM-DD` date.
    MalformedDate { key: String },
    /// The catalog lists the same id more than once.
    DuplicateUnit { unit_id: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownUnit { date, unit_id, anomalies, matches } => write!(
                f,
                "{date}: unknown cauldron '{unit_id}' ({anomalies} anomalies, {matches} matches dropped)"
            ),
            Self::MalformedDate { key } => write!(f, "bucket key '{key}' is not a YYYY-MM-DD date"),
            Self::DuplicateUnit { unit_id } => {
                write!(f, "catalog lists '{unit_id}' more than once")
            }
        }
    }
}

/// Collects skipped input during one reconcile pass.
///
/// Unknown ids seen in both maps for the same date fold into one entry.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    duplicates: Vec<String>,
    malformed: BTreeSet<String>,
    unknown: BTreeMap<(String, String), (usize, usize)>,
}

impl DiagnosticSink {
    pub fn duplicate_unit(&mut self, unit_id: &str) {
        self.duplicates.push(unit_id.to_string());
    }

    pub fn malformed_date(&mut self, key: &str) {
        self.malformed.insert(key.to_string());
    }

    pub fn unknown_anomalies(&mut self, date: &str, unit_id: &str, count: usize) {
        self.unknown_entry(date, unit_id).0 += count;
    }

    pub fn unknown_matches(&mut self, date: &str, unit_id: &str, count: usize) {
        self.unknown_entry(date, unit_id).1 += count;
    }

    fn unknown_entry(&mut self, date: &str, unit_id: &str) -> &mut (usize, usize) {
        self.unknown
            .entry((date.to_string(), unit_id.to_string()))
            .or_insert((0, 0))
    }

    /// Duplicates first (catalog order), then malformed keys, then unknown
    /// ids by (date, id).
    pub fn finish(self) -> Vec<Diagnostic> {
        let mut out: Vec<Diagnostic> = self
            .duplicates
            .into_iter()
            .map(|unit_id| Diagnostic::DuplicateUnit { unit_id })
            .collect();
        out.extend(self.malformed.into_iter().map(|key| Diagnostic::MalformedDate { key }));
        out.extend(self.unknown.into_iter().map(|((date, unit_id), (anomalies, matches))| {
            Diagnostic::UnknownUnit {
                date,
                unit_id,
                anomalies,
                matches,
            }
        }));

        for d in &out {
            log::warn!("{d}");
        }
        out
    }
}
