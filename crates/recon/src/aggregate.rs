use std::collections::HashMap;

use crate::model::{AggregatedUnit, MatchRecord, ReconciledAnomaly, StorageUnit};

impl AggregatedUnit {
    /// Empty aggregate for a catalog entry.
    pub fn new(details: StorageUnit) -> Self {
        Self {
            details,
            all_anomalies: Vec::new(),
            all_matches: Vec::new(),
            anomaly_count: 0,
            match_count: 0,
        }
    }

    /// Append reconciled anomalies; a merged pair counts once.
    pub fn push_anomalies(&mut self, reconciled: Vec<ReconciledAnomaly>) {
        self.anomaly_count += reconciled.len();
        self.all_anomalies.extend(reconciled);
    }

    pub fn push_matches(&mut self, matches: &[MatchRecord]) {
        self.match_count += matches.len();
        self.all_matches.extend_from_slice(matches);
    }

    pub fn has_activity(&self) -> bool {
        self.anomaly_count > 0 || self.match_count > 0
    }
}

/// Catalog-ordered aggregates with lookup by cauldron id.
///
/// Every catalog entry gets a slot. When an id repeats, later entries keep
/// their (empty) slot and lookups resolve to the first one.
pub struct UnitTable {
    units: Vec<AggregatedUnit>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
}

impl UnitTable {
    pub fn from_catalog(catalog: &[StorageUnit]) -> Self {
        let mut units = Vec::with_capacity(catalog.len());
        let mut index = HashMap::with_capacity(catalog.len());
        let mut duplicates = Vec::new();

        for unit in catalog {
            if index.contains_key(&unit.id) {
                duplicates.push(unit.id.clone());
            } else {
                index.insert(unit.id.clone(), units.len());
            }
            units.push(AggregatedUnit::new(unit.clone()));
        }

        Self {
            units,
            index,
            duplicates,
        }
    }

    pub fn get_mut(&mut self, unit_id: &str) -> Option<&mut AggregatedUnit> {
        let idx = *self.index.get(unit_id)?;
        self.units.get_mut(idx)
    }

    /// Ids that appeared more than once, in catalog order.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn into_units(self) -> Vec<AggregatedUnit> {
        self.units
    }
}
