use std::cmp::Reverse;
use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::model::{AnomalyRecord, MismatchRecord, ReconciledAnomaly};

/// Pair drain and ticket anomalies from one cauldron on one date.
///
/// Anomalies are stamped with `date` and sorted by volume, largest first
/// (stable: equal volumes keep their input order). Scanning left to right,
/// each unresolved anomaly takes the first later unresolved anomaly of the
/// other kind as its partner and the two collapse into a [`MismatchRecord`].
/// Anomalies left without a partner are emitted unchanged.
///
/// Greedy, not a minimum-difference assignment.
pub fn pair_anomalies(date: &str, anomalies: &[AnomalyRecord]) -> Vec<ReconciledAnomaly> {
    let mut dated: Vec<AnomalyRecord> = anomalies
        .iter()
        .map(|a| AnomalyRecord {
            date: Some(date.to_string()),
            ..a.clone()
        })
        .collect();
    dated.sort_by_key(|a| Reverse(OrderedFloat(a.volume_or_zero())));

    // `None` marks a slot already resolved.
    let mut slots: Vec<Option<AnomalyRecord>> = dated.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(slots.len());

    for i in 0..slots.len() {
        let Some(current) = slots[i].take() else {
            continue;
        };

        let partner = slots[i + 1..]
            .iter_mut()
            .find(|slot| matches!(slot, Some(other) if other.kind != current.kind))
            .and_then(Option::take);

        match partner {
            Some(other) => out.push(ReconciledAnomaly::Mismatch(merge_pair(date, &current, &other))),
            None => out.push(ReconciledAnomaly::Unpaired(current)),
        }
    }

    out
}

fn merge_pair(date: &str, a: &AnomalyRecord, b: &AnomalyRecord) -> MismatchRecord {
    let (va, vb) = (a.volume_or_zero(), b.volume_or_zero());
    MismatchRecord {
        difference: (va - vb).abs(),
        original_volumes: BTreeMap::from([(a.kind, va), (b.kind, vb)]),
        date: date.to_string(),
        merged: true,
    }
}
