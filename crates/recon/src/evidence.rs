use crate::model::{AggregatedUnit, AnomalyKind, ReconSummary, ReconciledAnomaly};

/// Compute summary statistics from reconciled cauldrons.
pub fn compute_summary(units: &[AggregatedUnit]) -> ReconSummary {
    let mut summary = ReconSummary {
        units: units.len(),
        ..ReconSummary::default()
    };

    for unit in units {
        if unit.has_activity() {
            summary.units_with_activity += 1;
        }
        summary.anomalies += unit.anomaly_count;
        summary.matches += unit.match_count;

        for anomaly in &unit.all_anomalies {
            match anomaly {
                ReconciledAnomaly::Mismatch(m) => {
                    summary.mismatches += 1;
                    summary.total_mismatch_difference += m.difference;
                }
                ReconciledAnomaly::Unpaired(a) => match a.kind {
                    AnomalyKind::DrainAnomaly => summary.unpaired_drains += 1,
                    AnomalyKind::TicketAnomaly => summary.unpaired_tickets += 1,
                },
            }
        }

        // A match without drain_volume adds nothing.
        summary.matched_drain_volume += unit
            .all_matches
            .iter()
            .filter_map(|m| m.drain_volume)
            .sum::<f64>();
    }

    summary
}
