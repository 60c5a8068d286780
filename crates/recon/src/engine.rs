use crate::aggregate::UnitTable;
use crate::config::ReconConfig;
use crate::diagnostics::DiagnosticSink;
use crate::evidence::compute_summary;
use crate::matcher::pair_anomalies;
use crate::model::{AnomalyLog, ReconInput, ReconMeta, ReconResult, Reconciliation, StorageUnit};
use crate::window::{parse_bucket_key, DateWindow};

/// Reconcile the anomaly/match log against the catalog for one date window.
///
/// Returns one aggregate per catalog entry, in catalog order. Buckets outside
/// the window are skipped; in-window anomalies are paired per cauldron and
/// date; matches are appended as-is. Nothing here fails. Records for unknown
/// cauldron ids and under unparseable bucket keys are dropped and reported in
/// `diagnostics`, as are duplicate catalog ids.
pub fn reconcile(catalog: &[StorageUnit], log: &AnomalyLog, window: &DateWindow) -> Reconciliation {
    let mut table = UnitTable::from_catalog(catalog);
    let mut sink = DiagnosticSink::default();
    for id in table.duplicates() {
        sink.duplicate_unit(id);
    }

    if window.is_empty() {
        log::debug!("window {window} is empty, no buckets contribute");
    }

    for (date, units) in &log.anomalies {
        if !bucket_in_window(date, window, &mut sink) {
            continue;
        }
        for (unit_id, anomalies) in units {
            match table.get_mut(unit_id) {
                Some(unit) => {
                    let reconciled = pair_anomalies(date, anomalies);
                    log::debug!(
                        "{date} {unit_id}: {} anomalies reconciled to {}",
                        anomalies.len(),
                        reconciled.len()
                    );
                    unit.push_anomalies(reconciled);
                }
                None => sink.unknown_anomalies(date, unit_id, anomalies.len()),
            }
        }
    }

    for (date, units) in &log.matches {
        if !bucket_in_window(date, window, &mut sink) {
            continue;
        }
        for (unit_id, matches) in units {
            match table.get_mut(unit_id) {
                Some(unit) => unit.push_matches(matches),
                None => sink.unknown_matches(date, unit_id, matches.len()),
            }
        }
    }

    Reconciliation {
        units: table.into_units(),
        diagnostics: sink.finish(),
    }
}

/// Whether a bucket key falls inside `window`. Malformed keys go to `sink`.
fn bucket_in_window(key: &str, window: &DateWindow, sink: &mut DiagnosticSink) -> bool {
    match parse_bucket_key(key) {
        Some(date) => window.contains(date),
        None => {
            sink.malformed_date(key);
            false
        }
    }
}

/// Run a configured reconciliation: reconcile, summarise, stamp metadata.
pub fn run(config: &ReconConfig, input: &ReconInput, window: &DateWindow) -> ReconResult {
    let Reconciliation { units, diagnostics } = reconcile(&input.catalog, &input.log, window);
    let summary = compute_summary(&units);

    log::info!(
        "reconciled {} cauldrons over {window}: {} anomalies, {} matches, {} diagnostics",
        summary.units,
        summary.anomalies,
        summary.matches,
        diagnostics.len()
    );

    ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            window: *window,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        units,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::load::{load_catalog, load_log};
    use crate::model::AnomalyKind;

    const CATALOG: &str = r#"[
        {"id": "C1", "name": "Crimson Brew", "max_volume": 1000, "latitude": 33.21, "longitude": -97.13},
        {"id": "C2", "name": "Azure Mist", "max_volume": 800, "latitude": 33.22, "longitude": -97.14},
        {"id": "C3", "name": "Verdant Tonic", "max_volume": 1200, "latitude": 33.23, "longitude": -97.15}
    ]"#;

    const LOG: &str = r#"{
        "anomalies": {
            "2025-01-01": {
                "C1": [
                    {"volume": 12, "time": "2025-01-01 09:00:00", "type": "DRAIN_ANOMALY"},
                    {"volume": 12, "ticket_id": "TT_01", "type": "TICKET_ANOMALY"}
                ]
            },
            "2025-01-02": {
                "C1": [{"volume": 5, "ticket_id": "TT_02", "type": "TICKET_ANOMALY"}],
                "C2": [
                    {"volume": 5, "time": "2025-01-02 10:00:00", "type": "DRAIN_ANOMALY"},
                    {"volume": 3, "time": "2025-01-02 16:00:00", "type": "DRAIN_ANOMALY"}
                ],
                "GHOST": [{"volume": 1, "ticket_id": "TT_99", "type": "TICKET_ANOMALY"}]
            },
            "2025-01-05": {
                "C3": [{"volume": 70, "time": "2025-01-05 11:00:00", "type": "DRAIN_ANOMALY"}]
            }
        },
        "matches": {
            "2025-01-02": {
                "C2": [{
                    "type": "1-to-1", "drain_volume": 88.1, "ticket_sum": 87.9,
                    "ticket_ids": ["TT_10"], "drain_end_time": "2025-01-02 12:00:00",
                    "cauldron_id": "C2", "date": "2025-01-02"
                }]
            },
            "2025-01-05": {
                "C3": [{
                    "type": "Many-to-One", "drain_volume": 150.0, "ticket_sum": 150.4,
                    "ticket_ids": ["TT_11", "TT_12"], "drain_end_time": "2025-01-05 08:00:00",
                    "cauldron_id": "C3", "date": "2025-01-05"
                }]
            }
        },
        "metadata": {"start_date": "2025-01-01", "end_date": "2025-01-05", "volume_tolerance": 1.5}
    }"#;

    fn fixtures() -> (Vec<StorageUnit>, AnomalyLog) {
        (load_catalog(CATALOG).unwrap(), load_log(LOG).unwrap())
    }

    fn window(start: &str, end: &str) -> DateWindow {
        DateWindow::parse(start, end).unwrap()
    }

    #[test]
    fn one_aggregate_per_catalog_entry_in_order() {
        let (catalog, log) = fixtures();
        let out = reconcile(&catalog, &log, &window("2025-01-01", "2025-01-05"));
        let ids: Vec<&str> = out.units.iter().map(|u| u.details.id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C2", "C3"]);
    }

    #[test]
    fn full_window() {
        let (catalog, log) = fixtures();
        let out = reconcile(&catalog, &log, &window("2025-01-01", "2025-01-05"));

        let c1 = &out.units[0];
        assert_eq!(c1.anomaly_count, 2);
        let m = c1.all_anomalies[0].as_mismatch().unwrap();
        assert_eq!(m.difference, 0.0);
        assert_eq!(m.original_volumes[&AnomalyKind::DrainAnomaly], 12.0);
        assert_eq!(m.original_volumes[&AnomalyKind::TicketAnomaly], 12.0);
        assert_eq!(c1.all_anomalies[1].date(), Some("2025-01-02"));

        let c2 = &out.units[1];
        assert_eq!(c2.anomaly_count, 2);
        assert!(c2.all_anomalies.iter().all(|a| a.as_unpaired().is_some()));
        assert_eq!(c2.match_count, 1);

        let c3 = &out.units[2];
        assert_eq!(c3.anomaly_count, 1);
        assert_eq!(c3.match_count, 1);
        assert_eq!(
            c3.all_matches[0].ticket_ids,
            Some(vec!["TT_11".to_string(), "TT_12".to_string()])
        );
    }

    #[test]
    fn window_filters_buckets() {
        let (catalog, log) = fixtures();
        let out = reconcile(&catalog, &log, &window("2025-01-02", "2025-01-04"));

        assert_eq!(out.units[0].anomaly_count, 1);
        assert_eq!(out.units[1].anomaly_count, 2);
        assert_eq!(out.units[1].match_count, 1);
        assert_eq!(out.units[2].anomaly_count, 0);
        assert_eq!(out.units[2].match_count, 0);
    }

    #[test]
    fn empty_window_contributes_nothing() {
        let (catalog, log) = fixtures();
        let out = reconcile(&catalog, &log, &window("2025-01-05", "2025-01-01"));
        assert_eq!(out.units.len(), 3);
        for u in &out.units {
            assert!(u.all_anomalies.is_empty());
            assert!(u.all_matches.is_empty());
            assert_eq!(u.anomaly_count, 0);
            assert_eq!(u.match_count, 0);
        }
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn empty_catalog_gives_empty_result() {
        let (_, log) = fixtures();
        let out = reconcile(&[], &log, &window("2025-01-01", "2025-01-05"));
        assert!(out.units.is_empty());
    }

    #[test]
    fn unknown_unit_is_dropped_and_reported() {
        let (catalog, log) = fixtures();
        let out = reconcile(&catalog, &log, &window("2025-01-01", "2025-01-05"));
        assert_eq!(out.units.len(), 3);
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::UnknownUnit {
                date: "2025-01-02".into(),
                unit_id: "GHOST".into(),
                anomalies: 1,
                matches: 0,
            }]
        );
    }

    #[test]
    fn malformed_bucket_key_is_skipped() {
        let (catalog, mut log) = fixtures();
        let bad = log.anomalies["2025-01-05"].clone();
        log.anomalies.insert("Jan 5th".into(), bad);

        let out = reconcile(&catalog, &log, &window("2025-01-01", "2025-01-05"));
        assert_eq!(out.units[2].anomaly_count, 1);
        assert!(out
            .diagnostics
            .contains(&Diagnostic::MalformedDate { key: "Jan 5th".into() }));
    }

    #[test]
    fn malformed_match_key_is_skipped() {
        let (catalog, mut log) = fixtures();
        let bad = log.matches["2025-01-05"].clone();
        log.matches.insert("Jan 5th".into(), bad);

        let out = reconcile(&catalog, &log, &window("2025-01-01", "2025-01-05"));
        assert_eq!(out.units[2].match_count, 1);
        assert_eq!(out.units[2].all_matches.len(), 1);
        assert_eq!(out.diagnostics.len(), 2);
        assert!(out
            .diagnostics
            .contains(&Diagnostic::MalformedDate { key: "Jan 5th".into() }));
    }

    #[test]
    fn unknown_unit_in_matches_only() {
        let (catalog, log) = fixtures();
        let w = window("2025-01-01", "2025-01-05");
        let baseline = reconcile(&catalog, &log, &w);

        let mut with_phantom = log.clone();
        let stray = log.matches["2025-01-05"]["C3"].clone();
        with_phantom
            .matches
            .get_mut("2025-01-05")
            .unwrap()
            .insert("PHANTOM".into(), stray);

        let out = reconcile(&catalog, &with_phantom, &w);
        assert_eq!(out.units, baseline.units);
        assert!(out.diagnostics.contains(&Diagnostic::UnknownUnit {
            date: "2025-01-05".into(),
            unit_id: "PHANTOM".into(),
            anomalies: 0,
            matches: 1,
        }));
    }

    #[test]
    fn records_pass_through_with_unknown_fields() {
        let catalog = load_catalog(CATALOG).unwrap();
        let log = load_log(
            r#"{
                "anomalies": {"2025-01-03": {"C1": [
                    {"volume": 3.0, "time": "2025-01-03 07:00:00", "type": "DRAIN_ANOMALY", "source": "level"}
                ]}},
                "matches": {"2025-01-03": {"C1": [
                    {"type": "1-to-1", "ticket_ids": ["TT_7"], "note": "keep me"}
                ]}}
            }"#,
        )
        .unwrap();
        let out = reconcile(&catalog, &log, &window("2025-01-03", "2025-01-03"));

        let c1 = serde_json::to_value(&out.units[0]).unwrap();
        assert_eq!(
            c1["allAnomalies"][0],
            serde_json::json!({
                "volume": 3.0,
                "time": "2025-01-03 07:00:00",
                "type": "DRAIN_ANOMALY",
                "source": "level",
                "date": "2025-01-03"
            })
        );
        assert_eq!(
            c1["allMatches"][0],
            serde_json::json!({"type": "1-to-1", "ticket_ids": ["TT_7"], "note": "keep me"})
        );
    }

    #[test]
    fn inputs_untouched_and_output_stable() {
        let (catalog, log) = fixtures();
        let log_before = log.clone();
        let w = window("2025-01-01", "2025-01-05");
        let first = reconcile(&catalog, &log, &w);
        let second = reconcile(&catalog, &log, &w);
        assert_eq!(first, second);
        assert_eq!(log, log_before);
    }

    #[test]
    fn run_stamps_meta_and_summary() {
        let (catalog, log) = fixtures();
        let config = ReconConfig::from_toml(
            r#"
name = "Engine test"
[inputs]
catalog = "cauldrons.json"
log = "anomalies.json"
"#,
        )
        .unwrap();
        let input = ReconInput { catalog, log };
        let w = window("2025-01-01", "2025-01-05");
        let result = run(&config, &input, &w);

        assert_eq!(result.meta.config_name, "Engine test");
        assert_eq!(result.meta.window, w);
        assert_eq!(result.summary.units, 3);
        assert_eq!(result.summary.anomalies, 5);
        assert_eq!(result.summary.mismatches, 1);
        assert_eq!(result.summary.matches, 2);
        assert_eq!(result.diagnostics.len(), 1);
    }
}
