//! End-to-end orchestrator tests against the in-memory store.

use analysis_engine::diagnostics::EventLog;
use analysis_engine::AnalysisOrchestrator;
use chart_common::{time::parse_iso8601, ChartError, LevelTag, VariableKind};
use chrono::{TimeZone, Utc};
use report_store::{MemoryReportStore, NewReport, ReportStore, Station};
use std::sync::Arc;

const RUN_TIME: &str = "2025-06-15T12:00:00Z";

fn station(id: &str, lon: f64, lat: f64) -> Station {
    Station {
        station_id: id.to_string(),
        name: format!("Station {}", id),
        longitude: lon,
        latitude: lat,
        elevation: Some(1300.0),
        country: "NP".to_string(),
    }
}

fn surface_report(id: &str, pressure: f64, temperature: f64) -> NewReport {
    NewReport {
        station_id: id.to_string(),
        observed_at: Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap(),
        sea_level_pressure: Some(pressure),
        height: None,
        temperature: Some(temperature),
        dew_point: Some(temperature - 4.0),
        wind_direction: Some(270),
        wind_speed: Some(8.0),
    }
}

/// A realistic spread of surface stations across the analysis domain.
async fn seeded_store() -> MemoryReportStore {
    let store = MemoryReportStore::new();
    let rows = [
        ("44477", 85.3, 27.7, 1006.2, 24.5),
        ("42182", 77.2, 28.6, 1004.8, 31.0),
        ("41923", 89.1, 26.1, 1008.9, 27.2),
        ("42369", 80.2, 26.8, 1005.5, 29.8),
        ("42809", 88.4, 22.6, 1010.3, 28.9),
        ("43003", 72.8, 19.1, 1011.7, 27.5),
        ("42971", 82.5, 18.9, 1012.4, 26.1),
        ("48327", 98.6, 16.8, 1009.6, 25.4),
    ];
    for (id, lon, lat, pressure, temperature) in rows {
        store.upsert_station(&station(id, lon, lat)).await.unwrap();
        store
            .insert_report(LevelTag::Surface, &surface_report(id, pressure, temperature))
            .await
            .unwrap();
    }
    store
}

#[test]
fn analysis_run_produces_all_three_collections() {
    tokio_test::block_on(async {
        let store = Arc::new(seeded_store().await);
        let orchestrator = AnalysisOrchestrator::new(store.clone());

        let mut log = EventLog::new();
        let products = orchestrator
            .analyze(LevelTag::Surface, Some(RUN_TIME), Some(&mut log))
            .await
            .expect("analysis should succeed");

        assert!(!products.primary_contours.is_empty());
        assert!(!products.isotherms.is_empty());

        let resolved = parse_iso8601(RUN_TIME).unwrap();
        assert_eq!(products.observation_time, resolved);
        for record in products
            .primary_contours
            .iter()
            .chain(products.isotherms.iter())
        {
            assert_eq!(record.level, LevelTag::Surface);
            assert_eq!(record.observation_time, resolved);
            // smoothed to the fixed count, or passed through when too short
            assert!(record.path.len() == 200 || record.path.len() < 4);
            assert!(record.path.len() >= 2);
        }

        let states = log.states();
        assert_eq!(states.first(), Some(&"resolve_time"));
        assert!(states.contains(&"fetch_observations"));
        assert!(states.contains(&"detect_centers"));
        assert!(states.contains(&"persist"));
        assert_eq!(states.last(), Some(&"done"));
    });
}

#[test]
fn analysis_is_deterministic() {
    tokio_test::block_on(async {
        let store = Arc::new(seeded_store().await);
        let orchestrator = AnalysisOrchestrator::new(store);

        let first = orchestrator
            .analyze(LevelTag::Surface, Some(RUN_TIME), None)
            .await
            .unwrap();
        let second = orchestrator
            .analyze(LevelTag::Surface, Some(RUN_TIME), None)
            .await
            .unwrap();

        assert_eq!(first.centers.len(), second.centers.len());
        assert_eq!(first.primary_contours.len(), second.primary_contours.len());
        assert_eq!(first.isotherms.len(), second.isotherms.len());
        assert_eq!(first, second);
    });
}

#[test]
fn persisted_products_match_returned() {
    tokio_test::block_on(async {
        let store = Arc::new(seeded_store().await);
        let orchestrator = AnalysisOrchestrator::new(store.clone());

        let products = orchestrator
            .analyze(LevelTag::Surface, Some(RUN_TIME), None)
            .await
            .unwrap();

        let resolved = parse_iso8601(RUN_TIME).unwrap();
        let stored = store
            .stored_products(LevelTag::Surface, resolved)
            .expect("products persisted");
        assert_eq!(stored, products);
    });
}

#[test]
fn rerun_replaces_wholesale() {
    tokio_test::block_on(async {
        let store = Arc::new(seeded_store().await);
        let orchestrator = AnalysisOrchestrator::new(store.clone());

        orchestrator
            .analyze(LevelTag::Surface, Some(RUN_TIME), None)
            .await
            .unwrap();
        let second = orchestrator
            .analyze(LevelTag::Surface, Some(RUN_TIME), None)
            .await
            .unwrap();

        let resolved = parse_iso8601(RUN_TIME).unwrap();
        let stored = store.stored_products(LevelTag::Surface, resolved).unwrap();
        // no accumulation across runs
        assert_eq!(stored.primary_contours.len(), second.primary_contours.len());
        assert_eq!(stored.centers.len(), second.centers.len());
    });
}

#[test]
fn insufficient_samples_abort_the_run() {
    tokio_test::block_on(async {
        let store = MemoryReportStore::new();
        for (id, lon, lat, pressure, temperature) in
            [("S1", 85.0, 27.0, 1010.0, 24.0), ("S2", 86.0, 27.5, 1008.0, 25.0)]
        {
            store.upsert_station(&station(id, lon, lat)).await.unwrap();
            store
                .insert_report(LevelTag::Surface, &surface_report(id, pressure, temperature))
                .await
                .unwrap();
        }

        let orchestrator = AnalysisOrchestrator::new(Arc::new(store));
        let err = orchestrator
            .analyze(LevelTag::Surface, Some(RUN_TIME), None)
            .await
            .unwrap_err();

        match err {
            ChartError::InsufficientValidatedData { variable, count } => {
                assert_eq!(variable, VariableKind::Pressure);
                assert_eq!(count, 2);
            }
            other => panic!("expected InsufficientValidatedData, got {:?}", other),
        }
    });
}

#[test]
fn empty_store_reenters_fetch_once_then_fails() {
    tokio_test::block_on(async {
        let store = Arc::new(MemoryReportStore::new());
        let orchestrator = AnalysisOrchestrator::new(store.clone());

        let mut log = EventLog::new();
        let err = orchestrator
            .analyze(LevelTag::Surface, Some(RUN_TIME), Some(&mut log))
            .await
            .unwrap_err();

        assert!(matches!(err, ChartError::NoObservationsFound(LevelTag::Surface)));
        assert_eq!(store.fetch_calls(), 2);

        let fetch_visits: Vec<&str> = log
            .states()
            .into_iter()
            .filter(|s| *s == "fetch_observations")
            .collect();
        assert_eq!(fetch_visits.len(), 2);
    });
}

#[test]
fn transient_store_errors_are_retried() {
    tokio_test::block_on(async {
        let store = Arc::new(seeded_store().await);
        store.fail_next_fetches(2);
        let orchestrator = AnalysisOrchestrator::new(store.clone());

        let products = orchestrator
            .analyze(LevelTag::Surface, Some(RUN_TIME), None)
            .await
            .expect("retries should recover");
        assert!(!products.primary_contours.is_empty());
        assert_eq!(store.fetch_calls(), 3);
    });
}

#[test]
fn exhausted_retries_surface_the_store_error() {
    tokio_test::block_on(async {
        let store = Arc::new(seeded_store().await);
        store.fail_next_fetches(3);
        let orchestrator = AnalysisOrchestrator::new(store.clone());

        let err = orchestrator
            .analyze(LevelTag::Surface, Some(RUN_TIME), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChartError::Storage(_)));
        assert_eq!(store.fetch_calls(), 3);
    });
}

#[test]
fn malformed_time_aborts_before_fetch() {
    tokio_test::block_on(async {
        let store = Arc::new(MemoryReportStore::new());
        let orchestrator = AnalysisOrchestrator::new(store.clone());

        let err = orchestrator
            .analyze(LevelTag::Surface, Some("next tuesday"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChartError::InvalidTimeFormat(_)));
        assert_eq!(store.fetch_calls(), 0);
    });
}
