//! In-memory report store for tests and dev mode.

use crate::{NewReport, ReportStore, Station};
use async_trait::async_trait;
use chart_common::{
    AnalysisProducts, AnalysisTime, LevelTag, StationReport, StoreError, TimeRange,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Non-persistent [`ReportStore`].
///
/// Carries a fetch-call counter and an injectable failure count so dev mode
/// and orchestrator tests can observe the retry behavior.
#[derive(Default)]
pub struct MemoryReportStore {
    stations: RwLock<HashMap<String, Station>>,
    reports: RwLock<Vec<(LevelTag, NewReport)>>,
    products: RwLock<HashMap<(LevelTag, DateTime<Utc>), AnalysisProducts>>,
    fetch_calls: AtomicUsize,
    fetch_failures: AtomicUsize,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetch_reports calls served so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Make the next `n` fetches fail with a transient error.
    pub fn fail_next_fetches(&self, n: usize) {
        self.fetch_failures.store(n, Ordering::SeqCst);
    }

    /// Stored products for a run key, if any.
    pub fn stored_products(
        &self,
        level: LevelTag,
        observation_time: AnalysisTime,
    ) -> Option<AnalysisProducts> {
        let key = (level, observation_time.with_timezone(&Utc));
        self.products
            .read()
            .ok()
            .and_then(|m| m.get(&key).cloned())
    }

    fn lock_poisoned() -> StoreError {
        StoreError::Unavailable("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn station(&self, station_id: &str) -> Result<Option<Station>, StoreError> {
        let stations = self.stations.read().map_err(|_| Self::lock_poisoned())?;
        Ok(stations.get(station_id).cloned())
    }

    async fn upsert_station(&self, station: &Station) -> Result<(), StoreError> {
        let mut stations = self.stations.write().map_err(|_| Self::lock_poisoned())?;
        stations.insert(station.station_id.clone(), station.clone());
        Ok(())
    }

    async fn insert_report(
        &self,
        level: LevelTag,
        report: &NewReport,
    ) -> Result<bool, StoreError> {
        let mut reports = self.reports.write().map_err(|_| Self::lock_poisoned())?;
        let exists = reports.iter().any(|(l, r)| {
            *l == level
                && r.station_id == report.station_id
                && r.observed_at == report.observed_at
        });
        if exists {
            return Ok(false);
        }
        reports.push((level, report.clone()));
        Ok(true)
    }

    async fn fetch_reports(
        &self,
        level: LevelTag,
        window: TimeRange,
    ) -> Result<Vec<StationReport>, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let failures = self.fetch_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.fetch_failures.store(failures - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }

        let stations = self.stations.read().map_err(|_| Self::lock_poisoned())?;
        let reports = self.reports.read().map_err(|_| Self::lock_poisoned())?;

        let mut out = Vec::new();
        for (report_level, report) in reports.iter() {
            if *report_level != level || !window.contains(&report.observed_at) {
                continue;
            }
            let Some(station) = stations.get(&report.station_id) else {
                continue;
            };
            let primary_value = if level.is_surface() {
                report.sea_level_pressure
            } else {
                report.height
            };
            out.push(StationReport {
                station_id: report.station_id.clone(),
                longitude: station.longitude,
                latitude: station.latitude,
                observed_at: report.observed_at,
                primary_value,
                temperature: report.temperature,
            });
        }
        Ok(out)
    }

    async fn replace_analysis(
        &self,
        level: LevelTag,
        observation_time: AnalysisTime,
        products: &AnalysisProducts,
    ) -> Result<(), StoreError> {
        let key = (level, observation_time.with_timezone(&Utc));
        let mut stored = self.products.write().map_err(|_| Self::lock_poisoned())?;
        stored.insert(key, products.clone());
        Ok(())
    }
}
