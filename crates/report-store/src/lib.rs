//! Record store for station reports and derived analysis products.
//!
//! The analysis engine only sees the [`ReportStore`] trait: a query for
//! reports in a level/time window and a transactional wholesale replace of
//! one run's derived contours and centers. [`MemoryReportStore`] backs tests
//! and dev mode; [`PgReportStore`] is the PostgreSQL implementation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chart_common::{
    AnalysisProducts, AnalysisTime, LevelTag, StationReport, StoreError, TimeRange,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryReportStore;
pub use postgres::PgReportStore;

/// A weather station known to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: String,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: Option<f64>,
    pub country: String,
}

/// A decoded report to be inserted, keyed by `(station, observed_at, level)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub station_id: String,
    pub observed_at: DateTime<Utc>,
    pub sea_level_pressure: Option<f64>,
    pub height: Option<f64>,
    pub temperature: Option<f64>,
    pub dew_point: Option<f64>,
    pub wind_direction: Option<i32>,
    pub wind_speed: Option<f64>,
}

/// Persistent store consumed by the analysis engine and the ingest path.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Look up a station by id.
    async fn station(&self, station_id: &str) -> Result<Option<Station>, StoreError>;

    /// Register or update a station.
    async fn upsert_station(&self, station: &Station) -> Result<(), StoreError>;

    /// Insert a decoded report; returns false if the key already exists.
    async fn insert_report(&self, level: LevelTag, report: &NewReport)
        -> Result<bool, StoreError>;

    /// All reports at `level` with `observed_at` inside `window`, joined to
    /// station coordinates.
    async fn fetch_reports(
        &self,
        level: LevelTag,
        window: TimeRange,
    ) -> Result<Vec<StationReport>, StoreError>;

    /// Replace every stored contour and center for `(level, observation_time)`
    /// with the given products, atomically.
    async fn replace_analysis(
        &self,
        level: LevelTag,
        observation_time: AnalysisTime,
        products: &AnalysisProducts,
    ) -> Result<(), StoreError>;
}
