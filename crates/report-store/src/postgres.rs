//! PostgreSQL report store using sqlx.

use crate::{NewReport, ReportStore, Station};
use async_trait::async_trait;
use chart_common::{
    AnalysisProducts, AnalysisTime, LevelTag, StationReport, StoreError, TimeRange,
};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

/// Database schema. Geometry is stored as a JSON array of [lon, lat] pairs
/// so the store runs on plain PostgreSQL.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS stations (
    station_id TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    longitude DOUBLE PRECISION NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    elevation DOUBLE PRECISION,
    country TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS reports (
    id UUID PRIMARY KEY,
    station_id TEXT NOT NULL REFERENCES stations(station_id) ON DELETE CASCADE,
    observation_time TIMESTAMPTZ NOT NULL,
    level TEXT NOT NULL,
    sea_level_pressure DOUBLE PRECISION,
    height DOUBLE PRECISION,
    temperature DOUBLE PRECISION,
    dew_point DOUBLE PRECISION,
    wind_direction INTEGER,
    wind_speed DOUBLE PRECISION,
    UNIQUE (station_id, observation_time, level)
);

CREATE INDEX IF NOT EXISTS idx_reports_level_time
    ON reports (level, observation_time);

CREATE TABLE IF NOT EXISTS isopleths (
    id UUID PRIMARY KEY,
    collection TEXT NOT NULL,
    level TEXT NOT NULL,
    observation_time TIMESTAMPTZ NOT NULL,
    value DOUBLE PRECISION NOT NULL,
    geometry JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_isopleths_level_time
    ON isopleths (level, observation_time);

CREATE TABLE IF NOT EXISTS centers (
    id UUID PRIMARY KEY,
    level TEXT NOT NULL,
    observation_time TIMESTAMPTZ NOT NULL,
    center_type TEXT NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    value DOUBLE PRECISION NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_centers_level_time
    ON centers (level, observation_time)
"#;

/// Collection tags in the isopleths table.
const COLLECTION_PRIMARY: &str = "primary";
const COLLECTION_ISOTHERM: &str = "isotherm";

/// PostgreSQL-backed [`ReportStore`].
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    /// Create a store from a database URL.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Connection failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StoreError::Database(format!("Migration failed: {}", e)))?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct StationRow {
    station_id: String,
    name: String,
    longitude: f64,
    latitude: f64,
    elevation: Option<f64>,
    country: String,
}

impl From<StationRow> for Station {
    fn from(row: StationRow) -> Self {
        Station {
            station_id: row.station_id,
            name: row.name,
            longitude: row.longitude,
            latitude: row.latitude,
            elevation: row.elevation,
            country: row.country,
        }
    }
}

#[derive(Debug, FromRow)]
struct ReportRow {
    station_id: String,
    longitude: f64,
    latitude: f64,
    observation_time: DateTime<Utc>,
    primary_value: Option<f64>,
    temperature: Option<f64>,
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn station(&self, station_id: &str) -> Result<Option<Station>, StoreError> {
        let row = sqlx::query_as::<_, StationRow>(
            "SELECT station_id, name, longitude, latitude, elevation, country \
             FROM stations WHERE station_id = $1",
        )
        .bind(station_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Station lookup failed: {}", e)))?;

        Ok(row.map(Station::from))
    }

    async fn upsert_station(&self, station: &Station) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO stations (station_id, name, longitude, latitude, elevation, country)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (station_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                longitude = EXCLUDED.longitude,
                latitude = EXCLUDED.latitude,
                elevation = EXCLUDED.elevation,
                country = EXCLUDED.country
            "#,
        )
        .bind(&station.station_id)
        .bind(&station.name)
        .bind(station.longitude)
        .bind(station.latitude)
        .bind(station.elevation)
        .bind(&station.country)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Station upsert failed: {}", e)))?;

        Ok(())
    }

    async fn insert_report(
        &self,
        level: LevelTag,
        report: &NewReport,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO reports (
                id, station_id, observation_time, level,
                sea_level_pressure, height, temperature, dew_point,
                wind_direction, wind_speed
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (station_id, observation_time, level) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&report.station_id)
        .bind(report.observed_at)
        .bind(level.as_str())
        .bind(report.sea_level_pressure)
        .bind(report.height)
        .bind(report.temperature)
        .bind(report.dew_point)
        .bind(report.wind_direction)
        .bind(report.wind_speed)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Report insert failed: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn fetch_reports(
        &self,
        level: LevelTag,
        window: TimeRange,
    ) -> Result<Vec<StationReport>, StoreError> {
        let value_column = if level.is_surface() {
            "r.sea_level_pressure"
        } else {
            "r.height"
        };
        let sql = format!(
            "SELECT r.station_id, s.longitude, s.latitude, r.observation_time, \
             {} AS primary_value, r.temperature \
             FROM reports r \
             JOIN stations s ON s.station_id = r.station_id \
             WHERE r.level = $1 AND r.observation_time BETWEEN $2 AND $3 \
             ORDER BY r.observation_time, r.station_id",
            value_column
        );

        let rows = sqlx::query_as::<_, ReportRow>(&sql)
            .bind(level.as_str())
            .bind(window.start)
            .bind(window.end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Report query failed: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|r| StationReport {
                station_id: r.station_id,
                longitude: r.longitude,
                latitude: r.latitude,
                observed_at: r.observation_time,
                primary_value: r.primary_value,
                temperature: r.temperature,
            })
            .collect())
    }

    async fn replace_analysis(
        &self,
        level: LevelTag,
        observation_time: AnalysisTime,
        products: &AnalysisProducts,
    ) -> Result<(), StoreError> {
        let ts = observation_time.with_timezone(&Utc);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(format!("Transaction begin failed: {}", e)))?;

        sqlx::query("DELETE FROM isopleths WHERE level = $1 AND observation_time = $2")
            .bind(level.as_str())
            .bind(ts)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("Isopleth delete failed: {}", e)))?;

        sqlx::query("DELETE FROM centers WHERE level = $1 AND observation_time = $2")
            .bind(level.as_str())
            .bind(ts)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("Center delete failed: {}", e)))?;

        for (collection, records) in [
            (COLLECTION_PRIMARY, &products.primary_contours),
            (COLLECTION_ISOTHERM, &products.isotherms),
        ] {
            for record in records {
                let geometry = serde_json::to_value(&record.path.points)
                    .map_err(|e| StoreError::Corrupt(format!("Geometry encoding: {}", e)))?;

                sqlx::query(
                    r#"
                    INSERT INTO isopleths (
                        id, collection, level, observation_time, value, geometry
                    ) VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(collection)
                .bind(level.as_str())
                .bind(ts)
                .bind(record.value)
                .bind(geometry)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Database(format!("Isopleth insert failed: {}", e)))?;
            }
        }

        for record in &products.centers {
            sqlx::query(
                r#"
                INSERT INTO centers (
                    id, level, observation_time, center_type,
                    longitude, latitude, value
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(level.as_str())
            .bind(ts)
            .bind(record.center.kind.as_str())
            .bind(record.center.longitude)
            .bind(record.center.latitude)
            .bind(record.center.value)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("Center insert failed: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            level = %level,
            observation_time = %ts,
            isopleths = products.primary_contours.len() + products.isotherms.len(),
            centers = products.centers.len(),
            "Replaced analysis products"
        );

        Ok(())
    }
}
