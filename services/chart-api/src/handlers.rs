//! HTTP handlers.

use crate::geojson;
use crate::state::AppState;
use analysis_engine::diagnostics::{DiagnosticsSink, EventLog};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chart_common::{ChartError, LevelTag, StoreError};
use chrono::{DateTime, Utc};
use report_store::{NewReport, Station};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use synop_codec::{decode_synop, decode_ttaa, DecodeError};

pub async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    /// ISO-8601 observation time; defaults to the current analysis hour
    pub time: Option<String>,
    /// Attach structured diagnostics events to the response
    #[serde(default)]
    pub debug: bool,
}

/// Run one analysis for the requested level and return GeoJSON collections.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Path(level): Path<String>,
    Query(query): Query<AnalyzeQuery>,
) -> Response {
    let level = match level.parse::<LevelTag>() {
        Ok(level) => level,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let mut log = EventLog::new();
    let sink: Option<&mut dyn DiagnosticsSink> = if query.debug { Some(&mut log) } else { None };

    let products = match state
        .orchestrator
        .analyze(level, query.time.as_deref(), sink)
        .await
    {
        Ok(products) => products,
        Err(e) => return chart_error_response(e),
    };

    let value_key = if level.is_surface() { "pressure" } else { "height" };
    let primary_key = if level.is_surface() {
        "isobars"
    } else {
        "height_contours"
    };

    let mut body = json!({
        "level": level.as_str(),
        "observation_time": products.observation_time.to_rfc3339(),
        "isotherms": geojson::contour_collection(&products.isotherms, "temperature"),
        "centers": geojson::center_collection(&products.centers, value_key),
    });
    if let Some(map) = body.as_object_mut() {
        map.insert(
            primary_key.to_string(),
            geojson::contour_collection(&products.primary_contours, value_key),
        );
        if query.debug {
            map.insert(
                "diagnostics".to_string(),
                serde_json::to_value(&log.events).unwrap_or_default(),
            );
        }
    }

    (StatusCode::OK, Json(body)).into_response()
}

/// Register or update a station.
pub async fn upsert_station(
    State(state): State<Arc<AppState>>,
    Json(station): Json<Station>,
) -> Response {
    match state.store.upsert_station(&station).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Err(e) => store_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SynopIngest {
    pub observed_at: DateTime<Utc>,
    pub report: String,
}

/// Decode one SYNOP report and store it as a surface observation.
pub async fn ingest_synop(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SynopIngest>,
) -> Response {
    let decoded = match decode_synop(&payload.report) {
        Ok(decoded) => decoded,
        Err(e) => return decode_error_response(e),
    };

    let station = match state.store.station(&decoded.station_id).await {
        Ok(Some(station)) => station,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("Unknown station: {}", decoded.station_id),
            )
        }
        Err(e) => return store_error_response(e),
    };

    let report = NewReport {
        station_id: station.station_id.clone(),
        observed_at: payload.observed_at,
        sea_level_pressure: decoded.sea_level_pressure,
        height: None,
        temperature: decoded.temperature,
        dew_point: decoded.dew_point,
        wind_direction: decoded.wind_direction,
        wind_speed: decoded.wind_speed,
    };

    match state.store.insert_report(LevelTag::Surface, &report).await {
        Ok(created) => (
            StatusCode::OK,
            Json(json!({ "station": station.station_id, "created": created })),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

/// Decode one TTAA bulletin and store a report per mandatory level.
pub async fn ingest_ttaa(State(state): State<Arc<AppState>>, body: String) -> Response {
    let decoded = match decode_ttaa(&body) {
        Ok(decoded) => decoded,
        Err(e) => return decode_error_response(e),
    };

    let station = match state.store.station(&decoded.station_id).await {
        Ok(Some(station)) => station,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("Unknown station: {}", decoded.station_id),
            )
        }
        Err(e) => return store_error_response(e),
    };

    let mut created = 0usize;
    for level in &decoded.levels {
        let report = NewReport {
            station_id: station.station_id.clone(),
            observed_at: decoded.observation_time,
            sea_level_pressure: None,
            height: level.height,
            temperature: level.temperature,
            dew_point: level.dew_point,
            wind_direction: level.wind_direction,
            wind_speed: level.wind_speed,
        };
        match state.store.insert_report(level.level, &report).await {
            Ok(true) => created += 1,
            Ok(false) => {}
            Err(e) => return store_error_response(e),
        }
    }

    (
        StatusCode::OK,
        Json(json!({
            "station": station.station_id,
            "levels": decoded.levels.len(),
            "created": created,
        })),
    )
        .into_response()
}

fn chart_error_response(error: ChartError) -> Response {
    let status = StatusCode::from_u16(error.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    tracing::warn!(status = %status, error = %error, "Analysis request failed");
    error_response(status, error.to_string())
}

fn store_error_response(error: StoreError) -> Response {
    tracing::error!(error = %error, "Store operation failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}

fn decode_error_response(error: DecodeError) -> Response {
    error_response(StatusCode::BAD_REQUEST, error.to_string())
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_engine::AnalysisOrchestrator;
    use report_store::{MemoryReportStore, ReportStore};

    fn dev_state() -> Arc<AppState> {
        let store: Arc<dyn ReportStore> = Arc::new(MemoryReportStore::new());
        Arc::new(AppState {
            store: store.clone(),
            orchestrator: AnalysisOrchestrator::new(store),
        })
    }

    fn kathmandu() -> Station {
        Station {
            station_id: "44477".to_string(),
            name: "Kathmandu Airport".to_string(),
            longitude: 85.36,
            latitude: 27.7,
            elevation: Some(1337.0),
            country: "NP".to_string(),
        }
    }

    #[test]
    fn test_unknown_level_is_bad_request() {
        tokio_test::block_on(async {
            let response = analyze(
                State(dev_state()),
                Path("900HPA".to_string()),
                Query(AnalyzeQuery {
                    time: None,
                    debug: false,
                }),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        });
    }

    #[test]
    fn test_empty_store_analysis_is_not_found() {
        tokio_test::block_on(async {
            let response = analyze(
                State(dev_state()),
                Path("SURFACE".to_string()),
                Query(AnalyzeQuery {
                    time: Some("2025-06-15T12:00:00Z".to_string()),
                    debug: false,
                }),
            )
            .await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        });
    }

    #[test]
    fn test_malformed_time_is_bad_request() {
        tokio_test::block_on(async {
            let response = analyze(
                State(dev_state()),
                Path("SURFACE".to_string()),
                Query(AnalyzeQuery {
                    time: Some("noonish".to_string()),
                    debug: false,
                }),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        });
    }

    #[test]
    fn test_synop_ingest_roundtrip() {
        tokio_test::block_on(async {
            let state = dev_state();

            let response = upsert_station(State(state.clone()), Json(kathmandu())).await;
            assert_eq!(response.status(), StatusCode::OK);

            let payload = SynopIngest {
                observed_at: "2025-06-15T12:00:00Z".parse().unwrap(),
                report: "AAXX 15121 44477 11458 61207 10172 21015 40131=".to_string(),
            };
            let response = ingest_synop(State(state.clone()), Json(payload)).await;
            assert_eq!(response.status(), StatusCode::OK);

            // duplicate key is reported, not an error
            let payload = SynopIngest {
                observed_at: "2025-06-15T12:00:00Z".parse().unwrap(),
                report: "AAXX 15121 44477 11458 61207 10172 21015 40131=".to_string(),
            };
            let response = ingest_synop(State(state), Json(payload)).await;
            assert_eq!(response.status(), StatusCode::OK);
        });
    }

    #[test]
    fn test_synop_ingest_unknown_station() {
        tokio_test::block_on(async {
            let payload = SynopIngest {
                observed_at: "2025-06-15T12:00:00Z".parse().unwrap(),
                report: "AAXX 15121 99999 11458 61207 10172=".to_string(),
            };
            let response = ingest_synop(State(dev_state()), Json(payload)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        });
    }

    #[test]
    fn test_ttaa_ingest_creates_level_reports() {
        tokio_test::block_on(async {
            let state = dev_state();
            upsert_station(State(state.clone()), Json(kathmandu())).await;

            let bulletin = "202506151200 TTAA 61121 44477 85462 05450 24015 \
                50570 15721 26035 31313="
                .to_string();
            let response = ingest_ttaa(State(state), bulletin).await;
            assert_eq!(response.status(), StatusCode::OK);
        });
    }
}

