//! Analysis run orchestration.
//!
//! One run analyzes a single `(level, observation time)` pair:
//! `ResolveTime → FetchObservations → Validate → DetectCenters →
//! ComputeLevels → Interpolate → TraceContours → SmoothPaths → Persist`.
//! The machine is explicit: each state carries the data the next one needs,
//! and the empty-fetch re-entry is a counted transition, not a loop. Any
//! terminal failure is returned as a [`ChartError`] value.

use crate::centers::detect_centers;
use crate::config;
use crate::contour::{trace_iso_lines, LevelPaths};
use crate::diagnostics::{DiagnosticsEvent, DiagnosticsSink};
use crate::interpolate::interpolate_field;
use crate::levels::contour_levels;
use crate::spline::smooth_path_default;
use crate::validate::validate_observations_default;
use chart_common::{
    time, AnalysisProducts, AnalysisTime, Center, CenterRecord, ChartError, ChartResult,
    ContourRecord, LevelTag, ScalarGrid, StationReport, TimeRange, ValidatedSample, VariableKind,
};
use report_store::ReportStore;
use std::sync::Arc;
use std::time::Duration;

/// Sequences one analysis run per request and persists its products.
pub struct AnalysisOrchestrator {
    store: Arc<dyn ReportStore>,
}

/// States of one run; each carries what downstream states consume.
enum RunState {
    ResolveTime,
    FetchObservations {
        resolved: AnalysisTime,
        visit: u32,
    },
    Validate {
        resolved: AnalysisTime,
        reports: Vec<StationReport>,
    },
    DetectCenters {
        resolved: AnalysisTime,
        primary: Vec<ValidatedSample>,
        temperature: Vec<ValidatedSample>,
    },
    ComputeLevels {
        resolved: AnalysisTime,
        primary: Vec<ValidatedSample>,
        temperature: Vec<ValidatedSample>,
        centers: Vec<Center>,
    },
    Interpolate {
        resolved: AnalysisTime,
        primary: Vec<ValidatedSample>,
        temperature: Vec<ValidatedSample>,
        centers: Vec<Center>,
        primary_levels: Vec<f64>,
        temperature_levels: Vec<f64>,
    },
    TraceContours {
        resolved: AnalysisTime,
        centers: Vec<Center>,
        primary_levels: Vec<f64>,
        temperature_levels: Vec<f64>,
        primary_grid: ScalarGrid,
        temperature_grid: ScalarGrid,
    },
    SmoothPaths {
        resolved: AnalysisTime,
        centers: Vec<Center>,
        primary_traced: Vec<LevelPaths>,
        temperature_traced: Vec<LevelPaths>,
    },
    Persist {
        resolved: AnalysisTime,
        products: AnalysisProducts,
    },
    Done {
        products: AnalysisProducts,
    },
}

impl RunState {
    fn name(&self) -> &'static str {
        match self {
            RunState::ResolveTime => "resolve_time",
            RunState::FetchObservations { .. } => "fetch_observations",
            RunState::Validate { .. } => "validate",
            RunState::DetectCenters { .. } => "detect_centers",
            RunState::ComputeLevels { .. } => "compute_levels",
            RunState::Interpolate { .. } => "interpolate",
            RunState::TraceContours { .. } => "trace_contours",
            RunState::SmoothPaths { .. } => "smooth_paths",
            RunState::Persist { .. } => "persist",
            RunState::Done { .. } => "done",
        }
    }

    fn visit(&self) -> u32 {
        match self {
            RunState::FetchObservations { visit, .. } => *visit,
            _ => 1,
        }
    }
}

impl AnalysisOrchestrator {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// Run one analysis for `level`.
    ///
    /// `observation_time` is an optional ISO-8601 string; without it the
    /// current hour in the analysis zone is used. The optional sink receives
    /// structured progress events and never influences the run.
    pub async fn analyze(
        &self,
        level: LevelTag,
        observation_time: Option<&str>,
        mut sink: Option<&mut dyn DiagnosticsSink>,
    ) -> ChartResult<AnalysisProducts> {
        let primary_variable = level.primary_variable();
        let mut state = RunState::ResolveTime;

        loop {
            emit(
                &mut sink,
                DiagnosticsEvent::StateEntered {
                    state: state.name(),
                    visit: state.visit(),
                },
            );

            state = match state {
                RunState::ResolveTime => {
                    let resolved = time::resolve_observation_time(observation_time)?;
                    tracing::info!(level = %level, observation_time = %resolved, "Starting analysis run");
                    RunState::FetchObservations { resolved, visit: 1 }
                }

                RunState::FetchObservations { resolved, visit } => {
                    let window = TimeRange::around(resolved, config::FETCH_WINDOW_MINUTES);
                    let reports = self.fetch_with_retry(level, window).await?;
                    emit(
                        &mut sink,
                        DiagnosticsEvent::ObservationsFetched {
                            rows: reports.len(),
                        },
                    );

                    if reports.is_empty() {
                        if visit < 2 {
                            // allow a just-in-time fetch by a collaborator
                            // before giving up
                            tracing::warn!(level = %level, "No reports found, re-entering fetch");
                            RunState::FetchObservations {
                                resolved,
                                visit: visit + 1,
                            }
                        } else {
                            return Err(ChartError::NoObservationsFound(level));
                        }
                    } else {
                        tracing::info!(level = %level, rows = reports.len(), "Fetched reports");
                        RunState::Validate { resolved, reports }
                    }
                }

                RunState::Validate { resolved, reports } => {
                    let primary = self.validated(&reports, primary_variable, resolved, &mut sink);
                    let temperature =
                        self.validated(&reports, VariableKind::Temperature, resolved, &mut sink);

                    if primary.len() < config::MIN_VALIDATED_SAMPLES {
                        return Err(ChartError::InsufficientValidatedData {
                            variable: primary_variable,
                            count: primary.len(),
                        });
                    }
                    if temperature.len() < config::MIN_VALIDATED_SAMPLES {
                        return Err(ChartError::InsufficientValidatedData {
                            variable: VariableKind::Temperature,
                            count: temperature.len(),
                        });
                    }

                    RunState::DetectCenters {
                        resolved,
                        primary,
                        temperature,
                    }
                }

                RunState::DetectCenters {
                    resolved,
                    primary,
                    temperature,
                } => {
                    let centers = detect_centers(&primary, primary_variable);
                    emit(
                        &mut sink,
                        DiagnosticsEvent::CentersDetected {
                            count: centers.len(),
                        },
                    );
                    RunState::ComputeLevels {
                        resolved,
                        primary,
                        temperature,
                        centers,
                    }
                }

                RunState::ComputeLevels {
                    resolved,
                    primary,
                    temperature,
                    centers,
                } => {
                    let primary_values: Vec<f64> = primary.iter().map(|s| s.value).collect();
                    let temperature_values: Vec<f64> =
                        temperature.iter().map(|s| s.value).collect();
                    let primary_levels = contour_levels(&primary_values, primary_variable);
                    let temperature_levels =
                        contour_levels(&temperature_values, VariableKind::Temperature);

                    emit(
                        &mut sink,
                        DiagnosticsEvent::LevelsComputed {
                            variable: primary_variable,
                            count: primary_levels.len(),
                        },
                    );
                    emit(
                        &mut sink,
                        DiagnosticsEvent::LevelsComputed {
                            variable: VariableKind::Temperature,
                            count: temperature_levels.len(),
                        },
                    );

                    RunState::Interpolate {
                        resolved,
                        primary,
                        temperature,
                        centers,
                        primary_levels,
                        temperature_levels,
                    }
                }

                RunState::Interpolate {
                    resolved,
                    primary,
                    temperature,
                    centers,
                    primary_levels,
                    temperature_levels,
                } => {
                    let spec = level.domain();
                    let primary_grid = interpolate_field(&primary, primary_variable, spec)?;
                    emit(
                        &mut sink,
                        DiagnosticsEvent::FieldInterpolated {
                            variable: primary_variable,
                            nodes: primary_grid.values.len(),
                        },
                    );

                    let temperature_grid =
                        interpolate_field(&temperature, VariableKind::Temperature, spec)?;
                    emit(
                        &mut sink,
                        DiagnosticsEvent::FieldInterpolated {
                            variable: VariableKind::Temperature,
                            nodes: temperature_grid.values.len(),
                        },
                    );

                    RunState::TraceContours {
                        resolved,
                        centers,
                        primary_levels,
                        temperature_levels,
                        primary_grid,
                        temperature_grid,
                    }
                }

                RunState::TraceContours {
                    resolved,
                    centers,
                    primary_levels,
                    temperature_levels,
                    primary_grid,
                    temperature_grid,
                } => {
                    let primary_traced = trace_iso_lines(&primary_grid, &primary_levels)?;
                    emit(
                        &mut sink,
                        DiagnosticsEvent::ContoursTraced {
                            variable: primary_variable,
                            paths: primary_traced.iter().map(|l| l.paths.len()).sum(),
                        },
                    );

                    let temperature_traced =
                        trace_iso_lines(&temperature_grid, &temperature_levels)?;
                    emit(
                        &mut sink,
                        DiagnosticsEvent::ContoursTraced {
                            variable: VariableKind::Temperature,
                            paths: temperature_traced.iter().map(|l| l.paths.len()).sum(),
                        },
                    );

                    RunState::SmoothPaths {
                        resolved,
                        centers,
                        primary_traced,
                        temperature_traced,
                    }
                }

                RunState::SmoothPaths {
                    resolved,
                    centers,
                    primary_traced,
                    temperature_traced,
                } => {
                    let primary_contours =
                        smooth_collection(primary_traced, level, resolved);
                    emit(
                        &mut sink,
                        DiagnosticsEvent::PathsSmoothed {
                            variable: primary_variable,
                            paths: primary_contours.len(),
                        },
                    );

                    let isotherms = smooth_collection(temperature_traced, level, resolved);
                    emit(
                        &mut sink,
                        DiagnosticsEvent::PathsSmoothed {
                            variable: VariableKind::Temperature,
                            paths: isotherms.len(),
                        },
                    );

                    let products = AnalysisProducts {
                        observation_time: resolved,
                        centers: centers
                            .into_iter()
                            .map(|center| CenterRecord {
                                center,
                                level,
                                observation_time: resolved,
                            })
                            .collect(),
                        primary_contours,
                        isotherms,
                    };

                    RunState::Persist { resolved, products }
                }

                RunState::Persist { resolved, products } => {
                    self.store
                        .replace_analysis(level, resolved, &products)
                        .await
                        .map_err(ChartError::Storage)?;
                    emit(
                        &mut sink,
                        DiagnosticsEvent::ProductsPersisted {
                            isopleths: products.primary_contours.len() + products.isotherms.len(),
                            centers: products.centers.len(),
                        },
                    );
                    tracing::info!(
                        level = %level,
                        observation_time = %resolved,
                        contours = products.primary_contours.len(),
                        isotherms = products.isotherms.len(),
                        centers = products.centers.len(),
                        "Analysis run complete"
                    );
                    RunState::Done { products }
                }

                RunState::Done { products } => return Ok(products),
            };
        }
    }

    fn validated(
        &self,
        reports: &[StationReport],
        variable: VariableKind,
        resolved: AnalysisTime,
        sink: &mut Option<&mut dyn DiagnosticsSink>,
    ) -> Vec<ValidatedSample> {
        let observations: Vec<_> = reports.iter().map(|r| r.observation(variable)).collect();
        let validated = validate_observations_default(&observations, variable, resolved);
        emit(
            sink,
            DiagnosticsEvent::SamplesValidated {
                variable,
                validated: validated.len(),
                input: observations.len(),
            },
        );
        validated
    }

    /// Fetch with bounded retries and exponential backoff on transient
    /// store errors.
    async fn fetch_with_retry(
        &self,
        level: LevelTag,
        window: TimeRange,
    ) -> ChartResult<Vec<StationReport>> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.store.fetch_reports(level, window).await {
                Ok(rows) => return Ok(rows),
                Err(e) if e.is_transient() && attempt < config::FETCH_MAX_ATTEMPTS => {
                    let delay = config::FETCH_BACKOFF_BASE_MS * 2u64.pow(attempt - 1);
                    tracing::warn!(
                        level = %level,
                        attempt,
                        delay_ms = delay,
                        error = %e,
                        "Transient store error, retrying fetch"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(ChartError::Storage(e)),
            }
        }
    }
}

/// Smooth every traced path of a variable into contour records.
fn smooth_collection(
    traced: Vec<LevelPaths>,
    level: LevelTag,
    observation_time: AnalysisTime,
) -> Vec<ContourRecord> {
    let mut records = Vec::new();
    for level_paths in traced {
        for path in level_paths.paths {
            if path.len() < 2 {
                continue;
            }
            records.push(ContourRecord {
                value: level_paths.level,
                level,
                observation_time,
                path: smooth_path_default(&path),
            });
        }
    }
    records
}

fn emit(sink: &mut Option<&mut dyn DiagnosticsSink>, event: DiagnosticsEvent) {
    if let Some(s) = sink.as_deref_mut() {
        s.record(event);
    }
}
