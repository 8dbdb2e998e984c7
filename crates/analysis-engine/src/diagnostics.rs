//! Structured diagnostics for analysis runs.
//!
//! The orchestrator reports progress into an optional sink instead of
//! producing side effects (debug images, global logs). Sinks observe; they
//! never influence control flow.

use chart_common::VariableKind;
use serde::Serialize;

/// One structured event emitted during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticsEvent {
    StateEntered {
        state: &'static str,
        visit: u32,
    },
    ObservationsFetched {
        rows: usize,
    },
    SamplesValidated {
        variable: VariableKind,
        validated: usize,
        input: usize,
    },
    CentersDetected {
        count: usize,
    },
    LevelsComputed {
        variable: VariableKind,
        count: usize,
    },
    FieldInterpolated {
        variable: VariableKind,
        nodes: usize,
    },
    ContoursTraced {
        variable: VariableKind,
        paths: usize,
    },
    PathsSmoothed {
        variable: VariableKind,
        paths: usize,
    },
    ProductsPersisted {
        isopleths: usize,
        centers: usize,
    },
}

/// Receives diagnostics events during a run.
pub trait DiagnosticsSink: Send {
    fn record(&mut self, event: DiagnosticsEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&mut self, _event: DiagnosticsEvent) {}
}

/// Collects events into a list, for debug responses and tests.
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<DiagnosticsEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// States entered, in order.
    pub fn states(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DiagnosticsEvent::StateEntered { state, .. } => Some(*state),
                _ => None,
            })
            .collect()
    }
}

impl DiagnosticsSink for EventLog {
    fn record(&mut self, event: DiagnosticsEvent) {
        self.events.push(event);
    }
}
