//! Diagnostic channel for pipeline fallbacks
//!
//! Whenever a stage of the pipeline gives up on the reasoning service and
//! substitutes its deterministic fallback, it reports a `DiagnosticEvent`
//! through a `DiagnosticSink`. How the event is shown (log line, console
//! warning, UI banner) is up to whoever installed the sink.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Service unreachable, transport fault, or empty payload
    Service,
    /// A response arrived but held no usable JSON object
    Parse,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Parse => "parse",
        }
    }
}

/// Which pipeline stage fell back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ContextInference,
    FactorScoring,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContextInference => "context_inference",
            Self::FactorScoring => "factor_scoring",
        }
    }
}

/// A single advisory event emitted on fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub kind: DiagnosticKind,
    pub stage: Stage,
    pub message: String,
}

impl DiagnosticEvent {
    pub fn new(kind: DiagnosticKind, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {}",
            self.stage.as_str(),
            self.kind.as_str(),
            self.message
        )
    }
}

/// Receiver for diagnostic events
///
/// Implementations must be cheap and must not fail; a sink that cannot
/// deliver an event drops it.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, event: &DiagnosticEvent);
}

/// Logs every event at `warn`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, event: &DiagnosticEvent) {
        tracing::warn!(
            kind = event.kind.as_str(),
            stage = event.stage.as_str(),
            "{}",
            event.message
        );
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _event: &DiagnosticEvent) {}
}

/// Records events in memory (tests, batch callers)
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, event: &DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
