//! Progress events emitted while a pipeline runs.
//!
//! Events are optional: a pipeline without a sender runs identically. When a
//! sender is attached, events are delivered in the order things happen.
//! Sending never waits: an event that finds the channel full, or the
//! receiver gone, is dropped and the run carries on.

use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// One of the four pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Structural analysis of the input files.
    Analyze,
    /// Step-by-step migration planning.
    Plan,
    /// Per-step code generation.
    Execute,
    /// Per-file verification of the migrated code.
    Verify,
}

impl Phase {
    /// All phases, in execution order.
    pub const ALL: [Self; 4] = [Self::Analyze, Self::Plan, Self::Execute, Self::Verify];

    /// Returns the 1-based position of the phase.
    #[must_use]
    pub const fn number(self) -> usize {
        match self {
            Self::Analyze => 1,
            Self::Plan => 2,
            Self::Execute => 3,
            Self::Verify => 4,
        }
    }

    /// Returns a human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Analyze => "Analyzing Source Code",
            Self::Plan => "Creating Migration Plan",
            Self::Execute => "Executing Migration Steps",
            Self::Verify => "Verifying Migrated Code",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase {}: {}", self.number(), self.label())
    }
}

/// How a single execution step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// Migrated code was recorded.
    Succeeded,
    /// The model reported `failed`.
    ReportedFailed,
    /// The generation call failed.
    Errored,
    /// The step's file isn't among the inputs.
    Skipped,
}

/// A progress update from a running pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A phase began.
    PhaseStarted {
        /// The phase.
        phase: Phase,
    },

    /// A phase finished and handed its output on.
    PhaseCompleted {
        /// The phase.
        phase: Phase,
    },

    /// An execution step finished.
    StepFinished {
        /// 0-based position in the plan.
        index: usize,
        /// Number of steps in the plan.
        total: usize,
        /// The step id.
        step_id: String,
        /// The file the step targets.
        file: String,
        /// How the step ended.
        outcome: StepOutcome,
    },

    /// An original file was verified.
    FileVerified {
        /// The file path.
        path: String,
        /// Whether verification passed.
        success: bool,
    },
}

/// Optional destination for [`PipelineEvent`]s.
///
/// Cheap to clone; every phase holds its own handle.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl EventSink {
    /// A sink that discards every event.
    #[must_use]
    pub const fn none() -> Self {
        Self { tx: None }
    }

    /// A sink that forwards events to `tx`.
    #[must_use]
    pub const fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Sends `event` without waiting.
    ///
    /// A full channel or a closed receiver drops the event.
    pub fn emit(&self, event: PipelineEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!(?event, "Progress channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    pub(crate) fn phase_started(&self, phase: Phase) {
        self.emit(PipelineEvent::PhaseStarted { phase });
    }

    pub(crate) fn phase_completed(&self, phase: Phase) {
        self.emit(PipelineEvent::PhaseCompleted { phase });
    }
}

impl From<mpsc::Sender<PipelineEvent>> for EventSink {
    fn from(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self::new(tx)
    }
}
