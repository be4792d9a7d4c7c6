//! Error types for the cs-pipeline crate.
//!
//! This module provides the [`PipelineError`] type for failures that abort a
//! whole migration run.
//!
//! # Error Recovery Strategy
//!
//! - **Invalid input** ([`PipelineError::InvalidInput`]): Fatal - rejected
//!   before any generation call
//! - **Analysis/planning failures** ([`PipelineError::Analysis`],
//!   [`PipelineError::Planning`]): Fatal - the run produces no report and must
//!   be restarted from scratch
//! - **Step and file failures**: Never surface here. The executor and verifier
//!   fold them into logs and report issues, so a completed run can still
//!   report `success: false`

use cs_core::RequestError;
use cs_llm::GenerationError;

use crate::events::Phase;

/// Errors that abort a migration run.
///
/// # Examples
///
/// ```
/// use cs_pipeline::PipelineError;
///
/// fn describe(err: &PipelineError) -> &'static str {
///     match err {
///         PipelineError::InvalidInput(_) => "fix the request",
///         PipelineError::Analysis(_) | PipelineError::Planning(_) => "retry the run",
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The request failed validation.
    #[error("invalid migration request: {0}")]
    InvalidInput(#[from] RequestError),

    /// The analysis phase could not produce a valid result.
    #[error("analysis failed: {0}")]
    Analysis(#[source] GenerationError),

    /// The planning phase could not produce a valid plan.
    #[error("planning failed: {0}")]
    Planning(#[source] GenerationError),
}

impl PipelineError {
    /// Returns the phase that failed, if the failure happened inside one.
    #[must_use]
    pub const fn phase(&self) -> Option<Phase> {
        match self {
            Self::InvalidInput(_) => None,
            Self::Analysis(_) => Some(Phase::Analyze),
            Self::Planning(_) => Some(Phase::Plan),
        }
    }

    /// Returns the underlying generation failure, if any.
    #[must_use]
    pub const fn generation_error(&self) -> Option<&GenerationError> {
        match self {
            Self::InvalidInput(_) => None,
            Self::Analysis(err) | Self::Planning(err) => Some(err),
        }
    }
}
