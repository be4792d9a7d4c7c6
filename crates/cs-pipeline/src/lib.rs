//! The four-phase code migration pipeline.
//!
//! Given source files and a target platform, the pipeline analyzes the code,
//! plans the migration step by step, executes the plan file by file, and
//! verifies every migrated file against its original.
//!
//! # Overview
//!
//! - [`Analyzer`]: one generation call producing an [`AnalysisResult`]
//! - [`Planner`]: one generation call producing an ordered [`MigrationPlan`]
//! - [`Executor`]: one generation call per step; failures stay local to the step
//! - [`Verifier`]: one generation call per migrated original file
//! - [`Pipeline`]: runs the phases in order and returns the final report
//!
//! Analysis and planning failures abort the run ([`PipelineError`]). Step and
//! verification failures never do; they end up in the execution log and the
//! report's issues. A completed run may therefore still report
//! `success: false`.
//!
//! # Progress
//!
//! Attach a `tokio::sync::mpsc::Sender<PipelineEvent>` with
//! [`Pipeline::with_events`] to follow a run:
//!
//! ```ignore
//! use tokio::sync::mpsc;
//! use cs_pipeline::{Pipeline, PipelineEvent};
//!
//! let (tx, mut rx) = mpsc::channel(64);
//! let pipeline = Pipeline::new(generator).with_events(tx);
//!
//! tokio::spawn(async move {
//!     while let Some(event) = rx.recv().await {
//!         if let PipelineEvent::StepFinished { index, total, outcome, .. } = event {
//!             println!("step {}/{total}: {outcome:?}", index + 1);
//!         }
//!     }
//! });
//!
//! let report = pipeline.run(files, "Python").await?;
//! ```
//!
//! [`AnalysisResult`]: cs_core::AnalysisResult
//! [`MigrationPlan`]: cs_core::MigrationPlan

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod analyzer;
pub mod error;
pub mod events;
pub mod executor;
pub mod pipeline;
pub mod planner;
mod prompts;
pub mod verifier;

pub use analyzer::Analyzer;
pub use error::PipelineError;
pub use events::{EventSink, Phase, PipelineEvent, StepOutcome};
pub use executor::Executor;
pub use pipeline::{MigrationRun, Pipeline, run_migration};
pub use planner::Planner;
pub use verifier::Verifier;
