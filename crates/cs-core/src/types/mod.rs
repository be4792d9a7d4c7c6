//! Domain types for the codeshift pipeline.
//!
//! One module per phase boundary. Each phase fully produces its output value
//! before handing it, immutably, to the next phase.
//!
//! # Module Organization
//!
//! - [`source`] - Input files and the migration request
//! - [`analysis`] - Output of the analysis phase
//! - [`plan`] - Migration steps and plans
//! - [`execution`] - Per-step generation results and the execution result
//! - [`verification`] - Per-file verdicts and the final report
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use cs_core::{SourceFile, MigrationPlan, VerificationReport};
//! ```

mod analysis;
mod execution;
mod plan;
mod source;
mod verification;

pub use analysis::AnalysisResult;
pub use execution::{ExecutionResult, ExecutionStats, MigratedFiles, StepResult, StepStatus};
pub use plan::{Complexity, MigrationPlan, MigrationStep, OrderViolation};
pub use source::{MigrationRequest, SourceFile};
pub use verification::{FileVerification, NOT_MIGRATED_ISSUE, VerificationReport};
