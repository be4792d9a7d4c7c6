//! Core types, configuration, and errors for the codeshift migration pipeline.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - Domain types for every pipeline phase ([`SourceFile`], [`AnalysisResult`],
//!   [`MigrationPlan`], [`ExecutionResult`], [`VerificationReport`])
//! - Configuration structures ([`Config`] and its sections)
//! - Error types for configuration loading and request validation
//!
//! Everything here is plain data. The phases that produce these values live in
//! `cs-pipeline`; the provider plumbing lives in `cs-llm`.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    Config, DEFAULT_MAX_ATTEMPTS, DEFAULT_SYSTEM_PROMPT, GenerationConfig, OutputConfig,
    ProviderConfig, ProviderKind, ReportFormat,
};
pub use error::{ConfigError, RequestError};
pub use types::{
    AnalysisResult, Complexity, ExecutionResult, ExecutionStats, FileVerification,
    MigratedFiles, MigrationPlan, MigrationRequest, MigrationStep, NOT_MIGRATED_ISSUE,
    OrderViolation, SourceFile, StepResult, StepStatus, VerificationReport,
};
