//! Generation providers and schema-validated structured generation.
//!
//! This crate sits between the migration pipeline and a text-generation
//! backend. The pipeline never sees raw model output; it asks for typed values.
//!
//! # Overview
//!
//! - [`GenerationProvider`]: one conversation in, one completion string out
//! - [`OpenAiCompatibleProvider`]: HTTP provider for OpenAI-compatible services
//! - [`extract_payload`]: pulls the JSON payload out of free-form model text
//! - [`Schema`] / [`SerdeSchema`]: validation of parsed JSON into typed output
//! - [`StructuredGenerator`]: bounded generate-parse-validate loop with
//!   in-conversation self-correction
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cs_core::{Config, MigrationPlan};
//! use cs_llm::{OpenAiCompatibleProvider, StructuredGenerator};
//!
//! let config = Config::default();
//! let provider = Arc::new(OpenAiCompatibleProvider::from_config(&config.provider)?);
//! let generator = StructuredGenerator::with_config(provider, config.generation);
//!
//! let plan: MigrationPlan = generator.generate_as("Create a migration plan ...").await?;
//! println!("{} steps", plan.len());
//! ```
//!
//! # Testing
//!
//! With the `testing` feature, [`ScriptedProvider`] replays canned responses
//! and records every request, so dependent crates can drive the pipeline
//! without a network.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod extract;
pub mod message;
pub mod openai;
pub mod provider;
pub mod schema;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;
pub mod structured;

pub use error::{AttemptError, GenerationError, ProviderError};
pub use extract::extract_payload;
pub use message::{Conversation, Message, Role};
pub use openai::OpenAiCompatibleProvider;
pub use provider::GenerationProvider;
pub use schema::{Check, Schema, SerdeSchema, Validation};
#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedProvider;
pub use structured::{StructuredGenerator, correction_message};
