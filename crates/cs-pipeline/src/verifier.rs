//! Phase 4: per-file verification.
//!
//! Walks the original files rather than the plan, so files the plan never
//! touched are still reported. Migrated content is only read, never changed.

use cs_core::{ExecutionResult, FileVerification, SourceFile, VerificationReport};
use cs_llm::{SerdeSchema, StructuredGenerator};
use tracing::{debug, error, info, instrument, warn};

use crate::events::{EventSink, PipelineEvent};
use crate::prompts;

/// Judges migrated files against their originals.
#[derive(Debug, Clone)]
pub struct Verifier {
    generator: StructuredGenerator,
    events: EventSink,
}

impl Verifier {
    /// Creates a verifier backed by `generator`.
    #[must_use]
    pub const fn new(generator: StructuredGenerator) -> Self {
        Self {
            generator,
            events: EventSink::none(),
        }
    }

    /// Sends a [`PipelineEvent::FileVerified`] to `events` after every file.
    #[must_use]
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Verifies every original file and aggregates the verdicts.
    ///
    /// Never fails: a verification call that can't produce a verdict is
    /// recorded as a failed verdict for that file.
    pub async fn verify(
        &self,
        execution: &ExecutionResult,
        originals: &[SourceFile],
        target: &str,
    ) -> VerificationReport {
        let verdicts = self.verify_files(execution, originals, target).await;
        VerificationReport::aggregate(&verdicts, execution.files.clone())
    }

    /// Produces one verdict per original file, in input order.
    #[instrument(skip_all, fields(files = originals.len(), platform = target))]
    pub async fn verify_files(
        &self,
        execution: &ExecutionResult,
        originals: &[SourceFile],
        target: &str,
    ) -> Vec<FileVerification> {
        let mut verdicts = Vec::with_capacity(originals.len());

        for original in originals {
            let verdict = match execution.migrated(&original.path) {
                Some(migrated) if !migrated.is_empty() => {
                    self.verify_one(original, migrated, target).await
                }
                _ => {
                    warn!(path = %original.path, "File was not migrated");
                    FileVerification::not_migrated(original.path.as_str())
                }
            };

            self.events
                .emit(PipelineEvent::FileVerified {
                    path: verdict.path.clone(),
                    success: verdict.success,
                });
            verdicts.push(verdict);
        }

        let passed = verdicts.iter().filter(|v| v.success).count();
        info!(passed, failed = verdicts.len() - passed, "Verification completed");
        verdicts
    }

    async fn verify_one(
        &self,
        original: &SourceFile,
        migrated: &str,
        target: &str,
    ) -> FileVerification {
        let prompt = prompts::verification(original, migrated, target);
        debug!(path = %original.path, prompt_chars = prompt.len(), "Built verification prompt");

        match self
            .generator
            .generate(&prompt, &SerdeSchema::<FileVerification>::new(), None)
            .await
        {
            Ok(mut verdict) => {
                if verdict.path != original.path {
                    debug!(
                        expected = %original.path,
                        reported = %verdict.path,
                        "Verdict named a different path"
                    );
                    verdict.path.clone_from(&original.path);
                }
                verdict
            }
            Err(err) => {
                error!(path = %original.path, error = %err, "Verification failed");
                FileVerification::errored(original.path.as_str(), &err)
            }
        }
    }
}
