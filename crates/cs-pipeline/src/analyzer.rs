//! Phase 1: structural analysis of the input files.

use cs_core::{AnalysisResult, SourceFile};
use cs_llm::{GenerationError, SerdeSchema, StructuredGenerator};
use tracing::{debug, info, instrument};

use crate::prompts;

/// Produces an [`AnalysisResult`] for a set of files with one generation call.
#[derive(Debug, Clone)]
pub struct Analyzer {
    generator: StructuredGenerator,
}

impl Analyzer {
    /// Creates an analyzer backed by `generator`.
    #[must_use]
    pub const fn new(generator: StructuredGenerator) -> Self {
        Self { generator }
    }

    /// Analyzes `files` for migration to `target`.
    ///
    /// `source` optionally names the platform the files are written for.
    ///
    /// # Errors
    ///
    /// Returns the [`GenerationError`] if no valid analysis could be
    /// generated. There is no partial result.
    #[instrument(skip_all, fields(files = files.len(), platform = target))]
    pub async fn analyze(
        &self,
        files: &[SourceFile],
        target: &str,
        source: Option<&str>,
    ) -> Result<AnalysisResult, GenerationError> {
        let prompt = prompts::analysis(files, target, source);
        debug!(prompt_chars = prompt.len(), "Built analysis prompt");

        let analysis = self
            .generator
            .generate(&prompt, &SerdeSchema::<AnalysisResult>::new(), None)
            .await?;

        info!(
            patterns = analysis.patterns.len(),
            dependencies = analysis.dependencies.len(),
            potential_issues = analysis.potential_issues.len(),
            "Analysis completed"
        );
        Ok(analysis)
    }
}
