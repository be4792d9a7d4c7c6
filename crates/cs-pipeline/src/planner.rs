//! Phase 2: migration planning.

use cs_core::{AnalysisResult, MigrationPlan, SourceFile};
use cs_llm::{GenerationError, SerdeSchema, StructuredGenerator};
use tracing::{debug, info, instrument, warn};

use crate::prompts;

/// Produces a [`MigrationPlan`] from an analysis with one generation call.
///
/// The plan is checked for types only. Whether each step's `file` names an
/// input path, and whether the steps are topologically ordered, is logged
/// but not enforced.
#[derive(Debug, Clone)]
pub struct Planner {
    generator: StructuredGenerator,
}

impl Planner {
    /// Creates a planner backed by `generator`.
    #[must_use]
    pub const fn new(generator: StructuredGenerator) -> Self {
        Self { generator }
    }

    /// Plans the migration of `files` to `target`.
    ///
    /// # Errors
    ///
    /// Returns the [`GenerationError`] if no valid plan could be generated.
    #[instrument(skip_all, fields(files = files.len(), platform = target))]
    pub async fn plan(
        &self,
        analysis: &AnalysisResult,
        target: &str,
        files: &[SourceFile],
    ) -> Result<MigrationPlan, GenerationError> {
        let prompt = prompts::plan(analysis, target, files);
        debug!(prompt_chars = prompt.len(), "Built planning prompt");

        let plan = self
            .generator
            .generate(&prompt, &SerdeSchema::<MigrationPlan>::new(), None)
            .await?;

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        for step in plan.steps_with_unknown_files(&paths) {
            warn!(step = %step.id, file = %step.file, "Plan step targets a file that is not an input");
        }

        info!(steps = plan.len(), "Plan generated");
        Ok(plan)
    }
}
