//! Phase 3: per-step code generation.
//!
//! Steps run strictly in plan order, one generation call each. A step that
//! can't run or fails is logged and skipped; it never stops the steps after
//! it.

use cs_core::{ExecutionResult, MigrationPlan, SourceFile, StepResult};
use cs_llm::{SerdeSchema, StructuredGenerator};
use rustc_hash::FxHashMap;
use tracing::{debug, error, info, instrument, warn};

use crate::events::{EventSink, PipelineEvent, StepOutcome};
use crate::prompts;

/// Runs the steps of a [`MigrationPlan`] against the original files.
#[derive(Debug, Clone)]
pub struct Executor {
    generator: StructuredGenerator,
    events: EventSink,
}

impl Executor {
    /// Creates an executor backed by `generator`.
    #[must_use]
    pub const fn new(generator: StructuredGenerator) -> Self {
        Self {
            generator,
            events: EventSink::none(),
        }
    }

    /// Sends a [`PipelineEvent::StepFinished`] to `events` after every step.
    #[must_use]
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Executes `plan` in the given order.
    ///
    /// Never fails. The result holds migrated content for every path with a
    /// successful step (later steps overwrite earlier ones), a log narrating
    /// every step, and counters for how the steps ended.
    #[instrument(skip_all, fields(steps = plan.len(), platform = target))]
    pub async fn execute(
        &self,
        plan: &MigrationPlan,
        files: &[SourceFile],
        target: &str,
    ) -> ExecutionResult {
        for violation in plan.dependency_order_violations() {
            warn!(%violation, "Plan order does not satisfy step dependencies");
        }

        let mut by_path: FxHashMap<&str, &SourceFile> = FxHashMap::default();
        for file in files {
            by_path.entry(file.path.as_str()).or_insert(file);
        }

        let mut result = ExecutionResult::default();
        let total = plan.len();

        for (index, step) in plan.steps.iter().enumerate() {
            info!(step = %step.id, file = %step.file, "Executing step: {}", step.description);
            result.log(format!("Starting step {}: {}", step.id, step.description));
            result.stats.steps += 1;

            let outcome = match by_path.get(step.file.as_str()) {
                None => {
                    error!(step = %step.id, file = %step.file, "Source file not found for step");
                    result.log(format!(
                        "ERROR: Source file not found for step {}: {}",
                        step.id, step.file
                    ));
                    result.stats.skipped += 1;
                    StepOutcome::Skipped
                }
                Some(source) => {
                    let prompt = prompts::step(step, source, target);
                    debug!(step = %step.id, prompt_chars = prompt.len(), "Built step prompt");

                    match self
                        .generator
                        .generate(&prompt, &SerdeSchema::<StepResult>::new(), None)
                        .await
                    {
                        Ok(StepResult {
                            thought,
                            code,
                            status,
                        }) if status.is_success() => {
                            result.record(step.file.as_str(), code);
                            result.log(format!("Step {} completed. Thought: {thought}", step.id));
                            result.stats.succeeded += 1;
                            StepOutcome::Succeeded
                        }
                        Ok(_) => {
                            warn!(step = %step.id, "Step reported failure");
                            result.log(format!("Step {} reported failure.", step.id));
                            result.stats.reported_failed += 1;
                            StepOutcome::ReportedFailed
                        }
                        Err(err) => {
                            error!(step = %step.id, error = %err, "Step failed");
                            result.log(format!("Step {} failed: {err}", step.id));
                            result.stats.errored += 1;
                            StepOutcome::Errored
                        }
                    }
                }
            };

            self.events
                .emit(PipelineEvent::StepFinished {
                    index,
                    total,
                    step_id: step.id.clone(),
                    file: step.file.clone(),
                    outcome,
                });
        }

        info!(
            files = result.files.len(),
            succeeded = result.stats.succeeded,
            unsuccessful = result.stats.unsuccessful(),
            "Execution completed"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cs_core::{Complexity, MigrationStep};
    use cs_llm::{GenerationProvider, ProviderError, ScriptedProvider};
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;

    fn step(id: &str, file: &str) -> MigrationStep {
        MigrationStep {
            id: id.to_owned(),
            description: format!("Migrate {file}"),
            dependencies: Default::default(),
            complexity: Complexity::Low,
            file: file.to_owned(),
        }
    }

    fn plan(steps: Vec<MigrationStep>) -> MigrationPlan {
        MigrationPlan {
            steps,
            rationale: String::new(),
        }
    }

    fn success(code: &str) -> String {
        json!({"thought": format!("port {code}"), "code": code, "status": "success"}).to_string()
    }

    fn executor(provider: &Arc<ScriptedProvider>) -> Executor {
        Executor::new(StructuredGenerator::new(
            Arc::clone(provider) as Arc<dyn GenerationProvider>
        ))
    }

    fn inputs() -> Vec<SourceFile> {
        vec![
            SourceFile::new("a.js", "const a = 1;"),
            SourceFile::new("b.js", "const b = 2;"),
            SourceFile::new("c.js", "const c = 3;"),
        ]
    }

    #[tokio::test]
    async fn test_missing_file_is_isolated_at_any_position() {
        for missing_at in 0..3 {
            let mut steps = vec![step("1", "a.js"), step("2", "b.js"), step("3", "c.js")];
            steps[missing_at].file = "src/missing.js".to_owned();
            let expected_id = steps[missing_at].id.clone();

            let provider = Arc::new(ScriptedProvider::new([
                success("A"),
                success("B"),
            ]));
            let result = executor(&provider)
                .execute(&plan(steps), &inputs(), "Python")
                .await;

            assert_eq!(provider.call_count(), 2);
            assert_eq!(result.files.len(), 2);
            assert!(!result.files.contains_key("src/missing.js"));
            assert!(result.logs.contains(&format!(
                "ERROR: Source file not found for step {expected_id}: src/missing.js"
            )));
            assert_eq!(result.stats.skipped, 1);
            assert_eq!(result.stats.succeeded, 2);
        }
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let provider = Arc::new(ScriptedProvider::new([
            success("first"),
            success("second"),
        ]));

        let result = executor(&provider)
            .execute(
                &plan(vec![step("1", "a.js"), step("2", "a.js")]),
                &inputs(),
                "Python",
            )
            .await;

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.migrated("a.js"), Some("second"));
    }

    #[tokio::test]
    async fn test_logs_narrate_every_outcome() {
        let provider = Arc::new(ScriptedProvider::from_results([
            Ok(success("A")),
            Ok(json!({"thought": "cannot", "code": "", "status": "failed"}).to_string()),
            Err(ProviderError::EmptyResponse),
            Err(ProviderError::EmptyResponse),
        ]));

        let result = executor(&provider)
            .execute(
                &plan(vec![step("1", "a.js"), step("2", "b.js"), step("3", "c.js")]),
                &inputs(),
                "Python",
            )
            .await;

        assert_eq!(result.logs.len(), 6);
        assert_eq!(result.logs[0], "Starting step 1: Migrate a.js");
        assert_eq!(result.logs[1], "Step 1 completed. Thought: port A");
        assert_eq!(result.logs[3], "Step 2 reported failure.");
        assert!(
            result.logs[5].starts_with("Step 3 failed: failed to generate valid JSON after 2 attempts"),
            "{}",
            result.logs[5]
        );
        assert_eq!(result.files.keys().collect::<Vec<_>>(), ["a.js"]);
        assert_eq!(
            (result.stats.succeeded, result.stats.reported_failed, result.stats.errored),
            (1, 1, 1)
        );
        assert_eq!(result.stats.unsuccessful(), 2);
    }

    #[tokio::test]
    async fn test_step_prompt_uses_original_content() {
        let provider = Arc::new(ScriptedProvider::new([success("B")]));

        executor(&provider)
            .execute(&plan(vec![step("1", "b.js")]), &inputs(), "Rust")
            .await;

        let prompt = &provider.calls()[0][1].content;
        assert!(prompt.contains("const b = 2;"));
        assert!(prompt.contains("migration to Rust"));
    }

    #[tokio::test]
    async fn test_step_events() {
        let provider = Arc::new(ScriptedProvider::new([success("A")]));
        let (tx, mut rx) = mpsc::channel(8);

        executor(&provider)
            .with_events(EventSink::new(tx))
            .execute(
                &plan(vec![step("1", "a.js"), step("2", "nope.js")]),
                &inputs(),
                "Python",
            )
            .await;

        let mut outcomes = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let PipelineEvent::StepFinished { outcome, total, .. } = event {
                assert_eq!(total, 2);
                outcomes.push(outcome);
            }
        }
        assert_eq!(outcomes, [StepOutcome::Succeeded, StepOutcome::Skipped]);
    }
}
