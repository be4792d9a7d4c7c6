//! The four-phase orchestrator.

use std::sync::Arc;

use cs_core::{
    AnalysisResult, ExecutionResult, FileVerification, GenerationConfig, MigrationPlan,
    MigrationRequest, SourceFile, VerificationReport,
};
use cs_llm::{GenerationProvider, StructuredGenerator};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::analyzer::Analyzer;
use crate::error::PipelineError;
use crate::events::{EventSink, Phase, PipelineEvent};
use crate::executor::Executor;
use crate::planner::Planner;
use crate::verifier::Verifier;

/// Every artefact of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRun {
    /// Phase 1 output.
    pub analysis: AnalysisResult,
    /// Phase 2 output.
    pub plan: MigrationPlan,
    /// Phase 3 output.
    pub execution: ExecutionResult,
    /// Phase 4 per-file verdicts, in input order.
    pub verdicts: Vec<FileVerification>,
    /// Phase 4 aggregate report.
    pub report: VerificationReport,
}

/// Runs analyze, plan, execute and verify in sequence.
///
/// Every phase shares one [`StructuredGenerator`], and through it one
/// provider. Each phase runs at most once per call; a fatal analysis or
/// planning failure aborts the run with no partial report.
///
/// # Examples
///
/// ```ignore
/// use std::sync::Arc;
/// use cs_core::SourceFile;
/// use cs_pipeline::Pipeline;
///
/// let pipeline = Pipeline::from_provider(provider, config.generation);
/// let files = vec![SourceFile::new("utils/math.js", source)];
/// let report = pipeline.run(files, "Python").await?;
/// if !report.success {
///     for issue in &report.issues {
///         eprintln!("{issue}");
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    analyzer: Analyzer,
    planner: Planner,
    executor: Executor,
    verifier: Verifier,
    events: EventSink,
}

impl Pipeline {
    /// Creates a pipeline whose phases share `generator`.
    #[must_use]
    pub fn new(generator: StructuredGenerator) -> Self {
        Self {
            analyzer: Analyzer::new(generator.clone()),
            planner: Planner::new(generator.clone()),
            executor: Executor::new(generator.clone()),
            verifier: Verifier::new(generator),
            events: EventSink::none(),
        }
    }

    /// Creates a pipeline over `provider` with the given generation settings.
    #[must_use]
    pub fn from_provider(provider: Arc<dyn GenerationProvider>, config: GenerationConfig) -> Self {
        Self::new(StructuredGenerator::with_config(provider, config))
    }

    /// Streams progress events to `tx` during runs.
    #[must_use]
    pub fn with_events(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        let events = EventSink::new(tx);
        self.executor = self.executor.with_events(events.clone());
        self.verifier = self.verifier.with_events(events.clone());
        self.events = events;
        self
    }

    /// Migrates `files` to `target` and returns the verification report.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidInput`] if `files` is empty, a path or
    ///   content is empty, a path repeats, or `target` is blank
    /// - [`PipelineError::Analysis`] / [`PipelineError::Planning`] if a fatal
    ///   phase fails
    pub async fn run(
        &self,
        files: Vec<SourceFile>,
        target: &str,
    ) -> Result<VerificationReport, PipelineError> {
        let request = MigrationRequest::new(files, target);
        self.run_request(&request).await
    }

    /// Runs a full request and returns the verification report.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn run_request(
        &self,
        request: &MigrationRequest,
    ) -> Result<VerificationReport, PipelineError> {
        self.run_detailed(request).await.map(|run| run.report)
    }

    /// Runs a full request and returns every intermediate artefact.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    #[instrument(skip_all, fields(files = request.files.len(), platform = %request.target_framework))]
    pub async fn run_detailed(
        &self,
        request: &MigrationRequest,
    ) -> Result<MigrationRun, PipelineError> {
        request.validate()?;
        info!(
            "Starting migration pipeline for {} files to {}",
            request.files.len(),
            request.target_framework
        );

        let analysis = self.analysis_phase(request).await?;
        let plan = self.planning_phase(request, &analysis).await?;

        self.events.phase_started(Phase::Execute);
        let execution = self
            .executor
            .execute(&plan, &request.files, &request.target_framework)
            .await;
        self.events.phase_completed(Phase::Execute);

        self.events.phase_started(Phase::Verify);
        let verdicts = self
            .verifier
            .verify_files(&execution, &request.files, &request.target_framework)
            .await;
        let report = VerificationReport::aggregate(&verdicts, execution.files.clone());
        self.events.phase_completed(Phase::Verify);

        info!(success = report.success, issues = report.issues.len(), "{}", report.summary);
        Ok(MigrationRun {
            analysis,
            plan,
            execution,
            verdicts,
            report,
        })
    }

    /// Runs only the analysis phase.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidInput`] or [`PipelineError::Analysis`].
    pub async fn analyze(&self, request: &MigrationRequest) -> Result<AnalysisResult, PipelineError> {
        request.validate()?;
        self.analysis_phase(request).await
    }

    /// Runs the analysis and planning phases.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidInput`], [`PipelineError::Analysis`] or
    /// [`PipelineError::Planning`].
    pub async fn plan(
        &self,
        request: &MigrationRequest,
    ) -> Result<(AnalysisResult, MigrationPlan), PipelineError> {
        request.validate()?;
        let analysis = self.analysis_phase(request).await?;
        let plan = self.planning_phase(request, &analysis).await?;
        Ok((analysis, plan))
    }

    async fn analysis_phase(
        &self,
        request: &MigrationRequest,
    ) -> Result<AnalysisResult, PipelineError> {
        info!("{}", Phase::Analyze);
        self.events.phase_started(Phase::Analyze);
        let analysis = self
            .analyzer
            .analyze(
                &request.files,
                &request.target_framework,
                request.source_framework.as_deref(),
            )
            .await
            .map_err(PipelineError::Analysis)?;
        self.events.phase_completed(Phase::Analyze);
        Ok(analysis)
    }

    async fn planning_phase(
        &self,
        request: &MigrationRequest,
        analysis: &AnalysisResult,
    ) -> Result<MigrationPlan, PipelineError> {
        info!("{}", Phase::Plan);
        self.events.phase_started(Phase::Plan);
        let plan = self
            .planner
            .plan(analysis, &request.target_framework, &request.files)
            .await
            .map_err(PipelineError::Planning)?;
        self.events.phase_completed(Phase::Plan);
        Ok(plan)
    }
}

/// Migrates `files` to `target` through `provider` with default settings.
///
/// # Errors
///
/// See [`Pipeline::run`].
pub async fn run_migration(
    provider: Arc<dyn GenerationProvider>,
    files: Vec<SourceFile>,
    target: &str,
) -> Result<VerificationReport, PipelineError> {
    Pipeline::from_provider(provider, GenerationConfig::default())
        .run(files, target)
        .await
}
