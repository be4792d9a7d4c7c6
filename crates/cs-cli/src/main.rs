//! CLI entry point for codeshift.
//!
//! This binary runs the four-phase migration pipeline (analyze, plan,
//! execute, verify) against an OpenAI-compatible generation provider.
//!
//! # Usage
//!
//! ```bash
//! codeshift [OPTIONS] <COMMAND>
//!
//! # Migrate a directory of JavaScript to Python, writing results to ./out
//! codeshift run --input ./src --target Python --ext js --output-dir ./out
//!
//! # Run a JSON request file against a local Ollama server
//! codeshift --provider ollama run --input request.json --format text
//!
//! # Only analyze, or analyze and plan
//! codeshift analyze --input ./src --target Go
//! codeshift plan --input ./src --target Go
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod input;
mod output;

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cs_core::{Config, MigrationRequest, ProviderKind, ReportFormat};
use cs_llm::{GenerationProvider, OpenAiCompatibleProvider};
use cs_pipeline::{Pipeline, PipelineEvent, StepOutcome};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Migrate source code to another platform with an LLM-driven
/// analyze, plan, execute and verify pipeline.
#[derive(Parser)]
#[command(name = "codeshift", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON configuration file.
    #[arg(short, long, global = true, env = "CODESHIFT_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Generation provider (overrides the configuration file).
    #[arg(long, global = true, value_enum, env = "CODESHIFT_PROVIDER")]
    provider: Option<ProviderArg>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, global = true, env = "CODESHIFT_BASE_URL")]
    base_url: Option<String>,

    /// Model name.
    #[arg(long, global = true, env = "CODESHIFT_MODEL")]
    model: Option<String>,

    /// Name of the environment variable holding the API key.
    #[arg(long, global = true, env = "CODESHIFT_API_KEY_ENV")]
    api_key_env: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print the verification report.
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Directory to write migrated files into.
        #[arg(short, long)]
        output_dir: Option<Utf8PathBuf>,

        /// Write the report to a file instead of stdout.
        #[arg(short, long)]
        report: Option<Utf8PathBuf>,

        /// Report format (overrides the configuration file).
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Exit with an error when the report is not successful.
        #[arg(long)]
        fail_on_issues: bool,
    },

    /// Analyze the input and print the analysis as JSON.
    Analyze {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Analyze and plan, then print the plan as JSON.
    Plan {
        #[command(flatten)]
        input: InputArgs,
    },
}

/// Where the source files come from.
#[derive(Args)]
struct InputArgs {
    /// A JSON request file or a directory of source files.
    #[arg(short, long)]
    input: Utf8PathBuf,

    /// Target platform (e.g. "Python"); required for directory input.
    #[arg(short, long)]
    target: Option<String>,

    /// Platform the source is written for, as a hint for analysis.
    #[arg(short, long)]
    source: Option<String>,

    /// Only collect files with these extensions (directory input).
    #[arg(short, long = "ext", value_delimiter = ',')]
    extensions: Vec<String>,
}

/// Provider selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderArg {
    /// OpenAI.
    #[value(name = "openai")]
    OpenAi,
    /// Groq.
    Groq,
    /// Google Gemini.
    Google,
    /// Local Ollama server.
    Ollama,
    /// Local LM Studio server.
    #[value(name = "lmstudio")]
    LmStudio,
    /// Any OpenAI-compatible endpoint (needs --base-url and --model).
    Custom,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::OpenAi => Self::OpenAi,
            ProviderArg::Groq => Self::Groq,
            ProviderArg::Google => Self::Google,
            ProviderArg::Ollama => Self::Ollama,
            ProviderArg::LmStudio => Self::LmStudio,
            ProviderArg::Custom => Self::Custom,
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// JSON format.
    Json,
    /// Human-readable text.
    Text,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Text => Self::Text,
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default. Logs go
/// to stderr so reports on stdout stay machine-readable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds the [`Config`] from the optional file plus CLI overrides.
///
/// # Errors
///
/// Returns an error if the file can't be loaded or the result is invalid.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(provider) = cli.provider {
        config.provider.kind = provider.into();
    }
    if let Some(base_url) = &cli.base_url {
        config.provider.base_url = Some(base_url.clone());
    }
    if let Some(model) = &cli.model {
        config.provider.model = Some(model.clone());
    }
    if let Some(var) = &cli.api_key_env {
        config.provider.api_key_env = Some(var.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Creates the pipeline over the configured provider.
///
/// # Errors
///
/// Returns an error if the provider can't be constructed (for example a
/// missing API key).
fn build_pipeline(config: &Config) -> color_eyre::Result<Pipeline> {
    let provider = OpenAiCompatibleProvider::from_config(&config.provider)?;
    info!(
        provider = provider.name(),
        model = provider.model().unwrap_or_default(),
        endpoint = provider.endpoint(),
        "Using generation provider"
    );
    let provider: Arc<dyn GenerationProvider> = Arc::new(provider);
    Ok(Pipeline::from_provider(provider, config.generation.clone()))
}

fn load(input: &InputArgs) -> color_eyre::Result<MigrationRequest> {
    input::load_request(
        &input.input,
        input.target.as_deref(),
        input.source.as_deref(),
        &input.extensions,
    )
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Options for the `run` command.
struct RunOptions {
    output_dir: Option<Utf8PathBuf>,
    report: Option<Utf8PathBuf>,
    format: ReportFormat,
    fail_on_issues: bool,
}

/// Runs the full pipeline.
///
/// # Errors
///
/// Returns an error if the pipeline aborts, output can't be written, or
/// `--fail-on-issues` is set and the migration reported issues.
async fn run_migration(
    config: &Config,
    request: MigrationRequest,
    options: RunOptions,
) -> color_eyre::Result<()> {
    let (tx, mut rx) = mpsc::channel(64);
    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_event(&event);
        }
    });

    let pipeline = build_pipeline(config)?.with_events(tx);
    let run = pipeline.run_detailed(&request).await;
    drop(pipeline);
    let _ = progress.await;
    let run = run?;

    if let Some(dir) = &options.output_dir {
        if config.output.write_files {
            output::write_migrated_files(dir, &run.report.files)?;
        } else {
            warn!(dir = %dir, "Writing migrated files is disabled in the configuration");
        }
    }

    let content = output::render_run(&run, options.format)?;
    emit(&content, options.report.as_ref())?;

    if options.fail_on_issues && !run.report.success {
        return Err(color_eyre::eyre::eyre!(
            "Migration completed with {} issue(s)",
            run.report.issues.len()
        ));
    }
    Ok(())
}

/// Runs only the analysis phase.
///
/// # Errors
///
/// Returns an error if analysis fails.
async fn run_analyze(config: &Config, request: &MigrationRequest) -> color_eyre::Result<()> {
    let analysis = build_pipeline(config)?.analyze(request).await?;
    emit(&output::to_json(&analysis)?, None)
}

/// Runs the analysis and planning phases.
///
/// # Errors
///
/// Returns an error if analysis or planning fails.
async fn run_plan(config: &Config, request: &MigrationRequest) -> color_eyre::Result<()> {
    let (_, plan) = build_pipeline(config)?.plan(request).await?;
    for violation in plan.dependency_order_violations() {
        warn!(%violation, "Plan order does not satisfy step dependencies");
    }
    emit(&output::to_json(&plan)?, None)
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Writes `content` to `path`, or to stdout.
fn emit(content: &str, path: Option<&Utf8PathBuf>) -> color_eyre::Result<()> {
    if let Some(path) = path {
        std::fs::write(path, content)?;
        info!(path = %path, "Report written");
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{content}")?;
    }
    Ok(())
}

/// Logs a progress event.
fn log_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::PhaseStarted { phase } => info!("--- {phase} ---"),
        PipelineEvent::PhaseCompleted { phase } => info!(phase = phase.label(), "Phase completed"),
        PipelineEvent::StepFinished {
            index,
            total,
            step_id,
            file,
            outcome,
        } => {
            let position = index + 1;
            match outcome {
                StepOutcome::Succeeded => {
                    info!(step = %step_id, %file, "[{position}/{total}] Step succeeded");
                }
                StepOutcome::ReportedFailed | StepOutcome::Errored | StepOutcome::Skipped => {
                    warn!(step = %step_id, %file, ?outcome, "[{position}/{total}] Step did not succeed");
                }
            }
        }
        PipelineEvent::FileVerified { path, success } => {
            if *success {
                info!(%path, "Verified");
            } else {
                warn!(%path, "Verification reported issues");
            }
        }
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Load configuration
    let config = build_config(&cli)?;

    // 5. Route to appropriate command
    match &cli.command {
        Commands::Run {
            input,
            output_dir,
            report,
            format,
            fail_on_issues,
        } => {
            let request = load(input)?;
            let options = RunOptions {
                output_dir: output_dir.clone(),
                report: report.clone(),
                format: format.map_or(config.output.report_format, Into::into),
                fail_on_issues: *fail_on_issues,
            };
            run_migration(&config, request, options).await
        }
        Commands::Analyze { input } => run_analyze(&config, &load(input)?).await,
        Commands::Plan { input } => run_plan(&config, &load(input)?).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "codeshift",
            "--provider",
            "ollama",
            "run",
            "--input",
            "src",
            "--target",
            "Python",
            "--ext",
            "js,jsx",
            "--format",
            "text",
            "--fail-on-issues",
        ])
        .unwrap();

        assert_eq!(cli.provider, Some(ProviderArg::Ollama));
        let Commands::Run {
            input,
            format,
            fail_on_issues,
            ..
        } = cli.command
        else {
            unreachable!("expected run command");
        };
        assert_eq!(input.input, Utf8PathBuf::from("src"));
        assert_eq!(input.target.as_deref(), Some("Python"));
        assert_eq!(input.extensions, ["js", "jsx"]);
        assert_eq!(format, Some(FormatArg::Text));
        assert!(fail_on_issues);
    }

    /// Builds flags directly so `CODESHIFT_*` variables in the developer's
    /// environment can't leak into the result.
    fn overrides(
        config: Option<Utf8PathBuf>,
        provider: Option<ProviderArg>,
        base_url: Option<&str>,
        model: Option<&str>,
    ) -> Cli {
        Cli {
            command: Commands::Analyze {
                input: InputArgs {
                    input: Utf8PathBuf::from("request.json"),
                    target: None,
                    source: None,
                    extensions: Vec::new(),
                },
            },
            config,
            provider,
            base_url: base_url.map(str::to_owned),
            model: model.map(str::to_owned),
            api_key_env: None,
            verbose: false,
            no_color: false,
        }
    }

    #[test]
    fn test_build_config_applies_overrides() {
        let cli = overrides(
            None,
            Some(ProviderArg::Custom),
            Some("http://localhost:8080/v1"),
            Some("qwen2.5-coder"),
        );

        let config = build_config(&cli).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Custom);
        assert_eq!(config.provider.base_url(), Some("http://localhost:8080/v1"));
        assert_eq!(config.provider.model(), Some("qwen2.5-coder"));
    }

    #[test]
    fn test_build_config_rejects_custom_without_model() {
        let cli = overrides(
            None,
            Some(ProviderArg::Custom),
            Some("http://localhost:8080/v1"),
            None,
        );

        let err = build_config(&cli).unwrap_err();
        assert!(err.to_string().contains("provider.model"), "{err}");
    }

    #[test]
    fn test_build_config_without_overrides_uses_defaults() {
        let config = build_config(&overrides(None, None, None, None)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_build_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("codeshift.json")).unwrap();
        std::fs::write(
            &path,
            r#"{"provider": {"kind": "groq"}, "generation": {"max_attempts": 3}, "output": {"report_format": "text"}}"#,
        )
        .unwrap();

        let cli = overrides(Some(path), None, None, Some("mixtral-8x7b"));

        let config = build_config(&cli).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Groq);
        assert_eq!(config.provider.model(), Some("mixtral-8x7b"));
        assert_eq!(config.generation.max_attempts, 3);
        assert_eq!(config.output.report_format, ReportFormat::Text);
    }
}
