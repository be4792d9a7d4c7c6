//! Writing migrated files and rendering reports.

use std::fmt::Write as _;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{WrapErr, eyre};
use cs_core::{MigratedFiles, ReportFormat};
use cs_pipeline::MigrationRun;
use serde::Serialize;
use tracing::info;

/// Resolves a migrated file path inside `output_dir`.
///
/// # Errors
///
/// Refuses empty and absolute paths and any path with a `..` component, so
/// nothing is written outside `output_dir`.
pub fn resolve_output_path(output_dir: &Utf8Path, path: &str) -> color_eyre::Result<Utf8PathBuf> {
    let relative = Utf8Path::new(path);
    if path.trim().is_empty() {
        return Err(eyre!("Refusing to write a file with an empty path"));
    }
    if relative.is_absolute() || relative.has_root() {
        return Err(eyre!("Refusing to write absolute path: {path}"));
    }
    for component in relative.components() {
        match component {
            Utf8Component::Normal(_) | Utf8Component::CurDir => {}
            Utf8Component::ParentDir | Utf8Component::RootDir | Utf8Component::Prefix(_) => {
                return Err(eyre!("Refusing to write path outside the output directory: {path}"));
            }
        }
    }
    Ok(output_dir.join(relative))
}

/// Writes every migrated file under `output_dir`, creating directories as
/// needed. Returns the written paths.
///
/// All paths are checked before anything is written.
///
/// # Errors
///
/// Returns an error if a path is refused or a write fails.
pub fn write_migrated_files(
    output_dir: &Utf8Path,
    files: &MigratedFiles,
) -> color_eyre::Result<Vec<Utf8PathBuf>> {
    let targets = files
        .iter()
        .map(|(path, content)| Ok((resolve_output_path(output_dir, path)?, content)))
        .collect::<color_eyre::Result<Vec<_>>>()?;

    let mut written = Vec::with_capacity(targets.len());
    for (target, content) in targets {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create directory {parent}"))?;
        }
        std::fs::write(&target, content).wrap_err_with(|| format!("Failed to write {target}"))?;
        written.push(target);
    }

    info!(dir = %output_dir, files = written.len(), "Migrated files written");
    Ok(written)
}

/// Serializes any value as pretty JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> color_eyre::Result<String> {
    let mut json = serde_json::to_string_pretty(value)
        .map_err(|e| eyre!("Failed to serialize JSON: {}", e))?;
    json.push('\n');
    Ok(json)
}

/// Renders the result of a full run in `format`.
///
/// JSON is the verification report alone; text adds the per-file verdicts,
/// step counters and the execution log.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_run(run: &MigrationRun, format: ReportFormat) -> color_eyre::Result<String> {
    match format {
        ReportFormat::Json => to_json(&run.report),
        ReportFormat::Text => Ok(render_text(run)),
    }
}

fn render_text(run: &MigrationRun) -> String {
    let mut out = String::new();
    let report = &run.report;
    let stats = &run.execution.stats;

    let _ = writeln!(out, "Migration Report");
    let _ = writeln!(out, "================");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", report.summary);
    let _ = writeln!(out, "Result: {}", if report.success { "PASS" } else { "FAIL" });
    let _ = writeln!(out);
    let _ = writeln!(out, "Plan: {} steps", run.plan.len());
    let _ = writeln!(out, "  Succeeded:        {}", stats.succeeded);
    let _ = writeln!(out, "  Reported failed:  {}", stats.reported_failed);
    let _ = writeln!(out, "  Errored:          {}", stats.errored);
    let _ = writeln!(out, "  Skipped:          {}", stats.skipped);

    if !run.verdicts.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Files ({}):", run.verdicts.len());
        for verdict in &run.verdicts {
            let mark = if verdict.success { "ok  " } else { "FAIL" };
            let _ = writeln!(out, "  [{mark}] {} - {}", verdict.path, verdict.summary);
        }
    }

    if !report.issues.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Issues ({}):", report.issues.len());
        for issue in &report.issues {
            let _ = writeln!(out, "  - {issue}");
        }
    }

    if !run.execution.logs.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Execution log:");
        for entry in &run.execution.logs {
            let _ = writeln!(out, "  {entry}");
        }
    }

    out
}
