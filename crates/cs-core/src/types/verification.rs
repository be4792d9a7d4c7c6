//! Per-file verdicts and the final verification report.

use serde::{Deserialize, Serialize};

use super::execution::MigratedFiles;

/// Issue recorded for an original file with no migrated counterpart.
pub const NOT_MIGRATED_ISSUE: &str = "File was not migrated or missing from execution result.";

/// Verdict on a single migrated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVerification {
    /// Path of the original file.
    pub path: String,
    /// Whether the migrated file passed verification.
    pub success: bool,
    /// Problems found, if any.
    pub issues: Vec<String>,
    /// Short verification summary.
    pub summary: String,
}

impl FileVerification {
    /// Verdict for a file the execution phase never produced.
    ///
    /// # Examples
    ///
    /// ```
    /// use cs_core::FileVerification;
    ///
    /// let verdict = FileVerification::not_migrated("utils/math.js");
    /// assert!(!verdict.success);
    /// assert_eq!(verdict.summary, "Migration skipped or failed.");
    /// ```
    #[must_use]
    pub fn not_migrated(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: false,
            issues: vec![NOT_MIGRATED_ISSUE.to_owned()],
            summary: "Migration skipped or failed.".to_owned(),
        }
    }

    /// Verdict for a file whose verification call itself failed.
    #[must_use]
    pub fn errored(path: impl Into<String>, error: &dyn std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            success: false,
            issues: vec![format!("Verification process failed: {error}")],
            summary: "Verification error.".to_owned(),
        }
    }
}

/// Final report of a pipeline run.
///
/// A completed run can still report `success: false`; callers must tell
/// "pipeline completed" apart from "migration succeeded". `files` is an
/// unchanged copy of the execution result's files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Logical AND of every per-file verdict.
    pub success: bool,
    /// Every per-file issue, in original file order.
    pub issues: Vec<String>,
    /// Fixed-template summary.
    pub summary: String,
    /// Migrated files, exactly as the execution phase produced them.
    pub files: MigratedFiles,
}

impl VerificationReport {
    /// Aggregates per-file verdicts into a report.
    ///
    /// `success` is vacuously `true` when `verifications` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use cs_core::{FileVerification, MigratedFiles, VerificationReport};
    ///
    /// let report = VerificationReport::aggregate(
    ///     &[FileVerification::not_migrated("a.js")],
    ///     MigratedFiles::new(),
    /// );
    /// assert!(!report.success);
    /// assert_eq!(report.summary, "Migration completed with issues. Processed 1 files.");
    /// ```
    #[must_use]
    pub fn aggregate(verifications: &[FileVerification], files: MigratedFiles) -> Self {
        let success = verifications.iter().all(|v| v.success);
        let issues = verifications
            .iter()
            .flat_map(|v| v.issues.iter().cloned())
            .collect();
        let outcome = if success {
            "succeeded"
        } else {
            "completed with issues"
        };
        let summary = format!(
            "Migration {outcome}. Processed {} files.",
            verifications.len()
        );

        Self {
            success,
            issues,
            summary,
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(path: &str, success: bool, issues: &[&str]) -> FileVerification {
        FileVerification {
            path: path.to_owned(),
            success,
            issues: issues.iter().map(|i| (*i).to_owned()).collect(),
            summary: String::new(),
        }
    }

    #[test]
    fn test_aggregate_all_pass() {
        let report = VerificationReport::aggregate(
            &[verdict("a", true, &[]), verdict("b", true, &["style nit"])],
            MigratedFiles::new(),
        );
        assert!(report.success);
        assert_eq!(report.issues, ["style nit"]);
        assert_eq!(report.summary, "Migration succeeded. Processed 2 files.");
    }

    #[test]
    fn test_aggregate_concatenates_in_order() {
        let report = VerificationReport::aggregate(
            &[
                verdict("a", false, &["a1", "a2"]),
                verdict("b", true, &[]),
                verdict("c", false, &["c1"]),
            ],
            MigratedFiles::new(),
        );
        assert!(!report.success);
        assert_eq!(report.issues, ["a1", "a2", "c1"]);
    }

    #[test]
    fn test_aggregate_empty_is_vacuous_success() {
        let report = VerificationReport::aggregate(&[], MigratedFiles::new());
        assert!(report.success);
        assert!(report.issues.is_empty());
        assert_eq!(report.summary, "Migration succeeded. Processed 0 files.");
    }

    #[test]
    fn test_errored_embeds_message() {
        let verdict = FileVerification::errored("a.js", &"provider timed out");
        assert!(!verdict.success);
        assert_eq!(
            verdict.issues,
            ["Verification process failed: provider timed out"]
        );
    }

    #[test]
    fn test_file_verification_parses_model_output() {
        let json = r#"{"path": "a.js", "success": false, "issues": ["added try/except"], "summary": "enhancement found"}"#;
        let parsed: FileVerification = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, verdict("a.js", false, &["added try/except"]).with_summary("enhancement found"));
    }

    impl FileVerification {
        fn with_summary(mut self, summary: &str) -> Self {
            self.summary = summary.to_owned();
            self
        }
    }
}
