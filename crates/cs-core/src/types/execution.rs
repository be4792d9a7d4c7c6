//! Per-step generation results and the execution result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Migrated file contents keyed by source path.
///
/// Ordered by path so reports serialize deterministically.
pub type MigratedFiles = BTreeMap<String, String>;

/// Outcome the model reports for a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// The step produced migrated code.
    Success,
    /// The model declined or could not migrate the file.
    Failed,
}

impl StepStatus {
    /// Returns `true` for [`Success`](Self::Success).
    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Structured result of one execution step, as emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Reasoning about the migration approach.
    pub thought: String,
    /// The full migrated code.
    pub code: String,
    /// Whether the step succeeded.
    pub status: StepStatus,
}

/// Counters describing how each plan step ended.
///
/// `steps == succeeded + reported_failed + errored + skipped` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Steps attempted.
    pub steps: u64,
    /// Steps whose migrated code was recorded.
    pub succeeded: u64,
    /// Steps where the model reported `failed`.
    pub reported_failed: u64,
    /// Steps whose generation call failed outright.
    pub errored: u64,
    /// Steps skipped because their file wasn't among the inputs.
    pub skipped: u64,
}

impl ExecutionStats {
    /// Returns the number of steps that didn't produce code.
    #[inline]
    #[must_use]
    pub const fn unsuccessful(&self) -> u64 {
        self.reported_failed + self.errored + self.skipped
    }
}

/// Result of the execution phase.
///
/// `files` holds one entry per path with at least one successful step; when
/// several successful steps target the same path, the later step wins.
/// `logs` is the ordered execution narrative.
///
/// # Examples
///
/// ```
/// use cs_core::ExecutionResult;
///
/// let mut result = ExecutionResult::default();
/// result.record("a.py", "x = 1");
/// result.record("a.py", "x = 2");
/// assert_eq!(result.files["a.py"], "x = 2");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Migrated content by source path.
    pub files: MigratedFiles,
    /// Execution log entries, in step order.
    pub logs: Vec<String>,
    /// Step outcome counters.
    #[serde(default)]
    pub stats: ExecutionStats,
}

impl ExecutionResult {
    /// Records migrated content for `path`, replacing any earlier entry.
    pub fn record(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Appends a log entry.
    pub fn log(&mut self, entry: impl Into<String>) {
        self.logs.push(entry.into());
    }

    /// Returns the migrated content for `path`, if any.
    #[must_use]
    pub fn migrated(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_result_parses_status() {
        let json = r#"{"thought": "direct port", "code": "def f(): pass", "status": "success"}"#;
        let result: StepResult = serde_json::from_str(json).unwrap();
        assert!(result.status.is_success());

        let json = r#"{"thought": "", "code": "", "status": "partial"}"#;
        assert!(serde_json::from_str::<StepResult>(json).is_err());
    }

    #[test]
    fn test_record_overwrites() {
        let mut result = ExecutionResult::default();
        result.record("a.js", "first");
        result.record("b.js", "other");
        result.record("a.js", "second");
        assert_eq!(result.files.len(), 2);
        assert_eq!(result.migrated("a.js"), Some("second"));
        assert_eq!(result.migrated("c.js"), None);
    }

    #[test]
    fn test_stats_unsuccessful() {
        let stats = ExecutionStats {
            steps: 5,
            succeeded: 2,
            reported_failed: 1,
            errored: 1,
            skipped: 1,
        };
        assert_eq!(stats.unsuccessful(), 3);
    }

    #[test]
    fn test_execution_result_without_stats_deserializes() {
        let json = r#"{"files": {"a.py": "x"}, "logs": ["Starting step 1: a"]}"#;
        let result: ExecutionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.stats, ExecutionStats::default());
        assert_eq!(result.logs.len(), 1);
    }
}
