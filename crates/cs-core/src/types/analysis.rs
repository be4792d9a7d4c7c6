//! Output of the analysis phase.

use serde::{Deserialize, Serialize};

/// Structural analysis of the input files.
///
/// Produced once per run and read-only downstream. Field names are camelCase
/// on the wire because that is the shape the model is asked to emit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Architectural patterns or styles identified in the code.
    pub patterns: Vec<String>,
    /// External libraries or internal modules, derived only from imports.
    pub dependencies: Vec<String>,
    /// Likely challenges for the migration.
    pub potential_issues: Vec<String>,
    /// High-level summary of what the code does.
    pub summary: String,
}

impl AnalysisResult {
    /// Renders the analysis as the plain-text digest handed to the planner.
    ///
    /// # Examples
    ///
    /// ```
    /// use cs_core::AnalysisResult;
    ///
    /// let analysis = AnalysisResult {
    ///     patterns: vec!["Module".to_owned(), "Pure functions".to_owned()],
    ///     dependencies: vec![],
    ///     potential_issues: vec!["CommonJS exports".to_owned()],
    ///     summary: "Math helpers".to_owned(),
    /// };
    /// let digest = analysis.digest();
    /// assert!(digest.contains("Patterns: Module, Pure functions"));
    /// assert!(digest.contains("Summary: Math helpers"));
    /// ```
    #[must_use]
    pub fn digest(&self) -> String {
        format!(
            "Patterns: {}\nDependencies: {}\nPotential Issues: {}\nSummary: {}",
            self.patterns.join(", "),
            self.dependencies.join(", "),
            self.potential_issues.join(", "),
            self.summary
        )
    }
}
