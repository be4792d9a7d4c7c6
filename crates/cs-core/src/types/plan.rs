//! Migration steps and plans.
//!
//! A [`MigrationPlan`] is an ordered list of [`MigrationStep`]s. The plan is
//! expected to be topologically sorted with respect to each step's
//! `dependencies`, but nothing enforces that: the executor runs steps in the
//! order given. [`MigrationPlan::dependency_order_violations`] reports where
//! the order and the declared dependencies disagree.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Estimated effort of a migration step.
///
/// # Examples
///
/// ```
/// use cs_core::Complexity;
///
/// let complexity: Complexity = serde_json::from_str(r#""medium""#).unwrap();
/// assert_eq!(complexity, Complexity::Medium);
/// assert_eq!(complexity.label(), "Medium");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Mechanical translation.
    Low,
    /// Some restructuring required.
    Medium,
    /// Significant platform differences to bridge.
    High,
}

impl Complexity {
    /// Returns a human-readable label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// One unit of planned migration work, scoped to exactly one input file.
///
/// `file` must equal the `path` of some input [`SourceFile`](crate::SourceFile).
/// The planner is instructed to honour that, but the value is not re-checked
/// before execution; the executor logs and skips steps whose file is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStep {
    /// Step identifier, unique within the plan.
    pub id: String,

    /// What the step should do.
    pub description: String,

    /// Ids of steps that must run before this one.
    ///
    /// Uses `SmallVec<[String; 4]>` since most steps have few prerequisites.
    pub dependencies: SmallVec<[String; 4]>,

    /// Estimated effort.
    pub complexity: Complexity,

    /// Path of the input file this step migrates.
    pub file: String,
}

/// A dependency that the plan order doesn't satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderViolation {
    /// The dependency names no step in the plan.
    UnknownDependency {
        /// Id of the dependent step.
        step: String,
        /// The missing prerequisite id.
        dependency: String,
    },
    /// The dependency is scheduled at or after the dependent step.
    ForwardDependency {
        /// Id of the dependent step.
        step: String,
        /// The prerequisite id that runs too late.
        dependency: String,
    },
}

impl fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDependency { step, dependency } => {
                write!(f, "step {step} depends on unknown step {dependency}")
            }
            Self::ForwardDependency { step, dependency } => {
                write!(f, "step {step} depends on step {dependency}, which runs later")
            }
        }
    }
}

/// An ordered migration plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPlan {
    /// Steps in execution order.
    pub steps: Vec<MigrationStep>,
    /// Explanation of the migration strategy.
    pub rationale: String,
}

impl MigrationPlan {
    /// Returns the number of steps.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the plan has no steps.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the steps whose `file` is not in `known_paths`.
    pub fn steps_with_unknown_files<'a>(
        &'a self,
        known_paths: &'a [&str],
    ) -> impl Iterator<Item = &'a MigrationStep> + 'a {
        self.steps
            .iter()
            .filter(move |step| !known_paths.contains(&step.file.as_str()))
    }

    /// Reports every dependency the step order fails to satisfy.
    ///
    /// A dependency is satisfied when the step it names appears strictly
    /// earlier in [`steps`](Self::steps). If an id is repeated, its first
    /// occurrence counts.
    ///
    /// # Examples
    ///
    /// ```
    /// use cs_core::{Complexity, MigrationPlan, MigrationStep, OrderViolation};
    ///
    /// let step = |id: &str, deps: &[&str]| MigrationStep {
    ///     id: id.to_owned(),
    ///     description: String::new(),
    ///     dependencies: deps.iter().map(|d| (*d).to_owned()).collect(),
    ///     complexity: Complexity::Low,
    ///     file: "a.js".to_owned(),
    /// };
    /// let plan = MigrationPlan {
    ///     steps: vec![step("1", &["2"]), step("2", &[])],
    ///     rationale: String::new(),
    /// };
    /// assert_eq!(
    ///     plan.dependency_order_violations(),
    ///     vec![OrderViolation::ForwardDependency { step: "1".into(), dependency: "2".into() }]
    /// );
    /// ```
    #[must_use]
    pub fn dependency_order_violations(&self) -> Vec<OrderViolation> {
        let mut position: FxHashMap<&str, usize> = FxHashMap::default();
        for (index, step) in self.steps.iter().enumerate() {
            position.entry(step.id.as_str()).or_insert(index);
        }

        let mut violations = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            for dependency in &step.dependencies {
                match position.get(dependency.as_str()) {
                    None => violations.push(OrderViolation::UnknownDependency {
                        step: step.id.clone(),
                        dependency: dependency.clone(),
                    }),
                    Some(&at) if at >= index => {
                        violations.push(OrderViolation::ForwardDependency {
                            step: step.id.clone(),
                            dependency: dependency.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        violations
    }
}
