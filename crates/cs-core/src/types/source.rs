//! Input files and the migration request.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// A source file submitted for migration.
///
/// `path` is the unique key for the file across a whole pipeline run; plan
/// steps and migrated outputs refer back to it by exact string equality.
///
/// # Examples
///
/// ```
/// use cs_core::SourceFile;
///
/// let file = SourceFile::new("utils/math.js", "function add(a, b) { return a + b; }");
/// assert_eq!(file.path, "utils/math.js");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path of the file, as given by the caller.
    pub path: String,
    /// Full file content.
    pub content: String,
}

impl SourceFile {
    /// Creates a new source file.
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A complete migration request: the files plus the platform to migrate to.
///
/// Serialized in camelCase so request files share the shape of the original
/// HTTP body (`{"files": [...], "targetFramework": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRequest {
    /// Files to migrate.
    pub files: Vec<SourceFile>,

    /// Free-text target platform (e.g. `"Python"`, `"FastAPI"`).
    pub target_framework: String,

    /// Optional hint describing the platform the files come from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_framework: Option<String>,
}

impl MigrationRequest {
    /// Creates a request without a source platform hint.
    #[must_use]
    pub fn new(files: Vec<SourceFile>, target_framework: impl Into<String>) -> Self {
        Self {
            files,
            target_framework: target_framework.into(),
            source_framework: None,
        }
    }

    /// Checks the request before any generation call is made.
    ///
    /// # Errors
    ///
    /// Returns the first [`RequestError`] found, checking in this order: file
    /// list non-empty, then per file (in order) path non-empty, content
    /// non-empty and path unique, then target non-empty.
    pub fn validate(&self) -> Result<(), RequestError> {
        validate_files(&self.files)?;
        if self.target_framework.trim().is_empty() {
            return Err(RequestError::EmptyTarget);
        }
        Ok(())
    }
}

/// Validates a file list on its own.
///
/// # Errors
///
/// See [`MigrationRequest::validate`].
fn validate_files(files: &[SourceFile]) -> Result<(), RequestError> {
    if files.is_empty() {
        return Err(RequestError::NoFiles);
    }

    let mut seen = FxHashSet::default();
    for (index, file) in files.iter().enumerate() {
        if file.path.is_empty() {
            return Err(RequestError::EmptyPath { index });
        }
        if file.content.is_empty() {
            return Err(RequestError::EmptyContent {
                path: file.path.clone(),
            });
        }
        if !seen.insert(file.path.as_str()) {
            return Err(RequestError::DuplicatePath(file.path.clone()));
        }
    }
    Ok(())
}
