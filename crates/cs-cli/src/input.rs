//! Loading migration requests from disk.
//!
//! `--input` is either a JSON request file (`{"files": [...],
//! "targetFramework": "..."}`) or a directory. Directories are walked with
//! the `ignore` crate, so `.gitignore` rules, hidden files and the usual
//! build/vendor directories are skipped.

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{WrapErr, eyre};
use cs_core::{MigrationRequest, SourceFile};
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

/// Directories never treated as migration input.
const SKIP_DIRECTORIES: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "target",
    ".git",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
    ".next",
    ".nuxt",
];

/// Collects source files under a root directory.
///
/// Paths in the result are relative to the root, use `/` separators, and
/// come out sorted.
#[derive(Debug)]
pub struct SourceWalker {
    root: Utf8PathBuf,
    extensions: Vec<String>,
}

impl SourceWalker {
    /// Creates a walker over `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` doesn't exist or isn't a directory.
    pub fn new(root: &Utf8Path) -> color_eyre::Result<Self> {
        if !root.exists() {
            return Err(eyre!("Input path does not exist: {root}"));
        }
        if !root.is_dir() {
            return Err(eyre!("Input path is not a directory: {root}"));
        }

        Ok(Self {
            root: root.to_owned(),
            extensions: Vec::new(),
        })
    }

    /// Restricts the walk to files with these extensions (leading dots are
    /// ignored). An empty list accepts every file.
    #[must_use]
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_owned())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    /// Reads every matching file.
    ///
    /// Empty files and files that aren't UTF-8 text are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error if traversal fails, a path isn't UTF-8, or a file
    /// can't be read.
    pub fn collect_files(&self) -> color_eyre::Result<Vec<SourceFile>> {
        let mut files = Vec::new();

        for result in self.build_walker() {
            let entry = result.wrap_err("Failed to walk input directory")?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = Utf8Path::from_path(entry.path())
                .ok_or_else(|| eyre!("Path is not valid UTF-8: {}", entry.path().display()))?;
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            if self.should_skip_path(relative) || !self.has_wanted_extension(relative) {
                continue;
            }

            let bytes = std::fs::read(path).wrap_err_with(|| format!("Failed to read {path}"))?;
            let Ok(content) = String::from_utf8(bytes) else {
                warn!(path = %relative, "Skipping file that is not UTF-8 text");
                continue;
            };
            if content.trim().is_empty() {
                warn!(path = %relative, "Skipping empty file");
                continue;
            }

            debug!(path = %relative, bytes = content.len(), "Collected input file");
            files.push(SourceFile::new(to_slash(relative), content));
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            .standard_filters(true)
            .follow_links(false)
            .require_git(false)
            .build()
    }

    fn has_wanted_extension(&self, path: &Utf8Path) -> bool {
        self.extensions.is_empty()
            || path
                .extension()
                .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }

    #[allow(clippy::unused_self)]
    fn should_skip_path(&self, relative: &Utf8Path) -> bool {
        relative
            .components()
            .any(|component| SKIP_DIRECTORIES.contains(&component.as_str()))
    }
}

/// Joins path components with `/` whatever the platform separator.
fn to_slash(path: &Utf8Path) -> String {
    path.components()
        .map(|component| component.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds a request from `--input` and the related flags.
///
/// For a request file, `target` and `source` override the values in the
/// file. For a directory, `target` is required.
///
/// # Errors
///
/// Returns an error if the input can't be read or parsed, or if no target
/// platform is known.
pub fn load_request(
    input: &Utf8Path,
    target: Option<&str>,
    source: Option<&str>,
    extensions: &[String],
) -> color_eyre::Result<MigrationRequest> {
    let mut request = if input.is_dir() {
        let files = SourceWalker::new(input)?
            .with_extensions(extensions)
            .collect_files()?;
        let target = target
            .ok_or_else(|| eyre!("--target is required when --input is a directory"))?;
        info!(root = %input, files = files.len(), "Collected input files");
        MigrationRequest::new(files, target)
    } else {
        let text = std::fs::read_to_string(input)
            .wrap_err_with(|| format!("Failed to read request file {input}"))?;
        let mut request: MigrationRequest = serde_json::from_str(&text)
            .wrap_err_with(|| format!("Failed to parse request file {input}"))?;
        if let Some(target) = target {
            target.clone_into(&mut request.target_framework);
        }
        info!(path = %input, files = request.files.len(), "Loaded request file");
        request
    };

    if let Some(source) = source {
        request.source_framework = Some(source.to_owned());
    }
    Ok(request)
}
