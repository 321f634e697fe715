use crate::error::Result;
use globset::{GlobBuilder, GlobMatcher};
use log::debug;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Characters that start a glob construct; a path component containing any of
/// them ends the static prefix of a pattern.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// File scanner resolving glob patterns into module files.
///
/// Patterns are resolved against the scanner's root (normally the working
/// directory). Each pattern is compiled with `globset`, and only the static
/// directory prefix of the pattern is walked, so `src/controllers/**/*.rs`
/// never visits anything outside `src/controllers`.
///
/// # Example
///
/// ```no_run
/// use openapi_assembler::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from(".")).with_extensions(&["json", "yaml"]);
/// let files = scanner.discover(&["schemas/*.json, schemas/*.yaml"]).unwrap();
/// println!("Found {} schema files", files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    extensions: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` resolving relative patterns against `root_path`.
    ///
    /// Without [`with_extensions`](Self::with_extensions) every regular file
    /// that matches a pattern is accepted.
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            extensions: Vec::new(),
        }
    }

    /// Restricts discovery to files with one of the given extensions.
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_ascii_lowercase()).collect();
        self
    }

    /// Splits a list of pattern arguments on commas, dropping blanks.
    ///
    /// Commas inside `{a,b}` alternations or `[...]` classes belong to the
    /// pattern and do not split it.
    pub fn split_patterns<S: AsRef<str>>(patterns: &[S]) -> Vec<String> {
        patterns
            .iter()
            .flat_map(|p| split_top_level(p.as_ref()))
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Resolves the patterns into an ordered, de-duplicated list of absolute file paths.
    ///
    /// Results follow pattern order, and within one pattern the walk order
    /// (entries sorted by file name). A pattern whose static prefix does not
    /// exist simply matches nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob or a directory under
    /// a pattern's prefix cannot be read.
    pub fn discover<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut seen = HashSet::new();

        for pattern in Self::split_patterns(patterns) {
            let absolute = self.absolutize(&pattern);
            let matcher = compile(&absolute)?;
            let base = static_prefix(&absolute);
            debug!("Pattern '{}' walks {}", pattern, base.display());

            if !base.exists() {
                debug!("Nothing to scan for '{}': {} does not exist", pattern, base.display());
                continue;
            }

            for entry in WalkDir::new(&base).sort_by_file_name() {
                let entry = entry?;
                let path = entry.path();

                if !path.is_file() || !matcher.is_match(path) || !self.accepts(path) {
                    continue;
                }
                if seen.insert(path.to_path_buf()) {
                    files.push(path.to_path_buf());
                }
            }
        }

        debug!("Discovered {} files", files.len());
        Ok(files)
    }

    fn absolutize(&self, pattern: &str) -> PathBuf {
        let path = Path::new(pattern);
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_path.join(path)
        };
        // `./` segments would never match walked paths
        joined
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

fn compile(pattern: &Path) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(&pattern.to_string_lossy())
        .literal_separator(true)
        .build()?;
    Ok(glob.compile_matcher())
}

/// Longest leading run of path components free of glob syntax.
fn static_prefix(pattern: &Path) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in pattern.components() {
        if component.as_os_str().to_string_lossy().contains(GLOB_META) {
            break;
        }
        prefix.push(component);
    }
    prefix
}

/// Splits on commas outside of `{...}` and `[...]`.
fn split_top_level(pattern: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_class = false;
    let mut start = 0;

    for (i, c) in pattern.char_indices() {
        match c {
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => depth += 1,
            '}' if !in_class => depth = depth.saturating_sub(1),
            ',' if depth == 0 && !in_class => {
                parts.push(&pattern[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&pattern[start..]);
    parts
}
