//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! of the session workspace:
//! - No sleep() calls in the session core; timing belongs to the timer registry
//! - No blocking I/O inside async functions
//! - No unwrap()/expect() in library code
//! - The core stays free of UI and CLI dependencies
//!
//! The helpers below are shared by the tests in `tests/`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, two levels above this crate
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// A rule violation at a source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// A source file split at its test module
pub struct SourceFile {
    pub path: PathBuf,
    lines: Vec<String>,
    production_end: usize,
}

impl SourceFile {
    /// Read a source file; `None` if it cannot be read
    #[must_use]
    pub fn read(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        let production_end = lines
            .iter()
            .position(|l| l.trim_start().starts_with("#[cfg(test)]"))
            .unwrap_or(lines.len());
        Some(Self {
            path: path.to_path_buf(),
            lines,
            production_end,
        })
    }

    /// Production lines as `(index, code without trailing comment)`
    pub fn production_code(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines[..self.production_end]
            .iter()
            .enumerate()
            .filter(|(_, l)| {
                let t = l.trim_start();
                !t.starts_with("//") && !t.starts_with("///") && !t.starts_with("//!")
            })
            .map(|(i, l)| (i, l.split("//").next().unwrap_or(l)))
    }

    /// Whether the line at `idx` is inside an `async fn`
    #[must_use]
    pub fn in_async_fn(&self, idx: usize) -> bool {
        for line in self.lines[..idx].iter().rev() {
            let t = line.trim();
            if t.contains("async fn ") {
                return true;
            }
            if t.contains("fn ") && !t.contains("async") && !t.starts_with("//") {
                return false;
            }
            if t.starts_with("mod ") || (t.starts_with("impl") && t.contains('{')) {
                return false;
            }
        }
        false
    }

    /// A violation for the line at `idx`
    #[must_use]
    pub fn violation(&self, idx: usize) -> Violation {
        Violation {
            path: self.path.clone(),
            line: idx + 1,
            text: self.lines[idx].trim().to_string(),
        }
    }
}

/// Every `.rs` file under `dir`, relative to the workspace root
#[must_use]
pub fn rust_sources(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root().join(dir);
    if !root.exists() {
        return Vec::new();
    }
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .filter_map(|e| SourceFile::read(e.path()))
        .collect()
}

/// Collect violations of `rule` across production code under `dir`
pub fn scan<F>(dir: &str, mut rule: F) -> Vec<Violation>
where
    F: FnMut(&SourceFile, usize, &str) -> bool,
{
    let mut violations = Vec::new();
    for file in rust_sources(dir) {
        for (idx, code) in file.production_code() {
            if rule(&file, idx, code) {
                violations.push(file.violation(idx));
            }
        }
    }
    violations
}

/// Print violations and fail the test
///
/// # Panics
///
/// Panics when `violations` is not empty.
pub fn assert_clean(rule: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!(
        "\nFound {} violation(s): {rule}.\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn test_core_sources_found() {
        assert!(!rust_sources("session/core/src").is_empty());
    }
}
