//! File selection for staging.
//!
//! Given the application root and a list of exclusion patterns, the
//! selector produces the set of regular files to stage. Exclusions are
//! composed against the root, and a pattern naming an existing directory
//! excludes that directory's entire subtree.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AirliftError, Result, StageError};

/// Selects the files to stage from the application root.
#[derive(Debug)]
pub struct FileSelector {
    /// Application root directory.
    root: PathBuf,
    /// Compiled exclusion matcher, rooted at `root`.
    matcher: Gitignore,
}

impl FileSelector {
    /// Compiles exclusion patterns for a root directory.
    ///
    /// Each pattern is anchored at the root, matching the way a glob
    /// joined onto the root path would. A pattern whose un-globbed
    /// literal resolves to an existing directory is widened with a
    /// recursive suffix so the whole subtree is excluded.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile.
    pub fn new(root: impl Into<PathBuf>, patterns: &[String]) -> Result<Self> {
        let root = root.into();
        let mut builder = GitignoreBuilder::new(&root);

        for pattern in patterns {
            let anchored = if pattern.starts_with('/') {
                pattern.clone()
            } else {
                format!("/{pattern}")
            };

            Self::add_pattern(&mut builder, pattern, &anchored)?;

            let literal = root.join(anchored.trim_start_matches('/'));
            if literal.is_dir() {
                Self::add_pattern(&mut builder, pattern, &format!("{anchored}/**"))?;
            }
        }

        let matcher = builder.build().map_err(|e| {
            AirliftError::Stage(StageError::InvalidPattern {
                pattern: patterns.join(", "),
                message: e.to_string(),
            })
        })?;

        Ok(Self { root, matcher })
    }

    /// Adds one compiled line to the matcher builder.
    fn add_pattern(builder: &mut GitignoreBuilder, original: &str, line: &str) -> Result<()> {
        builder.add_line(None, line).map_err(|e| {
            AirliftError::Stage(StageError::InvalidPattern {
                pattern: original.to_string(),
                message: e.to_string(),
            })
        })?;
        Ok(())
    }

    /// Selects every non-excluded regular file under the root.
    ///
    /// Output is sorted, so an unchanged tree and pattern list always
    /// yield the identical set.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory tree cannot be read.
    pub fn select(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.walk(&self.root, &mut files)?;
        files.sort();

        debug!(
            "Selected {} files under {}",
            files.len(),
            self.root.display()
        );
        Ok(files)
    }

    /// Recursively collects non-excluded regular files.
    ///
    /// Excluded directories are pruned without descending.
    fn walk(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        let mut entries: Vec<_> =
            std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(std::fs::DirEntry::path);

        for entry in entries {
            let path = entry.path();
            let file_type = entry.file_type()?;

            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };

            if self.is_excluded(relative, file_type.is_dir()) {
                continue;
            }

            if file_type.is_dir() {
                self.walk(&path, files)?;
            } else if path.is_file() {
                files.push(path);
            }
        }

        Ok(())
    }

    /// Checks a root-relative path against the exclusion patterns.
    fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_selects_all_files_without_exclusions() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("index.html"));
        touch(&dir.path().join("css/site.css"));

        let selector = FileSelector::new(dir.path(), &[]).unwrap();
        let files = selector.select().unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.contains(&dir.path().join("index.html")));
        assert!(files.contains(&dir.path().join("css/site.css")));
    }

    #[test]
    fn test_directory_exclusion_removes_subtree() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("index.html"));
        touch(&dir.path().join("node_modules/pkg/index.js"));
        touch(&dir.path().join("node_modules/pkg/deep/nested.js"));

        let selector = FileSelector::new(dir.path(), &patterns(&["node_modules"])).unwrap();
        let files = selector.select().unwrap();

        assert_eq!(files, vec![dir.path().join("index.html")]);
    }

    #[test]
    fn test_glob_exclusion_removes_matching_files() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("index.html"));
        touch(&dir.path().join("debug.log"));
        touch(&dir.path().join("trace.log"));

        let selector = FileSelector::new(dir.path(), &patterns(&["*.log"])).unwrap();
        let files = selector.select().unwrap();

        assert_eq!(files, vec![dir.path().join("index.html")]);
    }

    #[test]
    fn test_exclusions_are_anchored_at_root() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("logs/today.txt"));
        touch(&dir.path().join("sub/logs/keep.txt"));

        let selector = FileSelector::new(dir.path(), &patterns(&["logs"])).unwrap();
        let files = selector.select().unwrap();

        assert_eq!(files, vec![dir.path().join("sub/logs/keep.txt")]);
    }

    #[test]
    fn test_never_returns_directory_entries() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a/b/c.txt"));
        std::fs::create_dir_all(dir.path().join("empty/dir")).unwrap();

        let selector = FileSelector::new(dir.path(), &[]).unwrap();
        let files = selector.select().unwrap();

        assert_eq!(files, vec![dir.path().join("a/b/c.txt")]);
        assert!(files.iter().all(|f| f.is_file()));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b.txt"));
        touch(&dir.path().join("a.txt"));
        touch(&dir.path().join("nested/c.txt"));

        let excludes = patterns(&["*.log", "tmp"]);
        let first = FileSelector::new(dir.path(), &excludes).unwrap().select().unwrap();
        let second = FileSelector::new(dir.path(), &excludes).unwrap().select().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_multiple_exclusions_are_set_subtraction() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("keep.html"));
        touch(&dir.path().join("drop.log"));
        touch(&dir.path().join("cache/blob.bin"));

        let forward = patterns(&["*.log", "cache"]);
        let reversed = patterns(&["cache", "*.log"]);

        let first = FileSelector::new(dir.path(), &forward).unwrap().select().unwrap();
        let second = FileSelector::new(dir.path(), &reversed).unwrap().select().unwrap();

        assert_eq!(first, vec![dir.path().join("keep.html")]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_pattern_fails() {
        let dir = tempdir().unwrap();
        let result = FileSelector::new(dir.path(), &patterns(&["a["]));
        assert!(matches!(
            result,
            Err(AirliftError::Stage(StageError::InvalidPattern { .. }))
        ));
    }
}
