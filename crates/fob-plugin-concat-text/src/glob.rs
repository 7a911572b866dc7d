//! Glob resolution against the filesystem
//!
//! A pattern is split into a literal base directory and a wildcard remainder.
//! The base directory is walked and every regular file whose path relative
//! to the base matches the remainder is returned, sorted.
//!
//! ```text
//! /project/src/**/*.{txt,md}
//! └── base ──┘ └─ matcher ─┘
//! ```
//!
//! Symlinked directories are only followed when the pattern has no `**`.
//! Link cycles are skipped. Broken links are skipped unless the pattern
//! matches them, in which case they are returned and the read reports the
//! error.

use globset::{GlobBuilder, GlobMatcher};
use std::cmp::Ordering;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{ConcatError, Result};

const META_CHARS: &[char] = &['*', '?', '[', ']', '{', '}'];

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    base: PathBuf,
    /// `None` when the pattern has no wildcards
    matcher: Option<GlobMatcher>,
    max_depth: Option<usize>,
    match_hidden: bool,
}

impl GlobPattern {
    /// Compile a pattern
    ///
    /// `*` and `?` never cross a path separator; `**` does. Outside Windows a
    /// backslash escapes the next character.
    pub fn new(pattern: &str) -> Result<Self> {
        let normalized = if cfg!(windows) {
            pattern.replace('\\', "/")
        } else {
            pattern.to_string()
        };
        let segments: Vec<&str> = normalized.split('/').collect();

        let literal_len = segments
            .iter()
            .take_while(|segment| !segment.contains(META_CHARS))
            .count();

        if literal_len == segments.len() {
            return Ok(Self {
                pattern: pattern.to_string(),
                base: PathBuf::from(pattern),
                matcher: None,
                max_depth: Some(0),
                match_hidden: true,
            });
        }

        let base = match segments[..literal_len].join("/") {
            prefix if prefix.is_empty() && normalized.starts_with('/') => PathBuf::from("/"),
            prefix if prefix.is_empty() => PathBuf::from("."),
            prefix => PathBuf::from(prefix),
        };

        let remainder = &segments[literal_len..];
        let max_depth = if remainder.iter().any(|segment| segment.contains("**")) {
            None
        } else {
            Some(remainder.len())
        };
        let match_hidden = remainder.iter().any(|segment| segment.starts_with('.'));

        let matcher = GlobBuilder::new(&remainder.join("/"))
            .literal_separator(true)
            .backslash_escape(!cfg!(windows))
            .build()
            .map_err(|e| ConcatError::invalid_pattern(pattern, e))?
            .compile_matcher();

        Ok(Self {
            pattern: pattern.to_string(),
            base,
            matcher: Some(matcher),
            max_depth,
            match_hidden,
        })
    }

    /// Directory the walk starts from
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Walk the filesystem and collect matching files
    ///
    /// A base directory that does not exist yields no files. See
    /// [`compare_paths`] for the ordering.
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        let Some(matcher) = &self.matcher else {
            return Ok(if self.base.is_file() {
                vec![self.base.clone()]
            } else {
                Vec::new()
            });
        };

        if !self.base.is_dir() {
            return Ok(Vec::new());
        }

        // `**` never descends through links, so cycles cannot recurse forever.
        let follow_links = self.max_depth.is_some();
        let mut walker = WalkDir::new(&self.base)
            .min_depth(1)
            .follow_links(follow_links);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // Cycles always point at directories, which never match.
                Err(err) if err.loop_ancestor().is_some() => continue,
                Err(err) => {
                    let Some(path) = dangling_link_path(&err) else {
                        return Err(ConcatError::walk(&self.pattern, err));
                    };
                    if self.accepts(matcher, &path) {
                        files.push(path);
                    }
                    continue;
                }
            };

            let is_file = if entry.path_is_symlink() && !follow_links {
                // Dangling links stay candidates so the read reports them.
                std::fs::metadata(entry.path()).map_or(true, |meta| meta.is_file())
            } else {
                entry.file_type().is_file()
            };

            if is_file && self.accepts(matcher, entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort_by(|a, b| compare_paths(a, b));
        Ok(files)
    }

    fn accepts(&self, matcher: &GlobMatcher, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.base) else {
            return false;
        };

        if !self.match_hidden && is_hidden(relative) {
            return false;
        }

        matcher.is_match(relative)
    }
}

/// Path of a walk error caused by a symlink whose target is missing
fn dangling_link_path(err: &walkdir::Error) -> Option<PathBuf> {
    let path = err.path()?;

    let is_dangling = err
        .io_error()
        .is_some_and(|io| io.kind() == ErrorKind::NotFound)
        && path
            .symlink_metadata()
            .is_ok_and(|meta| meta.file_type().is_symlink());

    is_dangling.then(|| path.to_path_buf())
}

/// Case-insensitive path order with a byte-wise tie-break
///
/// `a.txt` sorts before `README.txt`; `B.txt` and `b.txt` keep a fixed order.
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    let a = a.to_string_lossy();
    let b = b.to_string_lossy();
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(&b))
}

fn is_hidden(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

/// Compile and resolve a pattern in one step
pub fn resolve_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    GlobPattern::new(pattern)?.resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn pattern(dir: &TempDir, rel: &str) -> String {
        format!("{}/{}", dir.path().display(), rel)
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_base_split() {
        let glob = GlobPattern::new("/project/src/**/*.txt").unwrap();
        assert_eq!(glob.base(), Path::new("/project/src"));

        let glob = GlobPattern::new("*.txt").unwrap();
        assert_eq!(glob.base(), Path::new("."));

        let glob = GlobPattern::new("/*.txt").unwrap();
        assert_eq!(glob.base(), Path::new("/"));
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.txt", "a");
        write(dir.path(), "src/nested/b.txt", "b");

        let files = resolve_glob(&pattern(&dir, "src/*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.txt"]);
    }

    #[test]
    fn test_globstar_recurses() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.txt", "a");
        write(dir.path(), "src/nested/b.txt", "b");
        write(dir.path(), "src/nested/c.md", "c");

        let files = resolve_glob(&pattern(&dir, "src/**/*.txt")).unwrap();
        assert_eq!(
            names(&files, dir.path()),
            vec!["src/a.txt", "src/nested/b.txt"]
        );
    }

    #[test]
    fn test_brace_alternatives() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.txt", "a");
        write(dir.path(), "src/b.md", "b");
        write(dir.path(), "src/c.css", "c");

        let files = resolve_glob(&pattern(&dir, "src/*.{txt,md}")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.txt", "src/b.md"]);
    }

    #[test]
    fn test_results_sort_case_insensitively() {
        let dir = TempDir::new().unwrap();
        for name in ["b.txt", "README.txt", "a.txt", "10.txt"] {
            write(dir.path(), &format!("src/{name}"), name);
        }

        let files = resolve_glob(&pattern(&dir, "src/*.txt")).unwrap();
        assert_eq!(
            names(&files, dir.path()),
            vec!["src/10.txt", "src/a.txt", "src/b.txt", "src/README.txt"]
        );
    }

    #[test]
    fn test_compare_paths_tie_break() {
        assert_eq!(
            compare_paths(Path::new("src/B.txt"), Path::new("src/b.txt")),
            Ordering::Less
        );
        assert_eq!(
            compare_paths(Path::new("src/a.txt"), Path::new("src/README.txt")),
            Ordering::Less
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_beside_matches_is_ignored() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.txt", "a");
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("src/link.md"))
            .unwrap();

        let files = resolve_glob(&pattern(&dir, "src/*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.txt"]);

        let files = resolve_glob(&pattern(&dir, "src/**/*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_matching_dangling_symlink_is_kept() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.txt", "a");
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("src/gone.txt"))
            .unwrap();

        let files = resolve_glob(&pattern(&dir, "src/*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.txt", "src/gone.txt"]);

        let files = resolve_glob(&pattern(&dir, "src/**/*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.txt", "src/gone.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_does_not_fail() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.txt", "a");
        write(dir.path(), "src/sub/b.txt", "b");
        std::os::unix::fs::symlink(dir.path().join("src"), dir.path().join("src/sub/loop"))
            .unwrap();

        let files = resolve_glob(&pattern(&dir, "src/**/*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.txt", "src/sub/b.txt"]);

        let files = resolve_glob(&pattern(&dir, "src/*/*")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/sub/b.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_is_matched() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "shared/notice.txt", "notice");
        write(dir.path(), "src/a.txt", "a");
        std::os::unix::fs::symlink(
            dir.path().join("shared/notice.txt"),
            dir.path().join("src/notice.txt"),
        )
        .unwrap();

        let files = resolve_glob(&pattern(&dir, "src/**/*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.txt", "src/notice.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_escapes_metacharacter() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/*.txt", "star");
        write(dir.path(), "src/a.txt", "a");

        let files = resolve_glob(&pattern(&dir, r"src/\*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/*.txt"]);
    }

    #[test]
    fn test_directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.txt", "a");
        fs::create_dir_all(dir.path().join("src/folder.txt")).unwrap();

        let files = resolve_glob(&pattern(&dir, "src/*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.txt"]);
    }

    #[test]
    fn test_hidden_files_skipped_unless_requested() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.txt", "a");
        write(dir.path(), "src/.secret.txt", "s");
        write(dir.path(), "src/.cache/b.txt", "b");

        let files = resolve_glob(&pattern(&dir, "src/**/*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.txt"]);

        let files = resolve_glob(&pattern(&dir, "src/.*.txt")).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/.secret.txt"]);
    }

    #[test]
    fn test_literal_pattern() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "LICENSE", "MIT");

        let files = resolve_glob(&pattern(&dir, "LICENSE")).unwrap();
        assert_eq!(files, vec![dir.path().join("LICENSE")]);

        let files = resolve_glob(&pattern(&dir, "MISSING")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_base_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = resolve_glob(&pattern(&dir, "nope/*.txt")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = GlobPattern::new("/project/src/[a.txt").unwrap_err();
        assert!(err.is_glob_error());
    }
}
