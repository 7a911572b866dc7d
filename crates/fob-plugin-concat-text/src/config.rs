//! Concat-text configuration types
//!
//! [`ConcatTextOptions`] is what users write. [`BuildContext`] describes the
//! host build. [`ConcatTextOptions::resolve`] combines the two, once, into an
//! immutable [`ResolvedConcatConfig`] that the emit phase reads.

use figment::{
    providers::{Format, Json, Toml},
    Figment,
};
use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// User-facing plugin options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatTextOptions {
    /// Glob pattern of the files to concatenate (e.g. "src/**/*.txt")
    pub files: String,

    /// Directory the artifact is written to
    ///
    /// Absolute paths are made relative to the build output directory.
    /// Defaults to the build output directory.
    #[serde(
        default,
        rename = "outputPath",
        alias = "output_path",
        skip_serializing_if = "Option::is_none"
    )]
    pub output_path: Option<PathBuf>,

    /// Artifact file name
    ///
    /// Defaults to the stem of the build's output filename plus the
    /// extension of `files`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ConcatTextOptions {
    /// Create options for the given glob pattern
    pub fn new(files: impl Into<String>) -> Self {
        Self {
            files: files.into(),
            output_path: None,
            name: None,
        }
    }

    /// Set the output directory
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the artifact file name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Load options from a TOML or JSON file
    ///
    /// The format is picked from the file extension; anything other than
    /// `.json` is read as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::figment(path.as_ref()).extract()?)
    }

    /// Load options from a nested table of a TOML or JSON file
    ///
    /// `key` is a dotted path such as `plugins.concat-text`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use fob_plugin_concat_text::ConcatTextOptions;
    ///
    /// let options = ConcatTextOptions::from_file_key("fob.toml", "plugins.concat-text").unwrap();
    /// ```
    pub fn from_file_key(path: impl AsRef<Path>, key: &str) -> Result<Self> {
        Ok(Self::figment(path.as_ref()).focus(key).extract()?)
    }

    fn figment(path: &Path) -> Figment {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Figment::new().merge(Json::file(path))
        } else {
            Figment::new().merge(Toml::file(path))
        }
    }

    /// Resolve the options against the host build
    ///
    /// Fills in the `outputPath` and `name` defaults, computes the artifact
    /// target and makes the `files` pattern absolute.
    pub fn resolve(self, build: &BuildContext) -> ResolvedConcatConfig {
        let output_dir = build.absolute_output_dir();

        let name = self
            .name
            .unwrap_or_else(|| default_name(&build.output_filename, &self.files));

        let output_path = self.output_path.unwrap_or_else(|| output_dir.clone());

        let target = if output_path.is_absolute() {
            relative_path(&output_dir, &output_path.join(&name))
        } else {
            output_path.join(&name).clean()
        };

        let files = if Path::new(&self.files).is_absolute() {
            self.files
        } else {
            build
                .context_dir
                .join(&self.files)
                .clean()
                .to_string_lossy()
                .into_owned()
        };

        ResolvedConcatConfig {
            files,
            output_path,
            name,
            target: to_slash(&target),
        }
    }
}

/// Host build settings the plugin derives its defaults from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Base directory for relative `files` patterns
    pub context_dir: PathBuf,
    /// Build output directory
    pub output_dir: PathBuf,
    /// Main output filename of the build (e.g. "main.js")
    pub output_filename: String,
}

impl BuildContext {
    pub fn new(
        context_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        output_filename: impl Into<String>,
    ) -> Self {
        Self {
            context_dir: context_dir.into(),
            output_dir: output_dir.into(),
            output_filename: output_filename.into(),
        }
    }

    fn absolute_output_dir(&self) -> PathBuf {
        self.context_dir.join(&self.output_dir).clean()
    }
}

/// Fully resolved, read-only plugin configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConcatConfig {
    /// Absolute glob pattern
    pub files: String,
    /// Output directory, as configured or defaulted
    pub output_path: PathBuf,
    /// Artifact file name
    pub name: String,
    /// Artifact path relative to the build output directory, `/`-separated
    pub target: String,
}

/// Extension of the last path segment, including the dot
///
/// A leading dot does not start an extension (".gitignore" has none).
fn extname(path: &str) -> &str {
    let segment = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match segment.rfind('.') {
        Some(idx) if idx > 0 => &segment[idx..],
        _ => "",
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn is_brace_pattern(ext: &str) -> bool {
    ext.find('{')
        .is_some_and(|open| ext[open..].contains('}'))
}

fn default_name(output_filename: &str, files: &str) -> String {
    let base = basename(output_filename);
    let stem = base.strip_suffix(extname(base)).unwrap_or(base);

    let ext = extname(files);
    if is_brace_pattern(ext) {
        stem.to_string()
    } else {
        format!("{stem}{ext}")
    }
}

/// Lexical relative path from `from` to `to`
///
/// Both paths are cleaned first; no filesystem access.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = from.clean();
    let to = to.clean();

    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from_parts.len() {
        relative.push("..");
    }
    for part in &to_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
