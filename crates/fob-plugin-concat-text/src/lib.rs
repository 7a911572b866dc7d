//! Rolldown plugin that concatenates text files into a single asset
//!
//! The plugin expands a glob pattern, joins the matched files in order and
//! adds the result to the bundle output during the `generate_bundle` hook,
//! right before Rolldown writes the bundle to disk.
//!
//! ## Architecture
//!
//! ```text
//! ConcatTextOptions + BuildContext → resolve() → ResolvedConcatConfig
//!                                                  ↓
//! generate_bundle → glob(files) → read + join → OutputAsset at `target`
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_plugin_concat_text::{BuildContext, ConcatTextOptions, FobConcatTextPlugin};
//! use std::sync::Arc;
//!
//! let build = BuildContext::new(".", "dist", "main.js");
//! let options = ConcatTextOptions::new("licenses/*.txt").with_name("LICENSES.txt");
//!
//! // Use with your Rolldown bundler configuration
//! let plugin = Arc::new(FobConcatTextPlugin::new(options, &build));
//! ```

use rolldown_common::Output;
use rolldown_plugin::{HookGenerateBundleArgs, HookNoopReturn, HookUsage, Plugin, PluginContext};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod artifact;
mod config;
mod error;
pub mod glob;
mod source;

pub use artifact::{ConcatArtifact, SEPARATOR};
pub use config::{BuildContext, ConcatTextOptions, ResolvedConcatConfig};
pub use error::{ConcatError, Result};
pub use source::{FileSource, NativeFileSource};

/// Plugin name reported to Rolldown
pub const PLUGIN_NAME: &str = "fob-concat-text";

/// Resolved concatenation job
///
/// Holds the immutable configuration and the file source; every call to
/// [`ConcatText::render`] re-reads the filesystem.
#[derive(Debug, Clone)]
pub struct ConcatText {
    config: ResolvedConcatConfig,
    source: Arc<dyn FileSource>,
}

impl ConcatText {
    /// Resolve `options` against `build` using the local filesystem
    pub fn new(options: ConcatTextOptions, build: &BuildContext) -> Self {
        Self::with_source(options, build, Arc::new(NativeFileSource))
    }

    /// Resolve `options` against `build` with a custom file source
    pub fn with_source(
        options: ConcatTextOptions,
        build: &BuildContext,
        source: Arc<dyn FileSource>,
    ) -> Self {
        let config = options.resolve(build);
        debug!(
            "[{}] files={} target={}",
            PLUGIN_NAME, config.files, config.target
        );
        Self { config, source }
    }

    pub fn config(&self) -> &ResolvedConcatConfig {
        &self.config
    }

    /// Glob and join the files without touching any bundle
    pub async fn render(&self) -> Result<ConcatArtifact> {
        let files = self.source.glob(&self.config.files).await?;

        if files.is_empty() {
            warn!(
                "[{}] No files match '{}', emitting an empty {}",
                PLUGIN_NAME, self.config.files, self.config.target
            );
        } else {
            debug!(
                "[{}] {} file(s) match '{}'",
                PLUGIN_NAME,
                files.len(),
                self.config.files
            );
        }

        ConcatArtifact::concatenate(self.source.as_ref(), self.config.target.clone(), files).await
    }

    /// Render the artifact and register it in `bundle`
    ///
    /// The bundle is only modified when every file was read successfully.
    pub async fn emit_into(&self, bundle: &mut Vec<Output>) -> Result<()> {
        let artifact = self.render().await?;

        info!(
            "[{}] Emitted {} ({} file(s), {} bytes)",
            PLUGIN_NAME,
            artifact.target,
            artifact.files.len(),
            artifact.content.len()
        );

        artifact.register(bundle, &self.config.name);
        Ok(())
    }
}

/// Rolldown plugin that emits the concatenation of globbed text files
///
/// # Architecture
///
/// Options are resolved once at construction. The `generate_bundle` hook
/// then globs, reads and registers a fresh asset on every build.
#[derive(Debug, Clone)]
pub struct FobConcatTextPlugin {
    concat: ConcatText,
}

impl FobConcatTextPlugin {
    /// Create a plugin that reads from the local filesystem
    ///
    /// # Example
    ///
    /// ```rust
    /// use fob_plugin_concat_text::{BuildContext, ConcatTextOptions, FobConcatTextPlugin};
    ///
    /// let build = BuildContext::new("/project", "/project/dist", "main.js");
    /// let plugin = FobConcatTextPlugin::new(ConcatTextOptions::new("src/*.txt"), &build);
    /// assert_eq!(plugin.config().target, "main.txt");
    /// ```
    pub fn new(options: ConcatTextOptions, build: &BuildContext) -> Self {
        Self {
            concat: ConcatText::new(options, build),
        }
    }

    /// Create a plugin with a custom [`FileSource`]
    pub fn with_source(
        options: ConcatTextOptions,
        build: &BuildContext,
        source: Arc<dyn FileSource>,
    ) -> Self {
        Self {
            concat: ConcatText::with_source(options, build, source),
        }
    }

    pub fn config(&self) -> &ResolvedConcatConfig {
        self.concat.config()
    }

    /// The concatenation job driven by the hook
    pub fn concat(&self) -> &ConcatText {
        &self.concat
    }
}

impl Plugin for FobConcatTextPlugin {
    fn name(&self) -> Cow<'static, str> {
        PLUGIN_NAME.into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::GenerateBundle
    }

    /// Emit the concatenated asset into the bundle
    ///
    /// Glob and read failures are returned to Rolldown unchanged and no
    /// asset is added.
    fn generate_bundle(
        &self,
        _ctx: &PluginContext,
        args: &mut HookGenerateBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let concat = self.concat.clone();

        async move {
            concat.emit_into(args.bundle).await?;
            Ok(())
        }
    }
}
