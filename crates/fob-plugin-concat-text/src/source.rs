//! File access abstraction
//!
//! The emit phase only needs two operations: expand a pattern and read a
//! file. [`FileSource`] puts them behind a trait so hosts can serve files
//! from somewhere other than the local disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{ConcatError, Result};
use crate::glob::resolve_glob;

/// Pattern expansion and file reads used by the concatenator
#[async_trait]
pub trait FileSource: Send + Sync + std::fmt::Debug {
    /// Expand a glob pattern into an ordered list of files
    async fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;

    /// Read the full contents of a file
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// [`FileSource`] backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFileSource;

#[async_trait]
impl FileSource for NativeFileSource {
    async fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = pattern.to_string();
        tokio::task::spawn_blocking(move || resolve_glob(&pattern)).await?
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| ConcatError::read(path, e))
    }
}
