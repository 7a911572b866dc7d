//! Concatenated artifact and its registration in the bundle output

use rolldown_common::{Output, OutputAsset, StrOrBytes};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::source::FileSource;

/// Separator inserted between consecutive files
pub const SEPARATOR: u8 = b'\n';

/// The joined contents of every matched file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatArtifact {
    /// Output path relative to the build output directory
    pub target: String,
    /// Source files, in concatenation order
    pub files: Vec<PathBuf>,
    /// Joined bytes
    pub content: Vec<u8>,
}

impl ConcatArtifact {
    /// Read `files` in order and join them
    ///
    /// Stops at the first file that cannot be read.
    pub async fn concatenate(
        source: &dyn FileSource,
        target: impl Into<String>,
        files: Vec<PathBuf>,
    ) -> Result<Self> {
        let mut content = Vec::new();
        for (index, path) in files.iter().enumerate() {
            let bytes = source.read(path).await?;
            if index > 0 {
                content.push(SEPARATOR);
            }
            content.extend_from_slice(&bytes);
        }

        Ok(Self {
            target: target.into(),
            files,
            content,
        })
    }

    /// Convert into a rolldown asset keyed by `target`
    ///
    /// UTF-8 content is kept as text, anything else as raw bytes.
    pub fn into_output(self, name: &str) -> Output {
        let source = match String::from_utf8(self.content) {
            Ok(text) => StrOrBytes::Str(text),
            Err(e) => StrOrBytes::Bytes(e.into_bytes()),
        };

        let asset = OutputAsset {
            names: vec![name.to_string()],
            original_file_names: self
                .files
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect(),
            filename: self.target.into(),
            source,
        };
        Output::Asset(Arc::new(asset))
    }

    /// Store the artifact in the bundle, replacing any output with the same filename
    pub fn register(self, bundle: &mut Vec<Output>, name: &str) {
        let target = self.target.clone();
        bundle.retain(|output| output.filename() != target);
        bundle.push(self.into_output(name));
    }
}
