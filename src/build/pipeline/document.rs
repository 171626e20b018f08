//! Document types for pipeline processing.

use std::path::{Path, PathBuf};

/// The Markdown file as read from disk.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Where the bytes were read from (used for derived titles and file names)
    pub path: PathBuf,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    /// Read the whole input file.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(path, bytes))
    }
}

/// The finished HTML document, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
}

impl RenderedDocument {
    pub fn as_bytes(&self) -> &[u8] {
        self.html.as_bytes()
    }
}
