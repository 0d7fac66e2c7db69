//! Publishing error types.

use std::io;
use std::path::PathBuf;

use crate::description::DescriptionError;
use crate::renderer::RendererError;

/// Run- or document-level error.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The rendering backend cannot be used; nothing should be processed.
    #[error("rendering backend '{renderer}' is unavailable: {source}")]
    MissingDependency {
        renderer: String,
        #[source]
        source: RendererError,
    },

    /// A configured document does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Creating, reading or writing a file failed.
    #[error("failed to {action} {}: {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PublishError {
    pub(crate) fn filesystem(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Single diagram failure; never aborts its document.
#[derive(Debug, thiserror::Error)]
#[error("diagram {number}: {kind}")]
pub struct BlockError {
    /// One-based diagram number within the document.
    pub number: usize,
    pub kind: BlockErrorKind,
}

/// Kind of diagram failure.
#[derive(Debug, thiserror::Error)]
pub enum BlockErrorKind {
    #[error("parse error: {0}")]
    Parse(#[from] DescriptionError),
    #[error("render failure: {0}")]
    Render(#[from] RendererError),
}
