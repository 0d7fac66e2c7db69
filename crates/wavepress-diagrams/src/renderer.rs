//! Rendering capability abstraction.
//!
//! The publisher only needs `description -> SVG markup`. Backends implement
//! [`DiagramRenderer`]; tests substitute their own.

use crate::description::DiagramDescription;

/// A diagram handed to a renderer.
#[derive(Debug)]
pub struct DiagramRequest<'a> {
    /// Zero-based position of the block in its document.
    pub index: usize,
    /// Human-readable title (document name and diagram number).
    pub title: String,
    /// Payload exactly as written in the document.
    pub source: &'a str,
    /// Parsed description.
    pub description: &'a DiagramDescription,
}

/// Error raised by a rendering backend.
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("invalid SVG output: {0}")]
    InvalidOutput(String),
    #[error("{0}")]
    Unavailable(String),
}

/// Converts diagram descriptions into SVG markup.
pub trait DiagramRenderer {
    /// Short backend identifier, used in messages and cache keys.
    fn name(&self) -> &str;

    /// Identity of everything besides the request that shapes the output
    /// (backend and, for remote backends, the server). Part of cache keys.
    fn cache_id(&self) -> String {
        self.name().to_owned()
    }

    /// Verify the backend can render before any work starts.
    fn check_available(&self) -> Result<(), RendererError>;

    /// Render one diagram to SVG markup.
    ///
    /// The returned markup may or may not carry an XML declaration; the
    /// publisher normalizes it.
    fn render(&self, request: &DiagramRequest<'_>) -> Result<String, RendererError>;

    /// Extra line appended to the inserted markdown reference, if any.
    fn reference_note(&self) -> Option<&str> {
        None
    }
}
