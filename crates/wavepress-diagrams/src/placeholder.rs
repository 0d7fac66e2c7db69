//! Offline placeholder renderer.
//!
//! Produces a static card naming the diagram with a link that opens the
//! original source in the online WaveDrom editor. Useful when no Kroki
//! server is reachable.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use quick_xml::escape::escape;

use crate::renderer::{DiagramRenderer, DiagramRequest, RendererError};

/// Default online editor.
const DEFAULT_EDITOR_URL: &str = "https://wavedrom.com/editor.html";

/// Note appended to references that point at placeholder cards.
const PLACEHOLDER_NOTE: &str = "<sub>Click the image to open in WaveDrom Editor</sub>";

/// Renderer that draws editor-link placeholder cards instead of diagrams.
pub struct PlaceholderRenderer {
    editor_url: String,
}

impl PlaceholderRenderer {
    /// Create a placeholder renderer linking to the public WaveDrom editor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            editor_url: DEFAULT_EDITOR_URL.to_owned(),
        }
    }

    /// Link to a different editor deployment.
    #[must_use]
    pub fn editor_url(mut self, url: impl Into<String>) -> Self {
        self.editor_url = url.into();
        self
    }

    /// Editor link carrying the diagram source in its query string.
    fn link_for(&self, source: &str) -> String {
        format!(
            "{}?{}",
            self.editor_url,
            utf8_percent_encode(source, NON_ALPHANUMERIC)
        )
    }
}

impl Default for PlaceholderRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramRenderer for PlaceholderRenderer {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn check_available(&self) -> Result<(), RendererError> {
        Ok(())
    }

    fn render(&self, request: &DiagramRequest<'_>) -> Result<String, RendererError> {
        let title = escape(request.title.as_str());
        let link = self.link_for(request.source);
        let link = escape(link.as_str());

        Ok(format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="900" height="300">
  <rect width="900" height="300" fill="#f8f9fa" stroke="#dee2e6" stroke-width="2" rx="10"/>
  <text x="450" y="60" text-anchor="middle" font-family="Arial, sans-serif" font-size="24" font-weight="bold" fill="#212529">WaveDrom Timing Diagram</text>
  <text x="450" y="95" text-anchor="middle" font-family="Arial, sans-serif" font-size="16" fill="#495057">{title}</text>
  <rect x="50" y="120" width="800" height="150" fill="#ffffff" stroke="#adb5bd" stroke-width="1" rx="5"/>
  <text x="450" y="150" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="#212529">To view this timing diagram:</text>
  <text x="450" y="180" text-anchor="middle" font-family="Arial, sans-serif" font-size="13" fill="#495057">1. Click the link below to open in WaveDrom Editor</text>
  <text x="450" y="205" text-anchor="middle" font-family="Arial, sans-serif" font-size="13" fill="#495057">2. Or view the WaveDrom code block in the markdown file</text>
  <a xlink:href="{link}" target="_blank">
    <rect x="300" y="220" width="300" height="35" fill="#0d6efd" rx="5" style="cursor:pointer"/>
    <text x="450" y="243" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" font-weight="bold" fill="#ffffff">Open in WaveDrom Editor</text>
  </a>
</svg>
"##
        ))
    }

    fn reference_note(&self) -> Option<&str> {
        Some(PLACEHOLDER_NOTE)
    }
}
