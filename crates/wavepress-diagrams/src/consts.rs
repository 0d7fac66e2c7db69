//! Internal constants for diagram publishing.

use std::time::Duration;

/// Info string that marks a fenced block as a WaveDrom diagram.
pub const DIAGRAM_LANGUAGE: &str = "wavedrom";

/// Declaration prepended to every generated SVG file.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;

/// Suffix stripped from document names when naming images.
pub const DOCUMENT_SUFFIX: &str = ".md";

/// Extension of generated images.
pub const IMAGE_EXTENSION: &str = "svg";

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
