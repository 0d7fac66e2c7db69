//! WaveDrom diagram publishing for markdown documents.
//!
//! This crate turns fenced `wavedrom` code blocks into SVG files and inserts
//! an image reference after each block, so hosts that cannot run WaveDrom
//! still show the diagram:
//! - Block extraction with byte offsets into the original text
//! - Lenient payload parsing (strict JSON, then JSON5 for JavaScript-style objects)
//! - Rendering through a Kroki server, or offline placeholder cards
//! - Content-addressed render cache
//! - Offset-tracking reference splicing that never duplicates references on re-runs
//!
//! # Architecture
//!
//! The crate is organized into modules:
//! - [`block`]: Block extraction and image naming
//! - [`description`]: Payload parsing (`DiagramDescription`)
//! - [`renderer`]: `DiagramRenderer` trait at the backend seam
//! - [`kroki`]: HTTP rendering via Kroki
//! - [`placeholder`]: Offline placeholder cards
//! - [`cache`]: `CachedRenderer` decorator and cache storage
//! - [`document`]: In-memory document with insertion bookkeeping
//! - [`publisher`]: `DiagramPublisher` orchestrating documents and runs
//!
//! # Example
//!
//! ```ignore
//! use wavepress_diagrams::{DiagramPublisher, KrokiRenderer, PublisherConfig, ReferenceTemplate};
//!
//! let publisher = DiagramPublisher::new(
//!     PublisherConfig {
//!         image_dir: "wavedrom-images".to_owned(),
//!         reference: ReferenceTemplate::default(),
//!     },
//!     Box::new(KrokiRenderer::new("https://kroki.io")),
//! );
//!
//! publisher.check_dependencies()?;
//! let summary = publisher.run(&["docs/DEMO.md".into()]);
//! println!("{} images", summary.images_generated());
//! ```

pub mod block;
pub mod cache;
mod consts;
pub mod description;
pub mod document;
mod error;
pub mod kroki;
pub mod placeholder;
pub mod publisher;
pub mod renderer;

pub use block::{DiagramBlock, extract_blocks};
pub use cache::{CachedRenderer, DiagramCache, DiagramKey, FileDiagramCache, NullDiagramCache};
pub use consts::{DIAGRAM_LANGUAGE, XML_DECLARATION};
pub use description::{DescriptionError, DiagramDescription};
pub use document::{DocumentState, ReferenceTemplate, SpliceOutcome};
pub use error::{BlockError, BlockErrorKind, PublishError};
pub use kroki::KrokiRenderer;
pub use placeholder::PlaceholderRenderer;
pub use publisher::{
    DiagramPublisher, DocumentOutcome, DocumentReport, PublisherConfig, RenderedImage, RunSummary,
    ensure_output_directory, persist_image,
};
pub use renderer::{DiagramRenderer, DiagramRequest, RendererError};
