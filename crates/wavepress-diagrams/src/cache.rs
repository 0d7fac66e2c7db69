//! Content-addressed render cache.
//!
//! [`CachedRenderer`] wraps any [`DiagramRenderer`] and stores its SVG output
//! keyed by a SHA-256 of everything that affects the result. Re-running over
//! unchanged documents then needs no network round-trips. Cache failures are
//! never fatal.

use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::consts::{DIAGRAM_LANGUAGE, IMAGE_EXTENSION};
use crate::renderer::{DiagramRenderer, DiagramRequest, RendererError};

/// Diagram parameters for cache key computation.
#[derive(Debug)]
pub struct DiagramKey<'a> {
    /// Diagram source as written in the document.
    pub source: &'a str,
    /// Renderer cache identity (e.g., "kroki:https://kroki.io").
    pub renderer: &'a str,
    /// Diagram title (placeholder cards embed it).
    pub title: &'a str,
}

impl DiagramKey<'_> {
    /// Compute a content hash for this diagram key.
    ///
    /// SHA-256 of `"wavedrom:svg:{renderer}:{title}:{source}"`, hex encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!(
            "{DIAGRAM_LANGUAGE}:{IMAGE_EXTENSION}:{}:{}:{}",
            self.renderer, self.title, self.source
        );
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Storage for rendered SVG markup.
pub trait DiagramCache {
    /// Retrieve cached markup for `hash`.
    fn get(&self, hash: &str) -> Option<String>;

    /// Store markup for `hash`, overwriting any previous entry.
    fn set(&self, hash: &str, svg: &str);
}

/// No-op cache (always misses).
pub struct NullDiagramCache;

impl DiagramCache for NullDiagramCache {
    fn get(&self, _hash: &str) -> Option<String> {
        None
    }

    fn set(&self, _hash: &str, _svg: &str) {}
}

/// File-based cache storing `{root}/diagrams/{hash}.svg`.
pub struct FileDiagramCache {
    dir: PathBuf,
}

impl FileDiagramCache {
    /// Create a cache rooted at `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            dir: root.join("diagrams"),
        }
    }

    fn entry_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}.{IMAGE_EXTENSION}"))
    }
}

impl DiagramCache for FileDiagramCache {
    fn get(&self, hash: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(hash)).ok()
    }

    fn set(&self, hash: &str, svg: &str) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::debug!(error = %e, "Failed to create diagram cache directory");
            return;
        }
        if let Err(e) = fs::write(self.entry_path(hash), svg) {
            tracing::debug!(error = %e, "Failed to write diagram cache entry");
        }
    }
}

/// Renderer decorator that consults a [`DiagramCache`] first.
pub struct CachedRenderer {
    inner: Box<dyn DiagramRenderer>,
    cache: Box<dyn DiagramCache>,
}

impl CachedRenderer {
    /// Wrap `inner` with `cache`.
    #[must_use]
    pub fn new(inner: Box<dyn DiagramRenderer>, cache: Box<dyn DiagramCache>) -> Self {
        Self { inner, cache }
    }
}

impl DiagramRenderer for CachedRenderer {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn cache_id(&self) -> String {
        self.inner.cache_id()
    }

    fn check_available(&self) -> Result<(), RendererError> {
        self.inner.check_available()
    }

    fn render(&self, request: &DiagramRequest<'_>) -> Result<String, RendererError> {
        let renderer = self.inner.cache_id();
        let hash = DiagramKey {
            source: request.source,
            renderer: &renderer,
            title: &request.title,
        }
        .compute_hash();

        if let Some(svg) = self.cache.get(&hash) {
            tracing::debug!(title = %request.title, hash = %hash, "Diagram cache hit");
            return Ok(svg);
        }

        let svg = self.inner.render(request)?;
        self.cache.set(&hash, &svg);
        Ok(svg)
    }

    fn reference_note(&self) -> Option<&str> {
        self.inner.reference_note()
    }
}
