//! Document-level orchestration.
//!
//! [`DiagramPublisher`] turns every WaveDrom block of a document into an SVG
//! file and splices an image reference after the block. Images go to the
//! image folder beside their document, so the `./<image_dir>/<file>`
//! reference resolves from every document and same-named documents in
//! different folders never share a file. Processing is sequential:
//! documents one at a time, blocks in source order.
//!
//! Failures are contained at the smallest unit: a bad block is skipped, a
//! missing or unwritable document is reported, and the run always reaches
//! the next document.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::block::{
    DiagramBlock, diagram_title, document_base_name, extract_blocks, image_file_name,
};
use crate::consts::XML_DECLARATION;
use crate::description::DiagramDescription;
use crate::document::{DocumentState, ReferenceTemplate, SpliceOutcome};
use crate::error::{BlockError, PublishError};
use crate::renderer::{DiagramRenderer, DiagramRequest};

/// Where images go and how references look.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Image folder relative to each document, as written in references
    /// (`./<image_dir>/<file>`).
    pub image_dir: String,
    /// Reference fragment template.
    pub reference: ReferenceTemplate,
}

/// An SVG ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// File name inside the output directory.
    pub file_name: String,
    /// SVG markup including the XML declaration.
    pub svg: String,
}

/// What happened to one document.
#[derive(Debug, Default)]
pub struct DocumentReport {
    /// Document path.
    pub path: PathBuf,
    /// Image folder of this document.
    pub output_dir: PathBuf,
    /// WaveDrom blocks found.
    pub blocks_found: usize,
    /// Image files written, in block order.
    pub images: Vec<String>,
    /// Blocks that were skipped.
    pub failures: Vec<BlockError>,
    /// References newly inserted.
    pub references_inserted: usize,
    /// Older references rewritten in place.
    pub references_replaced: usize,
    /// Whether the document was rewritten.
    pub updated: bool,
}

/// Per-document result of a run.
#[derive(Debug)]
pub enum DocumentOutcome {
    /// The document was scanned (possibly with skipped blocks).
    Processed(DocumentReport),
    /// The document does not exist.
    Skipped { path: PathBuf, reason: PublishError },
    /// The document could not be completed.
    Failed { path: PathBuf, error: PublishError },
}

impl DocumentOutcome {
    /// Document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Processed(report) => &report.path,
            Self::Skipped { path, .. } | Self::Failed { path, .. } => path,
        }
    }
}

/// Result of [`DiagramPublisher::run`].
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One outcome per requested document, in order.
    pub outcomes: Vec<DocumentOutcome>,
}

impl RunSummary {
    /// Total images written.
    #[must_use]
    pub fn images_generated(&self) -> usize {
        self.reports().map(|r| r.images.len()).sum()
    }

    /// Documents rewritten.
    #[must_use]
    pub fn documents_updated(&self) -> usize {
        self.reports().filter(|r| r.updated).count()
    }

    /// Blocks skipped because of parse or render failures.
    #[must_use]
    pub fn block_failures(&self) -> usize {
        self.reports().map(|r| r.failures.len()).sum()
    }

    /// Documents that were skipped or failed.
    #[must_use]
    pub fn documents_not_processed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o, DocumentOutcome::Processed(_)))
            .count()
    }

    /// Image folders that received files, in first-use order.
    #[must_use]
    pub fn image_dirs(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = Vec::new();
        for report in self.reports().filter(|r| !r.images.is_empty()) {
            if !dirs.contains(&report.output_dir.as_path()) {
                dirs.push(&report.output_dir);
            }
        }
        dirs
    }

    fn reports(&self) -> impl Iterator<Item = &DocumentReport> {
        self.outcomes.iter().filter_map(|o| match o {
            DocumentOutcome::Processed(report) => Some(report),
            _ => None,
        })
    }
}

/// Create `path` (and parents) if absent.
///
/// Returns `true` if the directory was created by this call.
pub fn ensure_output_directory(path: &Path) -> Result<bool, PublishError> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path)
        .map_err(|e| PublishError::filesystem("create directory", path, e))?;
    Ok(true)
}

/// Write `image` into `output_dir`, overwriting an existing file.
pub fn persist_image(
    image: &RenderedImage,
    output_dir: &Path,
) -> Result<PathBuf, PublishError> {
    let path = output_dir.join(&image.file_name);
    fs::write(&path, &image.svg).map_err(|e| PublishError::filesystem("write", &path, e))?;
    Ok(path)
}

/// Replace any declaration the renderer emitted with the standard one.
fn with_xml_declaration(svg: &str) -> String {
    let mut body = svg.trim_start();
    if body.starts_with("<?xml")
        && let Some(end) = body.find("?>")
    {
        body = body[end + 2..].trim_start();
    }
    format!("{XML_DECLARATION}\n{body}")
}

/// Converts WaveDrom blocks into image files and markdown references.
pub struct DiagramPublisher {
    config: PublisherConfig,
    renderer: Box<dyn DiagramRenderer>,
}

impl DiagramPublisher {
    /// Create a publisher.
    ///
    /// The renderer's reference note, if any, is added to the template.
    #[must_use]
    pub fn new(config: PublisherConfig, renderer: Box<dyn DiagramRenderer>) -> Self {
        let mut config = config;
        if config.reference.note.is_none() {
            config.reference = config.reference.with_note(renderer.reference_note());
        }
        Self { config, renderer }
    }

    /// Publisher configuration.
    #[must_use]
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Name of the rendering backend.
    #[must_use]
    pub fn renderer_name(&self) -> &str {
        self.renderer.name()
    }

    /// Verify the rendering backend before any file is touched.
    pub fn check_dependencies(&self) -> Result<(), PublishError> {
        self.renderer
            .check_available()
            .map_err(|source| PublishError::MissingDependency {
                renderer: self.renderer.name().to_owned(),
                source,
            })
    }

    /// Render one block of the document named `base_name`.
    pub fn render_block(
        &self,
        base_name: &str,
        block: &DiagramBlock<'_>,
    ) -> Result<RenderedImage, BlockError> {
        let number = block.number();
        let description = DiagramDescription::parse(block.payload).map_err(|e| BlockError {
            number,
            kind: e.into(),
        })?;

        let request = DiagramRequest {
            index: block.sequence_index,
            title: diagram_title(base_name, number),
            source: block.payload,
            description: &description,
        };
        let svg = self.renderer.render(&request).map_err(|e| BlockError {
            number,
            kind: e.into(),
        })?;

        Ok(RenderedImage {
            file_name: image_file_name(base_name, block),
            svg: with_xml_declaration(&svg),
        })
    }

    /// Image folder for the document at `document`.
    #[must_use]
    pub fn output_dir_for(&self, document: &Path) -> PathBuf {
        document
            .parent()
            .unwrap_or(Path::new(""))
            .join(&self.config.image_dir)
    }

    /// Reference path written into documents for `file_name`.
    #[must_use]
    pub fn relative_image_path(&self, file_name: &str) -> String {
        format!("./{}/{file_name}", self.config.image_dir)
    }

    /// Place the reference fragment for `relative_path` after `block`.
    pub fn splice_reference(
        &self,
        state: &mut DocumentState,
        block: &DiagramBlock<'_>,
        relative_path: &str,
    ) -> SpliceOutcome {
        state.splice(block, &self.config.reference, relative_path)
    }

    /// Process one document.
    ///
    /// # Errors
    ///
    /// - [`PublishError::FileNotFound`] if the document does not exist.
    /// - [`PublishError::Filesystem`] if the document cannot be read or
    ///   written, or an image cannot be stored. The document is left
    ///   untouched in that case.
    pub fn process_document(&self, path: &Path) -> Result<DocumentReport, PublishError> {
        let original = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PublishError::FileNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(PublishError::filesystem("read", path, e)),
        };

        let output_dir = self.output_dir_for(path);
        let mut report = DocumentReport {
            path: path.to_path_buf(),
            output_dir: output_dir.clone(),
            ..DocumentReport::default()
        };

        let blocks = extract_blocks(&original);
        report.blocks_found = blocks.len();
        if blocks.is_empty() {
            tracing::info!(path = %path.display(), "No WaveDrom blocks found");
            return Ok(report);
        }
        tracing::info!(
            path = %path.display(),
            count = blocks.len(),
            "Found WaveDrom diagrams"
        );

        let base_name = document_base_name(path);
        let mut state = DocumentState::new(original.clone());
        let mut output_ready = false;

        for block in &blocks {
            let image = match self.render_block(&base_name, block) {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping diagram");
                    report.failures.push(e);
                    continue;
                }
            };

            if !output_ready {
                if ensure_output_directory(&output_dir)? {
                    tracing::info!(dir = %output_dir.display(), "Created image directory");
                }
                output_ready = true;
            }

            persist_image(&image, &output_dir)?;
            tracing::info!(file = %image.file_name, "Generated image");

            let relative_path = self.relative_image_path(&image.file_name);
            match self.splice_reference(&mut state, block, &relative_path) {
                SpliceOutcome::Inserted => report.references_inserted += 1,
                SpliceOutcome::Replaced => report.references_replaced += 1,
                SpliceOutcome::AlreadyPresent => {}
            }
            report.images.push(image.file_name);
        }

        if state.is_modified() {
            fs::write(path, state.content())
                .map_err(|e| PublishError::filesystem("write", path, e))?;
            report.updated = true;
            tracing::info!(path = %path.display(), "Updated markdown file");
        }

        Ok(report)
    }

    /// Process every document in order.
    ///
    /// One document failing never stops the others.
    pub fn run(&self, files: &[PathBuf]) -> RunSummary {
        let mut summary = RunSummary::default();

        for path in files {
            let outcome = match self.process_document(path) {
                Ok(report) => DocumentOutcome::Processed(report),
                Err(reason @ PublishError::FileNotFound(_)) => {
                    tracing::warn!(path = %path.display(), "File not found");
                    DocumentOutcome::Skipped {
                        path: path.clone(),
                        reason,
                    }
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = %error, "Document failed");
                    DocumentOutcome::Failed {
                        path: path.clone(),
                        error,
                    }
                }
            };
            summary.outcomes.push(outcome);
        }

        summary
    }
}
