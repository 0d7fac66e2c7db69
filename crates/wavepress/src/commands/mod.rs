//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod generate;

pub(crate) use check::CheckArgs;
pub(crate) use generate::GenerateArgs;

use wavepress_config::{Config, RendererBackend};
use wavepress_diagrams::{
    CachedRenderer, DiagramPublisher, DiagramRenderer, FileDiagramCache, KrokiRenderer,
    PlaceholderRenderer, PublishError, PublisherConfig, ReferenceTemplate,
};

use crate::output::Output;

/// Create the configured rendering backend, cached unless disabled.
pub(crate) fn build_renderer(config: &Config) -> Box<dyn DiagramRenderer> {
    let renderer: Box<dyn DiagramRenderer> = match config.renderer.backend {
        RendererBackend::Kroki => Box::new(
            KrokiRenderer::new(config.renderer.kroki_url.as_str())
                .timeout(config.renderer.timeout()),
        ),
        RendererBackend::Placeholder => Box::new(PlaceholderRenderer::new()),
    };

    if !config.cache_resolved.enabled {
        return renderer;
    }
    Box::new(CachedRenderer::new(
        renderer,
        Box::new(FileDiagramCache::new(config.cache_resolved.dir.clone())),
    ))
}

/// Create a publisher writing into `<document dir>/<image_dir>`.
pub(crate) fn build_publisher(config: &Config) -> DiagramPublisher {
    let publisher_config = PublisherConfig {
        image_dir: config.docs_resolved.image_dir.clone(),
        reference: ReferenceTemplate::new(
            config.reference.caption.as_str(),
            config.reference.alt.as_str(),
        ),
    };
    DiagramPublisher::new(publisher_config, build_renderer(config))
}

/// Short description of the backend for console output.
pub(crate) fn describe_backend(config: &Config) -> String {
    let backend = config.renderer.backend;
    match backend {
        RendererBackend::Kroki => format!("{} ({})", backend.as_str(), config.renderer.kroki_url),
        RendererBackend::Placeholder => format!("{} (offline)", backend.as_str()),
    }
}

/// Installation hints shown when the backend check fails.
fn backend_guidance(backend: RendererBackend) -> &'static [&'static str] {
    match backend {
        RendererBackend::Kroki => &[
            "- start one locally: docker run -d -p 8000:8000 yuzutech/kroki",
            "  and run again with --kroki-url http://localhost:8000",
            "- or pass --placeholder to generate offline editor-link cards",
        ],
        RendererBackend::Placeholder => &[],
    }
}

/// Run the dependency check, printing installation guidance on failure.
///
/// The error itself is returned for the caller to report.
pub(crate) fn ensure_backend(
    publisher: &DiagramPublisher,
    config: &Config,
    output: &Output,
) -> Result<(), PublishError> {
    let Err(err) = publisher.check_dependencies() else {
        return Ok(());
    };

    let guidance = backend_guidance(config.renderer.backend);
    if !guidance.is_empty() {
        output.info("WaveDrom diagrams are rendered by a Kroki server. Either:");
        for line in guidance {
            output.detail(line);
        }
        output.info("");
    }
    Err(err)
}
