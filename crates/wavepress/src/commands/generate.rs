//! `wavepress generate` command implementation.

use std::path::PathBuf;

use clap::Args;
use wavepress_config::{CliSettings, Config, RendererBackend};
use wavepress_diagrams::{DocumentOutcome, DocumentReport, RunSummary};

use super::{build_publisher, describe_backend, ensure_backend};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the generate command.
#[derive(Args)]
pub(crate) struct GenerateArgs {
    /// Documents to process (overrides the configured list).
    files: Vec<PathBuf>,

    /// Path to configuration file (default: auto-discover wavepress.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long, env = "WAVEPRESS_KROKI_URL")]
    kroki_url: Option<String>,

    /// Generate offline placeholder cards instead of rendering.
    #[arg(long)]
    placeholder: bool,

    /// Disable the render cache.
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl GenerateArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            files: (!self.files.is_empty()).then_some(self.files),
            backend: self.placeholder.then_some(RendererBackend::Placeholder),
            kroki_url: self.kroki_url,
            cache_enabled: self.no_cache.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let documents = config.docs_resolved.document_paths()?;

        output.highlight("WaveDrom Diagram Generator");
        output.separator();
        output.info(&format!("Renderer: {}", describe_backend(&config)));

        let publisher = build_publisher(&config);
        ensure_backend(&publisher, &config, &output)?;

        let summary = publisher.run(&documents);
        for outcome in &summary.outcomes {
            print_outcome(&output, outcome);
        }
        print_banner(&output, &summary, &config);

        Ok(())
    }
}

fn print_outcome(output: &Output, outcome: &DocumentOutcome) {
    output.info("");
    match outcome {
        DocumentOutcome::Processed(report) => print_report(output, report),
        DocumentOutcome::Skipped { path, .. } => {
            output.warning(&format!("File not found: {}", path.display()));
        }
        DocumentOutcome::Failed { path, error } => {
            output.info(&format!("Processing: {}", path.display()));
            output.error(&format!("  {error}"));
        }
    }
}

fn print_report(output: &Output, report: &DocumentReport) {
    output.info(&format!("Processing: {}", report.path.display()));
    if report.blocks_found == 0 {
        output.detail("No WaveDrom blocks found");
        return;
    }

    output.detail(&format!("Found {} WaveDrom diagram(s)", report.blocks_found));
    for file in &report.images {
        output.success(&format!("  Generated: {file}"));
    }
    for failure in &report.failures {
        output.warning(&format!("  Skipped {failure}"));
    }
    if report.references_replaced > 0 {
        output.detail(&format!(
            "Refreshed {} existing reference(s)",
            report.references_replaced
        ));
    }
    if report.updated {
        output.success("  Updated markdown file");
    } else if !report.images.is_empty() {
        output.detail("References already present");
    }
}

fn print_banner(output: &Output, summary: &RunSummary, config: &Config) {
    output.info("");
    output.separator();
    output.success(&format!(
        "Done! {} image(s) generated, {} document(s) updated.",
        summary.images_generated(),
        summary.documents_updated()
    ));

    let failures = summary.block_failures();
    if failures > 0 {
        output.warning(&format!("{failures} diagram(s) skipped"));
    }
    let not_processed = summary.documents_not_processed();
    if not_processed > 0 {
        output.warning(&format!("{not_processed} document(s) not processed"));
    }

    let image_dirs = summary.image_dirs();
    if !image_dirs.is_empty() {
        output.info("");
        output.info("SVG files saved to:");
        for dir in image_dirs {
            output.detail(&dir.display().to_string());
        }
    }
    output.info("");
    output.info("Next steps:");
    output.detail("1. Review the generated SVG files");
    output.detail(&format!(
        "2. Commit the images: git add {}/ *.md",
        config.docs_resolved.image_dir
    ));
    output.detail("3. Push to see the diagrams render");
}
