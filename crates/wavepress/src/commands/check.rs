//! `wavepress check` command implementation.

use std::path::PathBuf;

use clap::Args;
use wavepress_config::{CliSettings, Config, RendererBackend};

use super::{build_publisher, describe_backend, ensure_backend};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Path to configuration file (default: auto-discover wavepress.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kroki server URL to probe (overrides config).
    #[arg(long, env = "WAVEPRESS_KROKI_URL")]
    kroki_url: Option<String>,

    /// Check the offline placeholder backend instead.
    #[arg(long)]
    placeholder: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl CheckArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            backend: self.placeholder.then_some(RendererBackend::Placeholder),
            kroki_url: self.kroki_url,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }
        output.info(&format!("Renderer: {}", describe_backend(&config)));

        let publisher = build_publisher(&config);
        ensure_backend(&publisher, &config, &output)?;

        output.success(&format!(
            "Rendering backend '{}' is available",
            publisher.renderer_name()
        ));
        Ok(())
    }
}
