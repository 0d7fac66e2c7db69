//! Configuration management for wavepress.
//!
//! Parses `wavepress.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Without a config
//! file the defaults describe the FPGA documentation set the tool was first
//! written for.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `docs.base_dir`
//! - `renderer.kroki_url`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wavepress.toml";

/// Documents processed when the config does not list any.
pub const DEFAULT_FILES: &[&str] = &[
    "PHASE_SIGNAL_PATH_DOCUMENTATION.md",
    "DUTY_CYCLE_CORRECTION.md",
    "DUTY_CYCLE_FIX_IMPLEMENTATION.md",
    "MUX8_ANALYSIS.md",
    "WAVEDROM_DIAGRAMS_SUMMARY.md",
];

/// Default folder (relative to the base directory) for generated images.
pub const DEFAULT_IMAGE_DIR: &str = "wavedrom-images";

/// Default Kroki server.
pub const DEFAULT_KROKI_URL: &str = "https://kroki.io";

/// Default HTTP timeout for the rendering backend, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound for `renderer.timeout_secs`.
const MAX_TIMEOUT_SECS: u64 = 600;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the document list (paths used as given, globs allowed).
    pub files: Option<Vec<PathBuf>>,
    /// Override the rendering backend.
    pub backend: Option<RendererBackend>,
    /// Override Kroki URL for diagram rendering.
    pub kroki_url: Option<String>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documents configuration (paths are relative strings from TOML).
    docs: DocsConfigRaw,
    /// Rendering backend configuration.
    pub renderer: RendererConfig,
    /// Inserted reference fragment configuration.
    pub reference: ReferenceConfig,
    /// Render cache configuration.
    cache: CacheConfigRaw,

    /// Resolved documents configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw documents configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    base_dir: Option<String>,
    files: Option<Vec<String>>,
    image_dir: Option<String>,
}

/// Resolved documents configuration.
#[derive(Debug, Default)]
pub struct DocsConfig {
    /// Directory the documents and the image folder live in.
    pub base_dir: PathBuf,
    /// Document paths or glob patterns, already joined with `base_dir`.
    pub files: Vec<PathBuf>,
    /// Image folder name relative to each document, as written in references.
    pub image_dir: String,
}

impl DocsConfig {
    /// Expand the configured entries into document paths.
    ///
    /// Entries containing glob metacharacters are expanded in sorted order;
    /// literal entries are kept even when the file is missing. Duplicates
    /// keep their first position.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a glob pattern is malformed.
    pub fn document_paths(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut paths: Vec<PathBuf> = Vec::with_capacity(self.files.len());

        for entry in &self.files {
            let pattern = entry.to_string_lossy();
            if !is_glob_pattern(&pattern) {
                push_unique(&mut paths, entry.clone());
                continue;
            }

            let matches = glob::glob(&pattern).map_err(|e| {
                ConfigError::Validation(format!("docs.files: invalid pattern '{pattern}': {e}"))
            })?;
            let mut expanded: Vec<PathBuf> = matches.filter_map(Result::ok).collect();
            expanded.sort();
            for path in expanded {
                push_unique(&mut paths, path);
            }
        }

        Ok(paths)
    }
}

fn is_glob_pattern(value: &str) -> bool {
    value.contains(['*', '?', '['])
}

fn push_unique(paths: &mut Vec<PathBuf>, path: PathBuf) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}

/// Rendering backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererBackend {
    /// Render through a Kroki server.
    #[default]
    Kroki,
    /// Offline placeholder cards linking to the WaveDrom editor.
    Placeholder,
}

impl RendererBackend {
    /// Name used in messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kroki => "kroki",
            Self::Placeholder => "placeholder",
        }
    }
}

/// Rendering backend configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Which backend renders diagrams.
    pub backend: RendererBackend,
    /// Kroki server URL.
    pub kroki_url: String,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl RendererConfig {
    /// HTTP timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backend: RendererBackend::default(),
            kroki_url: DEFAULT_KROKI_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Text of the fragment spliced after each diagram block.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Caption line above the image.
    pub caption: String,
    /// Image alt text.
    pub alt: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            caption: "**Rendered Diagram** (GitHub):".to_owned(),
            alt: "WaveDrom Diagram".to_owned(),
        }
    }
}

/// Raw cache configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
}

/// Resolved render cache configuration.
#[derive(Debug, Default)]
pub struct CacheConfig {
    /// Whether rendered SVGs are cached between runs.
    pub enabled: bool,
    /// Cache root directory.
    pub dir: PathBuf,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`renderer.kroki_url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wavepress.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(files) = &settings.files {
            self.docs_resolved.files.clone_from(files);
        }
        if let Some(backend) = settings.backend {
            self.renderer.backend = backend;
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.renderer.kroki_url.clone_from(kroki_url);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = cache_enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            docs: DocsConfigRaw::default(),
            renderer: RendererConfig::default(),
            reference: ReferenceConfig::default(),
            cache: CacheConfigRaw::default(),
            docs_resolved: DocsConfig {
                base_dir: base.to_path_buf(),
                files: DEFAULT_FILES.iter().map(|f| base.join(f)).collect(),
                image_dir: DEFAULT_IMAGE_DIR.to_owned(),
            },
            cache_resolved: CacheConfig {
                enabled: true,
                dir: base.join(".wavepress").join("cache"),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called by [`load`](Self::load) after CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_docs()?;
        self.validate_renderer()?;
        Ok(())
    }

    fn validate_docs(&self) -> Result<(), ConfigError> {
        if self.docs_resolved.files.is_empty() {
            return Err(ConfigError::Validation(
                "docs.files must list at least one document".to_owned(),
            ));
        }

        let image_dir = &self.docs_resolved.image_dir;
        require_non_empty(image_dir, "docs.image_dir")?;
        if Path::new(image_dir).is_absolute() || image_dir.starts_with('/') {
            return Err(ConfigError::Validation(
                "docs.image_dir must be a relative path".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_renderer(&self) -> Result<(), ConfigError> {
        // Only the Kroki backend talks to a server
        if self.renderer.backend == RendererBackend::Kroki {
            require_non_empty(&self.renderer.kroki_url, "renderer.kroki_url")?;
            require_http_url(&self.renderer.kroki_url, "renderer.kroki_url")?;
        }

        let timeout = self.renderer.timeout_secs;
        if timeout == 0 {
            return Err(ConfigError::Validation(
                "renderer.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if timeout > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "renderer.timeout_secs cannot exceed {MAX_TIMEOUT_SECS}"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref base_dir) = self.docs.base_dir {
            self.docs.base_dir = Some(expand::expand_env(base_dir, "docs.base_dir")?);
        }
        self.renderer.kroki_url =
            expand::expand_env(&self.renderer.kroki_url, "renderer.kroki_url")?;
        Ok(())
    }

    /// Resolve relative paths against the config file directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let base_dir = config_dir.join(self.docs.base_dir.as_deref().unwrap_or("."));

        let files = match &self.docs.files {
            Some(files) => files.iter().map(|f| base_dir.join(f)).collect(),
            None => DEFAULT_FILES.iter().map(|f| base_dir.join(f)).collect(),
        };

        let image_dir = self
            .docs
            .image_dir
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_DIR)
            .replace('\\', "/")
            .trim_end_matches('/')
            .to_owned();

        self.docs_resolved = DocsConfig {
            base_dir,
            files,
            image_dir,
        };

        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            dir: match &self.cache.dir {
                Some(dir) => config_dir.join(dir),
                None => config_dir.join(".wavepress").join("cache"),
            },
        };
    }
}
