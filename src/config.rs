//! Configuration management for printerdb
//!
//! Settings are loaded from environment variables with defaults, then the CLI
//! overrides individual fields before [`BuildConfig::validate`] runs.
//!
//! # Environment Variables
//!
//! - `PRINTERDB_OUTPUT_DIR`: Directory for `printers.json` and `metadata.json` - default: "data"
//! - `PRINTERDB_ORCA_PATH`: Local OrcaSlicer checkout - default: fetch `SoftFever/OrcaSlicer@main` from GitHub
//! - `PRINTERDB_UVTOOLS_PATH`: Local UVtools checkout - default: fetch `sn4k3/UVtools@master` from GitHub
//! - `PRINTERDB_SOURCES`: Enabled technologies (comma separated `fdm`, `sla`) - default: "fdm,sla"
//! - `PRINTERDB_RESOLVE_IMAGES`: Look up printer cover images (true|false) - default: "true"
//! - `PRINTERDB_REQUEST_TIMEOUT`: HTTP timeout in seconds - default: "30"
//! - `PRINTERDB_FETCH_RETRIES`: Retries for transient fetch failures - default: "1"
//! - `PRINTERDB_LOG_LEVEL`: Logging level - default: "info"
//! - `GITHUB_TOKEN`: Optional token for the GitHub API rate limit
//!
//! # Example
//!
//! ```no_run
//! use printerdb::BuildConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BuildConfig::default();
//! config.validate()?;
//!
//! let orchestrator = config.create_orchestrator()?;
//! let report = orchestrator.execute().await?;
//! println!("{} printers", report.metadata.total_printers);
//! # Ok(())
//! # }
//! ```

use crate::catalog::{Source, Technology};
use crate::extractors::{
    orca, uvtools, ExtractorRegistry, OrcaSlicerExtractor, PrinterExtractor, UvToolsExtractor,
};
use crate::pipeline::BuildOrchestrator;
use crate::upstream::{FetchError, GitHubRepo, GitHubUpstream, LocalUpstream, Upstream};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OUTPUT_DIR: &str = "data";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_RESOLVE_IMAGES: bool = true;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FETCH_RETRIES: u32 = 1;
const MAX_FETCH_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Failed to initialize upstream client: {0}")]
    Upstream(#[from] FetchError),
}

/// Where a source's upstream data is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamLocation {
    GitHub(GitHubRepo),
    Local(PathBuf),
}

impl fmt::Display for UpstreamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamLocation::GitHub(repo) => write!(f, "{}@{}", repo.html_url(), repo.branch),
            UpstreamLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub enabled: bool,
    pub location: UpstreamLocation,
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub output_dir: PathBuf,

    /// FDM source (OrcaSlicer profiles)
    pub orca: SourceConfig,

    /// SLA source (UVtools machine table)
    pub uvtools: SourceConfig,

    /// Look up cover images for FDM printers
    pub resolve_images: bool,

    pub request_timeout_secs: u64,

    /// Retries per request for transient failures
    pub fetch_retries: u32,

    pub github_token: Option<String>,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for BuildConfig {
    /// Loads from `PRINTERDB_*` variables; unparsable values fall back to defaults
    fn default() -> Self {
        let output_dir = env::var("PRINTERDB_OUTPUT_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let enabled = env::var("PRINTERDB_SOURCES")
            .ok()
            .and_then(|v| parse_sources(&v).ok())
            .unwrap_or_else(|| Technology::ALL.to_vec());

        let location = |var: &str, repo: GitHubRepo| {
            env::var(var)
                .ok()
                .filter(|v| !v.is_empty())
                .map(|p| UpstreamLocation::Local(PathBuf::from(p)))
                .unwrap_or(UpstreamLocation::GitHub(repo))
        };

        let resolve_images = env::var("PRINTERDB_RESOLVE_IMAGES")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_RESOLVE_IMAGES);

        let request_timeout_secs = env::var("PRINTERDB_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let fetch_retries = env::var("PRINTERDB_FETCH_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_FETCH_RETRIES);

        let github_token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

        let log_level = env::var("PRINTERDB_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            output_dir,
            orca: SourceConfig {
                enabled: enabled.contains(&Technology::Fdm),
                location: location("PRINTERDB_ORCA_PATH", orca::default_repo()),
            },
            uvtools: SourceConfig {
                enabled: enabled.contains(&Technology::Sla),
                location: location("PRINTERDB_UVTOOLS_PATH", uvtools::default_repo()),
            },
            resolve_images,
            request_timeout_secs,
            fetch_retries,
            github_token,
            log_level,
        }
    }
}

impl BuildConfig {
    /// Checks value ranges and that at least one source is enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.fetch_retries > MAX_FETCH_RETRIES {
            return Err(ConfigError::ValidationFailed(format!(
                "Fetch retries cannot exceed {}",
                MAX_FETCH_RETRIES
            )));
        }

        if !self.orca.enabled && !self.uvtools.enabled {
            return Err(ConfigError::ValidationFailed(
                "At least one source (fdm, sla) must be enabled".to_string(),
            ));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Output directory cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn source_config(&self, source: Source) -> &SourceConfig {
        match source {
            Source::OrcaSlicer => &self.orca,
            Source::UvTools => &self.uvtools,
        }
    }

    pub fn source_config_mut(&mut self, source: Source) -> &mut SourceConfig {
        match source {
            Source::OrcaSlicer => &mut self.orca,
            Source::UvTools => &mut self.uvtools,
        }
    }

    /// Enables exactly the given technologies
    pub fn enable_only(&mut self, technologies: &[Technology]) {
        for source in Source::ALL {
            self.source_config_mut(source).enabled = technologies.contains(&source.technology());
        }
    }

    /// Builds the upstream client for a source
    pub fn create_upstream(&self, source: Source) -> Result<Arc<dyn Upstream>, ConfigError> {
        let repo = match source {
            Source::OrcaSlicer => orca::default_repo(),
            Source::UvTools => uvtools::default_repo(),
        };

        let upstream: Arc<dyn Upstream> = match &self.source_config(source).location {
            UpstreamLocation::Local(path) => {
                Arc::new(LocalUpstream::new(path).with_public_base(repo.raw_base()))
            }
            UpstreamLocation::GitHub(repo) => Arc::new(GitHubUpstream::new(
                repo.clone(),
                Duration::from_secs(self.request_timeout_secs),
                self.fetch_retries,
                self.github_token.clone(),
            )?),
        };
        Ok(upstream)
    }

    pub fn create_extractor(
        &self,
        source: Source,
    ) -> Result<Arc<dyn PrinterExtractor>, ConfigError> {
        let upstream = self.create_upstream(source)?;
        let extractor: Arc<dyn PrinterExtractor> = match source {
            Source::OrcaSlicer => {
                Arc::new(OrcaSlicerExtractor::new(upstream).with_images(self.resolve_images))
            }
            Source::UvTools => Arc::new(UvToolsExtractor::new(upstream)),
        };
        Ok(extractor)
    }

    /// Extractors for every enabled source, FDM first
    pub fn create_registry(&self) -> Result<ExtractorRegistry, ConfigError> {
        let mut registry = ExtractorRegistry::new();
        for source in Source::ALL {
            if self.source_config(source).enabled {
                registry.register(self.create_extractor(source)?);
            }
        }
        Ok(registry)
    }

    pub fn create_orchestrator(&self) -> Result<BuildOrchestrator, ConfigError> {
        let mut orchestrator =
            BuildOrchestrator::new(self.create_registry()?, self.output_dir.clone());
        for source in Source::ALL {
            let source_config = self.source_config(source);
            if !source_config.enabled {
                orchestrator =
                    orchestrator.with_disabled(source, source_config.location.to_string());
            }
        }
        Ok(orchestrator)
    }
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "printerdb Configuration:")?;
        writeln!(f, "  Output Dir: {}", self.output_dir.display())?;
        for source in Source::ALL {
            let source_config = self.source_config(source);
            writeln!(
                f,
                "  {} ({}): {}{}",
                source,
                source.technology(),
                source_config.location,
                if source_config.enabled { "" } else { " [disabled]" }
            )?;
        }
        writeln!(f, "  Resolve Images: {}", self.resolve_images)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Fetch Retries: {}", self.fetch_retries)?;
        writeln!(
            f,
            "  GitHub Token: {}",
            if self.github_token.is_some() { "set" } else { "unset" }
        )?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

/// Parses a comma separated technology list such as `fdm,sla`
pub fn parse_sources(value: &str) -> Result<Vec<Technology>, ConfigError> {
    let mut technologies = Vec::new();
    for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let technology = match token.to_lowercase().as_str() {
            "fdm" | "orca" | "orcaslicer" => Technology::Fdm,
            "sla" | "resin" | "uvtools" => Technology::Sla,
            other => {
                return Err(ConfigError::ParseError {
                    field: "sources".to_string(),
                    error: format!("unknown source '{}', expected fdm or sla", other),
                })
            }
        };
        if !technologies.contains(&technology) {
            technologies.push(technology);
        }
    }

    if technologies.is_empty() {
        return Err(ConfigError::ParseError {
            field: "sources".to_string(),
            error: "no sources listed".to_string(),
        });
    }
    Ok(technologies)
}
