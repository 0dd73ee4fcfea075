//! printerdb - unified 3D printer database builder
//!
//! Pulls printer definitions from two open-source projects and turns them into
//! one catalog of brands, models and build volumes:
//!
//! - **FDM**: OrcaSlicer machine profiles (`resources/profiles/<Brand>/machine/*.json`)
//! - **SLA**: the UVtools machine table (`UVtools.Core/Printer/Machine.cs`)
//!
//! Each source runs independently. A source that cannot be fetched is recorded
//! in `metadata.json` and the build continues with the rest; only when no source
//! yields data does the build fail, and then nothing on disk is replaced.
//!
//! # Example Usage
//!
//! ```no_run
//! use printerdb::BuildConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = BuildConfig::default();
//! config.output_dir = "public/data".into();
//! config.validate()?;
//!
//! let report = config.create_orchestrator()?.execute().await?;
//! println!(
//!     "{} FDM, {} SLA",
//!     report.metadata.fdm_count, report.metadata.sla_count
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`upstream`]: where source files come from (GitHub or a local checkout)
//! - [`extractors`]: OrcaSlicer and UVtools parsers
//! - [`catalog`]: entry types, merge, metadata and the JSON writer
//! - [`pipeline`]: the build orchestrator
//! - [`cli`]: the `printerdb` command line

pub mod catalog;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod pipeline;
pub mod progress;
pub mod upstream;
pub mod util;

pub use catalog::{
    BuildMetadata, BuildVolume, PrinterEntry, Source, SourceReport, SourceStatus, Technology,
};
pub use config::{BuildConfig, ConfigError, SourceConfig, UpstreamLocation};
pub use extractors::{ExtractError, Extraction, PrinterExtractor};
pub use pipeline::{BuildError, BuildOrchestrator, BuildReport};
pub use upstream::{FetchError, Upstream};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_printerdb() {
        assert_eq!(NAME, "printerdb");
    }
}
