use crate::catalog::Source;
use crate::cli::commands::{BuildArgs, ExtractArgs, SourceArg};
use crate::cli::output::OutputFormatter;
use crate::config::BuildConfig;
use crate::pipeline::BuildError;
use tracing::{debug, error, info, warn};

/// Full or partial build written
pub const EXIT_SUCCESS: i32 = 0;
/// No usable data, or the output could not be written
pub const EXIT_BUILD_FAILED: i32 = 1;
/// Invalid configuration or arguments
pub const EXIT_CONFIG_ERROR: i32 = 2;

pub async fn handle_build(args: &BuildArgs) -> i32 {
    let mut config = BuildConfig::default();
    args.apply(&mut config);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return EXIT_CONFIG_ERROR;
    }
    debug!("{}", config);

    let orchestrator = match config.create_orchestrator() {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to set up build: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let report = match orchestrator.execute().await {
        Ok(report) => report,
        Err(BuildError::NoData(reason)) => {
            error!("Build produced no data, existing files left untouched: {}", reason);
            return EXIT_BUILD_FAILED;
        }
        Err(e) => {
            error!("Build failed: {}", e);
            return EXIT_BUILD_FAILED;
        }
    };

    if report.is_degraded() {
        warn!(
            failed = ?report.metadata.failed_sources(),
            "Catalog is partial; see metadata.json for per-source errors"
        );
    }

    match OutputFormatter::new(args.format.into()).format_build(&report) {
        Ok(output) => {
            println!("{}", output.trim_end());
            EXIT_SUCCESS
        }
        Err(e) => {
            // The files are already on disk, only the summary is lost
            error!("Failed to format build summary: {:#}", e);
            EXIT_SUCCESS
        }
    }
}

pub async fn handle_extract(args: &ExtractArgs) -> i32 {
    let mut config = BuildConfig::default();
    args.upstream.apply(&mut config);
    config.enable_only(&[args.source.into()]);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return EXIT_CONFIG_ERROR;
    }

    let source = match args.source {
        SourceArg::Fdm => Source::OrcaSlicer,
        SourceArg::Sla => Source::UvTools,
    };

    let extractor = match config.create_extractor(source) {
        Ok(e) => e,
        Err(e) => {
            error!("Failed to set up extractor: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    info!(source = %source, upstream = %extractor.upstream(), "Extracting");

    let extraction = match extractor.extract().await {
        Ok(extraction) => extraction,
        Err(e) => {
            error!(source = %source, "Extraction failed: {}", e);
            return EXIT_BUILD_FAILED;
        }
    };

    match OutputFormatter::new(args.format.into()).format_extraction(&extraction) {
        Ok(output) => {
            println!("{}", output.trim_end());
            EXIT_SUCCESS
        }
        Err(e) => {
            error!("Failed to format extraction: {:#}", e);
            EXIT_BUILD_FAILED
        }
    }
}
