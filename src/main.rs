use printerdb::cli::commands::{CliArgs, Commands};
use printerdb::cli::handlers::{handle_build, handle_extract};
use printerdb::util::logging::{init_logging, parse_level, LoggingConfig};
use printerdb::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("printerdb v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match args.command_or_default() {
        Commands::Build(build_args) => handle_build(&build_args).await,
        Commands::Extract(extract_args) => handle_extract(&extract_args).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("PRINTERDB_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    init_logging(LoggingConfig::from_env_with_level(level));
}
