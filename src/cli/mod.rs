pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{BuildArgs, CliArgs, Commands, ExtractArgs, OutputFormatArg, SourceArg};
pub use handlers::{
    handle_build, handle_extract, EXIT_BUILD_FAILED, EXIT_CONFIG_ERROR, EXIT_SUCCESS,
};
pub use output::{OutputFormat, OutputFormatter};
