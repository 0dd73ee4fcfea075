use crate::catalog::Technology;
use crate::config::{BuildConfig, UpstreamLocation};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Builds a unified 3D printer database from OrcaSlicer and UVtools data
#[derive(Parser, Debug)]
#[command(
    name = "printerdb",
    about = "Builds a unified 3D printer database from OrcaSlicer and UVtools data",
    version,
    long_about = "printerdb extracts printer build volumes from OrcaSlicer machine profiles (FDM) \
                  and the UVtools machine table (SLA), merges them and writes printers.json and \
                  metadata.json. Running without a subcommand performs a full build."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

impl CliArgs {
    /// The subcommand to run; a bare invocation is a default build
    pub fn command_or_default(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Build(BuildArgs::default()))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        about = "Fetch both sources, merge and write the database",
        long_about = "Fetches and extracts every enabled source, merges the results and writes \
                      printers.json and metadata.json. A source that fails is recorded in the \
                      metadata and the build continues; the exit code is non-zero only when no \
                      source produced data or the files could not be written.\n\n\
                      Examples:\n  \
                      printerdb\n  \
                      printerdb build --output-dir public/data\n  \
                      printerdb build --orca-path ../OrcaSlicer --uvtools-path ../UVtools\n  \
                      printerdb build --only sla --format json"
    )]
    Build(BuildArgs),

    #[command(
        about = "Run a single extractor and print its printers",
        long_about = "Runs one extractor and prints the entries it produced without writing \
                      any files.\n\n\
                      Examples:\n  \
                      printerdb extract sla\n  \
                      printerdb extract fdm --orca-path ../OrcaSlicer --format human"
    )]
    Extract(ExtractArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct UpstreamArgs {
    #[arg(
        long,
        value_name = "DIR",
        help = "Read OrcaSlicer profiles from a local checkout instead of GitHub"
    )]
    pub orca_path: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Read the UVtools machine table from a local checkout instead of GitHub"
    )]
    pub uvtools_path: Option<PathBuf>,

    #[arg(long, help = "Do not look up printer cover images")]
    pub no_images: bool,

    #[arg(long, value_name = "SECONDS", help = "HTTP request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(
        long,
        value_name = "COUNT",
        help = "Retries for transient fetch failures"
    )]
    pub retries: Option<u32>,
}

impl UpstreamArgs {
    pub fn apply(&self, config: &mut BuildConfig) {
        if let Some(path) = &self.orca_path {
            config.orca.location = UpstreamLocation::Local(path.clone());
        }
        if let Some(path) = &self.uvtools_path {
            config.uvtools.location = UpstreamLocation::Local(path.clone());
        }
        if self.no_images {
            config.resolve_images = false;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            config.fetch_retries = retries;
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Directory for printers.json and metadata.json"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_enum, help = "Build from a single source only")]
    pub only: Option<SourceArg>,

    #[command(flatten)]
    pub upstream: UpstreamArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Summary output format"
    )]
    pub format: OutputFormatArg,
}

impl BuildArgs {
    pub fn apply(&self, config: &mut BuildConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(only) = self.only {
            config.enable_only(&[only.into()]);
        }
        self.upstream.apply(config);
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(value_enum, help = "Source to extract")]
    pub source: SourceArg,

    #[command(flatten)]
    pub upstream: UpstreamArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "json",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    /// OrcaSlicer machine profiles
    Fdm,
    /// UVtools machine table
    Sla,
}

impl From<SourceArg> for Technology {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Fdm => Technology::Fdm,
            SourceArg::Sla => Technology::Sla,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    #[default]
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_bare_invocation_is_build() {
        let args = CliArgs::parse_from(["printerdb"]);
        match args.command_or_default() {
            Commands::Build(build) => {
                assert!(build.output_dir.is_none());
                assert!(build.only.is_none());
                assert_eq!(build.format, OutputFormatArg::Human);
                assert!(!build.upstream.no_images);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_build_with_options() {
        let args = CliArgs::parse_from([
            "printerdb",
            "build",
            "--output-dir",
            "/tmp/out",
            "--orca-path",
            "/src/orca",
            "--only",
            "fdm",
            "--no-images",
            "--timeout",
            "120",
            "--retries",
            "0",
            "--format",
            "json",
        ]);

        match args.command_or_default() {
            Commands::Build(build) => {
                assert_eq!(build.output_dir, Some(PathBuf::from("/tmp/out")));
                assert_eq!(build.upstream.orca_path, Some(PathBuf::from("/src/orca")));
                assert_eq!(build.only, Some(SourceArg::Fdm));
                assert!(build.upstream.no_images);
                assert_eq!(build.upstream.timeout, Some(120));
                assert_eq!(build.upstream.retries, Some(0));
                assert_eq!(build.format, OutputFormatArg::Json);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_extract_command() {
        let args = CliArgs::parse_from(["printerdb", "extract", "sla", "--uvtools-path", "/src/uv"]);
        match args.command_or_default() {
            Commands::Extract(extract) => {
                assert_eq!(extract.source, SourceArg::Sla);
                assert_eq!(extract.format, OutputFormatArg::Json);
                assert_eq!(
                    extract.upstream.uvtools_path,
                    Some(PathBuf::from("/src/uv"))
                );
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_extract_requires_source() {
        assert!(CliArgs::try_parse_from(["printerdb", "extract"]).is_err());
        assert!(CliArgs::try_parse_from(["printerdb", "extract", "sls"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["printerdb", "-v", "build"]);
        assert!(args.verbose);
        assert!(!args.quiet);

        let args = CliArgs::parse_from(["printerdb", "--log-level", "debug"]);
        assert_eq!(args.log_level, Some("debug".to_string()));

        assert!(CliArgs::try_parse_from(["printerdb", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_apply_overrides_config() {
        let mut config = BuildConfig::default();
        let args = CliArgs::parse_from([
            "printerdb",
            "build",
            "--only",
            "sla",
            "--uvtools-path",
            "/src/uv",
            "-o",
            "out",
        ]);

        let Commands::Build(build) = args.command_or_default() else {
            panic!("Expected Build command");
        };
        build.apply(&mut config);

        assert!(!config.orca.enabled);
        assert!(config.uvtools.enabled);
        assert_eq!(
            config.uvtools.location,
            UpstreamLocation::Local(PathBuf::from("/src/uv"))
        );
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }
}
