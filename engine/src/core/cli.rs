use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_CONFIG, ENV_MIN_ID_DIGITS, ENV_NO_ORPHANS, ENV_OUTPUT_DIR};

#[derive(Parser)]
#[command(name = "correlate")]
#[command(
    version,
    about = "Infer correlated values in recorded HTTP sessions",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Analyze capture files and write a correlation spec for each
    Analyze {
        /// Capture files (JSON)
        #[arg(required = true)]
        captures: Vec<PathBuf>,

        /// Output file (only with a single capture)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Directory for generated specs (default: next to each capture)
        #[arg(long, env = ENV_OUTPUT_DIR)]
        output_dir: Option<PathBuf>,

        /// Skip orphan id detection
        #[arg(long, env = ENV_NO_ORPHANS)]
        no_orphans: bool,

        /// Minimum digit count for numeric ids
        #[arg(long, env = ENV_MIN_ID_DIGITS)]
        min_id_digits: Option<usize>,

        /// Additional domain to exclude (repeatable)
        #[arg(long = "exclude-domain", value_name = "DOMAIN")]
        exclude_domains: Vec<String>,

        /// Write compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Print the classification of one or more values
    Classify {
        #[arg(required = true)]
        values: Vec<String>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub no_orphans: bool,
    pub min_id_digits: Option<usize>,
    pub exclude_domains: Vec<String>,
    pub compact: bool,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = cli_config(&cli);
    (config, cli.command)
}

fn cli_config(cli: &Cli) -> CliConfig {
    let mut config = CliConfig {
        config: cli.config.clone(),
        ..CliConfig::default()
    };
    if let Commands::Analyze {
        output_dir,
        no_orphans,
        min_id_digits,
        exclude_domains,
        compact,
        ..
    } = &cli.command
    {
        config.output_dir = output_dir.clone();
        config.no_orphans = *no_orphans;
        config.min_id_digits = *min_id_digits;
        config.exclude_domains = exclude_domains.clone();
        config.compact = *compact;
    }
    config
}
