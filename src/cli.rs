//! Command Line Interface (CLI) arguments.

use std::time::Duration;

use clap::Parser;

/// energy-compare command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "ENERGY_COMPARE_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 3001, env = "ENERGY_COMPARE_PORT")]
    pub port: u16,
    /// Path to the catalog manifest file
    #[arg(long, default_value = "data/catalog.json", env = "ENERGY_COMPARE_CATALOG")]
    pub catalog: String,
    /// Directory containing dataset files. Defaults to the directory of the catalog manifest.
    #[arg(long, env = "ENERGY_COMPARE_DATA_DIR")]
    pub data_dir: Option<String>,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "ENERGY_COMPARE_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Maximum time in seconds for each dataset query of a comparison.
    #[arg(long, env = "ENERGY_COMPARE_COMPARISON_TIMEOUT")]
    pub comparison_timeout: Option<u64>,
}

impl CommandLineArgs {
    /// Per-dataset comparison query timeout, if any.
    pub fn comparison_timeout(&self) -> Option<Duration> {
        self.comparison_timeout.map(Duration::from_secs)
    }
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
