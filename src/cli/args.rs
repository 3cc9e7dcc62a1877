//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

/// NVML-based GPU telemetry tool
///
/// Read identity, power, PCIe and clock properties of NVIDIA GPUs by name.
#[derive(Parser, Debug)]
#[command(name = "nvtel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (overrides the config file)
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NVTEL_CONFIG")]
    pub config: Option<String>,

    /// Target GPU by index (0-based)
    #[arg(long, global = true)]
    pub gpu: Option<u32>,

    /// Path to libnvidia-ml
    #[arg(long, global = true, env = "NVTEL_LIBRARY")]
    pub library: Option<String>,

    /// Fail if any GPU cannot be enumerated
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all detected GPUs
    List,

    /// Show GPU information
    Info(InfoArgs),

    /// Read a single property by name
    Get {
        /// Property name, e.g. FanSpeed or Serial
        property: String,
    },

    /// List the properties the loaded library supports
    Properties,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the info command
#[derive(Parser, Debug, Default)]
pub struct InfoArgs {
    /// Show all information
    #[arg(short, long)]
    pub all: bool,

    /// Show power information
    #[arg(long)]
    pub power: bool,

    /// Show PCIe link information
    #[arg(long)]
    pub pcie: bool,

    /// Show clocks, utilization and memory
    #[arg(long)]
    pub clocks: bool,
}

impl InfoArgs {
    /// Whether no section flag was given
    pub fn shows_all(&self) -> bool {
        self.all || !(self.power || self.pcie || self.clocks)
    }
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
