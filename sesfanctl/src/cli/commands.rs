//! CLI argument definitions

use clap::Parser;
use sesfan_core::SpeedLevel;
use std::path::PathBuf;

/// ThinkServer SA120 fan control
#[derive(Parser, Debug)]
#[command(name = "sesfanctl")]
#[command(
    version,
    about = "Fan speed control for SES enclosures (ThinkServer SA120)",
    long_about = None
)]
pub struct Cli {
    /// Print transport output and re-read fan speeds after a change
    #[arg(short, long)]
    pub verbose: bool,

    /// Report current fan speeds
    #[arg(short, long)]
    pub check: bool,

    /// Set all fans to a speed level (1-7)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=7))]
    pub speed: Option<u8>,

    /// Only act on this device node
    #[arg(short, long, value_name = "DEVICE")]
    pub device: Option<PathBuf>,

    /// Output format (overrides config file)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Path to the sg_ses binary (overrides config file and environment)
    #[arg(long = "sg-ses", value_name = "PATH")]
    pub sg_ses: Option<String>,

    /// Don't load config file
    #[arg(long)]
    pub no_config: bool,

    /// Config file path (default: ~/.config/sesfan/cli.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output
    Table,
    /// JSON output
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }

    /// Parse a validated config value, falling back to table
    pub fn from_config(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

/// What to do with each enclosure found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Check,
    SetSpeed(SpeedLevel),
}

impl Cli {
    /// Selected mode; `--check` takes precedence over `--speed`
    pub fn mode(&self) -> Option<Mode> {
        if self.check {
            return Some(Mode::Check);
        }
        self.speed
            .and_then(|speed| SpeedLevel::new(speed).ok())
            .map(Mode::SetSpeed)
    }
}
