//! sesfan CLI library
//!
//! Argument parsing, configuration and output formatting for the
//! `sesfanctl` binary. Configuration types are available via
//! [`config::CliConfig`] and [`config::ConfigBuilder`].
//!
//! ```no_run
//! use sesfanctl::config::CliConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = CliConfig::builder()
//!     .with_env_overrides()
//!     .with_settle_delay(0)?
//!     .build()?;
//! println!("Using {}", config.sg_ses_path);
//! # Ok(())
//! # }
//! ```

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// Configuration types for the CLI tool.
pub mod config;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;
