//! CLI argument definitions and handlers
//!
//! - [`commands`] - Argument parsing and mode selection
//! - [`handlers`] - Per-enclosure execution of the selected mode

mod commands;
mod handlers;

pub use commands::*;
pub use handlers::*;
