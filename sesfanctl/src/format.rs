//! Output formatting utilities for the CLI
//!
//! Table output is printed per enclosure as work happens. JSON output is
//! collected into one [`EnclosureResult`] per enclosure and printed once as
//! a single array.

use anyhow::Result;
use colored::*;
use serde::Serialize;
use sesfan_core::{FanSpeedReport, SpeedEstimate, SpeedLevel};
use std::path::{Path, PathBuf};

use tabled::{settings::Style, Table, Tabled};

/// Outcome of a speed change on one enclosure
#[derive(Debug, Clone, Serialize)]
pub struct SpeedChange {
    pub level: SpeedLevel,
    /// Transport output for the control page write
    pub output: String,
}

/// What happened on one enclosure during a run
#[derive(Debug, Clone, Serialize)]
pub struct EnclosureResult {
    pub device: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<SpeedChange>,
    /// Fan readings from a check, or the read-back after a change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<FanSpeedReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnclosureResult {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            change: None,
            report: None,
            error: None,
        }
    }

    /// Result for an enclosure the operation failed on
    pub fn failed(device: impl Into<PathBuf>, error: &anyhow::Error) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(device)
        }
    }
}

/// Human-readable speed estimate
pub fn format_estimate(estimate: &SpeedEstimate) -> String {
    match estimate {
        SpeedEstimate::NoActiveFans => "no active fans".to_string(),
        SpeedEstimate::Level {
            level,
            midpoint,
            mean,
        } => format!("level {} (~{} rpm, mean {} rpm)", level, midpoint, mean),
        SpeedEstimate::Undetermined { mean } => {
            format!("level undetermined (mean {} rpm)", mean)
        }
    }
}

/// Format a fan speed report as a table
pub fn format_fan_report(report: &FanSpeedReport) -> String {
    #[derive(Tabled)]
    struct FanRow {
        #[tabled(rename = "Fan")]
        fan: String,
        #[tabled(rename = "RPM")]
        rpm: String,
    }

    let rows: Vec<FanRow> = report
        .readings
        .iter()
        .map(|reading| FanRow {
            fan: reading.index.to_string(),
            rpm: if reading.is_active() {
                reading.rpm.to_string().green().to_string()
            } else {
                "0".red().to_string()
            },
        })
        .collect();

    let estimate = format_estimate(&report.estimate);
    let estimate = match report.estimate {
        SpeedEstimate::Level { .. } => estimate.cyan(),
        SpeedEstimate::Undetermined { .. } => estimate.yellow(),
        SpeedEstimate::NoActiveFans => estimate.red(),
    };

    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!(
        "{} {}\n{}\nEstimated speed: {}",
        "Device".bold(),
        report.device.display().to_string().bold(),
        table,
        estimate
    )
}

/// Format the result of a speed change
pub fn format_speed_change(device: &Path, change: &SpeedChange) -> String {
    format_success(&format!(
        "Set fans on {} to speed {}",
        device.display(),
        change.level
    ))
}

/// Format every enclosure result of a run as one JSON document
pub fn format_results_json(results: &[EnclosureResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

/// Message for a device the operation could not be carried out on
pub fn format_unsupported(device: &Path, error: &anyhow::Error) -> String {
    format!(
        "{} Operation not supported on {}: {}",
        "✗".red().bold(),
        device.display(),
        error
    )
}

/// Format success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}
