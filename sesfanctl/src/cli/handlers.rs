//! Per-enclosure execution handlers
//!
//! Table output is printed as each step completes. Every handler also
//! returns its outcome so JSON output can be emitted once for the whole run.

use anyhow::Result;
use sesfan_core::{FanSpeedReport, MatchedEnclosure, SpeedLevel};
use sesfan_hardware::{enumerate_devices, select_device, EnclosureController, SesTransport};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::CliConfig;
use crate::format::{format_fan_report, format_speed_change, EnclosureResult, SpeedChange};

use super::commands::*;

/// Find every enclosure reachable through the configured device globs
///
/// With `device` set, only enclosures reachable through that node are kept.
pub async fn find_enclosures<T: SesTransport + ?Sized>(
    controller: &EnclosureController<T>,
    config: &CliConfig,
    device: Option<&Path>,
) -> Vec<MatchedEnclosure> {
    let mut candidates = enumerate_devices(&config.device_globs);
    debug!("{} candidate device(s)", candidates.len());

    if let Some(device) = device {
        candidates = select_device(candidates, device);
    }

    controller.discover(&candidates).await
}

/// Handle --check
pub async fn handle_check<T: SesTransport + ?Sized>(
    controller: &EnclosureController<T>,
    enclosure: &MatchedEnclosure,
    format: &OutputFormat,
) -> Result<FanSpeedReport> {
    let report = controller.read_fan_speeds(enclosure).await?;

    if let OutputFormat::Table = format {
        println!("{}", format_fan_report(&report));
    }

    Ok(report)
}

/// Handle --speed
///
/// In verbose mode the transport output is printed (table output) or kept
/// in the result (JSON output), and the fans are read back once
/// `settle_delay` has passed.
pub async fn handle_set_speed<T: SesTransport + ?Sized>(
    controller: &EnclosureController<T>,
    enclosure: &MatchedEnclosure,
    level: SpeedLevel,
    verbose: bool,
    settle_delay: Duration,
    format: &OutputFormat,
) -> Result<EnclosureResult> {
    let output = controller.set_fan_speeds(enclosure, level).await?;
    let change = SpeedChange { level, output };

    if let OutputFormat::Table = format {
        println!("{}", format_speed_change(enclosure.path(), &change));
        if verbose && !change.output.trim().is_empty() {
            println!("{}", change.output.trim_end());
        }
    }

    let mut result = EnclosureResult::new(enclosure.path());
    result.change = Some(change);

    if verbose {
        info!(
            "Waiting {}s for fans on {} to settle",
            settle_delay.as_secs(),
            enclosure.path().display()
        );
        tokio::time::sleep(settle_delay).await;

        result.report = Some(handle_check(controller, enclosure, format).await?);
    }

    Ok(result)
}

/// Run `mode` against one enclosure
pub async fn handle_enclosure<T: SesTransport + ?Sized>(
    controller: &EnclosureController<T>,
    enclosure: &MatchedEnclosure,
    mode: Mode,
    config: &CliConfig,
    format: &OutputFormat,
) -> Result<EnclosureResult> {
    match mode {
        Mode::Check => {
            let mut result = EnclosureResult::new(enclosure.path());
            result.report = Some(handle_check(controller, enclosure, format).await?);
            Ok(result)
        }
        Mode::SetSpeed(level) => {
            let settle_delay = Duration::from_secs(config.settle_delay_secs);
            handle_set_speed(
                controller,
                enclosure,
                level,
                config.verbose,
                settle_delay,
                format,
            )
            .await
        }
    }
}

/// Generate shell completion script
pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
