//! Fan telemetry decoding and speed-level classification

use crate::enclosure::EnclosureModel;
use crate::types::FanReading;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parse the RPM value from an element-status response
///
/// Only the first line is considered. Anything that is not a positive
/// integer reads as 0.
///
/// ```
/// use sesfan_core::telemetry::parse_rpm;
///
/// assert_eq!(parse_rpm("1250\n"), 1250);
/// assert_eq!(parse_rpm(""), 0);
/// assert_eq!(parse_rpm("-5"), 0);
/// ```
pub fn parse_rpm(output: &str) -> u32 {
    let first_line = output.lines().next().unwrap_or("").trim();

    match first_line.parse::<i64>() {
        Ok(rpm) if rpm > 0 => u32::try_from(rpm).unwrap_or(u32::MAX),
        _ => 0,
    }
}

/// Mean RPM over active fans, truncated; `None` when no fan is spinning
pub fn average_active_rpm(readings: &[FanReading]) -> Option<u32> {
    let active: Vec<u64> = readings
        .iter()
        .filter(|r| r.is_active())
        .map(|r| r.rpm as u64)
        .collect();

    if active.is_empty() {
        return None;
    }

    let mean = active.iter().sum::<u64>() / active.len() as u64;
    Some(mean as u32)
}

/// Aggregate speed classification for one enclosure snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpeedEstimate {
    /// Every reading was 0
    NoActiveFans,
    /// Mean fell within the tolerance window of a level midpoint
    Level { level: u8, midpoint: u32, mean: u32 },
    /// Mean is not close enough to any midpoint
    Undetermined { mean: u32 },
}

/// Classify a mean RPM against the model's level midpoints
///
/// The first midpoint (ascending) within `mean ± tolerance`, bounds
/// inclusive, wins.
pub fn classify_mean<M: EnclosureModel>(mean: u32) -> SpeedEstimate {
    let low = mean as i64 - M::SPEED_TOLERANCE as i64;
    let high = mean as i64 + M::SPEED_TOLERANCE as i64;
    let window = low..=high;

    M::SPEED_MIDPOINTS
        .iter()
        .enumerate()
        .find(|&(_, &midpoint)| window.contains(&(midpoint as i64)))
        .map(|(position, &midpoint)| SpeedEstimate::Level {
            level: position as u8 + 1,
            midpoint,
            mean,
        })
        .unwrap_or(SpeedEstimate::Undetermined { mean })
}

/// Classify a set of readings
pub fn classify_speed<M: EnclosureModel>(readings: &[FanReading]) -> SpeedEstimate {
    match average_active_rpm(readings) {
        Some(mean) => classify_mean::<M>(mean),
        None => SpeedEstimate::NoActiveFans,
    }
}

/// Fan readings for one enclosure at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanSpeedReport {
    pub device: PathBuf,
    pub readings: Vec<FanReading>,
    pub estimate: SpeedEstimate,
}

impl FanSpeedReport {
    pub fn new<M: EnclosureModel>(device: impl Into<PathBuf>, readings: Vec<FanReading>) -> Self {
        let estimate = classify_speed::<M>(&readings);
        Self {
            device: device.into(),
            readings,
            estimate,
        }
    }
}
