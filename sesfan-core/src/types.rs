//! Core types and data structures for sesfan

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a device node: the major/minor pair of its device number
///
/// Two paths with the same `DeviceId` reach the same physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId {
    pub major: u32,
    pub minor: u32,
}

impl DeviceId {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.major, self.minor)
    }
}

/// A character device node that may be an enclosure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCandidate {
    pub path: PathBuf,
    pub id: DeviceId,
}

impl DeviceCandidate {
    pub fn new(path: impl Into<PathBuf>, id: DeviceId) -> Self {
        Self {
            path: path.into(),
            id,
        }
    }
}

/// A device confirmed to expose the enclosure signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedEnclosure {
    pub path: PathBuf,
    pub id: DeviceId,
}

impl MatchedEnclosure {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl From<DeviceCandidate> for MatchedEnclosure {
    fn from(candidate: DeviceCandidate) -> Self {
        Self {
            path: candidate.path,
            id: candidate.id,
        }
    }
}

/// Outcome of probing one device for the enclosure signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identification {
    /// Signature found
    Matched(MatchedEnclosure),
    /// Device answered but is a different product
    NotMatched,
    /// Device could not be queried
    AccessError(String),
}

impl Identification {
    pub fn is_match(&self) -> bool {
        matches!(self, Identification::Matched(_))
    }
}

/// RPM reported for one fan; 0 means absent or unpowered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanReading {
    pub index: u8,
    pub rpm: u32,
}

impl FanReading {
    pub fn new(index: u8, rpm: u32) -> Self {
        Self { index, rpm }
    }

    pub fn is_active(&self) -> bool {
        self.rpm > 0
    }
}

/// Commanded fan level, 1 (slowest) to 7 (fastest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SpeedLevel(u8);

impl SpeedLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;

    /// Create a speed level, rejecting values outside 1-7
    ///
    /// ```
    /// use sesfan_core::types::SpeedLevel;
    ///
    /// assert_eq!(SpeedLevel::new(3).unwrap().get(), 3);
    /// assert!(SpeedLevel::new(0).is_err());
    /// assert!(SpeedLevel::new(8).is_err());
    /// ```
    pub fn new(level: u8) -> crate::Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(crate::SesFanError::InvalidSpeedLevel(level))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SpeedLevel {
    type Error = crate::SesFanError;

    fn try_from(level: u8) -> crate::Result<Self> {
        Self::new(level)
    }
}

impl From<SpeedLevel> for u8 {
    fn from(level: SpeedLevel) -> Self {
        level.0
    }
}

impl fmt::Display for SpeedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
