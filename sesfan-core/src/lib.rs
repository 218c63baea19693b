//! sesfan Core Library
//!
//! Shared types, enclosure models and page encoding for SES enclosure fan
//! control. Transport and device discovery live in `sesfan-hardware`.

pub mod control_page;
pub mod enclosure;
pub mod error;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use control_page::{fan_control_word, ControlPage};
pub use enclosure::{DefaultEnclosure, Enclosure, EnclosureModel, ThinkServerSa120};
pub use error::*;
pub use telemetry::{FanSpeedReport, SpeedEstimate};
pub use types::*;
