//! Enclosure model definitions
//!
//! Each supported enclosure model implements the `EnclosureModel` trait with
//! the constants the protocol layer needs: the identification signature, the
//! fan count, and where the fan slots live in the control page.
//!
//! Only the Lenovo ThinkServer SA120 is supported. The constants here are
//! specific to that hardware and must not be inferred for other models.

use std::marker::PhantomData;

/// Enclosure model trait
///
/// # Example
///
/// ```
/// use sesfan_core::enclosure::{EnclosureModel, ThinkServerSa120};
///
/// const FAN_COUNT: usize = ThinkServerSa120::FAN_COUNT;
/// assert_eq!(FAN_COUNT, 6);
/// assert_eq!(ThinkServerSa120::fan_slot_offset(1), 92);
/// ```
pub trait EnclosureModel: Send + Sync + 'static {
    /// Human-readable model name
    const NAME: &'static str;

    /// Byte string that must appear in the inquiry response
    const SIGNATURE: &'static [u8];

    /// Number of cooling elements
    const FAN_COUNT: usize;

    /// Diagnostic page carrying the enclosure control/status elements
    const CONTROL_PAGE: u8;

    /// Offset of the first fan slot in the control page
    const FAN_SLOT_BASE: usize;

    /// Size of one fan slot in bytes
    const FAN_SLOT_LEN: usize;

    /// Maximum response length requested from the transport
    const MAX_RESPONSE_LEN: u32;

    /// Approximate RPM for each speed level, ascending, level 1 first
    const SPEED_MIDPOINTS: [u32; 7];

    /// Half-width of the RPM window used to match a level
    const SPEED_TOLERANCE: u32;

    /// Offset of fan slot `index` in the control page
    fn fan_slot_offset(index: usize) -> usize {
        Self::FAN_SLOT_BASE + Self::FAN_SLOT_LEN * index
    }

    /// Minimum control page length covering every fan slot
    fn min_control_page_len() -> usize {
        Self::fan_slot_offset(Self::FAN_COUNT)
    }
}

/// Lenovo ThinkServer SA120 disk enclosure
///
/// - 6 cooling elements
/// - Fan control words at offsets 88, 92, ... 108 of diagnostic page 0x02
/// - Seven discrete fan levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkServerSa120;

impl EnclosureModel for ThinkServerSa120 {
    const NAME: &'static str = "ThinkServer SA120";
    const SIGNATURE: &'static [u8] = b"ThinkServerSA120";
    const FAN_COUNT: usize = 6;
    const CONTROL_PAGE: u8 = 0x02;
    const FAN_SLOT_BASE: usize = 88;
    const FAN_SLOT_LEN: usize = 4;
    const MAX_RESPONSE_LEN: u32 = 32768;
    const SPEED_MIDPOINTS: [u32; 7] = [550, 925, 1100, 1250, 1400, 1575, 1700];
    const SPEED_TOLERANCE: u32 = 50;
}

/// Default enclosure model used throughout the codebase
pub type DefaultEnclosure = ThinkServerSa120;

/// Runtime helper for a given enclosure model
#[derive(Debug, Clone, Copy)]
pub struct Enclosure<M: EnclosureModel> {
    _marker: PhantomData<M>,
}

impl<M: EnclosureModel> Enclosure<M> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        M::NAME
    }

    pub fn fan_count(&self) -> usize {
        M::FAN_COUNT
    }

    /// Whether a raw inquiry response carries this model's signature
    pub fn matches(&self, response: &[u8]) -> bool {
        response
            .windows(M::SIGNATURE.len())
            .any(|window| window == M::SIGNATURE)
    }

    /// Validate a fan index against this model's fan count
    pub fn validate_fan_index(&self, index: usize) -> crate::Result<()> {
        if index >= M::FAN_COUNT {
            return Err(crate::SesFanError::InvalidFanIndex {
                index,
                fan_count: M::FAN_COUNT,
            });
        }
        Ok(())
    }
}

impl<M: EnclosureModel> Default for Enclosure<M> {
    fn default() -> Self {
        Self::new()
    }
}
