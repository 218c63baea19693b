//! Enclosure control diagnostic page
//!
//! The transport hands the control page over as a text dump of hex byte
//! tokens and takes it back in the same form. `ControlPage` holds the bytes,
//! gives named access to the fan slots, and writes the dump back in the
//! exact layout the transport ingests:
//!
//! ```text
//! 02 00 01 10 00 00 00 00  00 00 00 00 00 00 00 00
//! 80 00 00 23 ...
//! ```
//!
//! Every byte is followed by a separator: a double space after the 8th
//! byte of a line, a newline after the 16th, a single space otherwise. One
//! final newline closes the dump.

use crate::enclosure::{DefaultEnclosure, EnclosureModel};
use crate::error::{Result, SesFanError};
use std::fmt::Write;
use std::marker::PhantomData;

/// Select bit of an enclosure control element
pub const ELEMENT_SELECT: u8 = 0x80;

/// Requested-speed override flag in the last byte of a cooling element
pub const FAN_SPEED_OVERRIDE: u8 = 0x20;

/// Speed code field in the last byte of a cooling element
pub const FAN_SPEED_MASK: u8 = 0x07;

/// Control word commanding a fan to `speed`
///
/// Only the low three bits of `speed` are used.
///
/// ```
/// use sesfan_core::control_page::fan_control_word;
///
/// assert_eq!(fan_control_word(3), [0x80, 0x00, 0x00, 0x23]);
/// assert_eq!(fan_control_word(9), [0x80, 0x00, 0x00, 0x21]);
/// ```
#[inline]
pub fn fan_control_word(speed: u8) -> [u8; 4] {
    [
        ELEMENT_SELECT,
        0x00,
        0x00,
        FAN_SPEED_OVERRIDE | (speed & FAN_SPEED_MASK),
    ]
}

/// Parse a whitespace-separated hex byte dump
pub fn parse_hex_dump(dump: &str) -> Result<Vec<u8>> {
    dump.split_ascii_whitespace()
        .enumerate()
        .map(|(position, token)| {
            let valid = !token.is_empty()
                && token.len() <= 2
                && token.chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                return Err(SesFanError::InvalidHexToken {
                    position,
                    token: token.to_string(),
                });
            }
            u8::from_str_radix(token, 16).map_err(|_| SesFanError::InvalidHexToken {
                position,
                token: token.to_string(),
            })
        })
        .collect()
}

/// Format bytes as a hex dump in the transport's ingestion layout
pub fn format_hex_dump(bytes: &[u8]) -> String {
    // 2 hex digits + separator per byte, one extra space per line, final newline
    let mut output = String::with_capacity(bytes.len() * 3 + bytes.len() / 16 + 1);
    let mut count = 0;

    for byte in bytes {
        // write! to String is infallible
        let _ = write!(output, "{:02x}", byte);
        count += 1;

        if count == 8 {
            output.push_str("  ");
        } else if count == 16 {
            output.push('\n');
            count = 0;
        } else {
            output.push(' ');
        }
    }

    output.push('\n');
    output
}

/// Typed control page buffer for one enclosure model
///
/// Guaranteed at construction to cover every fan slot of `M`. Only the fan
/// slots can be modified; all other bytes go back to the device as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPage<M: EnclosureModel = DefaultEnclosure> {
    bytes: Vec<u8>,
    _model: PhantomData<M>,
}

impl<M: EnclosureModel> ControlPage<M> {
    /// Build a page from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let required = M::min_control_page_len();
        if bytes.len() < required {
            return Err(SesFanError::ControlPageTooShort {
                len: bytes.len(),
                required,
            });
        }

        Ok(Self {
            bytes,
            _model: PhantomData,
        })
    }

    /// Build a page from the transport's hex dump
    pub fn parse(dump: &str) -> Result<Self> {
        Self::from_bytes(parse_hex_dump(dump)?)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn slot_range(index: usize) -> Result<std::ops::Range<usize>> {
        if index >= M::FAN_COUNT {
            return Err(SesFanError::InvalidFanIndex {
                index,
                fan_count: M::FAN_COUNT,
            });
        }
        let start = M::fan_slot_offset(index);
        Ok(start..start + M::FAN_SLOT_LEN)
    }

    /// Current control word of fan `index`
    pub fn fan_slot(&self, index: usize) -> Result<[u8; 4]> {
        let range = Self::slot_range(index)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[range]);
        Ok(word)
    }

    /// Overwrite the control word of fan `index`
    pub fn set_fan_slot(&mut self, index: usize, word: [u8; 4]) -> Result<()> {
        let range = Self::slot_range(index)?;
        self.bytes[range].copy_from_slice(&word);
        Ok(())
    }

    /// Command every fan slot to `speed`
    pub fn apply_speed(&mut self, speed: u8) {
        let word = fan_control_word(speed);
        for index in 0..M::FAN_COUNT {
            let start = M::fan_slot_offset(index);
            self.bytes[start..start + M::FAN_SLOT_LEN].copy_from_slice(&word);
        }
    }

    /// Serialize for submission to the transport
    pub fn to_hex_dump(&self) -> String {
        format_hex_dump(&self.bytes)
    }
}
