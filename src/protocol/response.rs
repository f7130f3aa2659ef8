//! Response definitions
//!
//! Decoded chip-op responses and the FFDC records they carry.

use std::fmt;

use bytes::BufMut;

use crate::error::{ChipOpError, Result};
use super::codec::{FFDC_HEADER_SIZE, WORD_SIZE};

/// FFDC package magic emitted by SBE firmware
pub const FFDC_MAGIC_SBE: u16 = 0xFBAD;

/// FFDC package magic emitted by hardware procedures
pub const FFDC_MAGIC_HWP: u16 = 0xFFDC;

/// Primary/secondary status pair packed into one response word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    pub primary: u16,
    pub secondary: u16,
}

impl Status {
    pub const SUCCESS: Status = Status {
        primary: 0,
        secondary: 0,
    };

    pub const fn new(primary: u16, secondary: u16) -> Self {
        Self { primary, secondary }
    }

    /// High 16 bits primary, low 16 bits secondary
    pub const fn from_word(word: u32) -> Self {
        Self {
            primary: (word >> 16) as u16,
            secondary: (word & 0xFFFF) as u16,
        }
    }

    pub const fn to_word(self) -> u32 {
        ((self.primary as u32) << 16) | self.secondary as u32
    }

    pub const fn is_success(self) -> bool {
        self.primary == 0 && self.secondary == 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "primary=0x{:04X} secondary=0x{:04X}",
            self.primary, self.secondary
        )
    }
}

/// One First-Failure-Data-Capture record
///
/// `raw_data` holds the whole record as found on the wire, header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfdcRecord {
    pub slid: u8,
    pub severity: u8,

    /// Only the low byte is present in the record header
    pub chip_id: u32,

    pub raw_data: Vec<u8>,
}

impl FfdcRecord {
    /// Build a well-formed record; `body` is zero-padded to a word boundary
    pub fn build(magic: u16, slid: u8, severity: u8, chip_id: u8, body: &[u8]) -> Result<Self> {
        let padded_body = body.len().div_ceil(WORD_SIZE) * WORD_SIZE;
        let byte_len = FFDC_HEADER_SIZE + padded_body;
        let word_len = u16::try_from(byte_len / WORD_SIZE).map_err(|_| {
            ChipOpError::Protocol(format!(
                "FFDC record of {} bytes exceeds the 16-bit word length field",
                byte_len
            ))
        })?;

        let mut raw_data = Vec::with_capacity(byte_len);
        raw_data.put_u16(magic);
        raw_data.put_u16(word_len);
        raw_data.put_u16(slid as u16);
        raw_data.put_u8(severity);
        raw_data.put_u8(chip_id);
        raw_data.put_slice(body);
        raw_data.resize(byte_len, 0);

        Ok(Self {
            slid,
            severity,
            chip_id: chip_id as u32,
            raw_data,
        })
    }

    /// Magic value from the record header
    pub fn magic(&self) -> Option<u16> {
        match self.raw_data.get(..2) {
            Some(&[hi, lo]) => Some(u16::from_be_bytes([hi, lo])),
            _ => None,
        }
    }

    /// Record contents after the 8-byte header
    pub fn body(&self) -> &[u8] {
        self.raw_data.get(FFDC_HEADER_SIZE..).unwrap_or(&[])
    }
}

/// Decoded response buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseEnvelope {
    /// Bytes preceding the status header
    pub payload: Vec<u8>,

    pub status: Status,

    /// FFDC records in the order found after the status word
    pub ffdc_list: Vec<FfdcRecord>,

    /// Set when the buffer was too short or its trailer pointed outside it
    pub malformed: bool,
}

impl ResponseEnvelope {
    pub fn new(payload: Vec<u8>, status: Status, ffdc_list: Vec<FfdcRecord>) -> Self {
        Self {
            payload,
            status,
            ffdc_list,
            malformed: false,
        }
    }

    /// Empty, zero-status envelope returned for unparseable buffers
    pub fn malformed() -> Self {
        Self {
            malformed: true,
            ..Self::default()
        }
    }

    pub fn primary_status(&self) -> u16 {
        self.status.primary
    }

    pub fn secondary_status(&self) -> u16 {
        self.status.secondary
    }

    /// Zero status on a well-formed buffer
    pub fn is_success(&self) -> bool {
        !self.malformed && self.status.is_success()
    }
}
