//! Response codec
//!
//! Decoding (and, for simulators, encoding) of SBE response buffers.
//!
//! ## Wire Format
//!
//! ```text
//! word:  0 ........ hp-1 │ hp          │ hp+1        │ hp+2 ...     │ n-1
//!        payload         │ 0xC0DE | op │ prim | sec  │ FFDC chain   │ T = n - hp
//! ```
//!
//! ### FFDC Record Header
//! ```text
//! ┌───────────┬─────────────┬──────────┬──────────────┬─────────────┐
//! │ Magic (2) │ WordLen (2) │ SLID (2) │ Severity (1) │ ChipId (1)  │
//! └───────────┴─────────────┴──────────┴──────────────┴─────────────┘
//! ```
//! The record spans `WordLen * 4` bytes, header included.

use bytes::{Buf, BufMut};

use super::response::{FFDC_MAGIC_HWP, FFDC_MAGIC_SBE};
use super::{FfdcRecord, Opcode, ResponseEnvelope, Status};

/// Size of one protocol word
pub const WORD_SIZE: usize = 4;

/// Fixed portion of an FFDC record
pub const FFDC_HEADER_SIZE: usize = 8;

/// High half of the response header word
pub const HEADER_MAGIC: u16 = 0xC0DE;

/// Header word + status word + trailer
const MIN_RESPONSE_WORDS: usize = 3;

// =============================================================================
// Decoding
// =============================================================================

/// Decode a raw response buffer
///
/// Never fails: a buffer shorter than three words, or one whose trailer
/// points outside it, yields [`ResponseEnvelope::malformed`]. Bytes past the
/// last whole word are ignored for trailer arithmetic.
pub fn decode_response(bytes: &[u8]) -> ResponseEnvelope {
    let total_words = bytes.len() / WORD_SIZE;
    if total_words < MIN_RESPONSE_WORDS {
        tracing::trace!("Response too short: {} bytes", bytes.len());
        return ResponseEnvelope::malformed();
    }

    let trailer = read_word(bytes, total_words - 1) as usize;
    let header_pos = match total_words.checked_sub(trailer) {
        Some(pos) if pos + 1 < total_words => pos,
        _ => {
            tracing::trace!(
                "Trailer {} out of range for {}-word response",
                trailer,
                total_words
            );
            return ResponseEnvelope::malformed();
        }
    };

    let status = Status::from_word(read_word(bytes, header_pos + 1));
    let payload = bytes[..header_pos * WORD_SIZE].to_vec();
    let ffdc_list = decode_ffdc_chain(&bytes[(header_pos + 2) * WORD_SIZE..]);

    ResponseEnvelope::new(payload, status, ffdc_list)
}

/// Walk the FFDC chain until an unknown magic or the end of the buffer
fn decode_ffdc_chain(region: &[u8]) -> Vec<FfdcRecord> {
    let mut records = Vec::new();
    let mut offset = 0;

    while region.len() - offset >= FFDC_HEADER_SIZE {
        let mut header = &region[offset..offset + FFDC_HEADER_SIZE];

        let magic = header.get_u16();
        if magic != FFDC_MAGIC_SBE && magic != FFDC_MAGIC_HWP {
            break;
        }

        let word_len = header.get_u16() as usize;
        let slid = header.get_u16() as u8;
        let severity = header.get_u8();
        let chip_id = header.get_u8() as u32;

        let byte_len = word_len * WORD_SIZE;
        if byte_len == 0 {
            tracing::trace!("Zero-length FFDC record at offset {}", offset);
            break;
        }
        if offset + byte_len > region.len() {
            tracing::trace!(
                "Truncated FFDC record at offset {}: declared {} bytes, {} remain",
                offset,
                byte_len,
                region.len() - offset
            );
            break;
        }

        records.push(FfdcRecord {
            slid,
            severity,
            chip_id,
            raw_data: region[offset..offset + byte_len].to_vec(),
        });
        offset += byte_len;
    }

    records
}

/// Read big-endian word `index`
fn read_word(bytes: &[u8], index: usize) -> u32 {
    let start = index * WORD_SIZE;
    (&bytes[start..start + WORD_SIZE]).get_u32()
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a response buffer the way SBE firmware lays it out
///
/// The payload and each FFDC record are zero-padded to a word boundary.
pub fn encode_response(opcode: Opcode, envelope: &ResponseEnvelope) -> Vec<u8> {
    let ffdc_len: usize = envelope
        .ffdc_list
        .iter()
        .map(|r| padded_len(r.raw_data.len()))
        .sum();
    let capacity = padded_len(envelope.payload.len()) + 3 * WORD_SIZE + ffdc_len;
    let mut bytes = Vec::with_capacity(capacity);

    bytes.put_slice(&envelope.payload);
    bytes.resize(padded_len(bytes.len()), 0);
    let header_pos = bytes.len() / WORD_SIZE;

    bytes.put_u32(((HEADER_MAGIC as u32) << 16) | opcode.to_word());
    bytes.put_u32(envelope.status.to_word());

    for record in &envelope.ffdc_list {
        bytes.put_slice(&record.raw_data);
        bytes.resize(padded_len(bytes.len()), 0);
    }

    let total_words = bytes.len() / WORD_SIZE + 1;
    bytes.put_u32((total_words - header_pos) as u32);

    bytes
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD_SIZE) * WORD_SIZE
}
