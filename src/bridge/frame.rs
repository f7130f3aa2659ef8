//! Bridge frame codec
//!
//! Length-prefixed, CRC-checked bincode messages.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Len (4)  │ CRC (4)  │         Body (Len)          │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//! Both header fields are big-endian; the CRC covers the body only.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ChipOpError, Result};

/// Header size: 4 bytes length + 4 bytes CRC
pub const FRAME_HEADER_SIZE: usize = 8;

/// Maximum body size (128 MB), enough for the largest dump response
pub const MAX_FRAME_SIZE: u32 = 128 * 1024 * 1024;

/// Client → server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeRequest {
    /// Apply `timeout_ms` to the target, then run one transport exchange
    Execute {
        timeout_ms: u32,
        expected_len: u32,
        request: Vec<u8>,
    },

    /// Liveness check
    Ping,
}

/// Server → client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeReply {
    /// Raw response buffer from the target
    Response(Vec<u8>),

    /// The target timed out
    Timeout,

    /// The target's transport failed
    Failure(String),

    Pong,
}

// =============================================================================
// Encoding/Decoding
// =============================================================================

/// Encode a message to a complete frame
pub fn encode_frame<M: Serialize>(message: &M) -> Result<Vec<u8>> {
    let body = bincode::serialize(message)?;
    if body.len() > MAX_FRAME_SIZE as usize {
        return Err(ChipOpError::Protocol(format!(
            "Frame too large: {} bytes (max {})",
            body.len(),
            MAX_FRAME_SIZE
        )));
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&crc32fast::hash(&body).to_be_bytes());
    frame.extend_from_slice(&body);

    Ok(frame)
}

/// Decode a complete frame
pub fn decode_frame<M: DeserializeOwned>(bytes: &[u8]) -> Result<M> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(ChipOpError::Protocol(format!(
            "Incomplete frame header: expected {} bytes, got {}",
            FRAME_HEADER_SIZE,
            bytes.len()
        )));
    }

    let (body_len, crc) = parse_header(&bytes[..FRAME_HEADER_SIZE])?;

    let total_len = FRAME_HEADER_SIZE + body_len;
    if bytes.len() < total_len {
        return Err(ChipOpError::Protocol(format!(
            "Incomplete frame body: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    decode_body(&bytes[FRAME_HEADER_SIZE..total_len], crc)
}

fn parse_header(header: &[u8]) -> Result<(usize, u32)> {
    let body_len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    let crc = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

    if body_len > MAX_FRAME_SIZE {
        return Err(ChipOpError::Protocol(format!(
            "Frame too large: {} bytes (max {})",
            body_len, MAX_FRAME_SIZE
        )));
    }

    Ok((body_len as usize, crc))
}

fn decode_body<M: DeserializeOwned>(body: &[u8], crc: u32) -> Result<M> {
    let actual = crc32fast::hash(body);
    if actual != crc {
        return Err(ChipOpError::Protocol(format!(
            "Frame CRC mismatch: expected 0x{:08x}, computed 0x{:08x}",
            crc, actual
        )));
    }
    Ok(bincode::deserialize(body)?)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete frame from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_frame<R: Read, M: DeserializeOwned>(reader: &mut R) -> Result<M> {
    let mut header = [0u8; FRAME_HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let (body_len, crc) = parse_header(&header)?;

    let mut body = vec![0u8; body_len];
    if body_len > 0 {
        reader.read_exact(&mut body)?;
    }

    decode_body(&body, crc)
}

/// Write a frame to a stream
pub fn write_frame<W: Write, M: Serialize>(writer: &mut W, message: &M) -> Result<()> {
    let bytes = encode_frame(message)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
