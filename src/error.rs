//! Error types for sbe-chipop
//!
//! Provides a unified error type for all chip-op operations.

use thiserror::Error;

use crate::protocol::{FfdcRecord, Opcode, Status};

/// Result type alias using ChipOpError
pub type Result<T> = std::result::Result<T, ChipOpError>;

/// Unified error type for chip-op operations
#[derive(Debug, Error)]
pub enum ChipOpError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("chip-op {opcode} timed out")]
    TransportTimeout { opcode: Opcode },

    #[error("chip-op {opcode} transport failure: {message}")]
    Transport { opcode: Opcode, message: String },

    // -------------------------------------------------------------------------
    // Response Errors
    // -------------------------------------------------------------------------
    /// The response buffer was too short or its trailer pointed outside it
    #[error("chip-op {opcode} returned a malformed response ({len} bytes)")]
    MalformedResponse {
        opcode: Opcode,
        len: usize,
        ffdc: Vec<FfdcRecord>,
    },

    /// The transport succeeded but the SBE reported a nonzero status
    #[error("chip-op {opcode} failed with {status} ({} FFDC records)", ffdc.len())]
    ChipOpFailed {
        opcode: Opcode,
        status: Status,
        payload: Vec<u8>,
        ffdc: Vec<FfdcRecord>,
    },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol / Bridge Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChipOpError {
    /// FFDC records attached to a response-bearing failure, if any
    pub fn ffdc(&self) -> &[FfdcRecord] {
        match self {
            ChipOpError::MalformedResponse { ffdc, .. } | ChipOpError::ChipOpFailed { ffdc, .. } => {
                ffdc
            }
            _ => &[],
        }
    }

    /// True for timeout and generic transport failures
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChipOpError::TransportTimeout { .. } | ChipOpError::Transport { .. }
        )
    }
}

impl From<bincode::Error> for ChipOpError {
    fn from(err: bincode::Error) -> Self {
        ChipOpError::Serialization(err.to_string())
    }
}
