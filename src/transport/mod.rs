//! Transport Module
//!
//! The capability the executor needs from the platform: configure a
//! timeout, then run one blocking request/response exchange.
//!
//! ## Contract
//! - `set_timeout` is a side effect on the target and must take effect
//!   before the next `execute` on the same target
//! - `execute` returns the full response buffer; ownership passes to the
//!   caller
//! - Neither call is reentrant: chip-ops against one target must be
//!   serialized (see [`SharedTarget`])

mod shared;

pub use shared::SharedTarget;

use thiserror::Error;

/// Errors reported by a transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The device did not answer within the configured timeout
    #[error("timed out")]
    Timeout,

    /// Any other transport-level failure
    #[error("{0}")]
    Failure(String),
}

/// A resolved SBE target reachable over a FIFO-like transport
pub trait ChipOpTransport {
    /// Set the chip-op timeout used by the next `execute`
    fn set_timeout(&mut self, timeout_ms: u32);

    /// Send `request` and wait for a response of at most `expected_len` bytes
    fn execute(&mut self, request: &[u8], expected_len: u32) -> Result<Vec<u8>, TransportError>;
}

impl<T: ChipOpTransport + ?Sized> ChipOpTransport for &mut T {
    fn set_timeout(&mut self, timeout_ms: u32) {
        (**self).set_timeout(timeout_ms)
    }

    fn execute(&mut self, request: &[u8], expected_len: u32) -> Result<Vec<u8>, TransportError> {
        (**self).execute(request, expected_len)
    }
}

impl<T: ChipOpTransport + ?Sized> ChipOpTransport for Box<T> {
    fn set_timeout(&mut self, timeout_ms: u32) {
        (**self).set_timeout(timeout_ms)
    }

    fn execute(&mut self, request: &[u8], expected_len: u32) -> Result<Vec<u8>, TransportError> {
        (**self).execute(request, expected_len)
    }
}
