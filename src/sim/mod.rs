//! Simulated SBE
//!
//! An in-process [`ChipOpTransport`](crate::transport::ChipOpTransport)
//! that answers chip-ops from scripted replies.
//!
//! ## Behavior
//! - Requests are parsed back into [`Command`](crate::protocol::Command)s
//!   and dispatched on opcode
//! - One-shot replies queued with `push` are consumed first, then the
//!   persistent reply set with `on`, then an empty success
//! - Every timeout and request is recorded for inspection

mod reply;
mod device;

pub use reply::SimReply;
pub use device::SimulatedSbe;
