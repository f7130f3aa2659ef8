//! Bridge Module
//!
//! Carries chip-ops over TCP to a host that owns the SBE target.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Worker thread pool for connections (fed over a bounded channel)
//! - Every chip-op runs under the target's [`SharedTarget`](crate::SharedTarget) lock
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Len (4)  │ CRC (4)  │   bincode(BridgeRequest |   │
//! │          │          │           BridgeReply)      │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

mod frame;
mod client;
mod server;
mod connection;

pub use frame::{
    decode_frame, encode_frame, read_frame, write_frame, BridgeReply, BridgeRequest,
    FRAME_HEADER_SIZE, MAX_FRAME_SIZE,
};
pub use client::BridgeTransport;
pub use server::BridgeServer;
pub use connection::Connection;
