//! # sbe-chipop
//!
//! Chip-op protocol for the Self Boot Engine (SBE) FIFO:
//! - Fixed-shape big-endian command encoding
//! - Trailer-addressed response decoding with FFDC chains
//! - Per-opcode timeout and response size policy
//! - Blocking executor with a best-effort supplemental FFDC fetch
//! - TCP bridge for issuing chip-ops against a remotely owned target
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Caller (get_dump / get_ffdc)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Executor                               │
//! │      encode → set timeout → transport → decode → classify    │
//! └──────┬──────────────────────┬─────────────────────┬─────────┘
//!        │                      │                     │
//!        ▼                      ▼                     ▼
//!  ┌───────────┐        ┌──────────────┐      ┌──────────────┐
//!  │  Command  │        │    Policy    │      │   Decoder    │
//!  │  Encoder  │        │ (timeout/len)│      │ (status/FFDC)│
//!  └───────────┘        └──────────────┘      └──────────────┘
//!                               │
//!                               ▼
//!                     ┌───────────────────┐
//!                     │  ChipOpTransport  │
//!                     │ (FIFO / bridge /  │
//!                     │    simulator)     │
//!                     └───────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod transport;
pub mod executor;
pub mod sim;
pub mod bridge;
pub mod dump;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ChipOpError, Result};
pub use config::{Config, FfdcStrategy};
pub use executor::{ChipOpResponse, Executor};
pub use transport::{ChipOpTransport, SharedTarget, TransportError};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of sbe-chipop
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
