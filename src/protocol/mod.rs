//! Protocol Module
//!
//! Defines the SBE chip-op wire protocol.
//!
//! ## Protocol Format
//!
//! All multi-byte integers are big-endian.
//!
//! ### Request Format
//! ```text
//! ┌────────────┬────────────────────┬──────────────────────────┐
//! │ Count (4)  │ Opcode (4)         │ Params (4 × n)           │
//! │ = 2 + n    │ class << 8 | id    │                          │
//! └────────────┴────────────────────┴──────────────────────────┘
//! ```
//!
//! ### Response Format
//! ```text
//! ┌─────────────┬────────────┬────────────┬───────────────┬─────────────┐
//! │ Payload     │ Header (4) │ Status (4) │ FFDC records  │ Trailer (4) │
//! │ header_pos×4│ 0xC0DE|op  │ prim|sec   │ (chained)     │ = T         │
//! └─────────────┴────────────┴────────────┴───────────────┴─────────────┘
//! header_pos = total_words - T
//! ```
//!
//! ### Opcodes
//! - 0xAA01: GET_DUMP   - Params: packed dump flags
//! - 0xA801: GET_FFDC   - Params: none
//! - 0x2101: RESET_FIFO - Params: none

mod opcode;
mod command;
mod response;
mod codec;
mod policy;

pub use opcode::Opcode;
pub use command::{Command, DumpRequest};
pub use response::{FfdcRecord, ResponseEnvelope, Status, FFDC_MAGIC_HWP, FFDC_MAGIC_SBE};
pub use codec::{decode_response, encode_response, FFDC_HEADER_SIZE, HEADER_MAGIC, WORD_SIZE};
pub use policy::{Policy, PolicyEntry};
