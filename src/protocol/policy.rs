//! Timeout and response size policy
//!
//! Every opcode the command encoder produces must have an entry in `TABLE`.

use crate::config::Config;
use super::Opcode;

/// Recommended execution limits for one opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyEntry {
    /// Time the SBE is given to respond (milliseconds)
    pub timeout_ms: u32,

    /// Upper bound on the response buffer (bytes)
    pub response_size: u32,
}

const TABLE: &[(Opcode, PolicyEntry)] = &[
    (
        Opcode::GET_DUMP,
        PolicyEntry {
            timeout_ms: 60_000,
            response_size: 80 * 1024 * 1024,
        },
    ),
    (
        Opcode::GET_FFDC,
        PolicyEntry {
            timeout_ms: 5_000,
            response_size: 64 * 1024,
        },
    ),
    (
        Opcode::RESET_FIFO,
        PolicyEntry {
            timeout_ms: 5_000,
            response_size: 4096,
        },
    ),
];

/// Opcode → timeout/size lookup with a fallback for unknown opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    fallback: PolicyEntry,
}

impl Default for Policy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Policy {
    pub fn new(fallback_timeout_ms: u32, fallback_response_size: u32) -> Self {
        Self {
            fallback: PolicyEntry {
                timeout_ms: fallback_timeout_ms,
                response_size: fallback_response_size,
            },
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.fallback_timeout_ms, config.fallback_response_size)
    }

    /// Table entry for `opcode`, `None` if it would fall back
    pub fn entry(&self, opcode: Opcode) -> Option<PolicyEntry> {
        TABLE
            .iter()
            .find(|(op, _)| *op == opcode)
            .map(|(_, entry)| *entry)
    }

    /// Table entry or fallback
    pub fn lookup(&self, opcode: Opcode) -> PolicyEntry {
        self.entry(opcode).unwrap_or(self.fallback)
    }

    pub fn timeout_ms(&self, opcode: Opcode) -> u32 {
        self.lookup(opcode).timeout_ms
    }

    pub fn response_size(&self, opcode: Opcode) -> u32 {
        self.lookup(opcode).response_size
    }

    pub fn fallback(&self) -> PolicyEntry {
        self.fallback
    }
}
