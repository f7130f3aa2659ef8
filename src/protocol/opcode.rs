//! Opcode definitions
//!
//! A chip-op is identified by a class byte and an id byte.

use std::fmt;

/// Chip-op opcode: `class << 8 | id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opcode(u16);

impl Opcode {
    /// Collect a hardware dump
    pub const GET_DUMP: Opcode = Opcode::new(0xAA, 0x01);

    /// Retrieve pending FFDC from the SBE
    pub const GET_FFDC: Opcode = Opcode::new(0xA8, 0x01);

    /// Reset the SBE FIFO
    pub const RESET_FIFO: Opcode = Opcode::new(0x21, 0x01);

    /// Every opcode the command encoder can produce
    pub const ALL: [Opcode; 3] = [Opcode::GET_DUMP, Opcode::GET_FFDC, Opcode::RESET_FIFO];

    pub const fn new(class: u8, id: u8) -> Self {
        Opcode(((class as u16) << 8) | id as u16)
    }

    /// Extract the opcode from a command's second word
    pub const fn from_word(word: u32) -> Self {
        Opcode((word & 0xFFFF) as u16)
    }

    pub const fn class(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn id(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn to_word(self) -> u32 {
        self.0 as u32
    }

    /// Symbolic name for well-known opcodes
    pub fn name(self) -> Option<&'static str> {
        match self {
            Opcode::GET_DUMP => Some("GET_DUMP"),
            Opcode::GET_FFDC => Some("GET_FFDC"),
            Opcode::RESET_FIFO => Some("RESET_FIFO"),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}(0x{:04X})", name, self.0),
            None => write!(f, "0x{:04X}", self.0),
        }
    }
}

impl From<u16> for Opcode {
    fn from(raw: u16) -> Self {
        Opcode(raw)
    }
}
