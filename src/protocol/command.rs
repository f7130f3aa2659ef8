//! Command definitions
//!
//! Builds the word sequence sent to the SBE for a chip-op.

use bytes::{Buf, BufMut};

use crate::error::{ChipOpError, Result};
use super::codec::WORD_SIZE;
use super::Opcode;

/// Words preceding the parameters: count + opcode
const PREAMBLE_WORDS: usize = 2;

/// An encoded chip-op request
///
/// Word 0 always equals the number of words in the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    words: Vec<u32>,
}

/// Parameters of a GET_DUMP chip-op
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DumpRequest {
    /// Dump type (4 bits)
    pub dump_type: u8,

    /// Clock state (2 bits)
    pub clock: u8,

    /// Also collect fast-array data
    pub collect_fa: bool,
}

impl DumpRequest {
    pub fn new(dump_type: u8, clock: u8, collect_fa: bool) -> Self {
        Self {
            dump_type,
            clock,
            collect_fa,
        }
    }

    /// Pack into one word: type in bits [0:3], clock in [8:9], flag in bit 16
    pub fn flags_word(&self) -> u32 {
        ((self.collect_fa as u32) << 16)
            | (((self.clock & 0x3) as u32) << 8)
            | (self.dump_type & 0xF) as u32
    }
}

impl Command {
    /// Generic encoder: `[2 + params.len(), opcode, params...]`
    pub fn encode(class: u8, id: u8, params: &[u32]) -> Self {
        let opcode = Opcode::new(class, id);
        let mut words = Vec::with_capacity(PREAMBLE_WORDS + params.len());
        words.push((PREAMBLE_WORDS + params.len()) as u32);
        words.push(opcode.to_word());
        words.extend_from_slice(params);
        Self { words }
    }

    /// GET_DUMP with packed flags
    pub fn get_dump(request: DumpRequest) -> Self {
        let op = Opcode::GET_DUMP;
        Self::encode(op.class(), op.id(), &[request.flags_word()])
    }

    /// GET_FFDC
    pub fn get_ffdc() -> Self {
        let op = Opcode::GET_FFDC;
        Self::encode(op.class(), op.id(), &[])
    }

    /// RESET_FIFO
    pub fn reset_fifo() -> Self {
        let op = Opcode::RESET_FIFO;
        Self::encode(op.class(), op.id(), &[])
    }

    pub fn opcode(&self) -> Opcode {
        Opcode::from_word(self.words[1])
    }

    /// All words, including count and opcode
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Operation-specific parameter words
    pub fn params(&self) -> &[u32] {
        &self.words[PREAMBLE_WORDS..]
    }

    /// Big-endian wire bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.words.len() * WORD_SIZE);
        for word in &self.words {
            bytes.put_u32(*word);
        }
        bytes
    }

    /// Parse a request buffer back into a command
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % WORD_SIZE != 0 {
            return Err(ChipOpError::Protocol(format!(
                "Request length {} is not a multiple of {}",
                bytes.len(),
                WORD_SIZE
            )));
        }

        let word_count = bytes.len() / WORD_SIZE;
        if word_count < PREAMBLE_WORDS {
            return Err(ChipOpError::Protocol(format!(
                "Request too short: {} words (min {})",
                word_count, PREAMBLE_WORDS
            )));
        }

        let mut cursor = bytes;
        let mut words = Vec::with_capacity(word_count);
        while cursor.has_remaining() {
            words.push(cursor.get_u32());
        }

        if words[0] as usize != word_count {
            return Err(ChipOpError::Protocol(format!(
                "Request word count mismatch: header says {}, buffer has {}",
                words[0], word_count
            )));
        }

        Ok(Self { words })
    }
}
