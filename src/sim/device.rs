//! Simulated SBE device

use std::collections::{HashMap, VecDeque};

use crate::protocol::{encode_response, Command, Opcode, ResponseEnvelope};
use crate::transport::{ChipOpTransport, TransportError};
use super::SimReply;

/// Scripted stand-in for an SBE behind a FIFO
#[derive(Debug, Default)]
pub struct SimulatedSbe {
    /// One-shot replies, consumed in order
    queued: HashMap<Opcode, VecDeque<SimReply>>,

    /// Replies used once the queue for an opcode is empty
    persistent: HashMap<Opcode, SimReply>,

    /// Every timeout passed to `set_timeout`
    timeouts: Vec<u32>,

    /// Every request accepted by `execute`, with the timeout in force
    requests: Vec<(Command, Option<u32>)>,

    current_timeout_ms: Option<u32>,
}

impl SimulatedSbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `opcode` chip-op with `reply`
    pub fn on(&mut self, opcode: Opcode, reply: SimReply) -> &mut Self {
        self.persistent.insert(opcode, reply);
        self
    }

    /// Answer the next `opcode` chip-op with `reply`
    pub fn push(&mut self, opcode: Opcode, reply: SimReply) -> &mut Self {
        self.queued.entry(opcode).or_default().push_back(reply);
        self
    }

    /// Builder form of [`on`](Self::on)
    pub fn with_reply(mut self, opcode: Opcode, reply: SimReply) -> Self {
        self.on(opcode, reply);
        self
    }

    pub fn timeouts(&self) -> &[u32] {
        &self.timeouts
    }

    pub fn current_timeout_ms(&self) -> Option<u32> {
        self.current_timeout_ms
    }

    /// Opcodes of accepted requests, in order
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.requests.iter().map(|(cmd, _)| cmd.opcode()).collect()
    }

    /// Accepted requests with the timeout that was configured for each
    pub fn requests(&self) -> &[(Command, Option<u32>)] {
        &self.requests
    }

    fn next_reply(&mut self, opcode: Opcode) -> SimReply {
        if let Some(reply) = self.queued.get_mut(&opcode).and_then(VecDeque::pop_front) {
            return reply;
        }
        self.persistent
            .get(&opcode)
            .cloned()
            .unwrap_or_else(|| SimReply::ok(Vec::new()))
    }
}

impl ChipOpTransport for SimulatedSbe {
    fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeouts.push(timeout_ms);
        self.current_timeout_ms = Some(timeout_ms);
    }

    fn execute(&mut self, request: &[u8], expected_len: u32) -> Result<Vec<u8>, TransportError> {
        let command = Command::from_bytes(request)
            .map_err(|e| TransportError::Failure(format!("rejected request: {}", e)))?;
        let opcode = command.opcode();
        self.requests.push((command, self.current_timeout_ms));

        let bytes = match self.next_reply(opcode) {
            SimReply::Respond {
                payload,
                status,
                ffdc,
            } => encode_response(opcode, &ResponseEnvelope::new(payload, status, ffdc)),
            SimReply::Raw(bytes) => bytes,
            SimReply::Timeout => return Err(TransportError::Timeout),
            SimReply::Fail(message) => return Err(TransportError::Failure(message)),
        };

        if bytes.len() > expected_len as usize {
            return Err(TransportError::Failure(format!(
                "response of {} bytes exceeds buffer of {}",
                bytes.len(),
                expected_len
            )));
        }
        if bytes.is_empty() {
            return Err(TransportError::Failure("empty response".to_string()));
        }

        tracing::trace!("Simulated SBE answered {} with {} bytes", opcode, bytes.len());
        Ok(bytes)
    }
}
