//! USB-MIDI 1.0 event packets.
//!
//! On the bulk endpoints every MIDI message travels in 4-byte event packets:
//! a header byte (cable number + code index) followed by up to three MIDI
//! bytes. SysEx streams are cut into 3-byte continuation packets and closed
//! by a 1-, 2- or 3-byte end packet.

use bytes::Bytes;
use modular_bitfield::prelude::*;
use num_enum::{FromPrimitive, IntoPrimitive};
use tracing::{debug, warn};

use crate::constants::{SYSEX_END, SYSEX_START};

/// Size of one USB-MIDI event packet
pub const EVENT_PACKET_SIZE: usize = 4;

#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventHeader {
    pub code_index: B4,
    pub cable: B4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum CodeIndex {
    Misc = 0x0,
    SysExStart = 0x4,
    SysExEnd1 = 0x5,
    SysExEnd2 = 0x6,
    SysExEnd3 = 0x7,

    #[num_enum(catch_all)]
    Other(u8),
}

impl CodeIndex {
    /// Number of MIDI bytes carried by a SysEx packet with this code index.
    fn sysex_len(self) -> Option<usize> {
        match self {
            CodeIndex::SysExStart | CodeIndex::SysExEnd3 => Some(3),
            CodeIndex::SysExEnd1 => Some(1),
            CodeIndex::SysExEnd2 => Some(2),
            _ => None,
        }
    }

    fn sysex_end(len: usize) -> Self {
        match len {
            1 => CodeIndex::SysExEnd1,
            2 => CodeIndex::SysExEnd2,
            _ => CodeIndex::SysExEnd3,
        }
    }
}

/// Cut a complete SysEx frame into event packets for `cable` (0..=15).
pub fn packetize(frame: &[u8], cable: u8) -> Vec<u8> {
    let chunk_count = frame.len().div_ceil(3);
    let mut out = Vec::with_capacity(chunk_count * EVENT_PACKET_SIZE);
    for (i, chunk) in frame.chunks(3).enumerate() {
        let code_index = if i + 1 == chunk_count {
            CodeIndex::sysex_end(chunk.len())
        } else {
            CodeIndex::SysExStart
        };
        let header = EventHeader::new()
            .with_code_index(code_index.into())
            .with_cable(cable & 0x0F);
        out.extend_from_slice(&header.into_bytes());
        let mut data = [0u8; 3];
        data[..chunk.len()].copy_from_slice(chunk);
        out.extend_from_slice(&data);
    }
    out
}

/// Reassembles SysEx frames from a stream of event packets.
#[derive(Debug, Default)]
pub struct SysExAssembler {
    cable: u8,
    buffer: Vec<u8>,
}

impl SysExAssembler {
    pub fn new(cable: u8) -> Self {
        Self {
            cable: cable & 0x0F,
            buffer: Vec::new(),
        }
    }

    /// True while a frame has been started but not closed.
    pub fn in_progress(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Feed raw bytes from a bulk-IN transfer; returns every frame completed by them.
    ///
    /// A frame interrupted by a new start byte is emitted as-is so the frame
    /// parser can report it.
    pub fn push(&mut self, data: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        let chunks = data.chunks_exact(EVENT_PACKET_SIZE);
        if !chunks.remainder().is_empty() {
            warn!(
                trailing = chunks.remainder().len(),
                "Ignoring bytes that do not form a whole USB-MIDI event packet"
            );
        }

        for packet in chunks {
            let header = EventHeader::from_bytes([packet[0]]);
            let code_index = CodeIndex::from_primitive(header.code_index());
            if code_index == CodeIndex::Misc && packet.iter().all(|&b| b == 0) {
                // zero padding at the end of a transfer
                continue;
            }
            if header.cable() != self.cable {
                debug!(cable = header.cable(), "Skipping event for another cable");
                continue;
            }
            let Some(len) = code_index.sysex_len() else {
                debug!(packet = hex::encode(packet), "Skipping non-SysEx event");
                continue;
            };
            let body = &packet[1..1 + len];

            if body[0] == SYSEX_START && self.in_progress() {
                warn!(len = self.buffer.len(), "SysEx frame interrupted by a new start byte");
                frames.push(Bytes::from(std::mem::take(&mut self.buffer)));
            }
            if !self.in_progress() && body[0] != SYSEX_START && code_index != CodeIndex::SysExStart {
                // one- to three-byte system common message, not part of a SysEx stream
                debug!(packet = hex::encode(packet), "Skipping system common event");
                continue;
            }

            self.buffer.extend_from_slice(body);
            if code_index != CodeIndex::SysExStart || body.contains(&SYSEX_END) {
                frames.push(Bytes::from(std::mem::take(&mut self.buffer)));
            }
        }
        frames
    }
}
