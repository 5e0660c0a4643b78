//! Turns raw transport payloads into note events.
//!
//! Only note-on and note-off survive; everything else is filtered. The adapter
//! keeps the last channel-voice status byte so streams that elide repeated
//! status bytes (running status) decode correctly.

use super::message::{NoteEvent, NoteKind, RawMessage};
use crate::error::DropReason;
use log::debug;

/// Outcome of decoding a single raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Note(NoteEvent),
    /// Well-formed but not a note message (clock, control change, sysex...).
    Filtered,
    Malformed(DropReason),
}

impl Decoded {
    pub fn note(self) -> Option<NoteEvent> {
        match self {
            Decoded::Note(event) => Some(event),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct EventAdapter {
    running_status: Option<u8>,
}

impl EventAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `raw`, returning a note event when it is one.
    pub fn adapt(&mut self, raw: &RawMessage) -> Option<NoteEvent> {
        self.decode(raw).note()
    }

    pub fn decode(&mut self, raw: &RawMessage) -> Decoded {
        let data = raw.bytes.as_slice();
        let Some(&first) = data.first() else {
            return Decoded::Malformed(DropReason::Empty);
        };

        let (status, payload) = if first & 0x80 != 0 {
            (first, &data[1..])
        } else {
            match self.running_status {
                Some(status) => (status, data),
                None => return Decoded::Malformed(DropReason::NoRunningStatus),
            }
        };

        match status {
            0xF8..=0xFF => Decoded::Filtered,
            0xF0..=0xF7 => {
                self.running_status = None;
                Decoded::Filtered
            }
            _ => {
                self.running_status = Some(status);
                Self::decode_channel_message(status, payload, raw)
            }
        }
    }

    fn decode_channel_message(status: u8, payload: &[u8], raw: &RawMessage) -> Decoded {
        let needed = match status & 0xF0 {
            0xC0 | 0xD0 => 1,
            _ => 2,
        };
        if payload.len() < needed {
            debug!("Truncated MIDI message {:02X?}", raw.bytes);
            return Decoded::Malformed(DropReason::Truncated);
        }
        if payload[..needed].iter().any(|b| b & 0x80 != 0) {
            debug!("Invalid data byte in MIDI message {:02X?}", raw.bytes);
            return Decoded::Malformed(DropReason::InvalidDataByte);
        }

        let channel = status & 0x0F;
        match status & 0xF0 {
            0x90 if payload[1] > 0 => Decoded::Note(NoteEvent {
                channel,
                pitch: payload[0],
                velocity: payload[1],
                kind: NoteKind::On,
                timestamp: raw.timestamp,
            }),
            // Note-on with zero velocity is a release.
            0x90 | 0x80 => Decoded::Note(NoteEvent {
                channel,
                pitch: payload[0],
                velocity: payload[1],
                kind: NoteKind::Off,
                timestamp: raw.timestamp,
            }),
            _ => Decoded::Filtered,
        }
    }
}
