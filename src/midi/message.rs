use std::fmt;
use std::time::{Duration, Instant};

/// Microseconds since the engine epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis * 1_000)
    }

    /// Milliseconds elapsed between `earlier` and `self`, saturating at zero
    /// when the two arrive out of order.
    pub fn millis_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0) / 1_000
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}ms", self.0 / 1_000, self.0 % 1_000)
    }
}

/// Shared time origin for everything fed into one engine.
#[derive(Debug, Clone, Copy)]
pub struct Epoch(Instant);

impl Epoch {
    pub fn now() -> Self {
        Epoch(Instant::now())
    }

    pub fn stamp(&self) -> Timestamp {
        Timestamp(duration_micros(self.0.elapsed()))
    }
}

fn duration_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Undecoded protocol payload as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub bytes: Vec<u8>,
    pub timestamp: Timestamp,
}

impl RawMessage {
    pub fn new(bytes: impl Into<Vec<u8>>, timestamp: Timestamp) -> Self {
        Self {
            bytes: bytes.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    On,
    Off,
}

/// A decoded note-on or note-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    pub kind: NoteKind,
    pub timestamp: Timestamp,
}

impl NoteEvent {
    pub fn on(channel: u8, pitch: u8, velocity: u8, timestamp: Timestamp) -> Self {
        Self {
            channel,
            pitch,
            velocity,
            kind: NoteKind::On,
            timestamp,
        }
    }

    pub fn off(channel: u8, pitch: u8, timestamp: Timestamp) -> Self {
        Self {
            channel,
            pitch,
            velocity: 0,
            kind: NoteKind::Off,
            timestamp,
        }
    }

    pub fn is_on(&self) -> bool {
        self.kind == NoteKind::On
    }

    /// Wire encoding, used when echoing notes to an output port.
    pub fn to_bytes(&self) -> [u8; 3] {
        let status = match self.kind {
            NoteKind::On => 0x90,
            NoteKind::Off => 0x80,
        };
        [status | (self.channel & 0x0F), self.pitch & 0x7F, self.velocity & 0x7F]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_since_saturates() {
        let early = Timestamp::from_millis(100);
        let late = Timestamp::from_millis(350);
        assert_eq!(late.millis_since(early), 250);
        assert_eq!(early.millis_since(late), 0);
    }

    #[test]
    fn test_note_event_wire_bytes() {
        let on = NoteEvent::on(2, 60, 100, Timestamp(0));
        assert_eq!(on.to_bytes(), [0x92, 60, 100]);

        let off = NoteEvent::off(15, 72, Timestamp(0));
        assert_eq!(off.to_bytes(), [0x8F, 72, 0]);
    }

    #[test]
    fn test_timestamp_display() {
        assert_eq!(Timestamp(1_234_567).to_string(), "1234.567ms");
    }
}
