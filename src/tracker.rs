//! Tracks sounding notes and turns releases into tie chains.

use crate::error::Result;
use crate::midi::{NoteEvent, NoteKind, Timestamp};
use crate::quantize::{self, NoteValue, Timing};
use log::{debug, warn};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenNote {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    pub start: Timestamp,
}

/// A note whose duration is known, already decomposed into tied values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedNote {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    pub start: Timestamp,
    pub end: Timestamp,
    pub units: u64,
    pub values: Vec<NoteValue>,
}

/// What a single event did to the tracked set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerOutput {
    Opened,
    /// A second note-on for a sounding key closed the earlier note before the
    /// new one was opened.
    Retriggered(Result<ClosedNote>),
    Closed(Result<ClosedNote>),
    /// Note-off with nothing open for that key.
    Ignored,
}

pub struct NoteTracker {
    open: HashMap<(u8, u8), OpenNote>,
    timing: Timing,
    max_tie_chain: usize,
}

impl NoteTracker {
    pub fn new(timing: Timing, max_tie_chain: usize) -> Self {
        Self {
            open: HashMap::new(),
            timing,
            max_tie_chain,
        }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn on_event(&mut self, event: &NoteEvent) -> TrackerOutput {
        let key = (event.channel, event.pitch);
        match event.kind {
            NoteKind::On => {
                let previous = self.open.insert(
                    key,
                    OpenNote {
                        channel: event.channel,
                        pitch: event.pitch,
                        velocity: event.velocity,
                        start: event.timestamp,
                    },
                );
                match previous {
                    Some(note) => {
                        debug!(
                            "Retrigger on channel {} pitch {}, closing previous note",
                            event.channel, event.pitch
                        );
                        TrackerOutput::Retriggered(self.close(note, event.timestamp))
                    }
                    None => TrackerOutput::Opened,
                }
            }
            NoteKind::Off => match self.open.remove(&key) {
                Some(note) => TrackerOutput::Closed(self.close(note, event.timestamp)),
                None => {
                    debug!(
                        "Note-off without note-on: channel {} pitch {}",
                        event.channel, event.pitch
                    );
                    TrackerOutput::Ignored
                }
            },
        }
    }

    /// Closes every sounding note at `at`, oldest first.
    pub fn close_all(&mut self, at: Timestamp) -> Vec<Result<ClosedNote>> {
        let mut notes: Vec<OpenNote> = self.open.drain().map(|(_, note)| note).collect();
        notes.sort_by_key(|note| (note.start, note.channel, note.pitch));
        if !notes.is_empty() {
            warn!("Force-closing {} sounding note(s)", notes.len());
        }
        notes.into_iter().map(|note| self.close(note, at)).collect()
    }

    /// Forgets sounding notes without transcribing them.
    pub fn clear(&mut self) {
        self.open.clear();
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn is_open(&self, channel: u8, pitch: u8) -> bool {
        self.open.contains_key(&(channel, pitch))
    }

    pub fn has_open_on_channel(&self, channel: u8) -> bool {
        self.open.keys().any(|(ch, _)| *ch == channel)
    }

    fn close(&self, note: OpenNote, end: Timestamp) -> Result<ClosedNote> {
        let units = self.timing.units_for(end.millis_since(note.start));
        let values = quantize::tie_chain(units, self.max_tie_chain)?;
        Ok(ClosedNote {
            channel: note.channel,
            pitch: note.pitch,
            velocity: note.velocity,
            start: note.start,
            end,
            units,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranscriptionError;
    use crate::quantize::NoteClass;

    fn tracker() -> NoteTracker {
        NoteTracker::new(Timing::new(1, 4), 256)
    }

    fn ms(millis: u64) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    #[test]
    fn test_on_then_off_closes_note() {
        let mut tracker = tracker();
        assert_eq!(
            tracker.on_event(&NoteEvent::on(0, 60, 90, ms(0))),
            TrackerOutput::Opened
        );
        assert!(tracker.is_open(0, 60));

        // 4 ms at beat type 4 is 8 units: one quarter.
        let TrackerOutput::Closed(Ok(note)) = tracker.on_event(&NoteEvent::off(0, 60, ms(4)))
        else {
            panic!("expected a closed note");
        };
        assert_eq!(note.units, 8);
        assert_eq!(note.values, vec![NoteValue::new(NoteClass::Quarter, false)]);
        assert_eq!(note.velocity, 90);
        assert_eq!(tracker.open_count(), 0);
    }

    #[test]
    fn test_off_without_on_is_ignored() {
        let mut tracker = tracker();
        assert_eq!(
            tracker.on_event(&NoteEvent::off(0, 60, ms(10))),
            TrackerOutput::Ignored
        );
    }

    #[test]
    fn test_keys_are_per_channel_and_pitch() {
        let mut tracker = tracker();
        tracker.on_event(&NoteEvent::on(0, 60, 90, ms(0)));
        tracker.on_event(&NoteEvent::on(1, 60, 90, ms(0)));
        tracker.on_event(&NoteEvent::on(0, 64, 90, ms(0)));
        assert_eq!(tracker.open_count(), 3);
        assert!(tracker.has_open_on_channel(1));
        assert!(!tracker.has_open_on_channel(2));
    }

    #[test]
    fn test_double_on_retriggers() {
        let mut tracker = tracker();
        tracker.on_event(&NoteEvent::on(0, 60, 90, ms(0)));
        let TrackerOutput::Retriggered(Ok(first)) =
            tracker.on_event(&NoteEvent::on(0, 60, 70, ms(16)))
        else {
            panic!("expected a retrigger");
        };
        assert_eq!(first.units, 32);
        assert_eq!(first.end, ms(16));
        assert_eq!(tracker.open_count(), 1);

        let TrackerOutput::Closed(Ok(second)) = tracker.on_event(&NoteEvent::off(0, 60, ms(20)))
        else {
            panic!("expected a closed note");
        };
        assert_eq!(second.start, ms(16));
        assert_eq!(second.velocity, 70);
    }

    #[test]
    fn test_close_all_orders_by_start() {
        let mut tracker = tracker();
        tracker.on_event(&NoteEvent::on(0, 67, 90, ms(2)));
        tracker.on_event(&NoteEvent::on(0, 60, 90, ms(0)));

        let closed: Vec<ClosedNote> = tracker
            .close_all(ms(4))
            .into_iter()
            .map(|note| note.unwrap())
            .collect();
        assert_eq!(closed.len(), 2);
        assert_eq!(closed[0].pitch, 60);
        assert_eq!(closed[0].units, 8);
        assert_eq!(closed[1].pitch, 67);
        assert_eq!(closed[1].units, 4);
        assert_eq!(tracker.open_count(), 0);
    }

    #[test]
    fn test_overflowing_note_is_reported() {
        let mut tracker = NoteTracker::new(Timing::new(1, 4), 2);
        tracker.on_event(&NoteEvent::on(0, 60, 90, ms(0)));
        let output = tracker.on_event(&NoteEvent::off(0, 60, ms(100)));
        assert_eq!(
            output,
            TrackerOutput::Closed(Err(TranscriptionError::TranscriptionOverflow {
                units: 200,
                limit: 2
            }))
        );
        assert!(!tracker.is_open(0, 60));
    }
}
