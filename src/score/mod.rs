//! Score document model.
//!
//! A [`ScoreDocument`] is an immutable snapshot: the [`ScoreBuilder`] edits a
//! private copy and publishes it whole, so readers on other threads always see
//! complete tie chains.

mod builder;
mod musicxml;

pub use builder::{ScoreBuilder, ScoreHandle, ScoreUpdate};
pub use musicxml::{pitch_spelling, to_musicxml};

use crate::quantize::NoteValue;
use chrono::NaiveDate;

/// Tie marker carried by a note that belongs to a chain of two or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TieMarker {
    Start,
    Continue,
    Stop,
}

impl TieMarker {
    /// Marker for position `index` in a chain of `len` pieces.
    pub fn for_position(index: usize, len: usize) -> Option<TieMarker> {
        if len < 2 {
            None
        } else if index == 0 {
            Some(TieMarker::Start)
        } else if index + 1 == len {
            Some(TieMarker::Stop)
        } else {
            Some(TieMarker::Continue)
        }
    }
}

/// One notated symbol of a sounded note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotatedFragment {
    pub channel: u8,
    pub pitch: u8,
    pub value: NoteValue,
    pub tie: Option<TieMarker>,
}

impl NotatedFragment {
    /// Builds the fragments for one sounded note, marking every piece after
    /// the first as a tied continuation.
    pub fn chain(channel: u8, pitch: u8, values: &[NoteValue]) -> Vec<NotatedFragment> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| NotatedFragment {
                channel,
                pitch,
                value: *value,
                tie: TieMarker::for_position(index, values.len()),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasureEntry {
    Note(NotatedFragment),
    Rest(NoteValue),
}

impl MeasureEntry {
    pub fn value(&self) -> NoteValue {
        match self {
            MeasureEntry::Note(fragment) => fragment.value,
            MeasureEntry::Rest(value) => *value,
        }
    }

    pub fn divisions(&self) -> u64 {
        self.value().divisions()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    pub number: u32,
    /// Capacity in MusicXML divisions.
    pub capacity: u64,
    pub entries: Vec<MeasureEntry>,
}

impl Measure {
    pub fn new(number: u32, capacity: u64) -> Self {
        Self {
            number,
            capacity,
            entries: Vec::new(),
        }
    }

    pub fn filled(&self) -> u64 {
        self.entries.iter().map(MeasureEntry::divisions).sum()
    }

    pub fn remaining(&self) -> u64 {
        self.capacity.saturating_sub(self.filled())
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }
}

/// All measures transcribed from one MIDI channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub channel: u8,
    pub measures: Vec<Measure>,
}

impl Part {
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            measures: Vec::new(),
        }
    }

    pub fn id(&self) -> String {
        part_id(self.channel)
    }

    pub fn notes(&self) -> impl Iterator<Item = &NotatedFragment> {
        self.measures
            .iter()
            .flat_map(|measure| measure.entries.iter())
            .filter_map(|entry| match entry {
                MeasureEntry::Note(fragment) => Some(fragment),
                MeasureEntry::Rest(_) => None,
            })
    }
}

pub fn part_id(channel: u8) -> String {
    format!("P{}", u16::from(channel) + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_type: u32,
}

impl TimeSignature {
    pub fn new(beats: u32, beat_type: u32) -> Self {
        Self { beats, beat_type }
    }

    /// Measure capacity in MusicXML divisions (16 per quarter).
    pub fn measure_divisions(&self) -> u64 {
        u64::from(self.beats) * 64 / u64::from(self.beat_type.max(1))
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::new(4, 4)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreHeader {
    pub title: String,
    pub encoding_date: NaiveDate,
    pub time_signature: TimeSignature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreDocument {
    pub header: ScoreHeader,
    /// Ordered by channel.
    pub parts: Vec<Part>,
    /// Incremented once per committed mutation.
    pub revision: u64,
    pub frozen: bool,
}

impl ScoreDocument {
    pub fn new(header: ScoreHeader) -> Self {
        Self {
            header,
            parts: Vec::new(),
            revision: 0,
            frozen: false,
        }
    }

    pub fn part(&self, channel: u8) -> Option<&Part> {
        self.parts.iter().find(|part| part.channel == channel)
    }

    pub fn measure_count(&self) -> usize {
        self.parts
            .iter()
            .map(|part| part.measures.len())
            .max()
            .unwrap_or(0)
    }

    pub fn note_count(&self) -> usize {
        self.parts.iter().map(|part| part.notes().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Renders this snapshot as MusicXML.
    pub fn serialize(&self) -> String {
        to_musicxml(self)
    }

    pub(crate) fn part_mut(&mut self, channel: u8) -> &mut Part {
        let index = match self.parts.binary_search_by_key(&channel, |part| part.channel) {
            Ok(index) => index,
            Err(index) => {
                self.parts.insert(index, Part::new(channel));
                index
            }
        };
        &mut self.parts[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantize::NoteClass;

    #[test]
    fn test_tie_marker_positions() {
        assert_eq!(TieMarker::for_position(0, 1), None);
        assert_eq!(TieMarker::for_position(0, 2), Some(TieMarker::Start));
        assert_eq!(TieMarker::for_position(1, 2), Some(TieMarker::Stop));
        assert_eq!(TieMarker::for_position(1, 3), Some(TieMarker::Continue));
    }

    #[test]
    fn test_fragment_chain_marks_continuations() {
        let values = [
            NoteValue::new(NoteClass::Whole, false),
            NoteValue::new(NoteClass::Quarter, false),
        ];
        let chain = NotatedFragment::chain(0, 60, &values);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].tie, Some(TieMarker::Start));
        assert_eq!(chain[1].tie, Some(TieMarker::Stop));
        assert!(chain.iter().all(|fragment| fragment.pitch == 60));
    }

    #[test]
    fn test_measure_capacity() {
        assert_eq!(TimeSignature::new(4, 4).measure_divisions(), 64);
        assert_eq!(TimeSignature::new(3, 4).measure_divisions(), 48);
        assert_eq!(TimeSignature::new(6, 8).measure_divisions(), 48);
        assert_eq!(TimeSignature::new(2, 2).measure_divisions(), 64);
    }

    #[test]
    fn test_parts_stay_ordered_by_channel() {
        let header = ScoreHeader {
            title: "t".to_string(),
            encoding_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time_signature: TimeSignature::default(),
        };
        let mut document = ScoreDocument::new(header);
        document.part_mut(9);
        document.part_mut(0);
        document.part_mut(9);
        let channels: Vec<u8> = document.parts.iter().map(|part| part.channel).collect();
        assert_eq!(channels, vec![0, 9]);
        assert_eq!(document.part(9).unwrap().id(), "P10");
    }
}
