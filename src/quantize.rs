//! Duration quantizer.
//!
//! Durations are measured in duration units where 32 units make a whole note
//! regardless of the time signature (see [`Timing::units_for`]). `classify`
//! and `overflow` map a unit count to the single notated symbol that covers
//! most of it and the remainder that has to be tied on; [`tie_chain`] repeats
//! that until nothing is left.

use crate::error::{Result, TranscriptionError};
use std::fmt;

/// Largest beat denominator the unit scale is normalized against.
const MAX_BEAT_TYPE: u64 = 8;

/// Units in one whole note.
pub const WHOLE_NOTE_UNITS: u64 = 32;

/// MusicXML divisions per duration unit. A 64th note is half a unit, so the
/// document works at twice the unit resolution.
pub const DIVISIONS_PER_UNIT: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NoteClass {
    SixtyFourth,
    ThirtySecond,
    Sixteenth,
    Eighth,
    Quarter,
    Half,
    Whole,
}

impl NoteClass {
    /// Undotted value in MusicXML divisions (16 per quarter).
    pub fn divisions(self) -> u64 {
        match self {
            NoteClass::SixtyFourth => 1,
            NoteClass::ThirtySecond => 2,
            NoteClass::Sixteenth => 4,
            NoteClass::Eighth => 8,
            NoteClass::Quarter => 16,
            NoteClass::Half => 32,
            NoteClass::Whole => 64,
        }
    }

    /// MusicXML `<type>` name.
    pub fn type_name(self) -> &'static str {
        match self {
            NoteClass::SixtyFourth => "64th",
            NoteClass::ThirtySecond => "32nd",
            NoteClass::Sixteenth => "16th",
            NoteClass::Eighth => "eighth",
            NoteClass::Quarter => "quarter",
            NoteClass::Half => "half",
            NoteClass::Whole => "whole",
        }
    }
}

impl fmt::Display for NoteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One notated value: a class plus an optional dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteValue {
    pub class: NoteClass,
    pub dotted: bool,
}

impl NoteValue {
    pub fn new(class: NoteClass, dotted: bool) -> Self {
        Self { class, dotted }
    }

    pub fn divisions(self) -> u64 {
        let base = self.class.divisions();
        if self.dotted {
            base + base / 2
        } else {
            base
        }
    }

    /// Value in duration units. A 64th is worth less than one unit and
    /// counts as zero.
    pub fn units(self) -> u64 {
        self.divisions() / DIVISIONS_PER_UNIT
    }
}

/// Converts elapsed time into duration units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub precision_millis: u64,
    pub beat_type: u32,
}

impl Timing {
    pub fn new(precision_millis: u64, beat_type: u32) -> Self {
        Self {
            precision_millis: precision_millis.max(1),
            beat_type: beat_type.max(1),
        }
    }

    pub fn units_for(&self, elapsed_millis: u64) -> u64 {
        let ticks = elapsed_millis / self.precision_millis;
        ticks * MAX_BEAT_TYPE / u64::from(self.beat_type)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing::new(100, 4)
    }
}

pub fn classify(units: u64) -> NoteValue {
    let class = match units {
        0 => NoteClass::SixtyFourth,
        1 => NoteClass::ThirtySecond,
        2..=3 => NoteClass::Sixteenth,
        4..=7 => NoteClass::Eighth,
        8..=15 => NoteClass::Quarter,
        16..=31 => NoteClass::Half,
        _ => NoteClass::Whole,
    };
    NoteValue::new(class, is_dotted(units))
}

fn is_dotted(units: u64) -> bool {
    matches!(units, 3 | 6 | 7 | 12..=15 | 24..=31)
}

/// Units left over after the symbol chosen by [`classify`].
pub fn overflow(units: u64) -> u64 {
    if units > WHOLE_NOTE_UNITS {
        return units - WHOLE_NOTE_UNITS;
    }
    match units {
        5 | 7 | 9 | 13 | 17 | 25 => 1,
        10 | 14 | 18 | 26 => 2,
        11 | 15 | 19 | 27 => 3,
        20 | 28 => 4,
        21 | 29 => 5,
        22 | 30 => 6,
        23 | 31 => 7,
        _ => 0,
    }
}

/// Decomposes `units` into a sequence of values that are tied together.
///
/// The first value is the primary symbol; every later one is a tied
/// continuation. Fails with `TranscriptionOverflow` instead of producing more
/// than `limit` values.
pub fn tie_chain(units: u64, limit: usize) -> Result<Vec<NoteValue>> {
    let mut values = Vec::new();
    let mut remaining = units;
    loop {
        if values.len() >= limit {
            return Err(TranscriptionError::TranscriptionOverflow { units, limit });
        }
        values.push(classify(remaining));
        remaining = overflow(remaining);
        if remaining == 0 {
            return Ok(values);
        }
    }
}

/// Decomposes a span of MusicXML divisions. Used when a value has to be split
/// at a barline, where odd division counts can appear next to 64ths.
pub fn chain_for_divisions(divisions: u64, limit: usize) -> Result<Vec<NoteValue>> {
    let units = divisions / DIVISIONS_PER_UNIT;
    let mut values = if units > 0 {
        tie_chain(units, limit)?
    } else {
        Vec::new()
    };
    if divisions % DIVISIONS_PER_UNIT == 1 {
        values.push(NoteValue::new(NoteClass::SixtyFourth, false));
    }
    Ok(values)
}
