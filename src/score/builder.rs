use super::{Measure, MeasureEntry, NotatedFragment, ScoreDocument, ScoreHeader, TieMarker};
use crate::error::{Result, TranscriptionError};
use crate::quantize::{self, NoteValue};
use crate::state::{RecordingState, StateCell};
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::debug;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Pushed to subscribers after every committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub revision: u64,
    pub measures: usize,
    pub notes: usize,
}

struct Shared {
    document: RwLock<Arc<ScoreDocument>>,
    state: StateCell,
    subscribers: Mutex<Vec<Sender<ScoreUpdate>>>,
}

/// Read side of the engine, safe to clone onto any thread.
#[derive(Clone)]
pub struct ScoreHandle {
    shared: Arc<Shared>,
}

impl ScoreHandle {
    /// Latest published snapshot.
    pub fn current_document(&self) -> Arc<ScoreDocument> {
        let slot = self
            .shared
            .document
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slot)
    }

    pub fn serialize(&self) -> String {
        self.current_document().serialize()
    }

    pub fn recording_state(&self) -> RecordingState {
        self.shared.state.get()
    }

    pub fn subscribe(&self) -> Receiver<ScoreUpdate> {
        let (tx, rx) = unbounded();
        self.shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}

/// Where one piece of a note or rest goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    value: NoteValue,
    opens_measure: bool,
}

/// Owns the evolving score. All mutation goes through here on one thread; each
/// call that changes the document publishes a fresh snapshot.
pub struct ScoreBuilder {
    working: Arc<ScoreDocument>,
    shared: Arc<Shared>,
    max_tie_chain: usize,
}

impl ScoreBuilder {
    pub fn new(header: ScoreHeader, max_tie_chain: usize) -> Self {
        let working = Arc::new(ScoreDocument::new(header));
        let shared = Arc::new(Shared {
            document: RwLock::new(Arc::clone(&working)),
            state: StateCell::new(),
            subscribers: Mutex::new(Vec::new()),
        });
        Self {
            working,
            shared,
            max_tie_chain,
        }
    }

    pub fn handle(&self) -> ScoreHandle {
        ScoreHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn document(&self) -> &ScoreDocument {
        &self.working
    }

    pub(crate) fn set_state(&self, state: RecordingState) {
        self.shared.state.set(state);
    }

    /// Appends fragments to `part`. Consecutive fragments linked by tie
    /// markers form one chain; every chain is laid out across barlines as a
    /// unit and the whole call commits as one snapshot.
    pub fn append(&mut self, part: u8, fragments: &[NotatedFragment]) -> Result<()> {
        if fragments.is_empty() {
            return Ok(());
        }
        let capacity = self.measure_capacity();
        let mut room = self.room_in(part);
        let mut plans = Vec::new();
        for chain in split_chains(fragments) {
            let values: Vec<NoteValue> = chain.iter().map(|fragment| fragment.value).collect();
            let placements = layout(&values, room, capacity, self.max_tie_chain)?;
            room = room_after(&placements, room, capacity);
            plans.push((chain[0].pitch, placements));
        }

        let document = Arc::make_mut(&mut self.working);
        let target = document.part_mut(part);
        for (pitch, placements) in plans {
            let len = placements.len();
            for (index, placement) in placements.into_iter().enumerate() {
                let entry = MeasureEntry::Note(NotatedFragment {
                    channel: part,
                    pitch,
                    value: placement.value,
                    tie: TieMarker::for_position(index, len),
                });
                push_entry(&mut target.measures, placement, entry, capacity);
            }
        }
        self.publish();
        Ok(())
    }

    /// Appends silence to `part`.
    pub fn append_rest(&mut self, part: u8, values: &[NoteValue]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let capacity = self.measure_capacity();
        let placements = layout(values, self.room_in(part), capacity, usize::MAX)?;

        let document = Arc::make_mut(&mut self.working);
        let target = document.part_mut(part);
        for placement in placements {
            push_entry(
                &mut target.measures,
                placement,
                MeasureEntry::Rest(placement.value),
                capacity,
            );
        }
        self.publish();
        Ok(())
    }

    /// Fills the last measure of every part with rests, brings all parts to
    /// the same length and marks the document frozen.
    pub fn freeze(&mut self) -> Result<()> {
        let capacity = self.measure_capacity();
        let measure_count = self.working.measure_count();
        let document = Arc::make_mut(&mut self.working);
        for part in &mut document.parts {
            let remaining = part.measures.last().map_or(0, Measure::remaining);
            if remaining > 0 {
                for value in quantize::chain_for_divisions(remaining, usize::MAX)? {
                    if let Some(last) = part.measures.last_mut() {
                        last.entries.push(MeasureEntry::Rest(value));
                    }
                }
            }
            while part.measures.len() < measure_count {
                let number = part.measures.len() as u32 + 1;
                let mut measure = Measure::new(number, capacity);
                for value in quantize::chain_for_divisions(capacity, usize::MAX)? {
                    measure.entries.push(MeasureEntry::Rest(value));
                }
                part.measures.push(measure);
            }
        }
        document.frozen = true;
        self.publish();
        Ok(())
    }

    /// Drops all content and starts a new document under `header`.
    pub fn clear(&mut self, header: ScoreHeader) {
        let revision = self.working.revision;
        let mut document = ScoreDocument::new(header);
        document.revision = revision;
        self.working = Arc::new(document);
        self.publish();
    }

    fn measure_capacity(&self) -> u64 {
        self.working.header.time_signature.measure_divisions()
    }

    fn room_in(&self, part: u8) -> u64 {
        self.working
            .part(part)
            .and_then(|part| part.measures.last())
            .map_or(0, Measure::remaining)
    }

    fn publish(&mut self) {
        Arc::make_mut(&mut self.working).revision += 1;
        let snapshot = Arc::clone(&self.working);
        let update = ScoreUpdate {
            revision: snapshot.revision,
            measures: snapshot.measure_count(),
            notes: snapshot.note_count(),
        };
        *self
            .shared
            .document
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
        debug!(
            "Published score revision {} ({} measures)",
            update.revision, update.measures
        );

        let mut subscribers = self
            .shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(update).is_ok());
    }
}

/// Splits a fragment sequence into tie chains.
fn split_chains(fragments: &[NotatedFragment]) -> Vec<&[NotatedFragment]> {
    let mut chains = Vec::new();
    let mut start = 0;
    for (index, fragment) in fragments.iter().enumerate() {
        let continues = matches!(
            fragment.tie,
            Some(TieMarker::Start) | Some(TieMarker::Continue)
        );
        if !continues || index + 1 == fragments.len() {
            chains.push(&fragments[start..=index]);
            start = index + 1;
        }
    }
    chains
}

/// Lays `values` out starting with `room` divisions left in the current
/// measure, splitting any value that crosses a barline into tied pieces.
fn layout(values: &[NoteValue], room: u64, capacity: u64, limit: usize) -> Result<Vec<Placement>> {
    let total: u64 = values.iter().map(|value| value.divisions()).sum();
    let mut pending: VecDeque<NoteValue> = values.iter().copied().collect();
    let mut placements = Vec::new();
    let mut room = room;
    let mut opens_measure = false;

    while let Some(value) = pending.pop_front() {
        if placements.len() >= limit {
            return Err(TranscriptionError::TranscriptionOverflow {
                units: total / quantize::DIVISIONS_PER_UNIT,
                limit,
            });
        }
        if room == 0 {
            room = capacity;
            opens_measure = true;
        }
        let divisions = value.divisions();
        if divisions <= room {
            placements.push(Placement {
                value,
                opens_measure: std::mem::take(&mut opens_measure),
            });
            room -= divisions;
            continue;
        }

        let head = quantize::chain_for_divisions(room, usize::MAX)?;
        let tail = quantize::chain_for_divisions(divisions - room, usize::MAX)?;
        for piece in tail.into_iter().rev().chain(head.into_iter().rev()) {
            pending.push_front(piece);
        }
    }
    Ok(placements)
}

fn room_after(placements: &[Placement], room: u64, capacity: u64) -> u64 {
    placements.iter().fold(room, |room, placement| {
        let room = if placement.opens_measure { capacity } else { room };
        room - placement.value.divisions()
    })
}

fn push_entry(measures: &mut Vec<Measure>, placement: Placement, entry: MeasureEntry, capacity: u64) {
    if placement.opens_measure || measures.is_empty() {
        let number = measures.len() as u32 + 1;
        measures.push(Measure::new(number, capacity));
    }
    if let Some(measure) = measures.last_mut() {
        measure.entries.push(entry);
    }
}
