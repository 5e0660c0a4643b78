//! Recording-aware transcription: note tracker, rests and score builder
//! behind the recording state machine.

use crate::config::Settings;
use crate::error::Result;
use crate::midi::{NoteEvent, NoteKind, Timestamp};
use crate::quantize::{self, Timing};
use crate::score::{NotatedFragment, ScoreBuilder, ScoreDocument, ScoreHandle};
use crate::state::{RecordingCommand, RecordingState};
use crate::tracker::{ClosedNote, NoteTracker, TrackerOutput};
use log::{debug, error, info};
use std::collections::HashMap;

pub struct Transcriber {
    settings: Settings,
    state: RecordingState,
    tracker: NoteTracker,
    builder: ScoreBuilder,
    /// Per channel, when the part last fell silent.
    silent_since: HashMap<u8, Timestamp>,
    recording_started: Timestamp,
}

impl Transcriber {
    pub fn new(settings: Settings) -> Self {
        let tracker = NoteTracker::new(settings.timing(), settings.max_tie_chain);
        let builder = ScoreBuilder::new(settings.score_header(), settings.max_tie_chain);
        Self {
            settings,
            state: RecordingState::Idle,
            tracker,
            builder,
            silent_since: HashMap::new(),
            recording_started: Timestamp::default(),
        }
    }

    pub fn handle(&self) -> ScoreHandle {
        self.builder.handle()
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn timing(&self) -> Timing {
        self.tracker.timing()
    }

    pub fn document(&self) -> &ScoreDocument {
        self.builder.document()
    }

    pub fn open_notes(&self) -> usize {
        self.tracker.open_count()
    }

    /// Whether note events currently reach the tracker.
    pub fn accepts_input(&self) -> bool {
        matches!(
            self.state,
            RecordingState::Armed | RecordingState::Recording
        )
    }

    pub fn arm(&mut self) -> Result<RecordingState> {
        self.transition(RecordingCommand::Arm)
    }

    /// Starts recording at `at`. Notes already sounding are not backfilled.
    pub fn start(&mut self, at: Timestamp) -> Result<RecordingState> {
        self.transition(RecordingCommand::Start)?;
        self.tracker.clear();
        self.silent_since.clear();
        self.recording_started = at;
        Ok(self.state)
    }

    /// Stops recording at `at`, closing every sounding note there and
    /// freezing the document.
    ///
    /// The state is `Stopped` once the transition is allowed, even when a
    /// sounding note had to be dropped; the first such failure is returned.
    pub fn stop(&mut self, at: Timestamp) -> Result<RecordingState> {
        self.transition(RecordingCommand::Stop)?;
        let mut first_failure = None;
        for closed in self.tracker.close_all(at) {
            if let Err(e) = closed.and_then(|note| self.commit(&note)) {
                error!("Dropped sounding note at stop: {}", e);
                first_failure.get_or_insert(e);
            }
        }
        if let Err(e) = self.builder.freeze() {
            error!("Failed to pad final measures: {}", e);
            first_failure.get_or_insert(e);
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(self.state),
        }
    }

    /// Clears the document and re-arms.
    pub fn reset(&mut self) -> Result<RecordingState> {
        self.transition(RecordingCommand::Reset)?;
        self.tracker.clear();
        self.silent_since.clear();
        self.builder.clear(self.settings.score_header());
        Ok(self.state)
    }

    pub fn command(&mut self, command: RecordingCommand, at: Timestamp) -> Result<RecordingState> {
        match command {
            RecordingCommand::Arm => self.arm(),
            RecordingCommand::Start => self.start(at),
            RecordingCommand::Stop => self.stop(at),
            RecordingCommand::Reset => self.reset(),
        }
    }

    /// Feeds one note event. While armed, the first note-on starts recording.
    pub fn on_event(&mut self, event: &NoteEvent) -> Result<()> {
        match self.state {
            RecordingState::Recording => {}
            RecordingState::Armed if event.is_on() => {
                self.start(event.timestamp)?;
                info!("Recording started by note {}", event.pitch);
            }
            _ => return Ok(()),
        }

        let channel = event.channel;
        let was_silent = !self.tracker.has_open_on_channel(channel);
        let outcome = match self.tracker.on_event(event) {
            TrackerOutput::Opened => Ok(()),
            TrackerOutput::Ignored => return Ok(()),
            TrackerOutput::Retriggered(closed) | TrackerOutput::Closed(closed) => {
                closed.and_then(|note| self.commit(&note))
            }
        };

        let rest = match event.kind {
            NoteKind::On if was_silent => self.fill_silence(channel, event.timestamp),
            NoteKind::Off if !self.tracker.has_open_on_channel(channel) => {
                self.silent_since.insert(channel, event.timestamp);
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(e) = &outcome {
            error!("Dropped note {} on channel {}: {}", event.pitch, channel, e);
        }
        outcome.and(rest)
    }

    fn fill_silence(&mut self, channel: u8, until: Timestamp) -> Result<()> {
        let since = self
            .silent_since
            .get(&channel)
            .copied()
            .unwrap_or(self.recording_started);
        let units = self.timing().units_for(until.millis_since(since));
        if units == 0 || units < self.settings.min_rest_units {
            return Ok(());
        }
        let values = quantize::tie_chain(units, self.settings.max_tie_chain).map_err(|e| {
            error!("Dropped rest on channel {}: {}", channel, e);
            e
        })?;
        debug!("Rest of {} units on channel {}", units, channel);
        self.builder.append_rest(channel, &values)
    }

    fn commit(&mut self, note: &ClosedNote) -> Result<()> {
        let fragments = NotatedFragment::chain(note.channel, note.pitch, &note.values);
        debug!(
            "Committing pitch {} on channel {}: {} units in {} fragment(s)",
            note.pitch,
            note.channel,
            note.units,
            fragments.len()
        );
        self.builder.append(note.channel, &fragments)
    }

    fn transition(&mut self, command: RecordingCommand) -> Result<RecordingState> {
        match self.state.apply(command) {
            Ok(next) => {
                info!("Recording state {} -> {}", self.state, next);
                self.state = next;
                self.builder.set_state(next);
                Ok(next)
            }
            Err(e) => {
                debug!("Ignoring {}: {}", command.name(), e);
                Err(e)
            }
        }
    }
}
