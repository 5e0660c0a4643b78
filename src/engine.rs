//! The transcription engine: raw input in, score snapshots out.
//!
//! Everything here runs on the single delivery thread. Other threads read the
//! score through the [`ScoreHandle`] returned by [`TranscriptionEngine::handle`].

use crate::config::Settings;
use crate::dispatcher::{Dispatcher, NoteSink};
use crate::error::{Result, TranscriptionError};
use crate::midi::{Decoded, EventAdapter, RawMessage, Timestamp};
use crate::score::ScoreHandle;
use crate::state::{RecordingCommand, RecordingState};
use crate::transcriber::Transcriber;
use log::debug;

pub struct TranscriptionEngine {
    adapter: EventAdapter,
    dispatcher: Dispatcher,
    transcriber: Transcriber,
}

impl TranscriptionEngine {
    pub fn new(settings: Settings) -> Self {
        Self {
            adapter: EventAdapter::new(),
            dispatcher: Dispatcher::new(),
            transcriber: Transcriber::new(settings),
        }
    }

    /// Registers a playback branch that sees every note, recording or not.
    pub fn add_sink(&mut self, sink: Box<dyn NoteSink>) {
        self.dispatcher.add_sink(sink);
    }

    pub fn handle(&self) -> ScoreHandle {
        self.transcriber.handle()
    }

    pub fn state(&self) -> RecordingState {
        self.transcriber.state()
    }

    pub fn transcriber(&self) -> &Transcriber {
        &self.transcriber
    }

    /// Decodes and dispatches one raw message. Filtered messages are not an
    /// error; malformed ones come back as `DroppedInput`.
    pub fn on_raw_message(&mut self, raw: &RawMessage) -> Result<()> {
        match self.adapter.decode(raw) {
            Decoded::Note(event) => self.dispatcher.dispatch(&event, &mut self.transcriber),
            Decoded::Filtered => Ok(()),
            Decoded::Malformed(reason) => {
                debug!("Dropping raw message {:02X?}: {}", raw.bytes, reason);
                Err(TranscriptionError::DroppedInput(reason))
            }
        }
    }

    pub fn arm(&mut self) -> Result<RecordingState> {
        self.transcriber.arm()
    }

    pub fn start(&mut self, at: Timestamp) -> Result<RecordingState> {
        self.transcriber.start(at)
    }

    pub fn stop(&mut self, at: Timestamp) -> Result<RecordingState> {
        self.transcriber.stop(at)
    }

    /// Clears the score and re-arms. Running status belongs to the input
    /// stream and survives a reset.
    pub fn reset(&mut self) -> Result<RecordingState> {
        self.transcriber.reset()
    }

    pub fn command(&mut self, command: RecordingCommand, at: Timestamp) -> Result<RecordingState> {
        self.transcriber.command(command, at)
    }
}
