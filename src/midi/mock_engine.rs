use crate::midi::{MidiEngine, MidiError, NoteEvent, RawMessage, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Replays a scripted input stream and records everything sent to it.
#[derive(Default)]
pub struct MockMidiEngine {
    incoming: VecDeque<RawMessage>,
    sent: Arc<Mutex<Vec<NoteEvent>>>,
}

impl MockMidiEngine {
    pub fn new(incoming: impl IntoIterator<Item = RawMessage>) -> Self {
        Self {
            incoming: incoming.into_iter().collect(),
            sent: Arc::default(),
        }
    }

    /// Shared view of the events sent so far, usable after the engine has
    /// moved to another thread.
    pub fn sent(&self) -> Arc<Mutex<Vec<NoteEvent>>> {
        Arc::clone(&self.sent)
    }
}

impl MidiEngine for MockMidiEngine {
    fn send(&mut self, event: &NoteEvent) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event);
        Ok(())
    }

    fn recv(&mut self) -> Result<RawMessage> {
        self.incoming.pop_front().ok_or(MidiError::Disconnected)
    }

    fn list_devices(&self) -> Vec<String> {
        vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()]
    }
}
