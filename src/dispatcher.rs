use crate::error::Result;
use crate::midi::NoteEvent;
use crate::transcriber::Transcriber;

/// Receives every adapted note event regardless of recording state.
pub trait NoteSink: Send {
    fn on_note_event(&mut self, event: &NoteEvent);
}

impl<F> NoteSink for F
where
    F: FnMut(&NoteEvent) + Send,
{
    fn on_note_event(&mut self, event: &NoteEvent) {
        self(event)
    }
}

/// Fans note events out to the playback sinks and, while the transcriber
/// accepts input, to the transcriber.
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Box<dyn NoteSink>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: Box<dyn NoteSink>) {
        self.sinks.push(sink);
    }

    pub fn dispatch(&mut self, event: &NoteEvent, transcriber: &mut Transcriber) -> Result<()> {
        for sink in &mut self.sinks {
            sink.on_note_event(event);
        }
        if transcriber.accepts_input() {
            transcriber.on_event(event)
        } else {
            Ok(())
        }
    }
}
