use crate::dispatcher::NoteSink;
use crate::midi::{MidiEngine, NoteEvent};
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, error, info};
use std::thread::{self, JoinHandle};

/// Echoes note events to an output engine on its own thread so the delivery
/// thread never waits on the device.
pub struct MidiEcho {
    tx: Sender<NoteEvent>,
}

impl MidiEcho {
    pub fn spawn<E>(engine: E) -> (Self, JoinHandle<()>)
    where
        E: MidiEngine + 'static,
    {
        let (tx, rx) = unbounded();
        let handle = thread::spawn(move || run_echo(engine, rx));
        (MidiEcho { tx }, handle)
    }
}

impl NoteSink for MidiEcho {
    fn on_note_event(&mut self, event: &NoteEvent) {
        if self.tx.send(*event).is_err() {
            debug!("Echo thread gone, dropping note {}", event.pitch);
        }
    }
}

fn run_echo<E: MidiEngine>(mut engine: E, rx: Receiver<NoteEvent>) {
    info!("MIDI echo thread started");
    while let Ok(event) = rx.recv() {
        if let Err(e) = engine.send(&event) {
            error!("Failed to echo MIDI note: {}", e);
        }
    }
    info!("MIDI echo thread stopping");
}
