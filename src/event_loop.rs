// event_loop.rs

use crate::engine::TranscriptionEngine;
use crate::error::TranscriptionError;
use crate::midi::{Epoch, MidiEngine, MidiError, RawMessage, Timestamp};
use crate::state::RecordingCommand;
use crossbeam::channel::{Receiver, SendError, Sender};
use log::{debug, error, info, warn};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    Midi(RawMessage),
    Command {
        command: RecordingCommand,
        at: Timestamp,
    },
    Shutdown,
}

/// Sole owner of the engine. Every mutation happens on the thread running
/// [`EventLoop::run`].
pub struct EventLoop {
    engine: TranscriptionEngine,
    rx: Receiver<EngineMessage>,
}

impl EventLoop {
    pub fn new(engine: TranscriptionEngine, rx: Receiver<EngineMessage>) -> Self {
        EventLoop { engine, rx }
    }

    /// Processes messages until shutdown or until every sender is gone, then
    /// hands the engine back.
    pub fn run(mut self) -> TranscriptionEngine {
        info!("Event loop started");
        while let Ok(message) = self.rx.recv() {
            match message {
                EngineMessage::Midi(raw) => {
                    if let Err(e) = self.engine.on_raw_message(&raw) {
                        log_failure(&e);
                    }
                }
                EngineMessage::Command { command, at } => {
                    match self.engine.command(command, at) {
                        Ok(state) => debug!("{} -> {}", command.name(), state),
                        Err(e) => log_failure(&e),
                    }
                }
                EngineMessage::Shutdown => {
                    info!("Event loop shutdown requested");
                    break;
                }
            }
        }
        info!("Event loop stopped");
        self.engine
    }

    pub fn spawn(self) -> JoinHandle<TranscriptionEngine> {
        thread::spawn(move || self.run())
    }
}

fn log_failure(error: &TranscriptionError) {
    match error {
        TranscriptionError::DroppedInput(_) => debug!("{}", error),
        TranscriptionError::TranscriptionOverflow { .. } => error!("{}", error),
        TranscriptionError::InvalidState { .. } => warn!("{}", error),
    }
}

/// Sends recording commands into the event loop, stamped against the same
/// epoch as the MIDI input.
#[derive(Clone)]
pub struct EngineControl {
    tx: Sender<EngineMessage>,
    epoch: Epoch,
}

impl EngineControl {
    pub fn new(tx: Sender<EngineMessage>, epoch: Epoch) -> Self {
        Self { tx, epoch }
    }

    pub fn send(&self, command: RecordingCommand) -> Result<(), SendError<EngineMessage>> {
        self.tx.send(EngineMessage::Command {
            command,
            at: self.epoch.stamp(),
        })
    }

    pub fn shutdown(&self) -> Result<(), SendError<EngineMessage>> {
        self.tx.send(EngineMessage::Shutdown)
    }
}

/// Forwards everything `engine` receives into the event loop until the input
/// disconnects or the loop goes away.
pub fn run_input_pump<E>(mut engine: E, tx: Sender<EngineMessage>) -> JoinHandle<()>
where
    E: MidiEngine + 'static,
{
    thread::spawn(move || loop {
        match engine.recv() {
            Ok(raw) => {
                if tx.send(EngineMessage::Midi(raw)).is_err() {
                    error!("Failed to forward MIDI message - event loop dropped");
                    break;
                }
            }
            Err(MidiError::Disconnected) => {
                info!("MIDI input disconnected");
                break;
            }
            Err(e) => {
                error!("MIDI engine receive error: {}", e);
                break;
            }
        }
    })
}
