use super::message::{NoteEvent, RawMessage};
use thiserror::Error;

/// Errors from the MIDI transport.
#[derive(Debug, Error)]
pub enum MidiError {
    /// Error when sending a MIDI message
    #[error("MIDI send error: {0}")]
    SendError(String),
    /// Error when receiving a MIDI message
    #[error("MIDI receive error: {0}")]
    RecvError(String),
    /// Error when connecting to a MIDI device
    #[error("MIDI connection error: {0}")]
    ConnectionError(String),
    /// The input stream has ended
    #[error("MIDI input disconnected")]
    Disconnected,
}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

/// Transport binding for receiving raw messages and echoing notes.
pub trait MidiEngine: Send {
    /// Sends a note event to the device
    fn send(&mut self, event: &NoteEvent) -> Result<()>;

    /// Blocks until the next raw message arrives
    fn recv(&mut self) -> Result<RawMessage>;

    /// Names of the ports this engine can bind to
    fn list_devices(&self) -> Vec<String>;
}
