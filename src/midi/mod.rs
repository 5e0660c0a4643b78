//! MIDI wire-level functionality for ScoreScribe
//!
//! This module provides:
//! - Raw and decoded message types with engine-relative timestamps
//! - The event adapter that turns raw bytes into note events
//! - Real MIDI device communication via midir
//! - A scripted engine for testing
//!
mod adapter;
mod engine;
mod message;
pub mod midir_engine;
pub mod mock_engine;

pub use adapter::{Decoded, EventAdapter};
pub use engine::{MidiEngine, MidiError, Result};
pub use message::{Epoch, NoteEvent, NoteKind, RawMessage, Timestamp};

pub use midir_engine::MidirEngine;
pub use mock_engine::MockMidiEngine;

// Set default engine type
pub type DefaultMidiEngine = MidirEngine;
