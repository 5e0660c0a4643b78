pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event_loop;
pub mod logging;
pub mod midi;
pub mod playback;
pub mod quantize;
pub mod score;
pub mod session;
pub mod state;
pub mod tracker;
pub mod transcriber;
pub mod ui;

pub use cli::{handle_device_list, validate_device, Args};
pub use config::{Settings, SettingsError};
pub use dispatcher::NoteSink;
pub use engine::TranscriptionEngine;
pub use error::{DropReason, TranscriptionError};
pub use event_loop::{run_input_pump, EngineControl, EngineMessage, EventLoop};
pub use quantize::{tie_chain, NoteClass, NoteValue, Timing};
pub use score::{ScoreDocument, ScoreHandle, ScoreUpdate};
pub use session::SessionAction;
pub use state::{RecordingCommand, RecordingState};
pub use transcriber::Transcriber;
