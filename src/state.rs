use crate::error::{Result, TranscriptionError};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingState {
    Idle,
    Armed,
    Recording,
    Stopped,
}

impl RecordingState {
    fn as_u8(self) -> u8 {
        match self {
            RecordingState::Idle => 0,
            RecordingState::Armed => 1,
            RecordingState::Recording => 2,
            RecordingState::Stopped => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => RecordingState::Armed,
            2 => RecordingState::Recording,
            3 => RecordingState::Stopped,
            _ => RecordingState::Idle,
        }
    }

    /// State after `command`, or `InvalidState` when the transition is not
    /// allowed from here.
    pub fn apply(self, command: RecordingCommand) -> Result<RecordingState> {
        use RecordingCommand::*;
        use RecordingState::*;

        match (self, command) {
            (Idle, Arm) => Ok(Armed),
            (Armed, Start) => Ok(Recording),
            (Recording, Stop) => Ok(Stopped),
            (Stopped, Reset) | (Armed, Reset) => Ok(Armed),
            (state, command) => Err(TranscriptionError::InvalidState {
                command: command.name(),
                state,
            }),
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RecordingState::Idle => "idle",
            RecordingState::Armed => "armed",
            RecordingState::Recording => "recording",
            RecordingState::Stopped => "stopped",
        };
        f.write_str(text)
    }
}

/// External recording controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingCommand {
    Arm,
    Start,
    Stop,
    Reset,
}

impl RecordingCommand {
    pub fn name(self) -> &'static str {
        match self {
            RecordingCommand::Arm => "arm",
            RecordingCommand::Start => "start",
            RecordingCommand::Stop => "stop",
            RecordingCommand::Reset => "reset",
        }
    }
}

/// Recording state readable from any thread. Only the delivery thread stores.
#[derive(Debug)]
pub struct StateCell {
    state: AtomicU8,
}

impl Default for StateCell {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(RecordingState::Idle.as_u8()),
        }
    }
}

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> RecordingState {
        RecordingState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: RecordingState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }
}
