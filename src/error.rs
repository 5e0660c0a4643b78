use crate::state::RecordingState;
use std::fmt;
use thiserror::Error;

/// Why a raw message could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Empty,
    Truncated,
    InvalidDataByte,
    NoRunningStatus,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropReason::Empty => "empty message",
            DropReason::Truncated => "truncated message",
            DropReason::InvalidDataByte => "status bit set in data byte",
            DropReason::NoRunningStatus => "data bytes without running status",
        };
        f.write_str(text)
    }
}

/// Failures surfaced by the transcription engine.
///
/// None of these stop the engine: a dropped input or an overflowing note only
/// affects that message, and an invalid state transition leaves the state
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptionError {
    #[error("dropped input: {0}")]
    DroppedInput(DropReason),
    #[error("tie chain for {units} duration units exceeded {limit} fragments")]
    TranscriptionOverflow { units: u64, limit: usize },
    #[error("cannot {command} while {state}")]
    InvalidState {
        command: &'static str,
        state: RecordingState,
    },
}

pub type Result<T> = std::result::Result<T, TranscriptionError>;
