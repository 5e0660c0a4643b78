use scorescribe::error::DropReason;
use scorescribe::midi::{RawMessage, Timestamp};
use scorescribe::{
    RecordingCommand, RecordingState, Settings, TranscriptionEngine, TranscriptionError,
};

fn raw(bytes: &[u8], millis: u64) -> RawMessage {
    RawMessage::new(bytes.to_vec(), Timestamp::from_millis(millis))
}

fn recording_engine() -> TranscriptionEngine {
    let mut engine = TranscriptionEngine::new(Settings::default());
    engine.arm().unwrap();
    engine.on_raw_message(&raw(&[0x90, 60, 100], 0)).unwrap();
    assert_eq!(engine.state(), RecordingState::Recording);
    engine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refused_reset_keeps_running_status() {
        let mut engine = recording_engine();
        assert!(matches!(
            engine.reset(),
            Err(TranscriptionError::InvalidState {
                command: "reset",
                state: RecordingState::Recording
            })
        ));

        engine.on_raw_message(&raw(&[60, 0], 400)).unwrap();
        assert_eq!(engine.transcriber().open_notes(), 0);
        assert_eq!(engine.transcriber().document().note_count(), 1);
    }

    #[test]
    fn test_reset_keeps_running_status() {
        let mut engine = recording_engine();
        engine.on_raw_message(&raw(&[60, 0], 400)).unwrap();
        engine
            .command(RecordingCommand::Stop, Timestamp::from_millis(400))
            .unwrap();
        assert_eq!(
            engine
                .command(RecordingCommand::Reset, Timestamp::from_millis(500))
                .unwrap(),
            RecordingState::Armed
        );

        // Data bytes only: the stream keeps the 0x90 status from before.
        engine.on_raw_message(&raw(&[64, 90], 600)).unwrap();
        assert_eq!(engine.state(), RecordingState::Recording);
        assert_eq!(engine.transcriber().open_notes(), 1);

        engine.on_raw_message(&raw(&[64, 0], 1000)).unwrap();
        let document = engine.transcriber().document();
        assert_eq!(document.note_count(), 1);
        assert_eq!(document.parts[0].notes().next().map(|n| n.pitch), Some(64));
    }

    #[test]
    fn test_malformed_message_is_dropped_input() {
        let mut engine = recording_engine();
        assert_eq!(
            engine.on_raw_message(&raw(&[0x90, 200], 100)),
            Err(TranscriptionError::DroppedInput(DropReason::Truncated))
        );
        assert_eq!(
            engine.on_raw_message(&raw(&[0x90, 0x85, 10], 100)),
            Err(TranscriptionError::DroppedInput(DropReason::InvalidDataByte))
        );
        assert_eq!(
            engine.on_raw_message(&raw(&[], 100)),
            Err(TranscriptionError::DroppedInput(DropReason::Empty))
        );

        // Filtered traffic is not an error.
        assert_eq!(engine.on_raw_message(&raw(&[0xF8], 150)), Ok(()));
        assert_eq!(engine.on_raw_message(&raw(&[0xB0, 7, 100], 150)), Ok(()));

        engine.on_raw_message(&raw(&[0x80, 60, 0], 400)).unwrap();
        assert_eq!(engine.transcriber().document().note_count(), 1);
    }
}
