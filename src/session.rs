use crate::state::RecordingCommand;

/// The next thing the user can do with the session, offered one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionAction {
    Start,
    Stop,
    Save,
    Reset,
}

impl SessionAction {
    pub fn description(self) -> &'static str {
        match self {
            SessionAction::Start => "Start recording (or just start playing)",
            SessionAction::Stop => "Stop recording",
            SessionAction::Save => "Save the score",
            SessionAction::Reset => "Clear the score and record again",
        }
    }

    /// Action offered after this one has been taken.
    pub fn next(self) -> SessionAction {
        match self {
            SessionAction::Start => SessionAction::Stop,
            SessionAction::Stop => SessionAction::Save,
            SessionAction::Save => SessionAction::Reset,
            SessionAction::Reset => SessionAction::Start,
        }
    }

    /// Engine command behind the action. Saving is up to the caller.
    pub fn command(self) -> Option<RecordingCommand> {
        match self {
            SessionAction::Start => Some(RecordingCommand::Start),
            SessionAction::Stop => Some(RecordingCommand::Stop),
            SessionAction::Save => None,
            SessionAction::Reset => Some(RecordingCommand::Reset),
        }
    }
}
