//! Conversation session state

use crate::language::Language;
use crate::messages::{Message, MessageLog};
use uuid::Uuid;

/// Turn-taking state of a session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnState {
    /// Accepting input, capture closed
    #[default]
    Idle,
    /// Capture is open; typed input is accepted as well
    AwaitingInput,
    /// A request to the advice service is in flight
    WaitingForReply,
}

impl TurnState {
    /// Whether a user turn may start in this state
    pub fn is_accepting_input(&self) -> bool {
        matches!(self, TurnState::Idle | TurnState::AwaitingInput)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, TurnState::AwaitingInput)
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, TurnState::WaitingForReply)
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnState::Idle => write!(f, "Idle"),
            TurnState::AwaitingInput => write!(f, "AwaitingInput"),
            TurnState::WaitingForReply => write!(f, "WaitingForReply"),
        }
    }
}

/// One conversation: its language, turn state and message log
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    language: Language,
    state: TurnState,
    log: MessageLog,
}

impl Session {
    pub fn new(language: Language) -> Self {
        Self::with_log(language, MessageLog::new())
    }

    /// Create a session writing into an existing (shared) log
    pub fn with_log(language: Language, log: MessageLog) -> Self {
        Self {
            id: Uuid::new_v4(),
            language,
            state: TurnState::Idle,
            log,
        }
    }

    /// Start over in `language`: fresh id, empty log, idle
    ///
    /// The log is cleared in place so readers holding a clone see the reset.
    pub fn reset(&mut self, language: Language) {
        self.id = Uuid::new_v4();
        self.language = language;
        self.state = TurnState::Idle;
        self.log.clear();
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: TurnState) {
        self.state = state;
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn messages(&self) -> Vec<Message> {
        self.log.get_all()
    }

    pub(crate) fn append(&self, message: Message) -> Message {
        self.log.append(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(TurnState::Idle.is_accepting_input());
        assert!(TurnState::AwaitingInput.is_accepting_input());
        assert!(!TurnState::WaitingForReply.is_accepting_input());
        assert!(TurnState::AwaitingInput.is_capturing());
        assert!(TurnState::WaitingForReply.is_waiting());
        assert!(!TurnState::Idle.is_waiting());
        assert_eq!(TurnState::WaitingForReply.to_string(), "WaitingForReply");
    }

    #[test]
    fn test_reset_clears_shared_log() {
        let log = MessageLog::new();
        let mut session = Session::with_log(Language::En, log.clone());
        let first_id = session.id();

        session.append(Message::user("cough"));
        session.set_state(TurnState::WaitingForReply);
        session.reset(Language::Hi);

        assert!(log.is_empty());
        assert_ne!(session.id(), first_id);
        assert_eq!(session.language(), Language::Hi);
        assert_eq!(session.state(), TurnState::Idle);
    }
}
