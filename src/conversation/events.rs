//! Events flowing into and out of the turn controller

use crate::advice::AdviceReply;
use crate::conversation::session::TurnState;
use crate::language::Language;
use crate::messages::Message;
use crate::speech::{CaptureEvent, CaptureFailure, SpeechEvent};
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;
use uuid::Uuid;

/// Token for the single in-flight advice request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestTicket(Uuid);

impl RequestTicket {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestTicket {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifications from the capabilities the controller drives
#[derive(Debug, Clone)]
pub enum TurnEvent {
    Capture(CaptureEvent),
    Speech(SpeechEvent),
    Advice {
        ticket: RequestTicket,
        result: Result<AdviceReply>,
    },
}

/// Notifications for whatever renders the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A fresh session started (startup, reset or language change)
    SessionReset { session_id: Uuid, language: Language },

    /// A message was appended to the log
    MessageAppended(Message),

    /// Turn state changed
    StateChanged(TurnState),

    /// Speech capture opened; show the listening indicator
    CaptureOpened,

    /// Speech capture closed
    CaptureClosed,

    /// Capture is unusable (e.g. permission denied) until started manually
    CaptureUnavailable(CaptureFailure),

    /// An assistant message is being read aloud
    Speaking(String),

    /// The advice request failed; the fallback message follows
    RequestFailed(String),

    /// The controller has stopped
    Shutdown,
}

/// Cloneable sender that capabilities use to report back to the controller
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: Sender<TurnEvent>,
}

impl Notifier {
    pub fn new(tx: Sender<TurnEvent>) -> Self {
        Self { tx }
    }

    /// Create a notifier and the receiver the controller loop listens on
    ///
    /// Unbounded: capabilities may report from inside the controller's own
    /// thread (console speech, offline advice), and that thread is the only
    /// reader. At most one request and one utterance are outstanding.
    pub fn channel() -> (Self, Receiver<TurnEvent>) {
        let (tx, rx) = unbounded();
        (Self::new(tx), rx)
    }

    pub fn send(&self, event: TurnEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!("Dropping notification, controller is gone: {}", e);
        }
    }

    pub fn capture(&self, event: CaptureEvent) {
        self.send(TurnEvent::Capture(event));
    }

    pub fn speech(&self, event: SpeechEvent) {
        self.send(TurnEvent::Speech(event));
    }

    pub fn advice(&self, ticket: RequestTicket, result: Result<AdviceReply>) {
        self.send(TurnEvent::Advice { ticket, result });
    }
}
