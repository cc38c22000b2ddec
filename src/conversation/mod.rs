//! Conversation turn-taking
//!
//! The `TurnController` owns a `Session` and coordinates speech capture,
//! advice requests and speech output; `events` defines what flows in and out.

pub mod controller;
pub mod events;
pub mod session;

pub use controller::{SubmitOutcome, TurnController};
pub use events::{Notifier, RequestTicket, SessionEvent, TurnEvent};
pub use session::{Session, TurnState};
