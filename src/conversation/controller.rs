//! Conversation turn controller
//!
//! Owns the session and sequences the three capabilities:
//!
//! ```text
//! capture ──transcript──▶ submit ──request──▶ advice service
//!    ▲                                            │
//!    └──── speech finished ◀── speak ◀── reply ◀──┘
//! ```
//!
//! Everything runs on the caller's thread. Capabilities report back through
//! `handle_event`, and deadlines (speech completion grace, transcript
//! settle delay) fire from `poll_timers`. Time is always passed in, so the
//! controller can be driven deterministically.

use crate::advice::{AdviceReply, AdviceRequest, AdviceService};
use crate::conversation::events::{RequestTicket, SessionEvent, TurnEvent};
use crate::conversation::session::{Session, TurnState};
use crate::language::Language;
use crate::messages::{Message, MessageLog};
use crate::speech::{
    select_voice, speakable_text, CaptureEvent, CaptureFailure, SpeechConfig, SpeechEvent,
    SpeechInput, SpeechOutput, Utterance, UtteranceId,
};
use crate::Result;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// What happened to a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A request was issued under this ticket
    Sent(RequestTicket),
    /// The text was empty after trimming
    Empty,
    /// A reply is still pending; the submission was dropped
    Busy,
    /// The advice service refused the request; the fallback was shown
    Undeliverable,
}

/// The utterance whose completion we are waiting for
#[derive(Debug)]
struct SpeechWatch {
    utterance: UtteranceId,
    /// Cleared once the grace period passed while the engine was still speaking
    deadline: Option<Instant>,
}

#[derive(Debug)]
struct PendingTranscript {
    text: String,
    due: Instant,
}

/// Turn-taking state machine over injected speech and advice capabilities
pub struct TurnController<I, O, A>
where
    I: SpeechInput,
    O: SpeechOutput,
    A: AdviceService,
{
    config: SpeechConfig,
    session: Session,
    input: I,
    output: O,
    advice: A,
    muted: bool,
    in_flight: Option<RequestTicket>,
    capture_denied: bool,
    speech_watch: Option<SpeechWatch>,
    pending_transcript: Option<PendingTranscript>,
    events: Vec<SessionEvent>,
}

impl<I, O, A> TurnController<I, O, A>
where
    I: SpeechInput,
    O: SpeechOutput,
    A: AdviceService,
{
    pub fn new(config: SpeechConfig, language: Language, input: I, output: O, advice: A) -> Self {
        let muted = !config.auto_read_aloud;

        Self {
            config,
            session: Session::new(language),
            input,
            output,
            advice,
            muted,
            in_flight: None,
            capture_denied: false,
            speech_watch: None,
            pending_transcript: None,
            events: Vec::new(),
        }
    }

    /// Write messages into an existing shared log
    pub fn with_log(mut self, log: MessageLog) -> Self {
        self.session = Session::with_log(self.session.language(), log);
        self
    }

    // === Accessors ===

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> TurnState {
        self.session.state()
    }

    pub fn language(&self) -> Language {
        self.session.language()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.session.messages()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Ticket of the request currently in flight, if any
    pub fn in_flight(&self) -> Option<RequestTicket> {
        self.in_flight
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn advice(&self) -> &A {
        &self.advice
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Earliest pending timer, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        let speech = self.speech_watch.as_ref().and_then(|w| w.deadline);
        let transcript = self.pending_transcript.as_ref().map(|p| p.due);

        match (speech, transcript) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // === Session lifecycle ===

    /// Begin the first session
    pub fn start(&mut self, now: Instant) {
        self.reset(now);
    }

    /// Start over in the current language
    ///
    /// An in-flight request is not cancelled: its ticket stays reserved and
    /// its reply is applied to the new session when it arrives.
    pub fn reset(&mut self, now: Instant) {
        let language = self.session.language();
        self.reset_to(language, now);
    }

    /// Switch language, which always starts a new session
    pub fn change_language(&mut self, language: Language, now: Instant) {
        info!("Changing language to {}", language);
        self.reset_to(language, now);
    }

    fn reset_to(&mut self, language: Language, now: Instant) {
        self.output.cancel();
        self.speech_watch = None;
        self.pending_transcript = None;
        if self.input.is_active() {
            self.input.stop();
        }

        self.session.reset(language);
        info!("Session {} started ({})", self.session.id(), language);

        if self.in_flight.is_some() {
            debug!("Reset with a request in flight; its reply will land in the new session");
        }

        self.events.push(SessionEvent::SessionReset {
            session_id: self.session.id(),
            language,
        });
        self.events.push(SessionEvent::StateChanged(TurnState::Idle));

        self.say(language.greeting(), now);
    }

    /// Stop speech in both directions (used on shutdown)
    pub fn halt(&mut self) {
        self.output.cancel();
        self.speech_watch = None;
        self.pending_transcript = None;
        if self.input.is_active() {
            self.input.stop();
        }
    }

    // === User actions ===

    /// Submit typed text or a transcript as the user's turn
    pub fn submit(&mut self, text: &str, now: Instant) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Empty;
        }

        if let Some(ticket) = self.in_flight {
            debug!("Dropping submission, reply for {:?} still pending", ticket);
            return SubmitOutcome::Busy;
        }

        self.pending_transcript = None;
        let message = self.session.append(Message::user(text));
        self.events.push(SessionEvent::MessageAppended(message));

        if self.input.is_active() {
            self.input.stop();
            self.events.push(SessionEvent::CaptureClosed);
        }

        let ticket = RequestTicket::new();
        self.in_flight = Some(ticket);
        self.set_state(TurnState::WaitingForReply);

        let language = self.session.language();
        let request = AdviceRequest::new(text, language, &self.session.messages());
        info!("Submitting turn {:?} ({})", ticket, language);

        match self.advice.request(ticket, request) {
            Ok(()) => SubmitOutcome::Sent(ticket),
            Err(e) => {
                error!("Advice request could not be issued: {}", e);
                self.complete_request(ticket, Err(e), now);
                SubmitOutcome::Undeliverable
            }
        }
    }

    /// Mic button: close capture if open, otherwise open it
    ///
    /// A manual start also lifts the block left by a permission denial.
    pub fn toggle_capture(&mut self) -> bool {
        if self.input.is_active() {
            self.close_capture();
            false
        } else {
            self.capture_denied = false;
            self.open_capture()
        }
    }

    /// Turn automatic read-aloud off (`true`) or on (`false`)
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.output.cancel();
            self.speech_watch = None;
        }
        debug!("Read-aloud {}", if muted { "off" } else { "on" });
    }

    // === Capability notifications ===

    pub fn handle_event(&mut self, event: TurnEvent, now: Instant) {
        match event {
            TurnEvent::Capture(CaptureEvent::Transcript(text)) => {
                if text.trim().is_empty() {
                    debug!("Ignoring empty transcript");
                    return;
                }
                debug!("Transcript received, submitting after settle delay");
                self.pending_transcript = Some(PendingTranscript {
                    text,
                    due: now + self.config.transcript_settle(),
                });
            }

            TurnEvent::Capture(CaptureEvent::Ended) => {
                if self.session.state() == TurnState::AwaitingInput {
                    self.set_state(TurnState::Idle);
                    self.events.push(SessionEvent::CaptureClosed);
                }
            }

            TurnEvent::Capture(CaptureEvent::Failed(failure)) => self.capture_failed(failure),

            TurnEvent::Speech(SpeechEvent::Finished(id)) => self.speech_finished(id),

            TurnEvent::Speech(SpeechEvent::Unavailable(id)) => {
                warn!("Speech synthesis unavailable for {}", id);
                self.speech_finished(id);
            }

            TurnEvent::Advice { ticket, result } => self.complete_request(ticket, result, now),
        }
    }

    /// Fire any timers that are due
    pub fn poll_timers(&mut self, now: Instant) {
        if self
            .pending_transcript
            .as_ref()
            .is_some_and(|p| p.due <= now)
        {
            if let Some(pending) = self.pending_transcript.take() {
                self.submit(&pending.text, now);
            }
        }

        let due = self
            .speech_watch
            .as_ref()
            .and_then(|w| w.deadline.filter(|d| *d <= now).map(|_| w.utterance));

        if let Some(utterance) = due {
            if self.output.is_speaking() {
                // Still talking: wait for the real completion instead
                debug!("Grace period passed for {} while still speaking", utterance);
                if let Some(watch) = self.speech_watch.as_mut() {
                    watch.deadline = None;
                }
            } else {
                debug!("No completion for {}, assuming it finished", utterance);
                self.speech_finished(utterance);
            }
        }
    }

    // === Internals ===

    fn set_state(&mut self, state: TurnState) {
        if self.session.state() != state {
            self.session.set_state(state);
            self.events.push(SessionEvent::StateChanged(state));
        }
    }

    fn complete_request(&mut self, ticket: RequestTicket, result: Result<AdviceReply>, now: Instant) {
        if self.in_flight != Some(ticket) {
            warn!("Ignoring reply for unknown request {:?}", ticket);
            return;
        }
        self.in_flight = None;

        if self.session.state().is_waiting() {
            self.set_state(TurnState::Idle);
        }

        let language = self.session.language();
        let text = match result {
            Ok(reply) if !reply.is_blank() => reply.reply_translated,
            Ok(_) => {
                warn!("Advice service returned an empty reply");
                self.events
                    .push(SessionEvent::RequestFailed("empty reply".to_string()));
                language.fallback_message().to_string()
            }
            Err(e) => {
                error!("Advice request {:?} failed: {}", ticket, e);
                self.events.push(SessionEvent::RequestFailed(e.to_string()));
                language.fallback_message().to_string()
            }
        };

        self.say(&text, now);
    }

    /// Append an assistant message and read it aloud
    fn say(&mut self, text: &str, now: Instant) {
        let message = self.session.append(Message::assistant(text));
        self.events.push(SessionEvent::MessageAppended(message));
        self.speak(text, now);
    }

    fn speak(&mut self, text: &str, now: Instant) {
        if self.muted {
            return;
        }

        self.output.cancel();
        self.speech_watch = None;
        if self.input.is_active() {
            self.close_capture();
        }

        let language = self.session.language();
        let utterance = Utterance {
            id: Uuid::new_v4(),
            text: speakable_text(text),
            locale: language.speech_locale().to_string(),
            rate: self.config.rate,
            voice: select_voice(&self.output.voices(), language),
        };
        let id = utterance.id;

        match &utterance.voice {
            Some(voice) => debug!("Speaking with {} ({})", voice.name, voice.lang),
            None => debug!("No voices reported; engine default for {}", utterance.locale),
        }

        self.speech_watch = Some(SpeechWatch {
            utterance: id,
            deadline: Some(now + self.config.completion_grace(text)),
        });
        self.events.push(SessionEvent::Speaking(utterance.text.clone()));

        if let Err(e) = self.output.speak(utterance) {
            warn!("Speech output failed: {}", e);
            self.speech_finished(id);
        }
    }

    fn speech_finished(&mut self, id: UtteranceId) {
        match &self.speech_watch {
            Some(watch) if watch.utterance == id => {}
            _ => {
                debug!("Ignoring completion for superseded utterance {}", id);
                return;
            }
        }
        self.speech_watch = None;

        if self.session.state() == TurnState::Idle && !self.muted && !self.capture_denied {
            self.open_capture();
        }
    }

    fn open_capture(&mut self) -> bool {
        if self.session.state().is_waiting() || self.input.is_active() {
            return false;
        }

        let locale = self.session.language().speech_locale();
        match self.input.start(locale) {
            Ok(()) => {
                self.set_state(TurnState::AwaitingInput);
                self.events.push(SessionEvent::CaptureOpened);
                true
            }
            Err(e) => {
                warn!("Could not start capture: {}", e);
                false
            }
        }
    }

    fn close_capture(&mut self) {
        if self.input.is_active() {
            self.input.stop();
        }
        if self.session.state() == TurnState::AwaitingInput {
            self.set_state(TurnState::Idle);
        }
        self.events.push(SessionEvent::CaptureClosed);
    }

    fn capture_failed(&mut self, failure: CaptureFailure) {
        warn!("Speech capture error: {}", failure);

        if failure.is_permission_denied() {
            self.capture_denied = true;
            self.events
                .push(SessionEvent::CaptureUnavailable(failure.clone()));
        }

        if self.input.is_active() || self.session.state() == TurnState::AwaitingInput {
            self.close_capture();
        }
    }
}
