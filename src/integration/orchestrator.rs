//! Orchestrator for the conversation loop
//!
//! Runs a `TurnController` on its own thread and connects it to the outside:
//! UI commands and capability notifications in, session events out.

use crate::advice::AdviceService;
use crate::conversation::{Notifier, SessionEvent, TurnController, TurnEvent};
use crate::integration::config::AssistantConfig;
use crate::language::Language;
use crate::messages::{Message, MessageLog};
use crate::speech::{SpeechInput, SpeechOutput};
use crate::{MedchatError, Result};
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Longest wait between timer checks
const IDLE_TICK: Duration = Duration::from_millis(250);

/// Commands that can be sent to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorCommand {
    /// Submit typed text as the user's turn
    Submit(String),

    /// Mic button
    ToggleCapture,

    /// Turn automatic read-aloud off or on
    SetMuted(bool),

    /// Switch language and start a new session
    ChangeLanguage(Language),

    /// Start a new session in the current language
    Reset,

    /// Shutdown the orchestrator
    Shutdown,
}

/// Handle for controlling the orchestrator from the UI
#[derive(Clone)]
pub struct OrchestratorHandle {
    /// Command sender
    command_tx: Sender<OrchestratorCommand>,

    /// Session event receiver
    event_rx: Receiver<SessionEvent>,

    /// Message log shared with the controller
    log: MessageLog,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: OrchestratorCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| MedchatError::ChannelError(format!("Failed to send command: {}", e)))
    }

    pub fn submit(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(OrchestratorCommand::Submit(text.into()))
    }

    pub fn toggle_capture(&self) -> Result<()> {
        self.send_command(OrchestratorCommand::ToggleCapture)
    }

    pub fn set_muted(&self, muted: bool) -> Result<()> {
        self.send_command(OrchestratorCommand::SetMuted(muted))
    }

    pub fn change_language(&self, language: Language) -> Result<()> {
        self.send_command(OrchestratorCommand::ChangeLanguage(language))
    }

    pub fn reset(&self) -> Result<()> {
        self.send_command(OrchestratorCommand::Reset)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send_command(OrchestratorCommand::Shutdown)
    }

    /// Try to receive an event from the orchestrator
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Get the session event receiver; it disconnects once the orchestrator stops
    pub fn event_receiver(&self) -> Receiver<SessionEvent> {
        self.event_rx.clone()
    }

    /// Snapshot of the current session's messages
    pub fn messages(&self) -> Vec<Message> {
        self.log.get_all()
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }
}

/// Owns the channels until `start` moves them onto the controller thread
pub struct Orchestrator {
    /// Configuration
    config: AssistantConfig,

    /// Command receiver
    command_rx: Receiver<OrchestratorCommand>,

    /// Event sender
    event_tx: Sender<SessionEvent>,

    /// Capability notification channel
    notifier: Notifier,
    notify_rx: Receiver<TurnEvent>,

    log: MessageLog,
}

impl Orchestrator {
    /// Create a new orchestrator with the given configuration
    pub fn new(config: AssistantConfig) -> Result<(Self, OrchestratorHandle)> {
        config.validate()?;

        let (command_tx, command_rx) = bounded(config.channel_buffer_size);
        let (event_tx, event_rx) = bounded(config.channel_buffer_size);
        let (notifier, notify_rx) = Notifier::channel();
        let log = MessageLog::new();

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            log: log.clone(),
        };

        let orchestrator = Self {
            config,
            command_rx,
            event_tx,
            notifier,
            notify_rx,
            log,
        };

        Ok((orchestrator, handle))
    }

    /// Notifier to hand to the speech and advice capabilities
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Start the controller thread
    ///
    /// This consumes the orchestrator. The first session (and its greeting)
    /// begins immediately.
    pub fn start<I, O, A>(self, input: I, output: O, advice: A) -> Result<JoinHandle<()>>
    where
        I: SpeechInput + 'static,
        O: SpeechOutput + 'static,
        A: AdviceService + 'static,
    {
        let Orchestrator {
            config,
            command_rx,
            event_tx,
            notifier,
            notify_rx,
            log,
        } = self;

        let handle = thread::Builder::new()
            .name("medchat-orchestrator".to_string())
            .spawn(move || {
                info!("Orchestrator started ({})", config.language);

                // Held so the notification channel never reports disconnected
                let _notifier = notifier;

                let mut controller =
                    TurnController::new(config.speech.clone(), config.language, input, output, advice)
                        .with_log(log);
                controller.start(Instant::now());
                forward_events(&mut controller, &event_tx);

                loop {
                    let now = Instant::now();
                    let wait = controller
                        .next_deadline()
                        .map(|d| d.saturating_duration_since(now))
                        .unwrap_or(IDLE_TICK)
                        .min(IDLE_TICK);

                    select! {
                        recv(command_rx) -> cmd => match cmd {
                            Ok(OrchestratorCommand::Shutdown) => {
                                info!("Orchestrator shutdown requested");
                                break;
                            }
                            Ok(cmd) => apply_command(&mut controller, cmd),
                            Err(_) => {
                                warn!("Command channel disconnected");
                                break;
                            }
                        },
                        recv(notify_rx) -> event => {
                            if let Ok(event) = event {
                                controller.handle_event(event, Instant::now());
                            }
                        },
                        default(wait) => {}
                    }

                    controller.poll_timers(Instant::now());
                    forward_events(&mut controller, &event_tx);
                }

                controller.halt();
                let _ = event_tx.try_send(SessionEvent::Shutdown);
                info!("Orchestrator stopped");
            })
            .map_err(|e| MedchatError::OrchestratorError(format!("Failed to spawn: {}", e)))?;

        Ok(handle)
    }
}

fn apply_command<I, O, A>(controller: &mut TurnController<I, O, A>, cmd: OrchestratorCommand)
where
    I: SpeechInput,
    O: SpeechOutput,
    A: AdviceService,
{
    let now = Instant::now();

    match cmd {
        OrchestratorCommand::Submit(text) => {
            let outcome = controller.submit(&text, now);
            debug!("Submit: {:?}", outcome);
        }
        OrchestratorCommand::ToggleCapture => {
            let open = controller.toggle_capture();
            debug!("Capture {}", if open { "opened" } else { "closed" });
        }
        OrchestratorCommand::SetMuted(muted) => controller.set_muted(muted),
        OrchestratorCommand::ChangeLanguage(language) => controller.change_language(language, now),
        OrchestratorCommand::Reset => controller.reset(now),
        OrchestratorCommand::Shutdown => {}
    }
}

/// Pass controller events on without ever blocking the loop
fn forward_events<I, O, A>(controller: &mut TurnController<I, O, A>, event_tx: &Sender<SessionEvent>)
where
    I: SpeechInput,
    O: SpeechOutput,
    A: AdviceService,
{
    for event in controller.drain_events() {
        match event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => warn!("Event channel full, dropping {:?}", event),
            Err(TrySendError::Disconnected(_)) => {
                debug!("No event listener");
                break;
            }
        }
    }
}
