//! Speech capabilities used by the turn controller
//!
//! This module provides:
//! - `SpeechInput` / `SpeechOutput` traits wrapping callback-driven engines
//! - voice selection and speakable-text cleanup
//! - console implementations for the terminal front end
//!
//! Engines report back asynchronously through a `Notifier` with a
//! `CaptureEvent` or `SpeechEvent`; the traits themselves never block.

pub mod console;
pub mod text;
pub mod voice;

pub use console::{ConsoleMicrophone, ConsoleSpeechInput, ConsoleSpeechOutput};
pub use text::speakable_text;
pub use voice::{select_voice, Voice};

use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Identifier of a single spoken utterance
pub type UtteranceId = Uuid;

/// One request to the speech output engine
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub locale: String,
    pub rate: f32,
    pub voice: Option<Voice>,
}

/// Why speech capture stopped with an error
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureFailure {
    /// The user or browser refused microphone access
    NotAllowed,
    /// The recognition service itself is not permitted
    ServiceNotAllowed,
    NoSpeech,
    Aborted,
    Network,
    Other(String),
}

impl CaptureFailure {
    /// Parse an engine error code such as `not-allowed`
    pub fn from_code(code: &str) -> Self {
        match code {
            "not-allowed" => CaptureFailure::NotAllowed,
            "service-not-allowed" => CaptureFailure::ServiceNotAllowed,
            "no-speech" => CaptureFailure::NoSpeech,
            "aborted" => CaptureFailure::Aborted,
            "network" => CaptureFailure::Network,
            other => CaptureFailure::Other(other.to_string()),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            CaptureFailure::NotAllowed | CaptureFailure::ServiceNotAllowed
        )
    }
}

impl std::fmt::Display for CaptureFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureFailure::NotAllowed => write!(f, "not-allowed"),
            CaptureFailure::ServiceNotAllowed => write!(f, "service-not-allowed"),
            CaptureFailure::NoSpeech => write!(f, "no-speech"),
            CaptureFailure::Aborted => write!(f, "aborted"),
            CaptureFailure::Network => write!(f, "network"),
            CaptureFailure::Other(code) => write!(f, "{}", code),
        }
    }
}

/// Notifications from a speech input engine
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureEvent {
    /// Final transcript of a one-shot recognition
    Transcript(String),
    /// Capture has closed, with or without a result
    Ended,
    /// Capture failed
    Failed(CaptureFailure),
}

/// Notifications from a speech output engine
#[derive(Clone, Debug, PartialEq)]
pub enum SpeechEvent {
    /// The utterance finished playing
    Finished(UtteranceId),
    /// The engine cannot synthesize this utterance
    Unavailable(UtteranceId),
}

/// One-shot speech recognition
pub trait SpeechInput: Send {
    /// Open capture in the given locale (e.g. `hi-IN`)
    fn start(&mut self, locale: &str) -> Result<()>;

    /// Close capture; the engine still reports `CaptureEvent::Ended`
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// Speech synthesis
pub trait SpeechOutput: Send {
    /// Voices currently advertised by the engine (may be empty while loading)
    fn voices(&self) -> Vec<Voice>;

    /// Queue an utterance; completion arrives as a `SpeechEvent`
    fn speak(&mut self, utterance: Utterance) -> Result<()>;

    /// Drop the current and any queued utterances
    fn cancel(&mut self);

    fn is_speaking(&self) -> bool;
}

/// Configuration for speech sequencing
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speech rate passed with every utterance (1.0 = normal)
    pub rate: f32,

    /// Speak assistant messages and resume capture afterwards
    pub auto_read_aloud: bool,

    /// Fixed part of the completion grace period
    pub fallback_base_ms: u64,

    /// Per-character part of the completion grace period
    pub fallback_per_char_ms: u64,

    /// Delay between a final transcript and its submission
    pub transcript_settle_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            auto_read_aloud: true,
            fallback_base_ms: 2000,
            fallback_per_char_ms: 90,
            transcript_settle_ms: 800,
        }
    }
}

impl SpeechConfig {
    /// Set the speech rate
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    /// Enable or disable automatic read-aloud
    pub fn with_auto_read_aloud(mut self, enabled: bool) -> Self {
        self.auto_read_aloud = enabled;
        self
    }

    /// Set the transcript settle delay
    pub fn with_transcript_settle_ms(mut self, ms: u64) -> Self {
        self.transcript_settle_ms = ms;
        self
    }

    /// How long to wait for a completion notification before assuming one
    pub fn completion_grace(&self, text: &str) -> Duration {
        let chars = text.chars().count() as u64;
        Duration::from_millis(self.fallback_base_ms + chars * self.fallback_per_char_ms)
    }

    pub fn transcript_settle(&self) -> Duration {
        Duration::from_millis(self.transcript_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_config_default() {
        let config = SpeechConfig::default();
        assert_eq!(config.rate, 1.0);
        assert!(config.auto_read_aloud);
        assert_eq!(config.transcript_settle(), Duration::from_millis(800));
    }

    #[test]
    fn test_completion_grace_counts_chars() {
        let config = SpeechConfig::default();
        assert_eq!(config.completion_grace(""), Duration::from_millis(2000));
        assert_eq!(config.completion_grace("Rest."), Duration::from_millis(2450));
        // Devanagari is counted per character, not per byte
        assert_eq!(config.completion_grace("नमस्ते"), Duration::from_millis(2000 + 6 * 90));
    }

    #[test]
    fn test_capture_failure_codes() {
        assert!(CaptureFailure::from_code("not-allowed").is_permission_denied());
        assert!(CaptureFailure::from_code("service-not-allowed").is_permission_denied());
        assert!(!CaptureFailure::from_code("no-speech").is_permission_denied());
        assert_eq!(
            CaptureFailure::from_code("audio-capture"),
            CaptureFailure::Other("audio-capture".into())
        );
        assert_eq!(CaptureFailure::NotAllowed.to_string(), "not-allowed");
    }
}
