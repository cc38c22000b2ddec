//! Terminal stand-ins for the speech engines
//!
//! `ConsoleSpeechOutput` prints utterances instead of synthesizing them and
//! reports completion right away. `ConsoleSpeechInput` marks capture as
//! open; lines typed while it is open are delivered through the paired
//! `ConsoleMicrophone` as transcripts.

use super::{CaptureEvent, SpeechEvent, SpeechInput, SpeechOutput, Utterance, Voice};
use crate::conversation::Notifier;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Capture side: open/closed flag shared with a `ConsoleMicrophone`
pub struct ConsoleSpeechInput {
    active: Arc<AtomicBool>,
    notifier: Notifier,
}

/// Feeds typed lines into an open console capture
#[derive(Clone)]
pub struct ConsoleMicrophone {
    active: Arc<AtomicBool>,
    notifier: Notifier,
}

impl ConsoleSpeechInput {
    pub fn new(notifier: Notifier) -> (Self, ConsoleMicrophone) {
        let active = Arc::new(AtomicBool::new(false));

        let mic = ConsoleMicrophone {
            active: active.clone(),
            notifier: notifier.clone(),
        };

        (Self { active, notifier }, mic)
    }
}

impl SpeechInput for ConsoleSpeechInput {
    fn start(&mut self, locale: &str) -> Result<()> {
        self.active.store(true, Ordering::SeqCst);
        debug!("Console capture open ({})", locale);
        Ok(())
    }

    fn stop(&mut self) {
        if self.active.swap(false, Ordering::SeqCst) {
            debug!("Console capture closed");
            self.notifier.capture(CaptureEvent::Ended);
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl ConsoleMicrophone {
    pub fn is_listening(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Deliver `text` as a final transcript; returns false if capture is closed
    pub fn speak_line(&self, text: &str) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            warn!("Microphone is not listening; line ignored");
            return false;
        }

        self.notifier
            .capture(CaptureEvent::Transcript(text.to_string()));
        self.notifier.capture(CaptureEvent::Ended);
        true
    }
}

/// Output side: prints each utterance and reports it finished
pub struct ConsoleSpeechOutput {
    notifier: Notifier,
}

impl ConsoleSpeechOutput {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

impl SpeechOutput for ConsoleSpeechOutput {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice::new("Console", "en-US").as_default()]
    }

    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        println!("🔊 {}", utterance.text);
        self.notifier.speech(SpeechEvent::Finished(utterance.id));
        Ok(())
    }

    fn cancel(&mut self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::TurnEvent;
    use uuid::Uuid;

    #[test]
    fn test_microphone_delivers_only_while_open() {
        let (notifier, rx) = Notifier::channel();
        let (mut input, mic) = ConsoleSpeechInput::new(notifier);

        assert!(!mic.speak_line("ignored"));
        assert!(rx.try_recv().is_err());

        input.start("en-US").unwrap();
        assert!(mic.is_listening());
        assert!(mic.speak_line("chest pain"));
        assert!(!input.is_active());

        match rx.try_recv().unwrap() {
            TurnEvent::Capture(CaptureEvent::Transcript(text)) => assert_eq!(text, "chest pain"),
            other => panic!("Unexpected event: {:?}", other),
        }
        assert!(matches!(
            rx.try_recv().unwrap(),
            TurnEvent::Capture(CaptureEvent::Ended)
        ));
    }

    #[test]
    fn test_stop_reports_end_once() {
        let (notifier, rx) = Notifier::channel();
        let (mut input, _mic) = ConsoleSpeechInput::new(notifier);

        input.start("hi-IN").unwrap();
        input.stop();
        input.stop();

        assert!(matches!(
            rx.try_recv().unwrap(),
            TurnEvent::Capture(CaptureEvent::Ended)
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_output_finishes_immediately() {
        let (notifier, rx) = Notifier::channel();
        let mut output = ConsoleSpeechOutput::new(notifier);
        let id = Uuid::new_v4();

        output
            .speak(Utterance {
                id,
                text: "Rest and hydrate.".into(),
                locale: "en-US".into(),
                rate: 1.0,
                voice: None,
            })
            .unwrap();

        match rx.try_recv().unwrap() {
            TurnEvent::Speech(SpeechEvent::Finished(got)) => assert_eq!(got, id),
            other => panic!("Unexpected event: {:?}", other),
        }
        assert!(!output.is_speaking());
        assert_eq!(output.voices().len(), 1);
    }
}
