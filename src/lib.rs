pub mod advice;
pub mod conversation;
pub mod hospitals;
pub mod integration;
pub mod language;
pub mod messages;
pub mod speech;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MedchatError {
    #[error("Advice service error: {0}")]
    AdviceError(String),

    #[error("Advice response error: {0}")]
    AdviceResponseError(String),

    #[error("Speech output error: {0}")]
    SpeechError(String),

    #[error("Speech capture error: {0}")]
    CaptureError(String),

    #[error("Hospital lookup error: {0}")]
    HospitalLookupError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Orchestrator error: {0}")]
    OrchestratorError(String),
}

impl From<std::io::Error> for MedchatError {
    fn from(e: std::io::Error) -> Self {
        MedchatError::IOError(e.to_string())
    }
}

impl MedchatError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Remote failures are surfaced as a fallback message and the session goes on
            MedchatError::AdviceError(_) => true,
            MedchatError::AdviceResponseError(_) => true,
            MedchatError::SpeechError(_) => true,
            // Denied microphone access needs the user to act
            MedchatError::CaptureError(_) => false,
            MedchatError::HospitalLookupError(_) => true,
            MedchatError::IOError(_) => false,
            MedchatError::ConfigError(_) => false,
            MedchatError::ChannelError(_) => false,
            MedchatError::OrchestratorError(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            MedchatError::AdviceError(_) | MedchatError::AdviceResponseError(_) => {
                "The advice service could not be reached. Please try again.".to_string()
            }
            MedchatError::SpeechError(_) => {
                "Speech output failed. Replies will be shown as text.".to_string()
            }
            MedchatError::CaptureError(_) => {
                "Microphone unavailable. Please check permissions or type your message."
                    .to_string()
            }
            MedchatError::HospitalLookupError(_) => {
                "Failed to load hospital details.".to_string()
            }
            MedchatError::IOError(_) => "File system error occurred.".to_string(),
            MedchatError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            MedchatError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            MedchatError::OrchestratorError(_) => {
                "System error occurred. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MedchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(MedchatError::AdviceError("down".into()).is_recoverable());
        assert!(MedchatError::HospitalLookupError("timeout".into()).is_recoverable());
        assert!(!MedchatError::ConfigError("bad".into()).is_recoverable());
        assert!(!MedchatError::CaptureError("not-allowed".into()).is_recoverable());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: MedchatError = io.into();
        assert!(matches!(err, MedchatError::IOError(_)));
        assert_eq!(err.user_message(), "File system error occurred.");
    }
}
