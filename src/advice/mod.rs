//! Remote advice service
//!
//! One request per user turn. The request carries the newest user text, the
//! full message log as history and the session language; the reply carries
//! the advice already translated into that language.

pub mod client;
pub mod offline;
pub mod pipeline;

pub use client::HttpAdviceClient;
pub use offline::OfflineAdvisor;
pub use pipeline::{AdviceCommand, AdviceHandle, AdvicePipeline};

use crate::conversation::RequestTicket;
use crate::language::Language;
use crate::messages::Message;
use crate::{MedchatError, Result};
use serde::{Deserialize, Serialize};

/// Something that can answer a user turn
///
/// `request` must not block: the outcome is reported later through the
/// controller's `Notifier` with the same ticket. An `Err` return means the
/// request was never issued.
pub trait AdviceService: Send {
    fn request(&mut self, ticket: RequestTicket, request: AdviceRequest) -> Result<()>;
}

/// One history entry as the service expects it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role().wire_name().to_string(),
            content: message.text().to_string(),
        }
    }
}

/// Request for one turn
#[derive(Clone, Debug, PartialEq)]
pub struct AdviceRequest {
    /// The user's newest text
    pub symptoms: String,
    /// Illness duration; unused by the free-form flow
    pub duration: Option<String>,
    pub language: Language,
    /// Whole log including the newest user message
    pub history: Vec<HistoryEntry>,
}

impl AdviceRequest {
    pub fn new(symptoms: impl Into<String>, language: Language, history: &[Message]) -> Self {
        Self {
            symptoms: symptoms.into(),
            duration: None,
            language,
            history: history.iter().map(HistoryEntry::from).collect(),
        }
    }

    /// Form fields as posted to `/api/chat`
    pub fn form_fields(&self) -> Result<Vec<(&'static str, String)>> {
        let history = serde_json::to_string(&self.history).map_err(|e| {
            MedchatError::AdviceError(format!("Failed to encode history: {}", e))
        })?;

        Ok(vec![
            ("symptoms", self.symptoms.clone()),
            ("duration", self.duration.clone().unwrap_or_default()),
            ("language", self.language.code().to_string()),
            ("history", history),
        ])
    }
}

/// Reply for one turn
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceReply {
    /// Advice in the service's working language, if reported
    #[serde(default)]
    pub reply: Option<String>,
    /// Advice in the requested language
    pub reply_translated: String,
}

impl AdviceReply {
    pub fn translated(text: impl Into<String>) -> Self {
        Self {
            reply: None,
            reply_translated: text.into(),
        }
    }

    /// Whether the reply has nothing to show
    pub fn is_blank(&self) -> bool {
        self.reply_translated.trim().is_empty()
    }
}

/// Configuration for the advice service
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceConfig {
    /// Base URL of the service; requests go to `<endpoint>/api/chat`
    pub endpoint: String,

    /// Answer locally with keyword rules instead of calling the service
    pub offline: bool,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            offline: false,
        }
    }
}

impl AdviceConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Switch to the local keyword advisor
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.endpoint.trim_end_matches('/'))
    }
}
