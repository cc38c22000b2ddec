//! HTTP client for the advice service

use super::{AdviceConfig, AdviceReply, AdviceRequest};
use crate::{MedchatError, Result};
use tracing::{debug, warn};

/// Async client posting turns to `<endpoint>/api/chat`
///
/// No request timeout is set; the controller keeps its single ticket until
/// the service answers or the connection fails.
#[derive(Clone, Debug)]
pub struct HttpAdviceClient {
    url: String,
    client: reqwest::Client,
}

impl HttpAdviceClient {
    pub fn new(config: &AdviceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| MedchatError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: config.chat_url(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one turn and wait for the reply
    pub async fn ask(&self, request: &AdviceRequest) -> Result<AdviceReply> {
        let fields = request.form_fields()?;
        debug!(
            "Posting turn to {} ({} history entries, language {})",
            self.url,
            request.history.len(),
            request.language
        );

        let response = self
            .client
            .post(&self.url)
            .form(&fields)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    MedchatError::AdviceError(format!("Cannot connect to {}", self.url))
                } else {
                    MedchatError::AdviceError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Advice service returned {}: {}", status, body);
            return Err(MedchatError::AdviceResponseError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json::<AdviceReply>()
            .await
            .map_err(|e| MedchatError::AdviceResponseError(format!("Malformed reply: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::messages::Message;
    use mockito::Matcher;

    fn request(text: &str, language: Language) -> AdviceRequest {
        AdviceRequest::new(text, language, &[Message::user(text)])
    }

    #[tokio::test]
    async fn test_ask_posts_form_and_parses_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symptoms".into(), "fever and cough".into()),
                Matcher::UrlEncoded("language".into(), "en".into()),
                Matcher::UrlEncoded("duration".into(), "".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply": "Rest and hydrate.", "reply_translated": "Rest and hydrate."}"#)
            .create_async()
            .await;

        let client = HttpAdviceClient::new(&AdviceConfig::new(server.url())).unwrap();
        let reply = client
            .ask(&request("fever and cough", Language::En))
            .await
            .unwrap();

        assert_eq!(reply.reply_translated, "Rest and hydrate.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ask_reports_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = HttpAdviceClient::new(&AdviceConfig::new(server.url())).unwrap();
        let err = client
            .ask(&request("headache", Language::Hi))
            .await
            .unwrap_err();

        assert!(matches!(err, MedchatError::AdviceResponseError(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_ask_rejects_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"unexpected": true}"#)
            .create_async()
            .await;

        let client = HttpAdviceClient::new(&AdviceConfig::new(server.url())).unwrap();
        let err = client
            .ask(&request("nausea", Language::Mr))
            .await
            .unwrap_err();

        assert!(matches!(err, MedchatError::AdviceResponseError(_)));
    }
}
