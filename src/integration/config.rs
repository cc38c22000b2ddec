//! Configuration for the integration layer
//!
//! Provides centralized configuration for all components. Values come from
//! defaults, an optional TOML file and `MEDCHAT_*` environment overrides,
//! in that order.

use crate::advice::AdviceConfig;
use crate::hospitals::HospitalConfig;
use crate::language::Language;
use crate::speech::SpeechConfig;
use crate::{MedchatError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "MEDCHAT_CONFIG";

/// Configuration for the complete assistant
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Language of the first session
    pub language: Language,

    /// Advice service configuration
    pub advice: AdviceConfig,

    /// Speech timing and read-aloud configuration
    pub speech: SpeechConfig,

    /// Hospital lookup configuration
    pub hospitals: HospitalConfig,

    /// Capacity of the command and event channels (notifications are unbounded)
    pub channel_buffer_size: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            advice: AdviceConfig::default(),
            speech: SpeechConfig::default(),
            hospitals: HospitalConfig::default(),
            channel_buffer_size: 100,
        }
    }
}

impl AssistantConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AssistantConfig = toml::from_str(content)
            .map_err(|e| MedchatError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MedchatError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;

        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Apply `MEDCHAT_*` overrides read through `lookup`
    ///
    /// Recognized: `MEDCHAT_ADVICE_URL`, `MEDCHAT_LANGUAGE`,
    /// `MEDCHAT_OVERPASS_URL` and `MEDCHAT_OFFLINE`.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MEDCHAT_ADVICE_URL") {
            self.advice.endpoint = url;
        }
        if let Some(language) = lookup("MEDCHAT_LANGUAGE") {
            self.language = language.parse()?;
        }
        if let Some(url) = lookup("MEDCHAT_OVERPASS_URL") {
            self.hospitals.overpass_url = url;
        }
        if let Some(flag) = lookup("MEDCHAT_OFFLINE") {
            self.advice.offline = matches!(flag.trim(), "1" | "true" | "yes");
        }

        self.validate()?;
        Ok(self)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Set the starting language
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the advice configuration
    pub fn with_advice(mut self, advice: AdviceConfig) -> Self {
        self.advice = advice;
        self
    }

    /// Set the speech configuration
    pub fn with_speech(mut self, speech: SpeechConfig) -> Self {
        self.speech = speech;
        self
    }

    /// Set the hospital lookup configuration
    pub fn with_hospitals(mut self, hospitals: HospitalConfig) -> Self {
        self.hospitals = hospitals;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.advice.endpoint.trim();
        if !self.advice.offline
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(MedchatError::ConfigError(format!(
                "Advice endpoint must be an http(s) URL: {:?}",
                self.advice.endpoint
            )));
        }

        if !(0.1..=10.0).contains(&self.speech.rate) {
            return Err(MedchatError::ConfigError(format!(
                "Speech rate out of range: {}",
                self.speech.rate
            )));
        }

        if self.hospitals.radius_m == 0 {
            return Err(MedchatError::ConfigError(
                "Hospital search radius must be positive".to_string(),
            ));
        }

        if self.channel_buffer_size == 0 {
            return Err(MedchatError::ConfigError(
                "Channel buffer size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AssistantConfig::default();
        assert_eq!(config.language, Language::En);
        assert_eq!(config.advice.endpoint, "http://localhost:8000");
        assert_eq!(config.hospitals.radius_m, 5000);
        assert!(config.speech.auto_read_aloud);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AssistantConfig::default()
            .with_language(Language::Mr)
            .with_advice(AdviceConfig::new("https://triage.example.org"))
            .with_speech(SpeechConfig::default().with_rate(0.9))
            .with_hospitals(HospitalConfig::default().with_radius_m(2000));

        assert_eq!(config.language, Language::Mr);
        assert_eq!(config.advice.chat_url(), "https://triage.example.org/api/chat");
        assert_eq!(config.speech.rate, 0.9);
        assert_eq!(config.hospitals.radius_m, 2000);
    }

    #[test]
    fn test_partial_toml() {
        let config = AssistantConfig::from_toml_str(
            r#"
            language = "hi"

            [advice]
            endpoint = "http://10.0.0.5:8000"

            [speech]
            transcript_settle_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.language, Language::Hi);
        assert_eq!(config.advice.endpoint, "http://10.0.0.5:8000");
        assert_eq!(config.speech.transcript_settle_ms, 500);
        assert_eq!(config.speech.fallback_base_ms, 2000);
        assert_eq!(config.channel_buffer_size, 100);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = AssistantConfig::from_toml_str("language = \"fr\"").unwrap_err();
        assert!(matches!(err, MedchatError::ConfigError(_)));

        let err = AssistantConfig::from_toml_str("[advice]\nendpoint = \"localhost\"").unwrap_err();
        assert!(matches!(err, MedchatError::ConfigError(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channel_buffer_size = 16\n[hospitals]\nradius_m = 3000").unwrap();

        let config = AssistantConfig::load(file.path()).unwrap();
        assert_eq!(config.channel_buffer_size, 16);
        assert_eq!(config.hospitals.radius_m, 3000);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AssistantConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, MedchatError::ConfigError(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MEDCHAT_ADVICE_URL", "https://advice.example.org"),
            ("MEDCHAT_LANGUAGE", "marathi"),
            ("MEDCHAT_OVERPASS_URL", "http://overpass.local/api/interpreter"),
            ("MEDCHAT_OFFLINE", "1"),
        ]
        .into_iter()
        .collect();

        let config = AssistantConfig::default()
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.advice.endpoint, "https://advice.example.org");
        assert_eq!(config.language, Language::Mr);
        assert_eq!(config.hospitals.overpass_url, "http://overpass.local/api/interpreter");
        assert!(config.advice.offline);
    }

    #[test]
    fn test_bad_language_override() {
        let result = AssistantConfig::default().apply_overrides(|key| {
            (key == "MEDCHAT_LANGUAGE").then(|| "klingon".to_string())
        });
        assert!(result.is_err());
    }
}
