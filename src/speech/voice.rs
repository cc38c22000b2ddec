//! Voice selection for speech output

use crate::language::Language;
use serde::{Deserialize, Serialize};

/// A synthesis voice advertised by the speech engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Engine-specific display name (e.g. "Google हिन्दी")
    pub name: String,
    /// BCP-47-ish language tag as reported by the engine (e.g. "hi_IN")
    pub lang: String,
    /// Whether the engine marks this voice as its default
    pub is_default: bool,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            is_default: false,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Language tag with `_` replaced by `-`, lowercased
    pub fn normalized_lang(&self) -> String {
        self.lang.replace('_', "-").to_lowercase()
    }

    /// Whether the voice speaks the given base language code
    ///
    /// Deliberately a prefix match on the tag rather than a substring search,
    /// so `zh-chi` or `chr` never pass for `hi`.
    pub fn speaks(&self, code: &str) -> bool {
        let lang = self.normalized_lang();
        lang == code || lang.starts_with(&format!("{}-", code))
    }

    fn is_provider_native(&self) -> bool {
        self.name.contains("Google")
    }
}

/// Pick the best voice for `language`
///
/// Preference order:
/// 1. provider-native voice for the language
/// 2. any voice for the language code
/// 3. a voice whose name mentions the language (e.g. "Microsoft Hemant - Hindi")
/// 4. the engine default, else the first voice
///
/// Returns `None` only when the engine reports no voices at all, in which
/// case the engine picks on its own.
pub fn select_voice(voices: &[Voice], language: Language) -> Option<Voice> {
    let code = language.code();
    let name = language.english_name();

    voices
        .iter()
        .find(|v| v.is_provider_native() && v.speaks(code))
        .or_else(|| voices.iter().find(|v| v.speaks(code)))
        .or_else(|| voices.iter().find(|v| v.name.to_lowercase().contains(name)))
        .or_else(|| voices.iter().find(|v| v.is_default))
        .or_else(|| voices.first())
        .cloned()
}
