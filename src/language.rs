//! Supported conversation languages and their fixed phrases
//!
//! Every user-visible string the assistant produces on its own (greeting,
//! fallback, listening indicator, hospital list status) lives here so that a
//! language switch changes all of them at once.

use crate::MedchatError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language of the active session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Mr,
}

/// Localized fixed phrases for one language
#[derive(Debug)]
pub struct Phrases {
    pub greeting: &'static str,
    pub fallback: &'static str,
    pub listening: &'static str,
    pub input_placeholder: &'static str,
    pub locating: &'static str,
    pub hospitals_found: &'static str,
    pub no_hospitals_nearby: &'static str,
    pub hospital_lookup_failed: &'static str,
    pub no_matching_hospitals: &'static str,
    pub address_unavailable: &'static str,
    pub phone_unavailable: &'static str,
}

const EN: Phrases = Phrases {
    greeting: "Hello! 👋 I am Med-AI. What symptoms are you experiencing today?",
    fallback: "Sorry, I couldn't reach the medical advice service right now. Please try again in a moment.",
    listening: "Listening... Please speak now.",
    input_placeholder: "Type or speak your message...",
    locating: "Locating you...",
    hospitals_found: "Found Hospitals",
    no_hospitals_nearby: "No hospitals found nearby.",
    hospital_lookup_failed: "Failed to load hospital details.",
    no_matching_hospitals: "No matching hospitals found.",
    address_unavailable: "Address not available",
    phone_unavailable: "Phone not available",
};

const HI: Phrases = Phrases {
    greeting: "नमस्ते! 👋 मैं मेड-एआई हूं। आज आपको क्या लक्षण महसूस हो रहे हैं?",
    fallback: "क्षमा करें, मैं अभी चिकित्सा सलाह सेवा से संपर्क नहीं कर सका। कृपया थोड़ी देर में पुनः प्रयास करें।",
    listening: "सुन रहा हूँ... कृपया बोलें।",
    input_placeholder: "टाइप करें या बोलें...",
    locating: "आपका स्थान ढूंढा जा रहा है...",
    hospitals_found: "अस्पताल मिले",
    no_hospitals_nearby: "आसपास कोई अस्पताल नहीं मिला।",
    hospital_lookup_failed: "अस्पताल की जानकारी लोड नहीं हो सकी।",
    no_matching_hospitals: "कोई मेल खाता अस्पताल नहीं मिला।",
    address_unavailable: "पता उपलब्ध नहीं है",
    phone_unavailable: "फ़ोन उपलब्ध नहीं है",
};

const MR: Phrases = Phrases {
    greeting: "नमस्कार! 👋 मी मेड-एआय आहे. आज तुम्हाला कोणती लक्षणे जाणवत आहेत?",
    fallback: "क्षमस्व, मी आत्ता वैद्यकीय सल्ला सेवेशी संपर्क करू शकलो नाही. कृपया थोड्या वेळाने पुन्हा प्रयत्न करा.",
    listening: "ऐकत आहे... कृपया आता बोला.",
    input_placeholder: "टाइप करा किंवा बोला...",
    locating: "तुमचे स्थान शोधत आहे...",
    hospitals_found: "रुग्णालये सापडली",
    no_hospitals_nearby: "जवळपास कोणतेही रुग्णालय सापडले नाही.",
    hospital_lookup_failed: "रुग्णालयाची माहिती लोड करता आली नाही.",
    no_matching_hospitals: "जुळणारे रुग्णालय सापडले नाही.",
    address_unavailable: "पत्ता उपलब्ध नाही",
    phone_unavailable: "फोन उपलब्ध नाही",
};

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Hi, Language::Mr];

    /// Short code sent to the advice service
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Mr => "mr",
        }
    }

    /// Locale used for speech capture and synthesis
    pub fn speech_locale(&self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Hi => "hi-IN",
            Language::Mr => "mr-IN",
        }
    }

    /// Lowercase English name, used to match voices named after the language
    pub fn english_name(&self) -> &'static str {
        match self {
            Language::En => "english",
            Language::Hi => "hindi",
            Language::Mr => "marathi",
        }
    }

    pub fn phrases(&self) -> &'static Phrases {
        match self {
            Language::En => &EN,
            Language::Hi => &HI,
            Language::Mr => &MR,
        }
    }

    pub fn greeting(&self) -> &'static str {
        self.phrases().greeting
    }

    pub fn fallback_message(&self) -> &'static str {
        self.phrases().fallback
    }

    /// Console prompt shown before each line of input
    pub fn input_prompt(&self) -> String {
        format!("[{}] {} ", self.code(), self.phrases().input_placeholder)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = MedchatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" | "en-us" => Ok(Language::En),
            "hi" | "hindi" | "hi-in" => Ok(Language::Hi),
            "mr" | "marathi" | "mr-in" => Ok(Language::Mr),
            other => Err(MedchatError::ConfigError(format!(
                "Unsupported language: {}",
                other
            ))),
        }
    }
}
