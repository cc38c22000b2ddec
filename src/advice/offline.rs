//! Local keyword advisor used when no advice service is available

use super::{AdviceReply, AdviceRequest, AdviceService};
use crate::conversation::{Notifier, RequestTicket};
use crate::language::Language;
use crate::Result;
use tracing::debug;

/// Appended to advice shown in a language the advisor cannot produce
const UNTRANSLATED_MARKER: &str = " (Translation unavailable)";

/// Keyword groups and the advice they trigger, checked in order
const RULES: &[(&[&str], &str)] = &[
    (
        &["fever", "temperature", "hot"],
        "I see you have a fever. Monitor your temperature regularly and stay hydrated. If it persists beyond 3-4 days or exceeds 103°F (39.4°C), seek medical attention promptly.",
    ),
    (
        &["cough", "throat", "sore"],
        "Coughing and sore throat can have various causes. Rest your voice, stay hydrated, and try throat lozenges. If it's accompanied by difficulty breathing or lasts over 2 weeks, see a doctor.",
    ),
    (
        &["headache", "migraine", "head pain"],
        "Headaches can stem from dehydration, stress, or other causes. Try rest, hydration, and over-the-counter pain relief if appropriate. Recurring or severe headaches warrant a medical evaluation.",
    ),
    (
        &["fatigue", "tired", "exhausted"],
        "Fatigue can indicate various conditions from lack of sleep to nutritional deficiencies. Ensure adequate rest, balanced nutrition, and hydration. Persistent fatigue warrants a medical evaluation.",
    ),
    (
        &["nausea", "vomiting", "stomach"],
        "Nausea and digestive issues may be related to diet, stress, or infection. Rest your digestive system, stay hydrated with clear fluids, and eat bland foods. Contact a doctor if symptoms worsen.",
    ),
];

/// Produce keyword-based advice for a symptom description (English only)
pub fn keyword_advice(symptoms: &str) -> String {
    let lower = symptoms.to_lowercase();

    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, advice)| advice.to_string())
        .unwrap_or_else(|| {
            format!(
                "I understand you're experiencing {}. This requires proper medical evaluation to determine the cause. Monitor your condition and consult a healthcare provider if symptoms persist or worsen.",
                symptoms
            )
        })
}

/// `AdviceService` answering immediately from `keyword_advice`
pub struct OfflineAdvisor {
    notifier: Notifier,
}

impl OfflineAdvisor {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

impl AdviceService for OfflineAdvisor {
    fn request(&mut self, ticket: RequestTicket, request: AdviceRequest) -> Result<()> {
        debug!("Answering {:?} offline", ticket);
        let advice = keyword_advice(&request.symptoms);
        let shown = if request.language == Language::En {
            advice.clone()
        } else {
            format!("{}{}", advice, UNTRANSLATED_MARKER)
        };
        self.notifier.advice(
            ticket,
            Ok(AdviceReply {
                reply: Some(advice),
                reply_translated: shown,
            }),
        );
        Ok(())
    }
}
