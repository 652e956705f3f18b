//! Text analysis over role-attributed transcripts.
//!
//! Three independent layers: compliance/quality signals ([`extract_signals`]),
//! regex entity extraction ([`extract_entities`]), and call intent
//! classification ([`classify_intent`]). All of them are pure functions of
//! the transcript and configuration, so the same call always produces the
//! same analysis.

mod entities;
mod intent;
mod signals;

pub use entities::extract_entities;
pub use intent::classify_intent;
pub use signals::extract_signals;

use serde::{Deserialize, Serialize};

/// Phrase sets driving the signal rules. The defaults carry a realistic
/// collections vocabulary; deployments override them per policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Phrases that satisfy the mandatory recording/debt disclosure,
    /// matched case-insensitively as substrings of agent speech.
    pub disclosure_phrases: Vec<String>,
    /// Terms an agent must never use. Matched on word boundaries.
    pub prohibited_lexicon: Vec<String>,
    /// Phrases that count as a customer committing to a payment.
    pub commitment_patterns: Vec<String>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            disclosure_phrases: to_strings(&[
                "this call is recorded",
                "this call may be recorded",
                "call is being recorded",
                "on a recorded line",
                "attempt to collect a debt",
                "for quality and compliance",
            ]),
            prohibited_lexicon: to_strings(&[
                "arrest",
                "jail",
                "police",
                "sue you",
                "lawsuit",
                "legal action",
                "seize",
                "blacklist",
                "shut up",
                "idiot",
                "stupid",
                "useless",
                "liar",
            ]),
            commitment_patterns: to_strings(&[
                "i will pay",
                "i'll pay",
                "i can pay",
                "i promise to pay",
                "will make the payment",
                "will transfer",
                "will pay by",
                "going to pay",
            ]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Case-insensitive substring match against a configured phrase set.
/// Returns the first matching phrase, trimmed.
pub(crate) fn matches_any_phrase(text: &str, phrases: &[String]) -> Option<String> {
    let lower = text.to_lowercase();
    phrases
        .iter()
        .map(|phrase| phrase.trim())
        .find(|phrase| !phrase.is_empty() && lower.contains(&phrase.to_lowercase()))
        .map(str::to_string)
}
