use callscore_record::{CallIntent, TranscriptSegment};

use crate::entities::{extract_amounts, extract_dates};
use crate::SignalConfig;

const DEBT_KEYWORDS: &[&str] = &[
    "pay", "payment", "emi", "due", "overdue", "amount", "rupees", "rs", "₹", "upi", "bank",
    "transfer",
];

const DISPUTE_TERMS: &[&str] = &[
    "dispute",
    "already paid",
    "not my loan",
    "not my account",
    "wrong number",
    "never took",
    "incorrect",
    "fraud",
];

const REFUSAL_TERMS: &[&str] = &[
    "cannot pay",
    "can't pay",
    "will not pay",
    "won't pay",
    "refuse to pay",
    "not going to pay",
    "no money to pay",
];

/// Classifies what the call was about from its full text.
///
/// The ladder is evaluated top-down and the first rung that fires wins:
/// dispute, refusal, then commitment (graded by whether a concrete amount
/// and date back it up), then general debt vocabulary. An empty transcript
/// is `Ambiguous`.
pub fn classify_intent(segments: &[TranscriptSegment], config: &SignalConfig) -> CallIntent {
    let text = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return CallIntent::Ambiguous;
    }

    if contains_any(&lower, DISPUTE_TERMS) {
        return CallIntent::Dispute;
    }
    if contains_any(&lower, REFUSAL_TERMS) {
        return CallIntent::Refusal;
    }

    let committed = config
        .commitment_patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .any(|p| !p.is_empty() && lower.contains(&p));
    if committed {
        let has_amount = !extract_amounts(&text).is_empty();
        let has_date = !extract_dates(&text).is_empty();
        return match (has_amount, has_date) {
            (true, true) => CallIntent::FullPromiseToPay,
            (false, true) => CallIntent::Arrangement,
            _ => CallIntent::PartialPromise,
        };
    }

    if contains_any(&lower, DEBT_KEYWORDS) {
        CallIntent::PaymentDiscussion
    } else {
        CallIntent::GeneralInquiry
    }
}

fn contains_any(lower: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| lower.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscore_record::SpeakerRole;

    fn transcript(lines: &[&str]) -> Vec<TranscriptSegment> {
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| TranscriptSegment {
                start_ms: i as u64 * 2000,
                end_ms: i as u64 * 2000 + 1500,
                speaker_role: SpeakerRole::Unknown,
                speaker_label: None,
                text: text.to_string(),
            })
            .collect()
    }

    fn classify(lines: &[&str]) -> CallIntent {
        classify_intent(&transcript(lines), &SignalConfig::default())
    }

    #[test]
    fn empty_transcript_is_ambiguous() {
        assert_eq!(classify(&[]), CallIntent::Ambiguous);
        assert_eq!(classify(&["   "]), CallIntent::Ambiguous);
    }

    #[test]
    fn dispute_terms_win_over_everything() {
        assert_eq!(
            classify(&["I already paid this, I will pay nothing more"]),
            CallIntent::Dispute
        );
        assert_eq!(classify(&["this is a wrong number"]), CallIntent::Dispute);
    }

    #[test]
    fn refusal_beats_commitment() {
        assert_eq!(
            classify(&["I cannot pay this month, whatever you say"]),
            CallIntent::Refusal
        );
    }

    #[test]
    fn commitment_grading_by_amount_and_date() {
        assert_eq!(
            classify(&["I will pay 5,000 rupees on 12/05/2026"]),
            CallIntent::FullPromiseToPay
        );
        assert_eq!(
            classify(&["I will pay you next Friday"]),
            CallIntent::Arrangement
        );
        assert_eq!(classify(&["okay okay, I will pay"]), CallIntent::PartialPromise);
    }

    #[test]
    fn debt_vocabulary_without_commitment_is_discussion() {
        assert_eq!(
            classify(&["the emi is overdue and the amount keeps growing"]),
            CallIntent::PaymentDiscussion
        );
    }

    #[test]
    fn unrelated_text_is_general_inquiry() {
        assert_eq!(
            classify(&["hello, who is this calling me so late"]),
            CallIntent::GeneralInquiry
        );
    }
}
