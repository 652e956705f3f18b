use serde::{Deserialize, Serialize};

use callscore_record::{SpeakerRole, TranscriptSegment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiarizationConfig {
    /// A silence gap strictly longer than this marks a speaker change when
    /// the provider supplies no speaker labels.
    pub silence_gap_ms: u64,
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            silence_gap_ms: 2000,
        }
    }
}

const AGENT_ALIASES: &[&str] = &[
    "agent",
    "collector",
    "rep",
    "representative",
    "operator",
    "caller",
];

const CUSTOMER_ALIASES: &[&str] = &[
    "customer",
    "debtor",
    "client",
    "consumer",
    "borrower",
    "callee",
];

const COLLECTOR_KEYWORDS: &[(&str, u32)] = &[
    ("calling from", 2),
    ("bank", 2),
    ("loan", 2),
    ("emi", 2),
    ("due date", 2),
    ("payment reminder", 2),
    ("this call is recorded", 2),
];

const DEBTOR_KEYWORDS: &[(&str, u32)] = &[
    ("i will pay", 2),
    ("salary", 2),
    ("next week", 2),
    ("tomorrow", 2),
    ("cannot pay", 2),
    ("give time", 2),
];

/// Assigns a [`SpeakerRole`] to every segment, in place.
///
/// Never fails and never changes segment count or order. Unlabeled
/// transcripts fall back to silence-gap alternation starting from the agent
/// (the conventional first speaker on an outbound call). Labeled transcripts
/// are mapped through alias resolution and, for the common two-speaker case,
/// weighted keyword scoring; anything unresolvable degrades to
/// [`SpeakerRole::Unknown`].
pub fn assign_roles(segments: &mut [TranscriptSegment], config: &DiarizationConfig) {
    if segments.is_empty() {
        return;
    }

    if segments.iter().all(|s| s.speaker_label.is_none()) {
        assign_by_gaps(segments, config.silence_gap_ms);
    } else {
        assign_by_labels(segments);
    }
}

fn assign_by_gaps(segments: &mut [TranscriptSegment], silence_gap_ms: u64) {
    let mut role = SpeakerRole::Agent;
    let mut prev_end: Option<u64> = None;

    for segment in segments.iter_mut() {
        if let Some(end) = prev_end {
            if segment.start_ms.saturating_sub(end) > silence_gap_ms {
                role = opposite(role);
            }
        }
        segment.speaker_role = role;
        prev_end = Some(segment.end_ms);
    }
}

fn opposite(role: SpeakerRole) -> SpeakerRole {
    match role {
        SpeakerRole::Agent => SpeakerRole::Customer,
        _ => SpeakerRole::Agent,
    }
}

fn assign_by_labels(segments: &mut [TranscriptSegment]) {
    // Distinct labels in first-appearance order. Order matters for the
    // all-tied fallback below.
    let mut labels: Vec<String> = Vec::new();
    for segment in segments.iter() {
        if let Some(label) = &segment.speaker_label {
            if !labels.iter().any(|l| l == label) {
                labels.push(label.clone());
            }
        }
    }

    let mut roles: Vec<Option<SpeakerRole>> = labels.iter().map(|l| resolve_alias(l)).collect();

    if labels.len() == 2 {
        match (roles[0], roles[1]) {
            (Some(SpeakerRole::Agent), None) => roles[1] = Some(SpeakerRole::Customer),
            (Some(SpeakerRole::Customer), None) => roles[1] = Some(SpeakerRole::Agent),
            (None, Some(SpeakerRole::Agent)) => roles[0] = Some(SpeakerRole::Customer),
            (None, Some(SpeakerRole::Customer)) => roles[0] = Some(SpeakerRole::Agent),
            (None, None) => {
                let (first, second) = score_label_pair(segments, &labels);
                roles[0] = Some(first);
                roles[1] = Some(second);
            }
            _ => {}
        }
    }

    for (label, role) in labels.iter().zip(&roles) {
        tracing::debug!(label, role = %role.unwrap_or(SpeakerRole::Unknown), "resolved speaker label");
    }

    for segment in segments.iter_mut() {
        segment.speaker_role = match &segment.speaker_label {
            Some(label) => labels
                .iter()
                .position(|l| l == label)
                .and_then(|i| roles[i])
                .unwrap_or(SpeakerRole::Unknown),
            None => SpeakerRole::Unknown,
        };
    }
}

fn resolve_alias(label: &str) -> Option<SpeakerRole> {
    let normalized = label.trim().to_lowercase();
    if AGENT_ALIASES.contains(&normalized.as_str()) {
        Some(SpeakerRole::Agent)
    } else if CUSTOMER_ALIASES.contains(&normalized.as_str()) {
        Some(SpeakerRole::Customer)
    } else {
        None
    }
}

/// Weighted keyword scoring over each speaker's aggregated text, for the
/// two-speaker case where neither label is a known alias. Collector score
/// decides; on a tie the debtor score decides; when everything ties, the
/// first speaker to appear takes the agent side.
fn score_label_pair(
    segments: &[TranscriptSegment],
    labels: &[String],
) -> (SpeakerRole, SpeakerRole) {
    let mut texts = vec![String::new(); labels.len()];
    for segment in segments {
        if let Some(label) = &segment.speaker_label {
            if let Some(i) = labels.iter().position(|l| l == label) {
                texts[i].push(' ');
                texts[i].push_str(&segment.text);
            }
        }
    }

    let (collector_a, debtor_a) = keyword_scores(&texts[0]);
    let (collector_b, debtor_b) = keyword_scores(&texts[1]);
    tracing::debug!(
        collector_a,
        debtor_a,
        collector_b,
        debtor_b,
        "keyword scores for unresolved label pair"
    );

    if collector_a > collector_b {
        (SpeakerRole::Agent, SpeakerRole::Customer)
    } else if collector_b > collector_a {
        (SpeakerRole::Customer, SpeakerRole::Agent)
    } else if debtor_a > debtor_b {
        (SpeakerRole::Customer, SpeakerRole::Agent)
    } else if debtor_b > debtor_a {
        (SpeakerRole::Agent, SpeakerRole::Customer)
    } else {
        (SpeakerRole::Agent, SpeakerRole::Customer)
    }
}

fn keyword_scores(text: &str) -> (u32, u32) {
    let lower = text.to_lowercase();
    let collector = COLLECTOR_KEYWORDS
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|(_, weight)| weight)
        .sum();
    let debtor = DEBTOR_KEYWORDS
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|(_, weight)| weight)
        .sum();
    (collector, debtor)
}
