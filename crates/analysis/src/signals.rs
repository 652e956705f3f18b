use regex::Regex;

use callscore_record::{Signal, SignalCategory, SignalValue, SpeakerRole, TranscriptSegment};

use crate::{matches_any_phrase, SignalConfig};

/// Runs every signal rule over the transcript.
///
/// Rules are independent; each decides on its own whether it applies. A rule
/// that cannot be evaluated (no agent speech, no customer turns, too few
/// segments) contributes nothing, and the scoring engine later renormalizes
/// around the gap. Emission order is fixed, so identical transcripts yield
/// identical signal lists.
pub fn extract_signals(segments: &[TranscriptSegment], config: &SignalConfig) -> Vec<Signal> {
    if segments.is_empty() {
        return Vec::new();
    }

    let mut signals = Vec::new();
    signals.extend(disclosure_signal(segments, config));
    signals.extend(prohibited_signals(segments, config));
    signals.extend(talk_ratio_signal(segments));
    signals.extend(latency_signal(segments));
    signals.extend(commitment_signal(segments, config));
    signals.extend(dead_air_signal(segments));

    tracing::debug!(count = signals.len(), "extracted signals");
    signals
}

/// The disclosure counts only if an agent delivers it before the first
/// customer segment that commits to a payment. Without such a boundary, a
/// disclosure anywhere in the call passes.
fn disclosure_signal(segments: &[TranscriptSegment], config: &SignalConfig) -> Option<Signal> {
    if !segments
        .iter()
        .any(|s| s.speaker_role == SpeakerRole::Agent)
    {
        return None;
    }

    let commitment_boundary = segments.iter().position(|s| {
        s.speaker_role == SpeakerRole::Customer
            && matches_any_phrase(&s.text, &config.commitment_patterns).is_some()
    });

    let disclosure = segments.iter().enumerate().find_map(|(index, segment)| {
        if segment.speaker_role != SpeakerRole::Agent {
            return None;
        }
        matches_any_phrase(&segment.text, &config.disclosure_phrases)
            .map(|phrase| (index, phrase))
    });

    let signal = match disclosure {
        Some((index, phrase)) => {
            let in_time = commitment_boundary.map_or(true, |boundary| index < boundary);
            let mut evidence = vec![index];
            if !in_time {
                evidence.extend(commitment_boundary);
            }
            Signal {
                name: "disclosure_given".to_string(),
                category: SignalCategory::Disclosure,
                value: SignalValue::Flag(in_time),
                detail: Some(phrase),
                evidence,
            }
        }
        None => Signal {
            name: "disclosure_given".to_string(),
            category: SignalCategory::Disclosure,
            value: SignalValue::Flag(false),
            detail: None,
            evidence: commitment_boundary.into_iter().collect(),
        },
    };
    Some(signal)
}

/// One signal per prohibited-term occurrence in agent speech; a single
/// all-clear signal when agent speech exists and stays clean. An empty
/// lexicon disables the rule entirely.
fn prohibited_signals(segments: &[TranscriptSegment], config: &SignalConfig) -> Vec<Signal> {
    let agent_indices: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.speaker_role == SpeakerRole::Agent)
        .map(|(index, _)| index)
        .collect();
    if agent_indices.is_empty() {
        return Vec::new();
    }

    let Some(lexicon) = lexicon_regex(&config.prohibited_lexicon) else {
        return Vec::new();
    };

    let mut signals = Vec::new();
    for &index in &agent_indices {
        for found in lexicon.find_iter(&segments[index].text) {
            signals.push(Signal {
                name: "prohibited_term".to_string(),
                category: SignalCategory::ProhibitedLanguage,
                value: SignalValue::Flag(true),
                detail: Some(found.as_str().to_lowercase()),
                evidence: vec![index],
            });
        }
    }

    if signals.is_empty() {
        signals.push(Signal {
            name: "prohibited_language_clean".to_string(),
            category: SignalCategory::ProhibitedLanguage,
            value: SignalValue::Flag(false),
            detail: None,
            evidence: Vec::new(),
        });
    }
    signals
}

fn lexicon_regex(terms: &[String]) -> Option<Regex> {
    let escaped: Vec<String> = terms
        .iter()
        .map(|term| term.trim())
        .filter(|term| !term.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return None;
    }
    // Every alternative is escaped, so the pattern is always valid.
    Some(Regex::new(&format!(r"(?i)\b(?:{})\b", escaped.join("|"))).unwrap())
}

fn talk_ratio_signal(segments: &[TranscriptSegment]) -> Option<Signal> {
    let spoken_ms = |role: SpeakerRole| -> u64 {
        segments
            .iter()
            .filter(|s| s.speaker_role == role)
            .map(|s| s.duration_ms())
            .sum()
    };
    let agent_ms = spoken_ms(SpeakerRole::Agent);
    let customer_ms = spoken_ms(SpeakerRole::Customer);
    let attributed_ms = agent_ms + customer_ms;
    if attributed_ms == 0 {
        return None;
    }

    Some(Signal {
        name: "agent_talk_ratio".to_string(),
        category: SignalCategory::TalkRatio,
        value: SignalValue::Number(agent_ms as f64 / attributed_ms as f64),
        detail: None,
        evidence: Vec::new(),
    })
}

/// Mean delay between the end of a customer turn and the agent turn that
/// directly follows it. Overlapping responses count as zero.
fn latency_signal(segments: &[TranscriptSegment]) -> Option<Signal> {
    let mut gaps_ms: Vec<u64> = Vec::new();
    let mut evidence = Vec::new();
    for (index, pair) in segments.windows(2).enumerate() {
        if pair[0].speaker_role == SpeakerRole::Customer
            && pair[1].speaker_role == SpeakerRole::Agent
        {
            gaps_ms.push(pair[1].start_ms.saturating_sub(pair[0].end_ms));
            evidence.push(index + 1);
        }
    }
    if gaps_ms.is_empty() {
        return None;
    }

    let mean = gaps_ms.iter().sum::<u64>() as f64 / gaps_ms.len() as f64;
    Some(Signal {
        name: "mean_response_latency_ms".to_string(),
        category: SignalCategory::ResponseLatency,
        value: SignalValue::Number(mean),
        detail: None,
        evidence,
    })
}

fn commitment_signal(segments: &[TranscriptSegment], config: &SignalConfig) -> Option<Signal> {
    let mut evidence = Vec::new();
    let mut matched_phrase: Option<String> = None;
    let mut has_customer = false;

    for (index, segment) in segments.iter().enumerate() {
        if segment.speaker_role != SpeakerRole::Customer {
            continue;
        }
        has_customer = true;
        if let Some(phrase) = matches_any_phrase(&segment.text, &config.commitment_patterns) {
            matched_phrase.get_or_insert(phrase);
            evidence.push(index);
        }
    }
    if !has_customer {
        return None;
    }

    Some(Signal {
        name: "payment_commitment".to_string(),
        category: SignalCategory::PaymentCommitment,
        value: SignalValue::Flag(matched_phrase.is_some()),
        detail: matched_phrase,
        evidence,
    })
}

fn dead_air_signal(segments: &[TranscriptSegment]) -> Option<Signal> {
    if segments.len() < 2 {
        return None;
    }

    let mut longest_ms = 0u64;
    let mut after_gap = 0usize;
    for (index, pair) in segments.windows(2).enumerate() {
        let gap = pair[1].start_ms.saturating_sub(pair[0].end_ms);
        if gap > longest_ms {
            longest_ms = gap;
            after_gap = index + 1;
        }
    }

    Some(Signal {
        name: "longest_dead_air_ms".to_string(),
        category: SignalCategory::DeadAir,
        value: SignalValue::Number(longest_ms as f64),
        detail: None,
        evidence: if longest_ms > 0 { vec![after_gap] } else { Vec::new() },
    })
}
