use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::score::{ComplianceFlag, ScoreComponent, ScoreSummary};
use crate::segment::TranscriptSegment;
use crate::signal::Signal;

/// Bumped whenever a field is added to [`AnalysisRecord`]. Existing fields
/// are never renamed or removed.
pub const SCHEMA_VERSION: u32 = 1;

/// Coarse classification of what the call was about, derived from the
/// transcript text alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallIntent {
    FullPromiseToPay,
    Arrangement,
    PartialPromise,
    Refusal,
    Dispute,
    PaymentDiscussion,
    GeneralInquiry,
    Ambiguous,
}

impl CallIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallIntent::FullPromiseToPay => "full_promise_to_pay",
            CallIntent::Arrangement => "arrangement",
            CallIntent::PartialPromise => "partial_promise",
            CallIntent::Refusal => "refusal",
            CallIntent::Dispute => "dispute",
            CallIntent::PaymentDiscussion => "payment_discussion",
            CallIntent::GeneralInquiry => "general_inquiry",
            CallIntent::Ambiguous => "ambiguous",
        }
    }
}

impl std::fmt::Display for CallIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities pulled out of the transcript by the regex extractors, kept as
/// the normalized surface strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub amounts: Vec<String>,
    pub dates: Vec<String>,
    pub payment_modes: Vec<String>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty() && self.dates.is_empty() && self.payment_modes.is_empty()
    }
}

/// The versioned, immutable result of analyzing one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub schema_version: u32,
    pub record_id: Uuid,
    pub call_id: String,
    pub audio_ref: String,
    pub provider_used: String,
    pub created_at: DateTime<Utc>,
    pub call_duration_ms: u64,
    pub transcript: Vec<TranscriptSegment>,
    pub signals: Vec<Signal>,
    pub entities: ExtractedEntities,
    pub intent: CallIntent,
    pub scores: Vec<ScoreComponent>,
    pub composite_score: f64,
    pub compliance_flags: Vec<ComplianceFlag>,
}

impl AnalysisRecord {
    pub fn full_text(&self) -> String {
        self.transcript
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn failed_flags(&self) -> Vec<&ComplianceFlag> {
        self.compliance_flags.iter().filter(|f| !f.passed).collect()
    }
}

/// Derives a stable call id from an audio reference.
///
/// `recordings/call_0042.wav` becomes `call_0042`; a reference without a
/// usable file stem falls back to the reference itself.
pub fn call_id_from_ref(audio_ref: &str) -> String {
    Path::new(audio_ref)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| audio_ref.to_string())
}

/// Neither a transcript nor a score summary reached the builder, which means
/// every upstream stage failed to produce output for the call.
#[derive(Debug, thiserror::Error)]
#[error("incomplete record for call {call_id}: neither transcript nor scores were produced")]
pub struct IncompleteRecordError {
    pub call_id: String,
}

/// Assembles stage outputs into an [`AnalysisRecord`].
///
/// The builder stamps identity (record id, call id, creation time), the
/// provider used, and the call duration. An empty transcript is a valid
/// input: a dropped call still yields a record, with the missing data
/// reflected in the compliance flags rather than in an error.
#[derive(Debug)]
pub struct RecordBuilder {
    call_id: String,
    audio_ref: String,
    provider_used: String,
    created_at: DateTime<Utc>,
    call_duration_ms: u64,
    transcript: Option<Vec<TranscriptSegment>>,
    signals: Vec<Signal>,
    entities: ExtractedEntities,
    intent: CallIntent,
    scores: Option<ScoreSummary>,
}

impl RecordBuilder {
    pub fn new(audio_ref: &str, provider_used: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            call_id: call_id_from_ref(audio_ref),
            audio_ref: audio_ref.to_string(),
            provider_used: provider_used.to_string(),
            created_at,
            call_duration_ms: 0,
            transcript: None,
            signals: Vec::new(),
            entities: ExtractedEntities::default(),
            intent: CallIntent::Ambiguous,
            scores: None,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn call_duration_ms(mut self, duration_ms: u64) -> Self {
        self.call_duration_ms = duration_ms;
        self
    }

    pub fn transcript(mut self, segments: Vec<TranscriptSegment>) -> Self {
        self.transcript = Some(segments);
        self
    }

    pub fn signals(mut self, signals: Vec<Signal>) -> Self {
        self.signals = signals;
        self
    }

    pub fn entities(mut self, entities: ExtractedEntities) -> Self {
        self.entities = entities;
        self
    }

    pub fn intent(mut self, intent: CallIntent) -> Self {
        self.intent = intent;
        self
    }

    pub fn scores(mut self, summary: ScoreSummary) -> Self {
        self.scores = Some(summary);
        self
    }

    pub fn build(self) -> Result<AnalysisRecord, IncompleteRecordError> {
        if self.transcript.is_none() && self.scores.is_none() {
            return Err(IncompleteRecordError {
                call_id: self.call_id,
            });
        }

        let record_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, self.call_id.as_bytes());
        let transcript = self.transcript.unwrap_or_default();
        let (scores, composite_score, compliance_flags) = match self.scores {
            Some(summary) => (summary.components, summary.composite_score, summary.flags),
            None => (Vec::new(), 0.0, Vec::new()),
        };
        let call_duration_ms = if self.call_duration_ms > 0 {
            self.call_duration_ms
        } else {
            transcript.last().map(|s| s.end_ms).unwrap_or(0)
        };

        Ok(AnalysisRecord {
            schema_version: SCHEMA_VERSION,
            record_id,
            call_id: self.call_id,
            audio_ref: self.audio_ref,
            provider_used: self.provider_used,
            created_at: self.created_at,
            call_duration_ms,
            transcript,
            signals: self.signals,
            entities: self.entities,
            intent: self.intent,
            scores,
            composite_score,
            compliance_flags,
        })
    }
}
