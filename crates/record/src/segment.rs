use serde::{Deserialize, Serialize};

/// Speaker attribution for a transcript segment.
///
/// `Unknown` is a valid terminal state: role assignment degrades instead of
/// failing when provider speaker labels cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    Agent,
    Customer,
    Unknown,
}

impl SpeakerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerRole::Agent => "agent",
            SpeakerRole::Customer => "customer",
            SpeakerRole::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contiguous stretch of speech attributed to a single speaker.
///
/// Segments are created by the provider adapter with role `Unknown`, mutated
/// in place exactly once by role assignment, and immutable afterwards.
/// `speaker_label` preserves the provider's raw speaker tag for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_ms: u64,
    pub end_ms: u64,
    pub speaker_role: SpeakerRole,
    pub speaker_label: Option<String>,
    pub text: String,
}

impl TranscriptSegment {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}
