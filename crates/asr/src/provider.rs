use serde::{Deserialize, Serialize};

use crate::{MockProvider, ProviderError, TranscriptFileProvider, WhisperHttpProvider};

/// One transcribed stretch of speech as the provider reported it, before
/// role assignment. `speaker` carries the provider's own label when the
/// backend diarizes (e.g. "Speaker 1", "agent"), `None` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub speaker: Option<String>,
}

/// Contract every transcription backend implements.
///
/// `transcribe` takes the audio reference as given on the command line and
/// returns time-ordered segments. Implementations validate their own output
/// through [`normalize_segments`] so downstream stages never see malformed
/// timestamps.
pub trait TranscriptionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn transcribe(&self, audio_ref: &str) -> crate::Result<Vec<RawSegment>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Mock,
    WhisperHttp,
    TranscriptFile,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Mock => "mock",
            ProviderKind::WhisperHttp => "whisper_http",
            ProviderKind::TranscriptFile => "transcript_file",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "whisper_http" | "whisper-http" | "whisper" => Ok(ProviderKind::WhisperHttp),
            "transcript_file" | "transcript-file" | "file" => Ok(ProviderKind::TranscriptFile),
            other => Err(format!("unknown provider kind: {other}")),
        }
    }
}

/// Settings consumed by the HTTP-backed provider. The mock and file
/// providers ignore them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub whisper_endpoint: String,
    pub whisper_model: String,
    pub api_key: Option<String>,
    pub http_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            whisper_endpoint: "http://127.0.0.1:8080/v1/audio/transcriptions".to_string(),
            whisper_model: "whisper-1".to_string(),
            api_key: None,
            http_timeout_secs: 120,
        }
    }
}

/// Builds the configured provider. Selection is by configuration, not
/// compile-time wiring, so the pipeline itself never names a concrete
/// backend.
pub fn create_provider(
    kind: ProviderKind,
    settings: &ProviderSettings,
) -> crate::Result<Box<dyn TranscriptionProvider>> {
    match kind {
        ProviderKind::Mock => Ok(Box::new(MockProvider::new())),
        ProviderKind::WhisperHttp => Ok(Box::new(WhisperHttpProvider::new(settings)?)),
        ProviderKind::TranscriptFile => Ok(Box::new(TranscriptFileProvider::new())),
    }
}

/// Shared output validation for all providers.
///
/// Drops segments with empty text, rejects any segment whose end does not
/// lie strictly after its start, and orders the result by start time. Runs
/// inside every provider's `transcribe`, ahead of role assignment.
pub fn normalize_segments(mut segments: Vec<RawSegment>) -> crate::Result<Vec<RawSegment>> {
    segments.retain(|s| !s.text.trim().is_empty());
    for segment in &segments {
        if segment.end_ms <= segment.start_ms {
            return Err(ProviderError::MalformedResponse(format!(
                "segment starting at {}ms has non-positive duration (end {}ms)",
                segment.start_ms, segment.end_ms
            )));
        }
    }
    segments.sort_by_key(|s| s.start_ms);
    Ok(segments)
}
