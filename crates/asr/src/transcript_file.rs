use std::path::{Path, PathBuf};

use crate::provider::{normalize_segments, RawSegment, TranscriptionProvider};
use crate::whisper_http::parse_verbose_json;
use crate::ProviderError;

/// Provider for calls transcribed ahead of time.
///
/// Resolves the audio reference to a whisper-style JSON sidecar (the
/// reference with its extension swapped to `.json`), or reads the reference
/// directly when it already points at a `.json` file. This is the offline
/// path for batches transcribed elsewhere.
#[derive(Debug, Default)]
pub struct TranscriptFileProvider;

impl TranscriptFileProvider {
    pub fn new() -> Self {
        Self
    }

    fn sidecar_path(audio_ref: &str) -> PathBuf {
        let path = Path::new(audio_ref);
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            path.to_path_buf()
        } else {
            path.with_extension("json")
        }
    }
}

impl TranscriptionProvider for TranscriptFileProvider {
    fn name(&self) -> &'static str {
        "transcript_file"
    }

    fn transcribe(&self, audio_ref: &str) -> crate::Result<Vec<RawSegment>> {
        let path = Self::sidecar_path(audio_ref);
        if !path.is_file() {
            return Err(ProviderError::AudioNotFound(path));
        }

        let body = std::fs::read_to_string(&path).map_err(|e| {
            ProviderError::MalformedResponse(format!("could not read {}: {e}", path.display()))
        })?;
        tracing::debug!(transcript = %path.display(), "loaded sidecar transcript");

        normalize_segments(parse_verbose_json(&body)?)
    }
}
