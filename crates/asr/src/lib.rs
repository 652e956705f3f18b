mod mock;
mod provider;
mod transcript_file;
mod whisper_http;

pub use mock::MockProvider;
pub use provider::{
    create_provider, normalize_segments, ProviderKind, ProviderSettings, RawSegment,
    TranscriptionProvider,
};
pub use transcript_file::TranscriptFileProvider;
pub use whisper_http::WhisperHttpProvider;

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transcription backend unreachable: {0}")]
    Unreachable(String),
    #[error("transcription request timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("audio reference not found: {0}")]
    AudioNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Duration of a WAV file in milliseconds, read from the header.
///
/// Returns `None` when the reference is not a readable WAV, in which case
/// callers fall back to the last transcript segment's end time.
pub fn wav_duration_ms(path: &Path) -> Option<u64> {
    let reader = hound::WavReader::open(path).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    Some(reader.duration() as u64 * 1000 / spec.sample_rate as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_duration_from_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..8_000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        assert_eq!(wav_duration_ms(&path), Some(500));
    }

    #[test]
    fn wav_duration_none_for_missing_or_invalid() {
        assert_eq!(wav_duration_ms(Path::new("/no/such/file.wav")), None);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_audio.wav");
        std::fs::write(&path, b"plainly not a wav").unwrap();
        assert_eq!(wav_duration_ms(&path), None);
    }
}
