use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::provider::{normalize_segments, ProviderSettings, RawSegment, TranscriptionProvider};
use crate::ProviderError;

/// Provider backed by an OpenAI-compatible `/audio/transcriptions` endpoint.
///
/// Uploads the audio file as multipart form data and decodes the
/// `verbose_json` response. Network and decoding failures are mapped onto
/// [`ProviderError`]; nothing here panics on a bad backend.
pub struct WhisperHttpProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl WhisperHttpProvider {
    pub fn new(settings: &ProviderSettings) -> crate::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Unreachable(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            endpoint: settings.whisper_endpoint.clone(),
            model: settings.whisper_model.clone(),
            api_key: settings.api_key.clone(),
            timeout_secs: settings.http_timeout_secs,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                seconds: self.timeout_secs,
            }
        } else {
            ProviderError::Unreachable(err.to_string())
        }
    }
}

impl TranscriptionProvider for WhisperHttpProvider {
    fn name(&self) -> &'static str {
        "whisper_http"
    }

    fn transcribe(&self, audio_ref: &str) -> crate::Result<Vec<RawSegment>> {
        let path = Path::new(audio_ref);
        if !path.is_file() {
            return Err(ProviderError::AudioNotFound(path.to_path_buf()));
        }

        tracing::info!(audio_ref, endpoint = %self.endpoint, "uploading audio for transcription");

        let form = reqwest::blocking::multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .file("file", path)
            .map_err(|e| {
                ProviderError::Unreachable(format!("could not read {}: {e}", path.display()))
            })?;

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let body = response.text().map_err(|e| self.map_send_error(e))?;
        if !status.is_success() {
            return Err(ProviderError::Unreachable(format!(
                "backend returned {status}: {}",
                truncate(&body, 200)
            )));
        }

        normalize_segments(parse_verbose_json(&body)?)
    }
}

#[derive(Debug, Deserialize)]
struct VerboseResponse {
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: Option<f64>,
    end: Option<f64>,
    #[serde(default)]
    text: String,
    speaker: Option<String>,
}

/// Decodes a whisper-style `verbose_json` body into raw segments, converting
/// second floats into integral milliseconds. Missing, negative, or
/// non-finite timestamps are rejected here so they can never reach role
/// assignment.
pub(crate) fn parse_verbose_json(body: &str) -> crate::Result<Vec<RawSegment>> {
    let response: VerboseResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("undecodable body: {e}")))?;

    response
        .segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| {
            Ok(RawSegment {
                start_ms: seconds_to_ms(segment.start, index, "start")?,
                end_ms: seconds_to_ms(segment.end, index, "end")?,
                text: segment.text.trim().to_string(),
                speaker: segment.speaker,
            })
        })
        .collect()
}

fn seconds_to_ms(value: Option<f64>, index: usize, field: &str) -> crate::Result<u64> {
    let seconds = value.ok_or_else(|| {
        ProviderError::MalformedResponse(format!("segment {index} is missing `{field}`"))
    })?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ProviderError::MalformedResponse(format!(
            "segment {index} has invalid `{field}` value {seconds}"
        )));
    }
    Ok((seconds * 1000.0).round() as u64)
}

fn truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbose_json_segments() {
        let body = r#"{
            "text": "Hello there. Yes, speaking.",
            "segments": [
                {"id": 0, "start": 0.0, "end": 5.5, "text": " Hello there. ", "avg_logprob": -0.2},
                {"id": 1, "start": 6.0, "end": 7.25, "text": "Yes, speaking.", "speaker": "Speaker 2"}
            ]
        }"#;
        let segments = parse_verbose_json(body).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start_ms, 0);
        assert_eq!(segments[0].end_ms, 5500);
        assert_eq!(segments[0].text, "Hello there.");
        assert_eq!(segments[0].speaker, None);
        assert_eq!(segments[1].end_ms, 7250);
        assert_eq!(segments[1].speaker.as_deref(), Some("Speaker 2"));
    }

    #[test]
    fn missing_timestamp_is_malformed() {
        let body = r#"{"segments": [{"start": 0.0, "text": "no end field"}]}"#;
        let err = parse_verbose_json(body).unwrap_err();
        match err {
            ProviderError::MalformedResponse(msg) => assert!(msg.contains("end")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_timestamp_is_malformed() {
        let body = r#"{"segments": [{"start": -1.0, "end": 2.0, "text": "bad"}]}"#;
        assert!(matches!(
            parse_verbose_json(body),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn undecodable_body_is_malformed() {
        assert!(matches!(
            parse_verbose_json("<html>502 bad gateway</html>"),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn empty_segment_list_is_valid() {
        let segments = parse_verbose_json(r#"{"text": "", "segments": []}"#).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 200), "short");
        let s = "héllo";
        assert_eq!(truncate(s, 2), "h");
    }
}
