//! Per-call analysis pipeline and batch orchestration.
//!
//! One [`CallPipeline`] instance runs transcribe → diarize → extract →
//! score → build strictly in sequence; every stage's output is the next
//! stage's sole input and nothing is shared between calls. Only the
//! transcription provider touches I/O. A call either yields a complete
//! [`AnalysisRecord`] or fails with a [`PipelineError`]; there is no
//! partial result to persist.

mod batch;
mod config;

pub use batch::{process_batch, BatchOutcome};
pub use config::{AnalysisConfig, ConfigError};

use std::path::Path;

use chrono::{DateTime, Utc};

use callscore_analysis::{classify_intent, extract_entities, extract_signals};
use callscore_asr::{
    create_provider, wav_duration_ms, ProviderError, TranscriptionProvider,
};
use callscore_diarization::assign_roles;
use callscore_record::{
    AnalysisRecord, IncompleteRecordError, RecordBuilder, SpeakerRole, TranscriptSegment,
};
use callscore_scoring::ScoringEngine;

/// Failure of a single call's pipeline. Aborts that call only; the batch
/// carries on.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Record(#[from] IncompleteRecordError),
}

pub struct CallPipeline {
    config: AnalysisConfig,
    provider: Box<dyn TranscriptionProvider>,
}

impl CallPipeline {
    /// Validates the configuration and builds the selected provider.
    /// Failure here means nothing gets processed.
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let provider =
            create_provider(config.use_api, &config.provider).map_err(|e| ConfigError::Invalid {
                field: "use_api",
                message: e.to_string(),
            })?;
        Ok(Self { config, provider })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Analyzes one call, stamping the current time. Use
    /// [`process_call_at`](Self::process_call_at) when the record must be
    /// reproducible.
    pub fn process_call(&self, audio_ref: &str) -> Result<AnalysisRecord, PipelineError> {
        self.process_call_at(audio_ref, Utc::now())
    }

    /// Analyzes one call with an injected creation time, so reprocessing
    /// against a deterministic provider yields a byte-identical record.
    pub fn process_call_at(
        &self,
        audio_ref: &str,
        created_at: DateTime<Utc>,
    ) -> Result<AnalysisRecord, PipelineError> {
        let span = tracing::info_span!("process_call", audio_ref, provider = self.provider.name());
        let _guard = span.enter();

        let raw = self.provider.transcribe(audio_ref)?;
        let mut transcript: Vec<TranscriptSegment> = raw
            .into_iter()
            .map(|s| TranscriptSegment {
                start_ms: s.start_ms,
                end_ms: s.end_ms,
                speaker_role: SpeakerRole::Unknown,
                speaker_label: s.speaker,
                text: s.text,
            })
            .collect();
        tracing::debug!(segments = transcript.len(), "transcription complete");

        assign_roles(&mut transcript, &self.config.diarization);

        let signals = extract_signals(&transcript, &self.config.signals);
        let entities = extract_entities(&transcript);
        let intent = classify_intent(&transcript, &self.config.signals);
        let summary = ScoringEngine::score(&signals, &self.config.scoring);

        let duration_ms = wav_duration_ms(Path::new(audio_ref)).unwrap_or(0);
        let record = RecordBuilder::new(audio_ref, self.provider.name(), created_at)
            .call_duration_ms(duration_ms)
            .transcript(transcript)
            .signals(signals)
            .entities(entities)
            .intent(intent)
            .scores(summary)
            .build()?;

        tracing::info!(
            call_id = %record.call_id,
            intent = %record.intent,
            composite = record.composite_score,
            "analysis complete"
        );
        Ok(record)
    }
}
