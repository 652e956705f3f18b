//! Core data model for call analysis.
//!
//! Everything the pipeline produces ends up in an [`AnalysisRecord`]: the
//! role-attributed transcript, the extracted signals and entities, the score
//! breakdown, and the compliance flags. Records are immutable once built and
//! carry a `schema_version` so downstream consumers (reports, the dashboard)
//! can evolve independently. Schema changes are additive only.

mod record;
mod score;
mod segment;
mod signal;

pub use record::{
    call_id_from_ref, AnalysisRecord, CallIntent, ExtractedEntities, IncompleteRecordError,
    RecordBuilder, SCHEMA_VERSION,
};
pub use score::{ComplianceFlag, FlagKind, ScoreComponent, ScoreSummary};
pub use segment::{SpeakerRole, TranscriptSegment};
pub use signal::{Signal, SignalCategory, SignalValue};

use uuid::Uuid;

/// Repository trait for analysis record persistence.
/// Implemented by the storage layer, allowing the domain to remain decoupled.
pub trait RecordRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save(&self, record: &AnalysisRecord) -> Result<(), Self::Error>;
    fn get(&self, record_id: &Uuid) -> Result<AnalysisRecord, Self::Error>;
    fn latest(&self, limit: usize) -> Result<Vec<AnalysisRecord>, Self::Error>;
    fn delete(&self, record_id: &Uuid) -> Result<(), Self::Error>;
}
