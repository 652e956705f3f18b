use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use callscore_analysis::SignalConfig;
use callscore_asr::{ProviderKind, ProviderSettings};
use callscore_diarization::DiarizationConfig;
use callscore_scoring::{InvalidScoringConfig, ScoringConfig};

/// Configuration problems are fatal at startup, before any call is
/// processed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },
    #[error("invalid scoring configuration: {0}")]
    Scoring(#[from] InvalidScoringConfig),
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// The one configuration value threaded through every stage.
///
/// Stage sub-configs live in their stage crates and are flattened here, so
/// the JSON file stays a single flat object:
///
/// ```json
/// {
///   "use_api": "mock",
///   "disclosure_phrases": ["this call is recorded"],
///   "category_weights": {"disclosure": 0.5, "talk_ratio": 0.5}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub use_api: ProviderKind,
    #[serde(flatten)]
    pub provider: ProviderSettings,
    #[serde(flatten)]
    pub diarization: DiarizationConfig,
    #[serde(flatten)]
    pub signals: SignalConfig,
    #[serde(flatten)]
    pub scoring: ScoringConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            use_api: ProviderKind::Mock,
            provider: ProviderSettings::default(),
            diarization: DiarizationConfig::default(),
            signals: SignalConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&body).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolution chain: explicit path, then `./callscore.json`, then the
    /// per-user config directory, then built-in defaults. Environment
    /// overrides apply on top of whichever source won.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = explicit {
            Self::load(path)?
        } else if Path::new("callscore.json").is_file() {
            Self::load(Path::new("callscore.json"))?
        } else if let Some(path) = user_config_path().filter(|p| p.is_file()) {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = env::var("CALLSCORE_USE_API") {
            self.use_api = value.parse().map_err(|message| ConfigError::Env {
                var: "CALLSCORE_USE_API",
                message,
            })?;
        }
        if let Ok(value) = env::var("CALLSCORE_WHISPER_ENDPOINT") {
            self.provider.whisper_endpoint = value;
        }
        if let Ok(value) = env::var("CALLSCORE_API_KEY") {
            self.provider.api_key = Some(value);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        if self.provider.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "http_timeout_secs",
                message: "timeout must be at least 1 second".to_string(),
            });
        }
        if self.diarization.silence_gap_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "silence_gap_ms",
                message: "gap threshold must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("callscore").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscore_record::SignalCategory;

    #[test]
    fn default_config_validates() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn flat_json_reaches_stage_configs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("callscore.json");
        std::fs::write(
            &path,
            r#"{
                "use_api": "transcript_file",
                "silence_gap_ms": 1500,
                "prohibited_lexicon": ["garnish"],
                "min_composite": 70.0,
                "category_weights": {"disclosure": 0.5, "prohibited_language": 0.5}
            }"#,
        )
        .unwrap();

        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config.use_api, ProviderKind::TranscriptFile);
        assert_eq!(config.diarization.silence_gap_ms, 1500);
        assert_eq!(config.signals.prohibited_lexicon, vec!["garnish"]);
        assert_eq!(config.scoring.min_composite, 70.0);
        assert_eq!(
            config.scoring.category_weights[&SignalCategory::Disclosure],
            0.5
        );
        config.validate().unwrap();
    }

    #[test]
    fn unreadable_weights_fail_validation() {
        let mut config = AnalysisConfig::default();
        config
            .scoring
            .category_weights
            .insert(SignalCategory::Disclosure, 0.9);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Scoring(InvalidScoringConfig::WeightSum(_)))
        ));
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = AnalysisConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = AnalysisConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
