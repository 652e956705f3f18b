use serde::{Deserialize, Serialize};

use crate::signal::SignalCategory;

/// One category's contribution to the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub category: SignalCategory,
    /// Raw rule output before mapping (a ratio, milliseconds, or 0/1).
    pub raw_value: f64,
    /// Weight actually applied, after renormalization over present categories.
    pub weight: f64,
    /// Category score on the 0..=100 scale.
    pub normalized_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Disclosure,
    ProhibitedLanguage,
    CompositeMinimum,
    Scorable,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Disclosure => "disclosure",
            FlagKind::ProhibitedLanguage => "prohibited_language",
            FlagKind::CompositeMinimum => "composite_minimum",
            FlagKind::Scorable => "scorable",
        }
    }
}

impl std::fmt::Display for FlagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/fail compliance verdicts, tracked independently of the weighted
/// composite so a high score can never mask a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFlag {
    pub flag: FlagKind,
    pub passed: bool,
}

/// Output bundle of the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub components: Vec<ScoreComponent>,
    pub composite_score: f64,
    pub flags: Vec<ComplianceFlag>,
}

impl ScoreSummary {
    pub fn flag(&self, kind: FlagKind) -> Option<&ComplianceFlag> {
        self.flags.iter().find(|f| f.flag == kind)
    }
}
