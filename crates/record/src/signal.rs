use serde::{Deserialize, Serialize};

/// Signal categories double as scoring categories: each category present in
/// a call's signal set maps onto at most one weighted score component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Disclosure,
    ProhibitedLanguage,
    TalkRatio,
    ResponseLatency,
    PaymentCommitment,
    DeadAir,
}

impl SignalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::Disclosure => "disclosure",
            SignalCategory::ProhibitedLanguage => "prohibited_language",
            SignalCategory::TalkRatio => "talk_ratio",
            SignalCategory::ResponseLatency => "response_latency",
            SignalCategory::PaymentCommitment => "payment_commitment",
            SignalCategory::DeadAir => "dead_air",
        }
    }
}

impl std::fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SignalValue {
    Flag(bool),
    Number(f64),
    Label(String),
}

impl SignalValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            SignalValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SignalValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// A single extracted observation about the call.
///
/// `evidence` holds indices into the owning record's transcript rather than
/// copies of the segments, so a signal is only meaningful next to the
/// transcript it was extracted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub category: SignalCategory,
    pub value: SignalValue,
    pub detail: Option<String>,
    pub evidence: Vec<usize>,
}
