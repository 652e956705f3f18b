//! Deterministic scoring over extracted signals.
//!
//! Each signal category maps onto a 0..=100 component score; the composite
//! is the weighted sum over the categories that were actually observed, with
//! weights renormalized so missing data never drags the composite down.
//! Compliance flags are tracked separately from the composite: a perfect
//! score cannot hide a violation and a violation cannot be averaged away.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use callscore_record::{
    ComplianceFlag, FlagKind, ScoreComponent, ScoreSummary, Signal, SignalCategory,
};

#[derive(Debug, thiserror::Error)]
pub enum InvalidScoringConfig {
    #[error("category weights must sum to 1.0, got {0}")]
    WeightSum(f64),
    #[error("weight for {category} must be a finite, non-negative number")]
    BadWeight { category: SignalCategory },
    #[error("{name} range is inverted or degenerate ({low}..{high})")]
    BadRange {
        name: &'static str,
        low: f64,
        high: f64,
    },
    #[error("talk ratio range must lie within 0.0..=1.0")]
    RatioOutOfBounds,
    #[error("min_composite must lie within 0..=100, got {0}")]
    MinCompositeOutOfBounds(f64),
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights and ideal ranges for the composite. `category_weights` is a
/// `BTreeMap` so iteration order, and with it component order, is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub category_weights: BTreeMap<SignalCategory, f64>,
    /// Ideal agent share of attributed speaking time.
    pub talk_ratio_ideal_range: (f64, f64),
    /// Ideal mean response latency, in milliseconds.
    pub latency_ideal_range: (u64, u64),
    /// Acceptable longest silence, in milliseconds.
    pub dead_air_ideal_range: (u64, u64),
    /// Composite below this trips the composite_minimum flag.
    pub min_composite: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let category_weights = BTreeMap::from([
            (SignalCategory::Disclosure, 0.25),
            (SignalCategory::ProhibitedLanguage, 0.25),
            (SignalCategory::TalkRatio, 0.15),
            (SignalCategory::ResponseLatency, 0.10),
            (SignalCategory::PaymentCommitment, 0.15),
            (SignalCategory::DeadAir, 0.10),
        ]);
        Self {
            category_weights,
            talk_ratio_ideal_range: (0.35, 0.65),
            latency_ideal_range: (0, 2000),
            dead_air_ideal_range: (0, 3000),
            min_composite: 60.0,
        }
    }
}

impl ScoringConfig {
    /// Rejects configurations the engine cannot score against. Called once
    /// at startup; a failure here is fatal before any call is processed.
    pub fn validate(&self) -> Result<(), InvalidScoringConfig> {
        let mut sum = 0.0;
        for (&category, &weight) in &self.category_weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(InvalidScoringConfig::BadWeight { category });
            }
            sum += weight;
        }
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(InvalidScoringConfig::WeightSum(sum));
        }

        let (ratio_low, ratio_high) = self.talk_ratio_ideal_range;
        if !ratio_low.is_finite() || !ratio_high.is_finite() || ratio_low >= ratio_high {
            return Err(InvalidScoringConfig::BadRange {
                name: "talk_ratio_ideal_range",
                low: ratio_low,
                high: ratio_high,
            });
        }
        if ratio_low < 0.0 || ratio_high > 1.0 {
            return Err(InvalidScoringConfig::RatioOutOfBounds);
        }

        for (name, (low, high)) in [
            ("latency_ideal_range", self.latency_ideal_range),
            ("dead_air_ideal_range", self.dead_air_ideal_range),
        ] {
            if low >= high {
                return Err(InvalidScoringConfig::BadRange {
                    name,
                    low: low as f64,
                    high: high as f64,
                });
            }
        }

        if !self.min_composite.is_finite() || !(0.0..=100.0).contains(&self.min_composite) {
            return Err(InvalidScoringConfig::MinCompositeOutOfBounds(
                self.min_composite,
            ));
        }
        Ok(())
    }
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Scores one call's signal set. Pure: identical signals and config
    /// always produce an identical summary.
    pub fn score(signals: &[Signal], config: &ScoringConfig) -> ScoreSummary {
        let mut present: Vec<(SignalCategory, f64, f64, f64)> = Vec::new();

        for (&category, &weight) in &config.category_weights {
            if weight <= 0.0 {
                continue;
            }
            let category_signals: Vec<&Signal> =
                signals.iter().filter(|s| s.category == category).collect();
            if category_signals.is_empty() {
                continue;
            }
            if let Some((raw_value, normalized_value)) =
                evaluate_category(category, &category_signals, config)
            {
                present.push((category, weight, raw_value, normalized_value));
            }
        }

        let weight_sum: f64 = present.iter().map(|(_, weight, _, _)| weight).sum();
        let components: Vec<ScoreComponent> = present
            .iter()
            .map(|&(category, weight, raw_value, normalized_value)| ScoreComponent {
                category,
                raw_value,
                weight: weight / weight_sum,
                normalized_value,
            })
            .collect();

        let composite_score = components
            .iter()
            .map(|c| c.weight * c.normalized_value)
            .sum::<f64>()
            .clamp(0.0, 100.0);

        let flags = compliance_flags(signals, &components, composite_score, config);
        tracing::debug!(
            components = components.len(),
            composite = composite_score,
            "scored call"
        );

        ScoreSummary {
            components,
            composite_score,
            flags,
        }
    }
}

/// Raw value and 0..=100 score for one category. `None` when the category's
/// signals carry no usable value for it.
fn evaluate_category(
    category: SignalCategory,
    signals: &[&Signal],
    config: &ScoringConfig,
) -> Option<(f64, f64)> {
    match category {
        SignalCategory::Disclosure => {
            let given = signals.iter().any(|s| s.value.as_flag() == Some(true));
            Some((bool_raw(given), if given { 100.0 } else { 0.0 }))
        }
        SignalCategory::ProhibitedLanguage => {
            let occurrences = signals
                .iter()
                .filter(|s| s.value.as_flag() == Some(true))
                .count();
            Some((
                occurrences as f64,
                if occurrences > 0 { 0.0 } else { 100.0 },
            ))
        }
        SignalCategory::PaymentCommitment => {
            let committed = signals.iter().any(|s| s.value.as_flag() == Some(true));
            Some((bool_raw(committed), if committed { 100.0 } else { 0.0 }))
        }
        SignalCategory::TalkRatio => {
            let ratio = first_number(signals)?;
            let (low, high) = config.talk_ratio_ideal_range;
            Some((ratio, band_score(ratio, low, high)))
        }
        SignalCategory::ResponseLatency => {
            let latency = first_number(signals)?;
            let (low, high) = config.latency_ideal_range;
            Some((latency, band_score(latency, low as f64, high as f64)))
        }
        SignalCategory::DeadAir => {
            let silence = first_number(signals)?;
            let (low, high) = config.dead_air_ideal_range;
            Some((silence, band_score(silence, low as f64, high as f64)))
        }
    }
}

fn bool_raw(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn first_number(signals: &[&Signal]) -> Option<f64> {
    signals.iter().find_map(|s| s.value.as_number())
}

/// Bounded linear mapping against an ideal range: 100 inside, decaying
/// linearly to 0 one band-width past either edge.
fn band_score(value: f64, low: f64, high: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let width = high - low;
    let distance = if value < low {
        low - value
    } else if value > high {
        value - high
    } else {
        return 100.0;
    };
    (100.0 * (1.0 - distance / width)).clamp(0.0, 100.0)
}

fn compliance_flags(
    signals: &[Signal],
    components: &[ScoreComponent],
    composite_score: f64,
    config: &ScoringConfig,
) -> Vec<ComplianceFlag> {
    let mut flags = Vec::new();

    let disclosure: Vec<&Signal> = signals
        .iter()
        .filter(|s| s.category == SignalCategory::Disclosure)
        .collect();
    if !disclosure.is_empty() {
        flags.push(ComplianceFlag {
            flag: FlagKind::Disclosure,
            passed: disclosure.iter().any(|s| s.value.as_flag() == Some(true)),
        });
    }

    let prohibited: Vec<&Signal> = signals
        .iter()
        .filter(|s| s.category == SignalCategory::ProhibitedLanguage)
        .collect();
    if !prohibited.is_empty() {
        flags.push(ComplianceFlag {
            flag: FlagKind::ProhibitedLanguage,
            passed: !prohibited.iter().any(|s| s.value.as_flag() == Some(true)),
        });
    }

    if !components.is_empty() {
        flags.push(ComplianceFlag {
            flag: FlagKind::CompositeMinimum,
            passed: composite_score >= config.min_composite,
        });
    }

    flags.push(ComplianceFlag {
        flag: FlagKind::Scorable,
        passed: !components.is_empty(),
    });

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscore_record::SignalValue;

    fn flag_signal(category: SignalCategory, value: bool) -> Signal {
        Signal {
            name: format!("{category}_test"),
            category,
            value: SignalValue::Flag(value),
            detail: None,
            evidence: Vec::new(),
        }
    }

    fn number_signal(category: SignalCategory, value: f64) -> Signal {
        Signal {
            name: format!("{category}_test"),
            category,
            value: SignalValue::Number(value),
            detail: None,
            evidence: Vec::new(),
        }
    }

    fn full_signal_set() -> Vec<Signal> {
        vec![
            flag_signal(SignalCategory::Disclosure, true),
            flag_signal(SignalCategory::ProhibitedLanguage, false),
            number_signal(SignalCategory::TalkRatio, 0.5),
            number_signal(SignalCategory::ResponseLatency, 800.0),
            flag_signal(SignalCategory::PaymentCommitment, true),
            number_signal(SignalCategory::DeadAir, 1200.0),
        ]
    }

    mod config_validation {
        use super::*;

        #[test]
        fn default_config_is_valid() {
            assert!(ScoringConfig::default().validate().is_ok());
        }

        #[test]
        fn weights_must_sum_to_one() {
            let mut config = ScoringConfig::default();
            config
                .category_weights
                .insert(SignalCategory::Disclosure, 0.50);
            assert!(matches!(
                config.validate(),
                Err(InvalidScoringConfig::WeightSum(_))
            ));
        }

        #[test]
        fn negative_weight_is_rejected() {
            let mut config = ScoringConfig::default();
            config
                .category_weights
                .insert(SignalCategory::DeadAir, -0.1);
            assert!(matches!(
                config.validate(),
                Err(InvalidScoringConfig::BadWeight { .. })
            ));
        }

        #[test]
        fn inverted_ranges_are_rejected() {
            let config = ScoringConfig {
                latency_ideal_range: (3000, 1000),
                ..ScoringConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(InvalidScoringConfig::BadRange { .. })
            ));
        }

        #[test]
        fn talk_ratio_range_must_stay_in_unit_interval() {
            let config = ScoringConfig {
                talk_ratio_ideal_range: (0.4, 1.2),
                ..ScoringConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(InvalidScoringConfig::RatioOutOfBounds)
            ));
        }

        #[test]
        fn min_composite_must_stay_in_score_range() {
            let config = ScoringConfig {
                min_composite: 120.0,
                ..ScoringConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(InvalidScoringConfig::MinCompositeOutOfBounds(_))
            ));
        }
    }

    mod band_mapping {
        use super::*;

        #[test]
        fn inside_the_range_scores_full() {
            assert_eq!(band_score(0.5, 0.35, 0.65), 100.0);
            assert_eq!(band_score(0.35, 0.35, 0.65), 100.0);
            assert_eq!(band_score(0.65, 0.35, 0.65), 100.0);
        }

        #[test]
        fn decays_linearly_outside() {
            // width 0.30, half a width below the lower edge
            assert!((band_score(0.20, 0.35, 0.65) - 50.0).abs() < 1e-9);
            // a full width above the upper edge
            assert!(band_score(0.95, 0.35, 0.65).abs() < 1e-9);
            // beyond a full width clamps at zero
            assert!(band_score(2.0, 0.35, 0.65).abs() < 1e-9);
        }

        #[test]
        fn non_finite_values_score_zero() {
            assert_eq!(band_score(f64::NAN, 0.0, 1.0), 0.0);
            assert_eq!(band_score(f64::INFINITY, 0.0, 1.0), 0.0);
        }
    }

    mod scoring {
        use super::*;

        #[test]
        fn full_set_produces_one_component_per_category() {
            let summary = ScoringEngine::score(&full_signal_set(), &ScoringConfig::default());
            assert_eq!(summary.components.len(), 6);
            let weight_sum: f64 = summary.components.iter().map(|c| c.weight).sum();
            assert!((weight_sum - 1.0).abs() < 1e-9);
            assert!((summary.composite_score - 100.0).abs() < 1e-9);
        }

        #[test]
        fn composite_stays_in_bounds() {
            let signals = vec![
                flag_signal(SignalCategory::Disclosure, false),
                flag_signal(SignalCategory::ProhibitedLanguage, true),
                number_signal(SignalCategory::TalkRatio, 99.0),
                number_signal(SignalCategory::ResponseLatency, 1e12),
                flag_signal(SignalCategory::PaymentCommitment, false),
                number_signal(SignalCategory::DeadAir, 1e12),
            ];
            let summary = ScoringEngine::score(&signals, &ScoringConfig::default());
            assert_eq!(summary.composite_score, 0.0);

            let summary = ScoringEngine::score(&full_signal_set(), &ScoringConfig::default());
            assert!(summary.composite_score <= 100.0);
        }

        #[test]
        fn absent_category_renormalizes_weights() {
            let mut signals = full_signal_set();
            signals.retain(|s| s.category != SignalCategory::ResponseLatency);

            let summary = ScoringEngine::score(&signals, &ScoringConfig::default());
            assert_eq!(summary.components.len(), 5);

            let weight_sum: f64 = summary.components.iter().map(|c| c.weight).sum();
            assert!((weight_sum - 1.0).abs() < 1e-9);

            // 0.25 configured weight over the 0.90 still present
            let disclosure = summary
                .components
                .iter()
                .find(|c| c.category == SignalCategory::Disclosure)
                .unwrap();
            assert!((disclosure.weight - 0.25 / 0.90).abs() < 1e-9);
        }

        #[test]
        fn renormalization_does_not_depress_perfect_calls() {
            let mut signals = full_signal_set();
            signals.retain(|s| {
                s.category != SignalCategory::ResponseLatency
                    && s.category != SignalCategory::DeadAir
            });
            let summary = ScoringEngine::score(&signals, &ScoringConfig::default());
            assert_eq!(summary.composite_score, 100.0);
        }

        #[test]
        fn empty_signal_set_is_unscorable_but_flagged() {
            let summary = ScoringEngine::score(&[], &ScoringConfig::default());
            assert!(summary.components.is_empty());
            assert_eq!(summary.composite_score, 0.0);
            assert_eq!(summary.flags.len(), 1);
            let scorable = summary.flag(FlagKind::Scorable).unwrap();
            assert!(!scorable.passed);
        }

        #[test]
        fn prohibited_occurrence_zeroes_the_category_and_fails_the_flag() {
            let signals = vec![
                flag_signal(SignalCategory::Disclosure, true),
                flag_signal(SignalCategory::ProhibitedLanguage, true),
                flag_signal(SignalCategory::ProhibitedLanguage, true),
                flag_signal(SignalCategory::PaymentCommitment, true),
            ];
            let summary = ScoringEngine::score(&signals, &ScoringConfig::default());

            let prohibited = summary
                .components
                .iter()
                .find(|c| c.category == SignalCategory::ProhibitedLanguage)
                .unwrap();
            assert_eq!(prohibited.normalized_value, 0.0);
            assert_eq!(prohibited.raw_value, 2.0);

            let flag = summary.flag(FlagKind::ProhibitedLanguage).unwrap();
            assert!(!flag.passed);
            // violation flag is independent of the composite
            assert!(summary.composite_score > 0.0);
        }

        #[test]
        fn composite_minimum_flag_tracks_threshold() {
            let summary = ScoringEngine::score(&full_signal_set(), &ScoringConfig::default());
            assert!(summary.flag(FlagKind::CompositeMinimum).unwrap().passed);

            let signals = vec![flag_signal(SignalCategory::Disclosure, false)];
            let summary = ScoringEngine::score(&signals, &ScoringConfig::default());
            assert!(!summary.flag(FlagKind::CompositeMinimum).unwrap().passed);
        }

        #[test]
        fn zero_weight_category_never_produces_a_component() {
            let mut config = ScoringConfig::default();
            config.category_weights.insert(SignalCategory::DeadAir, 0.0);
            config
                .category_weights
                .insert(SignalCategory::ResponseLatency, 0.20);
            config.validate().unwrap();

            let summary = ScoringEngine::score(&full_signal_set(), &config);
            assert!(summary
                .components
                .iter()
                .all(|c| c.category != SignalCategory::DeadAir));
        }

        #[test]
        fn scoring_is_deterministic() {
            let signals = full_signal_set();
            let config = ScoringConfig::default();
            assert_eq!(
                ScoringEngine::score(&signals, &config),
                ScoringEngine::score(&signals, &config)
            );
        }
    }
}
