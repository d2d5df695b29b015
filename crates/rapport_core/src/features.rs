//! Per-turn observation produced by the external language-analysis step.
//!
//! The core never parses text. It only consumes the structured signals below,
//! all of which are expected in [0, 1] and are clamped on entry.

use crate::emotion::EmotionVector;
use crate::error::{ensure_finite, Result};
use serde::{Deserialize, Serialize};

/// Harassment above this level counts as severe negative behavior.
pub const SEVERE_HARASSMENT: f32 = 0.3;
/// Disrespect above this level counts as severe negative behavior.
pub const SEVERE_DISRESPECT: f32 = 0.5;

/// Interaction signals extracted from a single user message.
///
/// `disrespect`, `pressure` and `harassment` are adversarial signals. Every
/// downstream updater weights them so that they dominate the positive terms.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionFeatures {
    pub question_depth: f32,
    pub empathy_expression: f32,
    pub self_disclosure: f32,
    pub humor: f32,
    pub positivity: f32,
    pub conflict: f32,
    pub disrespect: f32,
    pub pressure: f32,
    pub harassment: f32,
}

impl InteractionFeatures {
    /// Fallback features used when the analysis collaborator fails:
    /// mid-range engagement, mild positivity, no adversarial behavior.
    pub fn neutral() -> Self {
        Self {
            question_depth: 0.3,
            empathy_expression: 0.3,
            self_disclosure: 0.3,
            humor: 0.2,
            positivity: 0.5,
            conflict: 0.1,
            disrespect: 0.0,
            pressure: 0.0,
            harassment: 0.0,
        }
    }

    /// Clamp every signal into [0, 1].
    pub fn clamped(&self) -> Self {
        Self {
            question_depth: self.question_depth.clamp(0.0, 1.0),
            empathy_expression: self.empathy_expression.clamp(0.0, 1.0),
            self_disclosure: self.self_disclosure.clamp(0.0, 1.0),
            humor: self.humor.clamp(0.0, 1.0),
            positivity: self.positivity.clamp(0.0, 1.0),
            conflict: self.conflict.clamp(0.0, 1.0),
            disrespect: self.disrespect.clamp(0.0, 1.0),
            pressure: self.pressure.clamp(0.0, 1.0),
            harassment: self.harassment.clamp(0.0, 1.0),
        }
    }

    /// Severe negative behavior: the condition that multiplies the per-metric
    /// learning rates so trust, comfort and affection collapse immediately.
    pub fn is_severe(&self) -> bool {
        self.harassment > SEVERE_HARASSMENT || self.disrespect > SEVERE_DISRESPECT
    }

    /// Summed adversarial score (conflict + disrespect + pressure + harassment).
    pub fn negative_score(&self) -> f32 {
        self.conflict + self.disrespect + self.pressure + self.harassment
    }

    fn named(&self) -> [(&'static str, f32); 9] {
        [
            ("features.questionDepth", self.question_depth),
            ("features.empathyExpression", self.empathy_expression),
            ("features.selfDisclosure", self.self_disclosure),
            ("features.humor", self.humor),
            ("features.positivity", self.positivity),
            ("features.conflict", self.conflict),
            ("features.disrespect", self.disrespect),
            ("features.pressure", self.pressure),
            ("features.harassment", self.harassment),
        ]
    }

    pub(crate) fn ensure_finite(&self) -> Result<()> {
        for (field, value) in self.named() {
            ensure_finite(field, value)?;
        }
        Ok(())
    }
}

/// Linear weights over the nine interaction signals.
///
/// Weight tables are `const` so every coefficient sits in one auditable place.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureWeights {
    pub question_depth: f32,
    pub empathy_expression: f32,
    pub self_disclosure: f32,
    pub humor: f32,
    pub positivity: f32,
    pub conflict: f32,
    pub disrespect: f32,
    pub pressure: f32,
    pub harassment: f32,
}

impl FeatureWeights {
    pub const ZERO: Self = Self {
        question_depth: 0.0,
        empathy_expression: 0.0,
        self_disclosure: 0.0,
        humor: 0.0,
        positivity: 0.0,
        conflict: 0.0,
        disrespect: 0.0,
        pressure: 0.0,
        harassment: 0.0,
    };

    /// Weighted sum of the features.
    pub fn dot(&self, f: &InteractionFeatures) -> f32 {
        self.question_depth * f.question_depth
            + self.empathy_expression * f.empathy_expression
            + self.self_disclosure * f.self_disclosure
            + self.humor * f.humor
            + self.positivity * f.positivity
            + self.conflict * f.conflict
            + self.disrespect * f.disrespect
            + self.pressure * f.pressure
            + self.harassment * f.harassment
    }
}

/// Everything the analysis collaborator reports about one user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Instantaneous estimate of the user's affect for this message.
    pub user_emotion: EmotionVector,
    #[serde(default)]
    pub features: InteractionFeatures,
    /// New facts about the user, appended to memory.
    #[serde(default)]
    pub detected_facts: Vec<String>,
}

impl Observation {
    pub fn new(user_emotion: EmotionVector, features: InteractionFeatures) -> Self {
        Self {
            user_emotion,
            features,
            detected_facts: Vec::new(),
        }
    }

    /// Substitute observation for a failed or missing analysis, so the
    /// relationship keeps drifting gently instead of freezing.
    pub fn neutral() -> Self {
        Self::new(
            EmotionVector {
                valence: 0.0,
                arousal: 0.0,
                trust: 0.5,
                attraction: 0.3,
            },
            InteractionFeatures::neutral(),
        )
    }

    pub fn with_facts<I, S>(mut self, facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.detected_facts.extend(facts.into_iter().map(Into::into));
        self
    }

    /// Reject NaN/∞ anywhere in the observation.
    pub fn validate(&self) -> Result<()> {
        self.user_emotion.ensure_finite([
            "userEmotion.valence",
            "userEmotion.arousal",
            "userEmotion.trust",
            "userEmotion.attraction",
        ])?;
        self.features.ensure_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_bounds_every_field() {
        let f = InteractionFeatures {
            question_depth: 2.0,
            empathy_expression: -1.0,
            harassment: 7.5,
            ..Default::default()
        }
        .clamped();
        assert_eq!(f.question_depth, 1.0);
        assert_eq!(f.empathy_expression, 0.0);
        assert_eq!(f.harassment, 1.0);
    }

    #[test]
    fn test_severity() {
        let mut f = InteractionFeatures::default();
        assert!(!f.is_severe());
        f.harassment = 0.31;
        assert!(f.is_severe());
        f.harassment = 0.3;
        assert!(!f.is_severe(), "threshold is exclusive");
        f.disrespect = 0.6;
        assert!(f.is_severe());
    }

    #[test]
    fn test_negative_score() {
        let f = InteractionFeatures {
            conflict: 0.1,
            disrespect: 0.2,
            pressure: 0.3,
            harassment: 0.4,
            positivity: 1.0,
            ..Default::default()
        };
        assert!((f.negative_score() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weights_dot() {
        let w = FeatureWeights {
            positivity: 0.5,
            harassment: -2.0,
            ..FeatureWeights::ZERO
        };
        let f = InteractionFeatures {
            positivity: 1.0,
            harassment: 0.5,
            humor: 1.0,
            ..Default::default()
        };
        assert!((w.dot(&f) - (-0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_observation_validate_rejects_nan() {
        let mut obs = Observation::neutral();
        assert!(obs.validate().is_ok());
        obs.features.pressure = f32::NAN;
        let err = obs.validate().unwrap_err();
        assert!(err.to_string().contains("features.pressure"));
    }

    #[test]
    fn test_observation_json_camel_case() {
        let json = r#"{
            "userEmotion": {"valence": 0.2, "arousal": 0.1, "trust": 0.4, "attraction": 0.1},
            "features": {"empathyExpression": 0.4, "positivity": 0.5},
            "detectedFacts": ["likes cats"]
        }"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert!((obs.features.empathy_expression - 0.4).abs() < 1e-6);
        assert_eq!(obs.features.harassment, 0.0);
        assert_eq!(obs.detected_facts, vec!["likes cats".to_string()]);
    }

    #[test]
    fn test_observation_missing_features_default_to_zero() {
        let json = r#"{"userEmotion": {"valence": 0.0, "arousal": 0.0, "trust": 0.0, "attraction": 0.0}}"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.features, InteractionFeatures::default());
        assert!(obs.detected_facts.is_empty());
    }
}
