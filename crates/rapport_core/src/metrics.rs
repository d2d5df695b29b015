//! Relationship metrics: Trust (T), Comfort (K), Affection (A) and the
//! integrated relationship score (C).
//!
//! T, K and A each smooth toward a per-turn contribution with an *adaptive*
//! learning rate: severe negative behavior multiplies the rate so a single
//! bad turn collapses them at once, while good behavior accrues slowly.
//! C integrates them at a fixed rate with a velocity penalty, so the
//! relationship as a whole still resists whiplash.

use crate::config::RelationshipParams;
use crate::emotion::{calculate_alignment, EmotionVector};
use crate::features::{FeatureWeights, InteractionFeatures};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

// T: empathy and warmth build trust slowly, adversarial behavior breaks it.
const TRUST_DRIVE: FeatureWeights = FeatureWeights {
    empathy_expression: 0.5,
    positivity: 0.2,
    conflict: -0.5,
    disrespect: -1.5,
    pressure: -1.0,
    harassment: -2.0,
    ..FeatureWeights::ZERO
};
/// Bonus for the absence of conflict, applied as `w · (1 - conflict)`.
const TRUST_CALM_BONUS: f32 = 0.3;

const COMFORT_DRIVE: FeatureWeights = FeatureWeights {
    positivity: 0.4,
    empathy_expression: 0.3,
    ..FeatureWeights::ZERO
};
/// Weight of the "not pressured" share of comfort.
const COMFORT_EASE_WEIGHT: f32 = 0.3;
const COMFORT_PRESSURE: FeatureWeights = FeatureWeights {
    conflict: 2.0,
    pressure: 3.0,
    disrespect: 2.5,
    harassment: 4.0,
    ..FeatureWeights::ZERO
};
/// Question depth beyond this is intrusive.
const PROBING_THRESHOLD: f32 = 0.5;
const PROBING_WEIGHT: f32 = 1.5;
/// User self-disclosure beyond this feels like too much too soon.
const OVERSHARE_THRESHOLD: f32 = 0.6;
const OVERSHARE_WEIGHT: f32 = 1.2;

// Harassment at -3.0 is the single largest penalty in the system.
const AFFECTION_DRIVE: FeatureWeights = FeatureWeights {
    empathy_expression: 0.4,
    positivity: 0.3,
    humor: 0.2,
    conflict: -0.5,
    disrespect: -1.5,
    pressure: -1.2,
    harassment: -3.0,
    ..FeatureWeights::ZERO
};

/// Rate multipliers under severe negative behavior.
const TRUST_SEVERE_BOOST: f32 = 5.0;
const TRUST_NEGATIVE_BOOST: f32 = 3.0;
const TRUST_CONFLICT_BOOST: f32 = 2.0;
const COMFORT_SEVERE_BOOST: f32 = 3.0;
const AFFECTION_SEVERE_BOOST: f32 = 4.0;
/// Summed negative score above which trust drops at the "negative" rate.
const NEGATIVE_SCORE_THRESHOLD: f32 = 0.5;
/// Conflict above which trust drops at the "conflict" rate.
const CONFLICT_THRESHOLD: f32 = 0.3;

/// The four scalar relationship metrics, all in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMetrics {
    #[serde(rename = "T")]
    pub trust: f32,
    #[serde(rename = "K")]
    pub comfort: f32,
    #[serde(rename = "A")]
    pub affection: f32,
    /// Integrated relationship score; the primary driver of state transitions.
    #[serde(rename = "C")]
    pub score: f32,
}

impl Default for RelationshipMetrics {
    fn default() -> Self {
        Self::initial()
    }
}

impl RelationshipMetrics {
    /// A stranger: barely any trust, some discomfort, no affection.
    pub fn initial() -> Self {
        Self {
            trust: 0.05,
            comfort: 0.2,
            affection: 0.0,
            score: 0.15,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            trust: self.trust.clamp(0.0, 1.0),
            comfort: self.comfort.clamp(0.0, 1.0),
            affection: self.affection.clamp(0.0, 1.0),
            score: self.score.clamp(0.0, 1.0),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.trust.is_finite()
            && self.comfort.is_finite()
            && self.affection.is_finite()
            && self.score.is_finite()
    }

    /// C as a 0–100 percentage, the "affinity" shown to callers.
    pub fn affinity(&self) -> u8 {
        (self.score * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Source of the similarity term in the integrated score.
///
/// How user/bot similarity should really be computed is undecided, so the
/// default is a fixed value. Implementations must return a value in [0, 1].
pub trait SimilarityModel: Send + Sync + Debug {
    fn similarity(
        &self,
        user: &EmotionVector,
        bot: &EmotionVector,
        features: &InteractionFeatures,
    ) -> f32;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedSimilarity(pub f32);

impl Default for FixedSimilarity {
    fn default() -> Self {
        Self(0.5)
    }
}

impl SimilarityModel for FixedSimilarity {
    fn similarity(&self, _: &EmotionVector, _: &EmotionVector, _: &InteractionFeatures) -> f32 {
        self.0
    }
}

/// Smooth `current` toward a non-negative `contribution` at `rate`.
///
/// A negative contribution only stops growth; decay toward zero comes from
/// the (1 - rate) factor.
fn blend(current: f32, contribution: f32, rate: f32) -> f32 {
    let rate = rate.clamp(0.0, 1.0);
    ((1.0 - rate) * current + rate * contribution.max(0.0)).clamp(0.0, 1.0)
}

pub fn update_trust(current: f32, features: &InteractionFeatures, params: &RelationshipParams) -> f32 {
    let f = features.clamped();
    let contribution = TRUST_DRIVE.dot(&f) + TRUST_CALM_BONUS * (1.0 - f.conflict);

    let rate = if f.is_severe() {
        params.eta_t * TRUST_SEVERE_BOOST
    } else if f.negative_score() > NEGATIVE_SCORE_THRESHOLD {
        params.eta_t * TRUST_NEGATIVE_BOOST
    } else if f.conflict > CONFLICT_THRESHOLD {
        params.eta_t * TRUST_CONFLICT_BOOST
    } else {
        params.eta_t
    };

    blend(current, contribution, rate)
}

pub fn update_comfort(current: f32, features: &InteractionFeatures, params: &RelationshipParams) -> f32 {
    let f = features.clamped();
    let pressure = (f.question_depth - PROBING_THRESHOLD).max(0.0) * PROBING_WEIGHT
        + (f.self_disclosure - OVERSHARE_THRESHOLD).max(0.0) * OVERSHARE_WEIGHT
        + COMFORT_PRESSURE.dot(&f);
    let contribution = COMFORT_DRIVE.dot(&f) + (1.0 - pressure).max(0.0) * COMFORT_EASE_WEIGHT;

    let rate = if f.is_severe() {
        params.eta_k * COMFORT_SEVERE_BOOST
    } else {
        params.eta_k
    };

    blend(current, contribution, rate)
}

pub fn update_affection(current: f32, features: &InteractionFeatures, params: &RelationshipParams) -> f32 {
    let f = features.clamped();
    let contribution = AFFECTION_DRIVE.dot(&f);

    let rate = if f.is_severe() {
        params.eta_a * AFFECTION_SEVERE_BOOST
    } else {
        params.eta_a
    };

    blend(current, contribution, rate)
}

/// Inputs of the integrated score besides the previous C.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs {
    pub trust: f32,
    pub comfort: f32,
    pub affection: f32,
    pub alignment: f32,
    pub similarity: f32,
    /// User self-disclosure minus bot self-disclosure.
    pub disclosure_balance: f32,
}

/// Integrate C with the velocity penalty.
///
/// `C' = (1-ζ)·C + ζ·(w·inputs)`, then any step larger than `r_max` loses
/// `χ·(|ΔC| - r_max)`.
pub fn update_relationship_score(current: f32, inputs: &ScoreInputs, params: &RelationshipParams) -> f32 {
    let w = &params.weights;
    let integrated = w.alignment * inputs.alignment
        + w.trust * inputs.trust
        + w.affection * inputs.affection
        + w.comfort * inputs.comfort
        + w.similarity * inputs.similarity
        + w.disclosure_balance * (1.0 - inputs.disclosure_balance.abs()).max(0.0);

    let raw = (1.0 - params.zeta) * current + params.zeta * integrated;

    let delta = (raw - current).abs();
    let penalty = if delta > params.r_max {
        params.chi * (delta - params.r_max)
    } else {
        0.0
    };

    (raw - penalty).clamp(0.0, 1.0)
}

/// Run all four updaters for one turn.
///
/// T, K and A are updated first; C then integrates the *new* values.
pub fn update_relationship_metrics(
    metrics: &RelationshipMetrics,
    user: &EmotionVector,
    bot: &EmotionVector,
    features: &InteractionFeatures,
    params: &RelationshipParams,
    similarity: &dyn SimilarityModel,
) -> RelationshipMetrics {
    let f = features.clamped();
    let trust = update_trust(metrics.trust, &f, params);
    let comfort = update_comfort(metrics.comfort, &f, params);
    let affection = update_affection(metrics.affection, &f, params);

    let inputs = ScoreInputs {
        trust,
        comfort,
        affection,
        alignment: calculate_alignment(user, bot),
        similarity: similarity.similarity(user, bot, &f).clamp(0.0, 1.0),
        disclosure_balance: f.self_disclosure - params.bot_self_disclosure,
    };
    let score = update_relationship_score(metrics.score, &inputs, params);

    RelationshipMetrics {
        trust,
        comfort,
        affection,
        score,
    }
}
