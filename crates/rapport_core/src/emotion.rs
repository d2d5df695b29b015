//! Emotion dynamics: a four-dimensional affect model for both parties.
//!
//! Valence and arousal are bipolar in [-1, 1] (circumplex plane), trust and
//! attraction are unipolar in [0, 1]. Two vectors exist per session: a
//! smoothed estimate of the user's affect and the bot's own affect.
//!
//! The bot update is
//!
//! ```text
//! e_bot' = (1 - α)·e_bot + sync(e_user - e_bot) + Γ·g(features, memory) + ξ
//! ```
//!
//! where `sync` is scaled by a guard factor max(0.3, C), so the persona
//! resists emotional contagion while the relationship is still cold.

use crate::config::EmotionParams;
use crate::error::{ensure_finite, Result};
use crate::features::{FeatureWeights, InteractionFeatures};
use crate::noise::NoiseSource;
use serde::{Deserialize, Serialize};

/// Largest possible Euclidean distance between two clamped vectors,
/// used to normalize alignment.
pub const MAX_DISTANCE: f32 = 2.0;

/// Self-disclosure above this level starts to erode the bot's trust.
const OVERSHARE_THRESHOLD: f32 = 0.5;
/// Weight of the memory score in the bot's trust drive.
const MEMORY_TRUST_WEIGHT: f32 = 0.2;
/// Penalty per unit of oversharing in the bot's trust drive.
const OVERSHARE_TRUST_PENALTY: f32 = 0.3;

const VALENCE_DRIVE: FeatureWeights = FeatureWeights {
    positivity: 0.6,
    conflict: -1.2,
    disrespect: -2.0,
    harassment: -3.0,
    ..FeatureWeights::ZERO
};

// Disrespect and harassment raise tension, not calm.
const AROUSAL_DRIVE: FeatureWeights = FeatureWeights {
    question_depth: 0.3,
    humor: 0.3,
    disrespect: 1.5,
    harassment: 2.0,
    ..FeatureWeights::ZERO
};

const TRUST_DRIVE: FeatureWeights = FeatureWeights {
    empathy_expression: 0.8,
    disrespect: -2.5,
    pressure: -1.5,
    harassment: -3.0,
    ..FeatureWeights::ZERO
};

const ATTRACTION_DRIVE: FeatureWeights = FeatureWeights {
    empathy_expression: 0.3,
    humor: 0.3,
    positivity: 0.2,
    conflict: -0.5,
    disrespect: -2.0,
    pressure: -1.5,
    harassment: -4.0,
    ..FeatureWeights::ZERO
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionVector {
    /// Positive/negative (-1.0 to 1.0)
    pub valence: f32,
    /// Activated/relaxed (-1.0 to 1.0)
    pub arousal: f32,
    /// Trust (0.0 to 1.0)
    pub trust: f32,
    /// Attraction (0.0 to 1.0)
    pub attraction: f32,
}

impl Default for EmotionVector {
    fn default() -> Self {
        Self::neutral()
    }
}

impl EmotionVector {
    pub fn new(valence: f32, arousal: f32, trust: f32, attraction: f32) -> Self {
        Self {
            valence,
            arousal,
            trust,
            attraction,
        }
        .clamped()
    }

    pub fn neutral() -> Self {
        Self {
            valence: 0.0,
            arousal: 0.0,
            trust: 0.0,
            attraction: 0.0,
        }
    }

    /// Session-start affect: guarded, slightly negative, no attraction.
    pub fn initial() -> Self {
        Self {
            valence: -0.1,
            arousal: -0.2,
            trust: 0.05,
            attraction: 0.0,
        }
    }

    /// Clamp every dimension into its documented range.
    pub fn clamped(self) -> Self {
        Self {
            valence: self.valence.clamp(-1.0, 1.0),
            arousal: self.arousal.clamp(-1.0, 1.0),
            trust: self.trust.clamp(0.0, 1.0),
            attraction: self.attraction.clamp(0.0, 1.0),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.valence.is_finite()
            && self.arousal.is_finite()
            && self.trust.is_finite()
            && self.attraction.is_finite()
    }

    /// Euclidean distance in the four-dimensional affect space.
    pub fn distance(&self, other: &EmotionVector) -> f32 {
        ((self.valence - other.valence).powi(2)
            + (self.arousal - other.arousal).powi(2)
            + (self.trust - other.trust).powi(2)
            + (self.attraction - other.attraction).powi(2))
        .sqrt()
    }

    /// Interpolate toward `other`; `t` is clamped to [0, 1].
    pub fn lerp(&self, other: &EmotionVector, t: f32) -> EmotionVector {
        let t = t.clamp(0.0, 1.0);
        EmotionVector {
            valence: self.valence + (other.valence - self.valence) * t,
            arousal: self.arousal + (other.arousal - self.arousal) * t,
            trust: self.trust + (other.trust - self.trust) * t,
            attraction: self.attraction + (other.attraction - self.attraction) * t,
        }
    }

    /// Reject NaN/∞; `names` are the field paths reported in the error, in
    /// valence, arousal, trust, attraction order.
    pub(crate) fn ensure_finite(&self, names: [&'static str; 4]) -> Result<()> {
        let values = [self.valence, self.arousal, self.trust, self.attraction];
        for (field, value) in names.into_iter().zip(values) {
            ensure_finite(field, value)?;
        }
        Ok(())
    }
}

/// Exponential smoothing of the user-affect estimate:
/// `(1 - λ)·previous + λ·observed`.
pub fn update_user_emotion(
    previous: &EmotionVector,
    observed: &EmotionVector,
    params: &EmotionParams,
) -> EmotionVector {
    previous
        .lerp(&observed.clamped(), params.lambda_u)
        .clamped()
}

/// Advance the bot's affect by one turn.
///
/// `memory_score` in [0, 1] rewards remembered user facts in the trust drive;
/// `current_c` is the relationship score *before* this turn's metric update.
pub fn update_bot_emotion(
    bot: &EmotionVector,
    user: &EmotionVector,
    features: &InteractionFeatures,
    memory_score: f32,
    current_c: f32,
    params: &EmotionParams,
    noise: &dyn NoiseSource,
) -> EmotionVector {
    let f = features.clamped();
    let memory_score = memory_score.clamp(0.0, 1.0);

    // === Synchronization ===
    // The colder the relationship, the less the bot mirrors the user.
    let guard = params.guard_floor.max(current_c);
    let beta = params.beta * guard;
    let valence_gain = if user.valence > 0.0 {
        params.sync.positive_valence
    } else {
        params.sync.negative_valence
    };
    let sync = EmotionVector {
        valence: beta * (user.valence - bot.valence) * valence_gain,
        arousal: beta * (user.arousal - bot.arousal) * params.sync.arousal,
        trust: beta * (user.trust - bot.trust) * params.sync.trust,
        attraction: beta * (user.attraction - bot.attraction) * params.sync.attraction,
    };

    // === Interaction contribution ===
    let overshare = (f.self_disclosure - OVERSHARE_THRESHOLD).max(0.0);
    let drive = EmotionVector {
        valence: params.gamma.valence * VALENCE_DRIVE.dot(&f),
        arousal: params.gamma.arousal * AROUSAL_DRIVE.dot(&f),
        trust: params.gamma.trust
            * (TRUST_DRIVE.dot(&f) + MEMORY_TRUST_WEIGHT * memory_score
                - OVERSHARE_TRUST_PENALTY * overshare),
        attraction: params.gamma.attraction * ATTRACTION_DRIVE.dot(&f),
    };

    // === Jitter ===
    let jitter = EmotionVector {
        valence: noise.jitter(params.noise.valence),
        arousal: noise.jitter(params.noise.arousal),
        trust: noise.jitter(params.noise.trust),
        attraction: noise.jitter(params.noise.attraction),
    };

    let retain = 1.0 - params.alpha;
    let mut next = EmotionVector {
        valence: retain * bot.valence + sync.valence + drive.valence + jitter.valence,
        arousal: retain * bot.arousal + sync.arousal + drive.arousal + jitter.arousal,
        trust: retain * bot.trust + sync.trust + drive.trust + jitter.trust,
        attraction: retain * bot.attraction + sync.attraction + drive.attraction + jitter.attraction,
    }
    .clamped();

    // The persona never becomes highly aroused.
    next.arousal = next.arousal.min(params.arousal_cap);

    tracing::trace!(
        "bot affect: sync=({:.3},{:.3},{:.3},{:.3}) drive=({:.3},{:.3},{:.3},{:.3})",
        sync.valence, sync.arousal, sync.trust, sync.attraction,
        drive.valence, drive.arousal, drive.trust, drive.attraction
    );

    next
}

/// Emotional alignment in [0, 1]: `max(0, 1 - ‖user - bot‖ / 2)`.
pub fn calculate_alignment(user: &EmotionVector, bot: &EmotionVector) -> f32 {
    (1.0 - user.distance(bot) / MAX_DISTANCE).max(0.0)
}
