//! Response-style policy: eight scalars in [0, 1] handed to text generation.
//!
//! Each state has a base row. A fixed sequence of nudges is then applied on
//! top of it. Order matters: every nudge clamps to its own floor or cap, so
//! a later cap can undo an earlier boost.

use crate::emotion::EmotionVector;
use crate::metrics::RelationshipMetrics;
use crate::relationship::RelationshipState;
use serde::{Deserialize, Serialize};

/// Below this C the persona is at its coldest and recalls nothing.
const COLD_SCORE: f32 = 0.3;
const RECALL_SLOPE: f32 = 1.2;
const RECALL_PER_MEMORY: f32 = 0.01;

/// Trust below this shuts the persona down.
const DISTRUST: f32 = 0.15;
/// Trust below this keeps it guarded.
const GUARDED_TRUST: f32 = 0.4;
/// Comfort below this means short answers.
const UNEASY: f32 = 0.3;
/// Comfort below this still holds back.
const RESERVED: f32 = 0.5;
const FOND: f32 = 0.3;
const CLOSE: f32 = 0.5;
/// Affect beyond ±this counts as a clear swing.
const AFFECT_SWING: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePolicy {
    /// Liveliness of the reply; also drives length.
    pub tone: f32,
    pub humor: f32,
    pub self_disclosure: f32,
    pub question_depth: f32,
    /// 0 keeps formal address, 1 uses pet names.
    pub nickname_use: f32,
    pub playfulness: f32,
    pub warmth: f32,
    pub memory_recall: f32,
}

impl ResponsePolicy {
    /// Base row for a relationship state.
    pub const fn base(state: RelationshipState) -> Self {
        match state {
            RelationshipState::Stranger => Self::row(0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.05, 0.0),
            RelationshipState::Friend => Self::row(0.3, 0.2, 0.2, 0.3, 0.1, 0.1, 0.4, 0.3),
            RelationshipState::Interest => Self::row(0.6, 0.5, 0.5, 0.5, 0.3, 0.5, 0.6, 0.5),
            RelationshipState::Flirting => Self::row(0.7, 0.6, 0.6, 0.6, 0.6, 0.7, 0.7, 0.6),
            RelationshipState::Dating => Self::row(0.8, 0.7, 0.8, 0.7, 0.8, 0.7, 0.9, 0.8),
        }
    }

    #[allow(clippy::too_many_arguments)]
    const fn row(
        tone: f32,
        humor: f32,
        self_disclosure: f32,
        question_depth: f32,
        nickname_use: f32,
        playfulness: f32,
        warmth: f32,
        memory_recall: f32,
    ) -> Self {
        Self {
            tone,
            humor,
            self_disclosure,
            question_depth,
            nickname_use,
            playfulness,
            warmth,
            memory_recall,
        }
    }

    pub fn fields(&self) -> [(&'static str, f32); 8] {
        [
            ("tone", self.tone),
            ("humor", self.humor),
            ("selfDisclosure", self.self_disclosure),
            ("questionDepth", self.question_depth),
            ("nicknameUse", self.nickname_use),
            ("playfulness", self.playfulness),
            ("warmth", self.warmth),
            ("memoryRecall", self.memory_recall),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
enum Knob {
    Tone,
    Humor,
    SelfDisclosure,
    QuestionDepth,
    Playfulness,
    Warmth,
}

/// Move one field by `delta`, clamping to `bound`: a floor when lowering,
/// a cap when raising.
#[derive(Debug, Clone, Copy)]
struct Nudge {
    knob: Knob,
    delta: f32,
    bound: f32,
}

const fn down(knob: Knob, delta: f32, floor: f32) -> Nudge {
    Nudge {
        knob,
        delta: -delta,
        bound: floor,
    }
}

const fn up(knob: Knob, delta: f32, cap: f32) -> Nudge {
    Nudge {
        knob,
        delta,
        bound: cap,
    }
}

/// Force a field to zero.
const fn off(knob: Knob) -> Nudge {
    down(knob, 1.0, 0.0)
}

use Knob::*;

const COLD: &[Nudge] = &[down(Tone, 0.1, 0.0), down(Warmth, 0.2, 0.05), off(SelfDisclosure), off(Playfulness)];

const DISTRUSTFUL: &[Nudge] = &[off(QuestionDepth), off(SelfDisclosure), down(Warmth, 0.3, 0.05)];
const GUARDED: &[Nudge] = &[down(Playfulness, 0.1, 0.0), down(Warmth, 0.1, 0.1)];

const UNEASY_COMFORT: &[Nudge] = &[off(QuestionDepth), off(SelfDisclosure), down(Tone, 0.2, 0.0)];
const RESERVED_COMFORT: &[Nudge] = &[
    down(QuestionDepth, 0.2, 0.0),
    down(SelfDisclosure, 0.1, 0.0),
    down(Tone, 0.1, 0.0),
];

// Affection only thaws the persona a little.
const FOND_AFFECTION: &[Nudge] = &[up(Warmth, 0.1, 1.0)];
const CLOSE_AFFECTION: &[Nudge] = &[up(Playfulness, 0.1, 0.5), up(SelfDisclosure, 0.1, 0.6)];

// User is upset: fewer jokes, more listening.
const USER_UPSET: &[Nudge] = &[down(Humor, 0.3, 0.0), up(QuestionDepth, 0.2, 0.6), down(Playfulness, 0.2, 0.0)];

const BOT_LOW: &[Nudge] = &[
    down(Tone, 0.2, 0.0),
    down(Warmth, 0.3, 0.0),
    down(Humor, 0.3, 0.0),
    down(Playfulness, 0.3, 0.0),
    down(SelfDisclosure, 0.2, 0.0),
];
const BOT_HIGH: &[Nudge] = &[up(Tone, 0.1, 1.0), up(Warmth, 0.1, 1.0), up(Humor, 0.1, 1.0)];
const BOT_AGITATED: &[Nudge] = &[
    down(Tone, 0.15, 0.0),
    down(QuestionDepth, 0.2, 0.0),
    down(SelfDisclosure, 0.2, 0.0),
];
const BOT_CALM: &[Nudge] = &[up(Warmth, 0.05, 1.0)];
const BOT_TRUSTING: &[Nudge] = &[up(SelfDisclosure, 0.1, 1.0), up(Warmth, 0.1, 1.0)];
const BOT_ATTRACTED: &[Nudge] = &[
    up(Warmth, 0.15, 1.0),
    up(Playfulness, 0.15, 1.0),
    up(SelfDisclosure, 0.1, 1.0),
    up(QuestionDepth, 0.1, 1.0),
];

impl ResponsePolicy {
    fn knob_mut(&mut self, knob: Knob) -> &mut f32 {
        match knob {
            Tone => &mut self.tone,
            Humor => &mut self.humor,
            SelfDisclosure => &mut self.self_disclosure,
            QuestionDepth => &mut self.question_depth,
            Playfulness => &mut self.playfulness,
            Warmth => &mut self.warmth,
        }
    }

    fn apply(&mut self, nudges: &[Nudge]) {
        for n in nudges {
            let value = self.knob_mut(n.knob);
            *value = if n.delta < 0.0 {
                (*value + n.delta).max(n.bound)
            } else {
                (*value + n.delta).min(n.bound)
            };
        }
    }
}

/// Compile the current turn into a response policy.
///
/// Pure and order-sensitive. `memory_count` is the number of remembered
/// items and only affects `memory_recall`.
pub fn generate_response_policy(
    bot: &EmotionVector,
    user: &EmotionVector,
    metrics: &RelationshipMetrics,
    state: RelationshipState,
    memory_count: usize,
) -> ResponsePolicy {
    let mut p = ResponsePolicy::base(state);
    let RelationshipMetrics {
        trust: t,
        comfort: k,
        affection: a,
        score: c,
    } = *metrics;

    if c < COLD_SCORE {
        p.apply(COLD);
    }

    if t < DISTRUST {
        p.apply(DISTRUSTFUL);
    } else if t < GUARDED_TRUST {
        p.apply(GUARDED);
    }

    if k < UNEASY {
        p.apply(UNEASY_COMFORT);
    } else if k < RESERVED {
        p.apply(RESERVED_COMFORT);
    }

    if a > FOND {
        p.apply(FOND_AFFECTION);
    }
    if a > CLOSE {
        p.apply(CLOSE_AFFECTION);
    }

    if user.valence < -AFFECT_SWING {
        p.apply(USER_UPSET);
    }

    // === Bot's own affect ===
    if bot.valence < -AFFECT_SWING {
        p.apply(BOT_LOW);
    } else if bot.valence > AFFECT_SWING {
        p.apply(BOT_HIGH);
    }

    if bot.arousal > AFFECT_SWING {
        p.apply(BOT_AGITATED);
    } else if bot.arousal < -AFFECT_SWING {
        p.apply(BOT_CALM);
    }

    // Bot trust and attraction are unipolar, so only the upper side applies.
    if bot.trust > AFFECT_SWING {
        p.apply(BOT_TRUSTING);
    }
    if bot.attraction > AFFECT_SWING {
        p.apply(BOT_ATTRACTED);
    }

    p.memory_recall = if c < COLD_SCORE {
        0.0
    } else {
        ((c - COLD_SCORE) * RECALL_SLOPE + memory_count as f32 * RECALL_PER_MEMORY).min(1.0)
    };

    p
}
