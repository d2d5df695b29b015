//! Per-session relationship record and the per-turn pipeline.
//!
//! observation → emotion update → metrics update → transition → policy
//!
//! [`RelationshipEngine::step`] never mutates its input. It works on a clone
//! and hands back the next state, so callers commit a turn atomically or
//! not at all.

use crate::config::RapportConfig;
use crate::emotion::{update_bot_emotion, update_user_emotion, EmotionVector};
use crate::error::Result;
use crate::features::{InteractionFeatures, Observation};
use crate::metrics::{update_relationship_metrics, FixedSimilarity, RelationshipMetrics, SimilarityModel};
use crate::noise::{self, NoNoise, NoiseSource};
use crate::policy::{generate_response_policy, ResponsePolicy};
use crate::relationship::{RelationshipState, RelationshipTrack, Transition, TransitionKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Each remembered fact adds this much to the memory score.
const MEMORY_SCORE_PER_FACT: f32 = 0.1;

/// Append-only memory. The engine only ever reads counts from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryLog {
    pub user_facts: Vec<String>,
    pub shared_jokes: Vec<String>,
    pub milestones: Vec<String>,
}

fn push_trimmed(list: &mut Vec<String>, entry: &str) -> bool {
    let entry = entry.trim();
    if entry.is_empty() {
        return false;
    }
    list.push(entry.to_string());
    true
}

impl MemoryLog {
    /// Append facts, skipping blank ones. Returns how many were kept.
    pub fn record_facts<I, S>(&mut self, facts: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        facts
            .into_iter()
            .filter(|fact| push_trimmed(&mut self.user_facts, fact.as_ref()))
            .count()
    }

    pub fn record_joke(&mut self, joke: &str) -> bool {
        push_trimmed(&mut self.shared_jokes, joke)
    }

    pub fn record_milestone(&mut self, milestone: &str) -> bool {
        push_trimmed(&mut self.milestones, milestone)
    }

    /// Count used for memory recall in the response policy.
    pub fn recall_count(&self) -> usize {
        self.user_facts.len() + self.shared_jokes.len()
    }

    /// Memory score in [0, 1] feeding the bot's trust drive.
    pub fn memory_score(&self) -> f32 {
        (self.user_facts.len() as f32 * MEMORY_SCORE_PER_FACT).min(1.0)
    }
}

/// Everything the engine owns for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotState {
    pub user_emotion: EmotionVector,
    pub bot_emotion: EmotionVector,
    pub metrics: RelationshipMetrics,
    #[serde(flatten)]
    pub track: RelationshipTrack,
    pub memory: MemoryLog,
    pub interaction_count: u64,
    pub last_features: Option<InteractionFeatures>,
}

impl Default for ChatbotState {
    fn default() -> Self {
        Self::initial()
    }
}

impl ChatbotState {
    /// A fresh conversation: both parties guarded, relationship at stranger.
    pub fn initial() -> Self {
        Self {
            user_emotion: EmotionVector::initial(),
            bot_emotion: EmotionVector::initial(),
            metrics: RelationshipMetrics::initial(),
            track: RelationshipTrack::default(),
            memory: MemoryLog::default(),
            interaction_count: 0,
            last_features: None,
        }
    }

    pub fn relationship(&self) -> RelationshipState {
        self.track.state
    }

    pub fn state_duration(&self) -> u32 {
        self.track.state_duration
    }
}

/// Result of one processed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub state: ChatbotState,
    pub policy: ResponsePolicy,
    pub transition: Option<Transition>,
}

/// Runs the per-turn pipeline with fixed configuration.
#[derive(Debug)]
pub struct RelationshipEngine {
    config: RapportConfig,
    noise: Box<dyn NoiseSource>,
    similarity: Box<dyn SimilarityModel>,
}

impl RelationshipEngine {
    /// Engine with jitter seeded from `config.session.noise_seed`
    /// (thread RNG when unset) and the configured fixed similarity.
    pub fn new(config: RapportConfig) -> Self {
        let noise = noise::from_seed(config.session.noise_seed);
        let similarity = Box::new(FixedSimilarity(config.relationship.similarity));
        Self {
            config,
            noise,
            similarity,
        }
    }

    /// Engine with no jitter: identical inputs give identical outputs.
    pub fn deterministic(config: RapportConfig) -> Self {
        Self::new(config).with_noise(Box::new(NoNoise))
    }

    pub fn with_noise(mut self, noise: Box<dyn NoiseSource>) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_similarity(mut self, similarity: Box<dyn SimilarityModel>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn config(&self) -> &RapportConfig {
        &self.config
    }

    /// Process one observation against `current`.
    ///
    /// Fails only on non-finite input; `current` is left untouched either way.
    pub fn step(&self, current: &ChatbotState, observation: &Observation) -> Result<TurnOutcome> {
        observation.validate()?;
        let features = observation.features.clamped();
        let mut next = current.clone();

        // Emotions first. The bot sees last turn's C and memory.
        next.user_emotion =
            update_user_emotion(&current.user_emotion, &observation.user_emotion, &self.config.emotion);
        next.bot_emotion = update_bot_emotion(
            &current.bot_emotion,
            &next.user_emotion,
            &features,
            current.memory.memory_score(),
            current.metrics.score,
            &self.config.emotion,
            self.noise.as_ref(),
        );

        next.metrics = update_relationship_metrics(
            &current.metrics,
            &next.user_emotion,
            &next.bot_emotion,
            &features,
            &self.config.relationship,
            self.similarity.as_ref(),
        );

        let transition = next.track.advance(&next.metrics, &self.config.transitions);
        if let Some(t) = transition {
            info!("relationship {} -> {} ({:?})", t.from, t.to, t.kind);
            if t.kind == TransitionKind::Advance {
                next.memory.record_milestone(&format!("became {}", t.to));
            }
        }

        // Policy reads the memory as it was before this turn's facts.
        let policy = generate_response_policy(
            &next.bot_emotion,
            &next.user_emotion,
            &next.metrics,
            next.track.state,
            next.memory.recall_count(),
        );

        next.memory.record_facts(&observation.detected_facts);
        next.interaction_count += 1;
        next.last_features = Some(features);

        debug!(
            "turn {}: state={} dwell={} T={:.3} K={:.3} A={:.3} C={:.3}",
            next.interaction_count,
            next.track.state,
            next.track.state_duration,
            next.metrics.trust,
            next.metrics.comfort,
            next.metrics.affection,
            next.metrics.score
        );
        debug_assert!(next.metrics.is_finite() && next.bot_emotion.is_finite());

        Ok(TurnOutcome {
            state: next,
            policy,
            transition,
        })
    }
}
