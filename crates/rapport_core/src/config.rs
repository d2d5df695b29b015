use crate::error::{RapportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

/// All tunable coefficients of the dynamics core plus session-layer settings.
///
/// Every default below is a design constant of the persona; a TOML file may
/// override individual fields, but nothing is learned at runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RapportConfig {
    pub emotion: EmotionParams,
    pub relationship: RelationshipParams,
    pub transitions: TransitionTable,
    pub session: SessionSettings,
}

impl RapportConfig {
    /// Parse a TOML string; missing fields fall back to defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| RapportError::Config(e.to_string()))
    }

    /// Load config from a TOML file, then apply env var overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return
    /// defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!(
                    "Config {} not loaded ({}), using defaults",
                    path.as_ref().display(),
                    e
                );
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Render the effective configuration back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RapportError::Config(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RAPPORT_NOISE_SEED") {
            if let Ok(n) = v.parse() {
                self.session.noise_seed = Some(n);
            }
        }
        if let Ok(v) = std::env::var("RAPPORT_ANALYSIS_TIMEOUT_MS") {
            if let Ok(n) = v.parse() {
                self.session.analysis_timeout_ms = n;
            }
        }
        if let Ok(v) = std::env::var("RAPPORT_HISTORY_WINDOW") {
            if let Ok(n) = v.parse() {
                self.session.history_window = n;
            }
        }
    }
}

// ============================================================================
// Emotion dynamics
// ============================================================================

/// A partial `[emotion]` section is overlaid on the defaults, down to the
/// individual gains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "EmotionOverride")]
pub struct EmotionParams {
    /// Bot affect decay: the previous vector is kept at weight (1 - alpha).
    pub alpha: f32,
    /// Base contagion rate toward the user's affect.
    pub beta: f32,
    /// Smoothing factor of the user-affect estimate.
    pub lambda_u: f32,
    /// Minimum guard factor; contagion is scaled by max(guard_floor, C).
    pub guard_floor: f32,
    /// Hard ceiling on bot arousal.
    pub arousal_cap: f32,
    /// Per-dimension gain of the interaction contribution.
    pub gamma: DimensionGains,
    /// Per-dimension multipliers of the contagion term.
    pub sync: SyncGains,
    /// Peak-to-peak amplitude of the jitter per dimension.
    pub noise: DimensionGains,
}

impl Default for EmotionParams {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            beta: 0.25,
            lambda_u: 0.5,
            guard_floor: 0.3,
            arousal_cap: 0.3,
            gamma: DimensionGains {
                valence: 0.15,
                arousal: 0.1,
                trust: 0.15,
                attraction: 0.2,
            },
            sync: SyncGains::default(),
            noise: DimensionGains {
                valence: 0.02,
                arousal: 0.01,
                trust: 0.01,
                attraction: 0.02,
            },
        }
    }
}

/// One coefficient per affect dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionGains {
    pub valence: f32,
    pub arousal: f32,
    pub trust: f32,
    pub attraction: f32,
}

#[derive(Debug, Default, Deserialize)]
struct GainsOverride {
    valence: Option<f32>,
    arousal: Option<f32>,
    trust: Option<f32>,
    attraction: Option<f32>,
}

impl GainsOverride {
    fn apply(self, base: DimensionGains) -> DimensionGains {
        DimensionGains {
            valence: self.valence.unwrap_or(base.valence),
            arousal: self.arousal.unwrap_or(base.arousal),
            trust: self.trust.unwrap_or(base.trust),
            attraction: self.attraction.unwrap_or(base.attraction),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmotionOverride {
    alpha: Option<f32>,
    beta: Option<f32>,
    lambda_u: Option<f32>,
    guard_floor: Option<f32>,
    arousal_cap: Option<f32>,
    gamma: GainsOverride,
    sync: SyncGains,
    noise: GainsOverride,
}

impl From<EmotionOverride> for EmotionParams {
    fn from(o: EmotionOverride) -> Self {
        let base = Self::default();
        Self {
            alpha: o.alpha.unwrap_or(base.alpha),
            beta: o.beta.unwrap_or(base.beta),
            lambda_u: o.lambda_u.unwrap_or(base.lambda_u),
            guard_floor: o.guard_floor.unwrap_or(base.guard_floor),
            arousal_cap: o.arousal_cap.unwrap_or(base.arousal_cap),
            gamma: o.gamma.apply(base.gamma),
            sync: o.sync,
            noise: o.noise.apply(base.noise),
        }
    }
}

/// Contagion multipliers. Valence syncs faster toward positive user affect
/// than toward negative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncGains {
    pub positive_valence: f32,
    pub negative_valence: f32,
    pub arousal: f32,
    pub trust: f32,
    pub attraction: f32,
}

impl Default for SyncGains {
    fn default() -> Self {
        Self {
            positive_valence: 0.7,
            negative_valence: 0.4,
            arousal: 0.5,
            trust: 0.3,
            attraction: 0.5,
        }
    }
}

// ============================================================================
// Relationship metrics
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipParams {
    /// Base learning rate of Trust.
    pub eta_t: f32,
    /// Base learning rate of Comfort.
    pub eta_k: f32,
    /// Base learning rate of Affection.
    pub eta_a: f32,
    /// Integration rate of the relationship score C.
    pub zeta: f32,
    pub weights: ScoreWeights,
    /// Largest per-turn change of C that goes unpenalized.
    pub r_max: f32,
    /// Strength of the velocity penalty beyond `r_max`.
    pub chi: f32,
    /// Value of the fixed similarity model.
    pub similarity: f32,
    /// Assumed self-disclosure level of the bot in the balance term.
    pub bot_self_disclosure: f32,
}

impl Default for RelationshipParams {
    fn default() -> Self {
        Self {
            eta_t: 0.08,
            eta_k: 0.12,
            eta_a: 0.1,
            zeta: 0.15,
            weights: ScoreWeights::default(),
            r_max: 0.04,
            chi: 0.8,
            similarity: 0.5,
            bot_self_disclosure: 0.3,
        }
    }
}

/// Blend weights of the integrated score. Trust is weighted highest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub alignment: f32,
    pub trust: f32,
    pub affection: f32,
    pub comfort: f32,
    pub similarity: f32,
    pub disclosure_balance: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            alignment: 0.2,
            trust: 0.35,
            affection: 0.15,
            comfort: 0.2,
            similarity: 0.05,
            disclosure_balance: 0.05,
        }
    }
}

// ============================================================================
// State transitions
// ============================================================================

/// Gate for one forward transition and the hysteresis threshold of its
/// reverse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionRule {
    /// C must reach this value to advance.
    pub up: f32,
    /// C must fall below this value to regress.
    pub down: f32,
    /// Trust must exceed this floor to advance.
    pub min_trust: f32,
    /// Comfort must exceed this floor to advance.
    pub min_comfort: f32,
    /// Affection floor to advance, if the transition requires one.
    pub min_affection: Option<f32>,
    /// Turns the current state must have been held before advancing.
    pub min_dwell: u32,
}

impl Default for TransitionRule {
    fn default() -> Self {
        Self {
            up: 1.0,
            down: 0.0,
            min_trust: 0.0,
            min_comfort: 0.0,
            min_affection: None,
            min_dwell: 0,
        }
    }
}

/// A partial `[transitions.*]` rule is overlaid on that rule's defaults,
/// never on [`TransitionRule::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "TransitionTableOverride")]
pub struct TransitionTable {
    pub stranger_to_friend: TransitionRule,
    pub friend_to_interest: TransitionRule,
    pub interest_to_flirting: TransitionRule,
    pub flirting_to_dating: TransitionRule,
    /// T or K below this snaps any state back to stranger.
    pub reset_floor: f32,
    /// Friend and interest fall back to stranger when T drops below this.
    pub stranger_trust_floor: f32,
    pub affection_floors: AffectionFloors,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self {
            stranger_to_friend: TransitionRule {
                up: 0.35,
                down: 0.25,
                min_trust: 0.15,
                min_comfort: 0.25,
                min_affection: None,
                min_dwell: 5,
            },
            friend_to_interest: TransitionRule {
                up: 0.55,
                down: 0.45,
                min_trust: 0.30,
                min_comfort: 0.35,
                min_affection: Some(0.20),
                min_dwell: 5,
            },
            interest_to_flirting: TransitionRule {
                up: 0.70,
                down: 0.60,
                min_trust: 0.50,
                min_comfort: 0.45,
                min_affection: Some(0.40),
                min_dwell: 8,
            },
            flirting_to_dating: TransitionRule {
                up: 0.85,
                down: 0.77,
                min_trust: 0.70,
                min_comfort: 0.60,
                min_affection: Some(0.65),
                min_dwell: 12,
            },
            reset_floor: 0.05,
            stranger_trust_floor: 0.10,
            affection_floors: AffectionFloors::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RuleOverride {
    up: Option<f32>,
    down: Option<f32>,
    min_trust: Option<f32>,
    min_comfort: Option<f32>,
    min_affection: Option<f32>,
    min_dwell: Option<u32>,
}

impl RuleOverride {
    fn apply(self, base: TransitionRule) -> TransitionRule {
        TransitionRule {
            up: self.up.unwrap_or(base.up),
            down: self.down.unwrap_or(base.down),
            min_trust: self.min_trust.unwrap_or(base.min_trust),
            min_comfort: self.min_comfort.unwrap_or(base.min_comfort),
            min_affection: self.min_affection.or(base.min_affection),
            min_dwell: self.min_dwell.unwrap_or(base.min_dwell),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TransitionTableOverride {
    stranger_to_friend: RuleOverride,
    friend_to_interest: RuleOverride,
    interest_to_flirting: RuleOverride,
    flirting_to_dating: RuleOverride,
    reset_floor: Option<f32>,
    stranger_trust_floor: Option<f32>,
    affection_floors: AffectionFloors,
}

impl From<TransitionTableOverride> for TransitionTable {
    fn from(o: TransitionTableOverride) -> Self {
        let base = Self::default();
        Self {
            stranger_to_friend: o.stranger_to_friend.apply(base.stranger_to_friend),
            friend_to_interest: o.friend_to_interest.apply(base.friend_to_interest),
            interest_to_flirting: o.interest_to_flirting.apply(base.interest_to_flirting),
            flirting_to_dating: o.flirting_to_dating.apply(base.flirting_to_dating),
            reset_floor: o.reset_floor.unwrap_or(base.reset_floor),
            stranger_trust_floor: o.stranger_trust_floor.unwrap_or(base.stranger_trust_floor),
            affection_floors: o.affection_floors,
        }
    }
}

/// Affection below the floor of a state regresses it one step, whatever C is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AffectionFloors {
    pub interest: f32,
    pub flirting: f32,
    pub dating: f32,
}

impl Default for AffectionFloors {
    fn default() -> Self {
        Self {
            interest: 0.10,
            flirting: 0.25,
            dating: 0.45,
        }
    }
}

// ============================================================================
// Session layer
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seed for the affect jitter. `None` draws from the thread RNG.
    pub noise_seed: Option<u64>,
    /// Number of past turns handed to the collaborators as dialogue context.
    pub history_window: usize,
    pub analysis_timeout_ms: u64,
    pub generation_timeout_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            noise_seed: None,
            history_window: 5,
            analysis_timeout_ms: 15_000,
            generation_timeout_ms: 30_000,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
