//! Relationship dynamics for a persona-driven conversational agent.
//!
//! Per turn, a structured [`Observation`] of the user's message drives the
//! bot's affect, four relationship metrics (T, K, A, C), a five-state
//! relationship machine and finally a [`ResponsePolicy`] for text generation.
//! Everything here is synchronous and free of I/O apart from config loading.

pub mod config;
pub mod emotion;
pub mod error;
pub mod features;
pub mod metrics;
pub mod noise;
pub mod policy;
pub mod relationship;
pub mod state;

pub use config::RapportConfig;
pub use emotion::EmotionVector;
pub use error::{RapportError, Result};
pub use features::{InteractionFeatures, Observation};
pub use metrics::{FixedSimilarity, RelationshipMetrics, SimilarityModel};
pub use noise::{NoNoise, NoiseSource, SeededNoise, ThreadNoise};
pub use policy::{generate_response_policy, ResponsePolicy};
pub use relationship::{RelationshipState, RelationshipTrack, Transition, TransitionKind};
pub use state::{ChatbotState, MemoryLog, RelationshipEngine, TurnOutcome};
