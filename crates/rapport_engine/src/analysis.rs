//! Seams to the two external collaborators: language analysis before the
//! engine runs and text generation after it.

use anyhow::Result;
use async_trait::async_trait;
use rapport_core::{ChatbotState, Observation, RelationshipState, ResponsePolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One line of recent dialogue handed to the collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub role: Speaker,
    pub content: String,
}

impl DialogueLine {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::Assistant,
            content: content.into(),
        }
    }
}

/// Structured reading of one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(flatten)]
    pub observation: Observation,
    /// One-sentence summary; surfaced to callers as the affinity reason.
    #[serde(default)]
    pub content_summary: String,
}

impl Analysis {
    pub fn new(observation: Observation, content_summary: impl Into<String>) -> Self {
        Self {
            observation,
            content_summary: content_summary.into(),
        }
    }

    /// Substitute when the analyzer fails: neutral observation, and the raw
    /// message stands in for the summary.
    pub fn fallback(message: &str) -> Self {
        Self::new(Observation::neutral(), message)
    }
}

/// Everything the text generator needs to write the bot's reply.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub message: String,
    pub dialogue: Vec<DialogueLine>,
    pub relationship: RelationshipState,
    pub policy: ResponsePolicy,
    /// Style guide rendered from the policy.
    pub instructions: String,
    /// Recent facts and jokes, already formatted.
    pub memory_context: String,
    /// Sampling temperature; warmer policies sample more freely.
    pub temperature: f32,
    pub max_tokens: u32,
    /// The state as it will be committed if generation succeeds.
    pub state: ChatbotState,
}

/// Language-analysis collaborator.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Read a user message in the context of recent dialogue.
    async fn analyze(&self, message: &str, dialogue: &[DialogueLine]) -> Result<Analysis>;
}

/// Text-generation collaborator.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, request: GenerationRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_uses_message_as_summary() {
        let a = Analysis::fallback("hello there");
        assert_eq!(a.content_summary, "hello there");
        assert_eq!(a.observation, Observation::neutral());
    }

    #[test]
    fn test_analysis_json_is_flat() {
        let json = r#"{
            "userEmotion": {"valence": 0.4, "arousal": 0.1, "trust": 0.3, "attraction": 0.2},
            "features": {"humor": 0.7},
            "contentSummary": "told a joke about cats",
            "detectedFacts": ["has two cats"]
        }"#;
        let a: Analysis = serde_json::from_str(json).unwrap();
        assert_eq!(a.content_summary, "told a joke about cats");
        assert_eq!(a.observation.detected_facts, vec!["has two cats".to_string()]);
        assert!((a.observation.features.humor - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_dialogue_roles_serialize_lowercase() {
        let line = DialogueLine::assistant("hi");
        let json = serde_json::to_string(&line).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
