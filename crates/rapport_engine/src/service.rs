//! Turn processing: analysis → engine step → generation → commit.

use crate::analysis::{Analysis, Analyzer, DialogueLine, GenerationRequest, Responder};
use crate::error::{Result, SessionError};
use crate::prompt;
use crate::session::{SessionId, SessionStore, Turn};
use rapport_core::config::SessionSettings;
use rapport_core::{EmotionVector, RapportConfig, RelationshipEngine, RelationshipState, ResponsePolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Replies are kept short.
const MAX_REPLY_TOKENS: u32 = 250;

fn percent(v: f32) -> u8 {
    (v * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Read-only projection of the relationship after a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionDetail {
    pub relationship_state: RelationshipState,
    pub state_duration: u32,
    pub trust_level: u8,
    pub comfort_level: u8,
    pub affection_level: u8,
    pub user_emotion: EmotionVector,
    pub bot_emotion: EmotionVector,
    pub policy: ResponsePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    pub session_id: SessionId,
    pub message: String,
    /// round(C · 100)
    pub affinity: u8,
    pub affinity_reason: String,
    pub detail: EmotionDetail,
}

pub struct ConversationService {
    engine: RelationshipEngine,
    store: Arc<SessionStore>,
    analyzer: Arc<dyn Analyzer>,
    responder: Arc<dyn Responder>,
    settings: SessionSettings,
}

impl ConversationService {
    pub fn new(config: RapportConfig, analyzer: Arc<dyn Analyzer>, responder: Arc<dyn Responder>) -> Self {
        let settings = config.session.clone();
        Self {
            engine: RelationshipEngine::new(config),
            store: Arc::new(SessionStore::new()),
            analyzer,
            responder,
            settings,
        }
    }

    /// Replace the engine, e.g. with a noiseless one for tests.
    pub fn with_engine(mut self, engine: RelationshipEngine) -> Self {
        self.settings = engine.config().session.clone();
        self.engine = engine;
        self
    }

    /// Share a session store with other services.
    pub fn with_store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Process one user message.
    ///
    /// A missing `session_id` opens a new session for `user_id`. The turn
    /// is applied only if every step succeeds; on error the session is left
    /// exactly as it was.
    pub async fn process_message(
        &self,
        session_id: Option<SessionId>,
        user_id: &str,
        message: &str,
    ) -> Result<TurnReply> {
        let id = match session_id {
            Some(id) => id,
            None => self.store.create(user_id).await,
        };
        let handle = self.store.handle(id).await.ok_or(SessionError::NotFound(id))?;

        // Held for the whole turn: one in-flight turn per session.
        let mut session = handle.lock().await;
        if session.user_id != user_id {
            return Err(SessionError::NotOwner {
                session: id,
                user: user_id.to_string(),
            });
        }
        debug!("Processing turn {} of session {}", session.turns.len() + 1, id);

        let dialogue = session.recent_dialogue(self.settings.history_window);
        let analysis = self.analyze(message, &dialogue).await;

        let outcome = self.engine.step(&session.state, &analysis.observation)?;

        let request = GenerationRequest {
            message: message.to_string(),
            dialogue,
            relationship: outcome.state.relationship(),
            policy: outcome.policy,
            instructions: prompt::policy_to_prompt(&outcome.policy, outcome.state.relationship()),
            memory_context: prompt::format_memory_context(&session.state.memory),
            temperature: prompt::temperature(&outcome.policy),
            max_tokens: MAX_REPLY_TOKENS,
            state: outcome.state.clone(),
        };
        let reply = self.generate(request).await?;

        // === Commit ===
        let now = chrono::Utc::now().timestamp_millis();
        let state = outcome.state;
        session.state = state.clone();
        session.turns.push(Turn {
            turn_number: state.interaction_count,
            user_message: message.to_string(),
            bot_response: reply.clone(),
            analysis: analysis.clone(),
            policy: outcome.policy,
            snapshot: state.clone(),
            timestamp: now,
        });
        session.updated_at = now;

        info!(
            "Turn {} done: session={} state={} C={:.2}",
            state.interaction_count,
            id,
            state.relationship(),
            state.metrics.score
        );

        Ok(TurnReply {
            session_id: id,
            message: reply,
            affinity: state.metrics.affinity(),
            affinity_reason: analysis.content_summary,
            detail: EmotionDetail {
                relationship_state: state.relationship(),
                state_duration: state.state_duration(),
                trust_level: percent(state.metrics.trust),
                comfort_level: percent(state.metrics.comfort),
                affection_level: percent(state.metrics.affection),
                user_emotion: state.user_emotion,
                bot_emotion: state.bot_emotion,
                policy: outcome.policy,
            },
        })
    }

    /// Run the analyzer under its timeout, falling back to the neutral
    /// observation on failure.
    async fn analyze(&self, message: &str, dialogue: &[DialogueLine]) -> Analysis {
        let timeout = Duration::from_millis(self.settings.analysis_timeout_ms);
        match tokio::time::timeout(timeout, self.analyzer.analyze(message, dialogue)).await {
            Ok(Ok(analysis)) => analysis,
            Ok(Err(e)) => {
                warn!("Analysis failed, using neutral observation: {}", e);
                Analysis::fallback(message)
            }
            Err(_) => {
                warn!(
                    "Analysis timed out after {}ms, using neutral observation",
                    self.settings.analysis_timeout_ms
                );
                Analysis::fallback(message)
            }
        }
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let timeout = Duration::from_millis(self.settings.generation_timeout_ms);
        match tokio::time::timeout(timeout, self.responder.respond(request)).await {
            Ok(Ok(reply)) => Ok(reply.trim().to_string()),
            Ok(Err(e)) => Err(SessionError::Generation(e.to_string())),
            Err(_) => Err(SessionError::Generation(format!(
                "timed out after {}ms",
                self.settings.generation_timeout_ms
            ))),
        }
    }
}
