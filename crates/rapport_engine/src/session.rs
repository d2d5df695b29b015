//! In-memory session store.
//!
//! Each session sits behind its own `tokio::sync::Mutex`, so turns on one
//! session run strictly one after another while distinct sessions proceed
//! in parallel. The outer map lock is only held to look up or insert a
//! handle, never across a turn.

use crate::analysis::{Analysis, DialogueLine};
use rapport_core::{ChatbotState, RelationshipState, ResponsePolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Record of one processed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub turn_number: u64,
    pub user_message: String,
    pub bot_response: String,
    pub analysis: Analysis,
    pub policy: ResponsePolicy,
    /// Owned copy of the state at the end of this turn.
    pub snapshot: ChatbotState,
    /// Unix timestamp (ms)
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub user_id: String,
    pub state: ChatbotState,
    /// Unix timestamp (ms)
    pub created_at: i64,
    /// Unix timestamp (ms)
    pub updated_at: i64,
    pub turns: Vec<Turn>,
}

impl Session {
    pub fn new(user_id: &str) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: SessionId::new(),
            user_id: user_id.to_string(),
            state: ChatbotState::initial(),
            created_at: now,
            updated_at: now,
            turns: Vec::new(),
        }
    }

    /// The last `window` turns as alternating user/assistant lines.
    pub fn recent_dialogue(&self, window: usize) -> Vec<DialogueLine> {
        let start = self.turns.len().saturating_sub(window);
        self.turns[start..]
            .iter()
            .flat_map(|turn| {
                [
                    DialogueLine::user(turn.user_message.as_str()),
                    DialogueLine::assistant(turn.bot_response.as_str()),
                ]
            })
            .collect()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            user_id: self.user_id.clone(),
            relationship: self.state.relationship(),
            affinity: self.state.metrics.affinity(),
            turn_count: self.turns.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only projection for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub user_id: String,
    pub relationship: RelationshipState,
    pub affinity: u8,
    pub turn_count: usize,
    pub created_at: i64,
    pub updated_at: i64,
}

pub(crate) type SessionHandle = Arc<Mutex<Session>>;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh session at the initial state.
    pub async fn create(&self, user_id: &str) -> SessionId {
        let session = Session::new(user_id);
        let id = session.id;
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        tracing::info!("Session created: {} (user {})", id, user_id);
        id
    }

    pub(crate) async fn handle(&self, id: SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Owned snapshot of a session. Waits for an in-flight turn to finish.
    pub async fn get(&self, id: SessionId) -> Option<Session> {
        let handle = self.handle(id).await?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Summaries of a user's sessions, most recently active first.
    pub async fn list_for_user(&self, user_id: &str) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();
        let mut out = Vec::new();
        for handle in handles {
            let session = handle.lock().await;
            if session.user_id == user_id {
                out.push(session.summary());
            }
        }
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        out
    }

    /// Remove a session. Returns false if it did not exist.
    pub async fn delete(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!("Session deleted: {}", id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
