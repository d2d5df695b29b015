//! Mock collaborators: deterministic analysis and replies for tests and
//! offline simulation.

use crate::analysis::{Analysis, Analyzer, DialogueLine, GenerationRequest, Responder};
use anyhow::Result;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Replays a fixed queue of analyses, one per call. Errors once the queue
/// is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedAnalyzer {
    script: Mutex<VecDeque<Analysis>>,
}

impl ScriptedAnalyzer {
    pub fn new(script: impl IntoIterator<Item = Analysis>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait::async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, _message: &str, _dialogue: &[DialogueLine]) -> Result<Analysis> {
        self.script
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("analysis script exhausted"))
    }
}

/// Always fails, forcing the neutral fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingAnalyzer;

#[async_trait::async_trait]
impl Analyzer for FailingAnalyzer {
    async fn analyze(&self, _message: &str, _dialogue: &[DialogueLine]) -> Result<Analysis> {
        anyhow::bail!("analysis service unavailable")
    }
}

/// Builds a short deterministic reply from the relationship and policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoResponder;

#[async_trait::async_trait]
impl Responder for EchoResponder {
    async fn respond(&self, request: GenerationRequest) -> Result<String> {
        Ok(format!(
            "[{} tone={:.2} warmth={:.2}] {}",
            request.relationship, request.policy.tone, request.policy.warmth, request.message
        ))
    }
}

/// Always fails; the turn must not be applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingResponder;

#[async_trait::async_trait]
impl Responder for FailingResponder {
    async fn respond(&self, _request: GenerationRequest) -> Result<String> {
        anyhow::bail!("generation service unavailable")
    }
}
