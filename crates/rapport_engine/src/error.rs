use crate::session::SessionId;
use rapport_core::RapportError;
use thiserror::Error;

/// Errors surfaced by the conversation service.
///
/// A failed turn never leaves a partial update behind: the session is only
/// written once every step has succeeded.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session {session} does not belong to user {user}")]
    NotOwner { session: SessionId, user: String },

    /// The text generator failed or timed out. The turn was not applied.
    #[error("Response generation failed: {0}")]
    Generation(String),

    #[error(transparent)]
    Engine(#[from] RapportError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
