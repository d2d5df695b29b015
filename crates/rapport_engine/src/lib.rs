//! Conversation layer around the relationship dynamics core: an in-memory
//! session store, the turn-processing entry point and the seams to the
//! external analysis and generation services.

pub mod analysis;
pub mod error;
pub mod prompt;
pub mod providers;
pub mod service;
pub mod session;

pub use analysis::{Analysis, Analyzer, DialogueLine, GenerationRequest, Responder, Speaker};
pub use error::SessionError;
pub use service::{ConversationService, EmotionDetail, TurnReply};
pub use session::{Session, SessionId, SessionStore, SessionSummary, Turn};
