//! Error types for the relationship dynamics core.

use thiserror::Error;

/// Errors raised by the dynamics core.
///
/// Finite but out-of-range inputs are never errors: they are clamped at the
/// boundary. Only NaN/∞ is rejected, since it means an upstream collaborator
/// broke its contract.
#[derive(Error, Debug)]
pub enum RapportError {
    /// An observation carried NaN or an infinity.
    #[error("Non-finite input in {field}: {value}")]
    NonFiniteInput {
        /// Dotted path of the offending field, e.g. `features.harassment`.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, RapportError>;

/// Reject NaN/∞ for a named field.
pub(crate) fn ensure_finite(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RapportError::NonFiniteInput { field, value })
    }
}
