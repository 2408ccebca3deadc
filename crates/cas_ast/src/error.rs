//! Error types for cas_ast crate.

use thiserror::Error;

/// Errors that can occur in AST operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    /// Matrix dimensions don't match data length
    #[error("invalid matrix: {reason}")]
    InvalidMatrix { reason: String },
}
