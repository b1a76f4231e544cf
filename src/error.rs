//! Error types shared by the memorizer and its persistence layer.

use crate::core::cell::CellAddress;
use thiserror::Error;

/// Errors raised while encoding or restoring a memorizer.
///
/// Stepping and feedback never fail; only persistence does.
#[derive(Error, Debug)]
pub enum AsmError {
    /// A text snapshot could not be parsed or describes an inconsistent store.
    #[error("malformed state at line {line}: {reason}")]
    MalformedState { line: usize, reason: String },

    /// A binary snapshot holds a connection to a cell that does not exist.
    #[error("connection from {from} points to missing cell {to}")]
    DanglingConnection { from: CellAddress, to: CellAddress },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("binary snapshot error: {0}")]
    Encoding(#[from] bincode::Error),
}

impl AsmError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        AsmError::MalformedState {
            line,
            reason: reason.into(),
        }
    }
}

/// Result type alias using `AsmError`.
pub type Result<T> = std::result::Result<T, AsmError>;
