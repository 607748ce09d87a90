//! Error types for hotkey operations

use thiserror::Error;

/// Errors that can occur while parsing a key combination
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty key combination")]
    EmptyCombo,

    #[error("Invalid key syntax: {0}")]
    InvalidKeySyntax(String),

    #[error("Invalid modifier: {0}")]
    InvalidModifier(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),
}
