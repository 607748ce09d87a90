use thiserror::Error;

use crate::models::DialogId;

/// Errors that can occur while manipulating dialogs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    #[error("Dialog not found: {0}")]
    NotFound(DialogId),

    #[error("No drag in progress")]
    NotDragging,

    #[error("Dialog cannot be dragged: {0}")]
    NotDraggable(DialogId),
}

pub type Result<T> = std::result::Result<T, DialogError>;
