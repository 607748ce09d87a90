//! Modal dialog stack
//!
//! Dialogs open on top of each other, own the active element while open,
//! and close through two paths: close alone, or dismiss followed by close.
//! Drag offsets are tracked per dialog and reset on viewport resize.

pub mod error;
pub mod models;
pub mod stack;

// Re-export public types
pub use error::{DialogError, Result};
pub use models::{
    DialogCallback, DialogHandlers, DialogId, DialogOptions, DialogSize, Pointer, Position,
};
pub use stack::DialogStack;
