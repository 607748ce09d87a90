//! Hotkey registry with scoped dispatch and platform-aware display
//!
//! This crate provides the keyboard side of the command palette:
//! - Key combination parsing and normalization
//! - Active-element tracking with guaranteed restoration
//! - A hotkey registry supporting global and scoped bindings, repeat
//!   suppression and availability predicates
//! - Display strings that follow the platform's modifier conventions
//! - Conflict diagnostics for bindings claiming the same combo

pub mod conflict;
pub mod error;
pub mod models;
pub mod platform;
pub mod registry;
pub mod scope;

// Re-export public types
pub use conflict::{Conflict, ConflictDetector};
pub use error::ParseError;
pub use models::{Key, KeyCombo, KeyEvent, Modifier};
pub use platform::{parse_modifiers, HotkeyDisplay, Platform};
pub use registry::{
    Availability, BindingInfo, DispatchOutcome, HotkeyCallback, HotkeyOptions, HotkeyRegistry,
    HotkeyToken,
};
pub use scope::{ActiveElement, ActiveGuard, ScopeId};
