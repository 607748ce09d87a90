//! Command palette engine
//!
//! This crate provides:
//! - A command registry whose hotkeys are bound through `palette-hotkeys`
//! - Pluggable asynchronous providers merged in registration order
//! - A palette state machine with namespaces, categories and nested levels
//! - Last-request-wins resolution: superseded results are dropped, never shown
//! - Settings loaded from JSON or YAML

pub mod aggregator;
pub mod bus;
pub mod category;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod namespace;
pub mod provider;
pub mod registry;
pub mod service;
pub mod session;
pub mod types;

// Re-export public types
pub use aggregator::{ProviderAggregator, ResolveRequest, ResolvedBatch};
pub use bus::{PaletteBus, PaletteEvent};
pub use category::{Category, CategoryGroup, CategoryRegistry, DEFAULT_CATEGORY};
pub use config::{NamespaceSetting, PaletteSettings, PlatformSetting, SettingsLoader};
pub use error::{CommandError, Result};
pub use fuzzy::{fuzzy_lookup, fuzzy_score};
pub use namespace::{format_list, split_namespace, NamespaceRegistry};
pub use provider::{
    CommandProvider, FnProvider, HotkeyItemProvider, Provider, ProviderRegistry, SearchContext,
};
pub use registry::{CommandRegistry, ScopedCommands};
pub use service::{CommandService, COMMAND_PROVIDER, HOTKEY_PROVIDER};
pub use session::{
    CloseCallback, KeyHandling, PaletteSession, PaletteState, PaletteView, Selection, ViewGroup,
    ViewItem, DEFAULT_EMPTY_MESSAGE, DEFAULT_PLACEHOLDER,
};
pub use types::{
    action, ActionOutcome, Command, CommandAction, CommandDefinition, CommandEntry, CommandId,
    CommandOptions, HotkeyBindingOptions, NamespaceConfig, PaletteConfig, PaletteRequest,
    DEFAULT_NAMESPACE,
};
