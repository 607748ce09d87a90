//! Core types for commands, palette entries and palette configurations

use palette_hotkeys::{Availability, HotkeyToken, KeyCombo, ScopeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::provider::Provider;

/// Namespace used when the search text carries no marker
pub const DEFAULT_NAMESPACE: &str = "default";

/// Callback run when a command or palette entry is selected
pub type CommandAction = Arc<dyn Fn() -> ActionOutcome + Send + Sync>;

/// What an action asks the palette to do next
#[derive(Clone, Default)]
pub enum ActionOutcome {
    /// The action ran to completion; the palette closes
    #[default]
    Done,
    /// Descend into a nested palette configuration
    Open(PaletteConfig),
}

impl From<()> for ActionOutcome {
    fn from(_: ()) -> Self {
        ActionOutcome::Done
    }
}

impl From<PaletteConfig> for ActionOutcome {
    fn from(config: PaletteConfig) -> Self {
        ActionOutcome::Open(config)
    }
}

impl fmt::Debug for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Done => write!(f, "Done"),
            ActionOutcome::Open(config) => f.debug_tuple("Open").field(config).finish(),
        }
    }
}

/// Wrap a closure returning `()` or a [`PaletteConfig`] as a [`CommandAction`]
pub fn action<R, F>(f: F) -> CommandAction
where
    R: Into<ActionOutcome>,
    F: Fn() -> R + Send + Sync + 'static,
{
    Arc::new(move || f().into())
}

/// Identity of a registered command, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(pub(crate) u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command#{}", self.0)
    }
}

/// Options applying to the hotkey binding only
#[derive(Clone, Default)]
pub struct HotkeyBindingOptions {
    pub allow_repeat: bool,
    pub is_available: Option<Availability>,
}

impl fmt::Debug for HotkeyBindingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyBindingOptions")
            .field("allow_repeat", &self.allow_repeat)
            .field("is_available", &self.is_available.is_some())
            .finish()
    }
}

/// Options accepted by [`crate::CommandRegistry::add`]
#[derive(Clone, Default)]
pub struct CommandOptions {
    pub category: Option<String>,
    /// Combo string such as `"alt+b"`
    pub hotkey: Option<String>,
    pub hotkey_options: HotkeyBindingOptions,
    pub is_available: Option<Availability>,
    /// Listed and bound regardless of the active element
    pub global: bool,
    /// Owning scope; the active element at registration time when unset
    pub scope: Option<ScopeId>,
}

impl CommandOptions {
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_hotkey(mut self, hotkey: impl Into<String>) -> Self {
        self.hotkey = Some(hotkey.into());
        self
    }

    pub fn with_allow_repeat(mut self, allow_repeat: bool) -> Self {
        self.hotkey_options.allow_repeat = allow_repeat;
        self
    }

    /// Predicate gating the hotkey only
    pub fn with_hotkey_available(
        mut self,
        predicate: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        self.hotkey_options.is_available = Some(Arc::new(predicate));
        self
    }

    /// Predicate gating both the palette listing and the hotkey
    pub fn with_is_available(mut self, predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.is_available = Some(Arc::new(predicate));
        self
    }

    pub fn with_global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn with_scope(mut self, scope: ScopeId) -> Self {
        self.scope = Some(scope);
        self
    }
}

impl fmt::Debug for CommandOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandOptions")
            .field("category", &self.category)
            .field("hotkey", &self.hotkey)
            .field("hotkey_options", &self.hotkey_options)
            .field("is_available", &self.is_available.is_some())
            .field("global", &self.global)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Unvalidated command, as handed to [`crate::CommandRegistry::register`]
#[derive(Clone, Default)]
pub struct CommandDefinition {
    pub name: Option<String>,
    pub action: Option<CommandAction>,
    pub options: CommandOptions,
}

impl CommandDefinition {
    pub fn new<R, F>(name: impl Into<String>, f: F) -> Self
    where
        R: Into<ActionOutcome>,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            action: Some(action(f)),
            options: CommandOptions::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_action(mut self, action: CommandAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("action", &self.action.is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// A registered command
#[derive(Clone)]
pub struct Command {
    pub id: CommandId,
    pub name: String,
    pub action: CommandAction,
    pub category: Option<String>,
    pub hotkey: Option<KeyCombo>,
    pub scope: ScopeId,
    pub global: bool,
    pub is_available: Option<Availability>,
    pub(crate) hotkey_token: Option<HotkeyToken>,
}

impl Command {
    pub fn available(&self) -> bool {
        self.is_available.as_ref().map(|p| p()).unwrap_or(true)
    }

    /// Whether the command belongs in a palette opened over `owner`
    pub fn visible_from(&self, owner: ScopeId) -> bool {
        self.global || self.scope == owner
    }

    pub fn hotkey_token(&self) -> Option<HotkeyToken> {
        self.hotkey_token
    }

    pub fn to_entry(&self) -> CommandEntry {
        CommandEntry {
            name: self.name.clone(),
            action: Arc::clone(&self.action),
            category: self.category.clone(),
            hotkey: self.hotkey.clone(),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("hotkey", &self.hotkey)
            .field("scope", &self.scope)
            .field("global", &self.global)
            .finish()
    }
}

/// One row produced by a provider
#[derive(Clone)]
pub struct CommandEntry {
    pub name: String,
    pub action: CommandAction,
    pub category: Option<String>,
    /// Combo that selects the entry while the palette is open
    pub hotkey: Option<KeyCombo>,
}

impl CommandEntry {
    pub fn new<R, F>(name: impl Into<String>, f: F) -> Self
    where
        R: Into<ActionOutcome>,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self::from_action(name, action(f))
    }

    pub fn from_action(name: impl Into<String>, action: CommandAction) -> Self {
        Self {
            name: name.into(),
            action,
            category: None,
            hotkey: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_hotkey(mut self, hotkey: KeyCombo) -> Self {
        self.hotkey = Some(hotkey);
        self
    }

    pub fn run(&self) -> ActionOutcome {
        (self.action)()
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("hotkey", &self.hotkey)
            .finish()
    }
}

/// Per-namespace overrides and setup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceConfig {
    /// Display name listed in the footer
    pub name: Option<String>,
    pub empty_message: Option<String>,
    pub placeholder: Option<String>,
}

impl NamespaceConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = Some(message.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// Configuration of one palette level
#[derive(Clone, Default)]
pub struct PaletteConfig {
    /// Replaces the active provider set when present
    pub providers: Option<Vec<Arc<dyn Provider>>>,
    pub config_by_namespace: HashMap<String, NamespaceConfig>,
    pub search_value: Option<String>,
}

impl PaletteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers
            .get_or_insert_with(Vec::new)
            .push(Arc::new(provider));
        self
    }

    pub fn with_providers(mut self, providers: Vec<Arc<dyn Provider>>) -> Self {
        self.providers = Some(providers);
        self
    }

    pub fn with_namespace_config(mut self, marker: impl Into<String>, config: NamespaceConfig) -> Self {
        self.config_by_namespace.insert(marker.into(), config);
        self
    }

    /// Placeholder of the default namespace
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        let entry = self
            .config_by_namespace
            .entry(DEFAULT_NAMESPACE.to_string())
            .or_default();
        entry.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_search_value(mut self, search_value: impl Into<String>) -> Self {
        self.search_value = Some(search_value.into());
        self
    }
}

impl fmt::Debug for PaletteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaletteConfig")
            .field("providers", &self.providers.as_ref().map(|p| p.len()))
            .field("config_by_namespace", &self.config_by_namespace)
            .field("search_value", &self.search_value)
            .finish()
    }
}

/// Palette opening requested from outside the palette (hotkeys, actions)
#[derive(Debug, Clone)]
pub enum PaletteRequest {
    /// The palette hotkey was pressed
    OpenMain,
    /// A hotkey-bound command returned a nested configuration
    Open(PaletteConfig),
}
