//! Pluggable sources of palette entries

use async_trait::async_trait;
use palette_hotkeys::{HotkeyRegistry, ScopeId};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{CommandError, Result};
use crate::fuzzy::fuzzy_lookup;
use crate::registry::CommandRegistry;
use crate::types::{ActionOutcome, CommandEntry, DEFAULT_NAMESPACE};

/// What a provider is asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchContext {
    pub namespace: String,
    /// Search text with the namespace marker stripped
    pub search_value: String,
    /// Scope that was active when the palette opened
    pub owner_scope: ScopeId,
}

impl SearchContext {
    pub fn new(namespace: impl Into<String>, search_value: impl Into<String>, owner_scope: ScopeId) -> Self {
        Self {
            namespace: namespace.into(),
            search_value: search_value.into(),
            owner_scope,
        }
    }
}

/// Source of palette entries for one namespace
#[async_trait]
pub trait Provider: Send + Sync {
    /// Namespace marker this provider answers for
    fn namespace(&self) -> &str {
        DEFAULT_NAMESPACE
    }

    /// Message shown when the namespace has no results
    fn empty_message(&self) -> Option<&str> {
        None
    }

    async fn provide(&self, context: &SearchContext) -> Result<Vec<CommandEntry>>;
}

/// Provider backed by a synchronous closure
pub struct FnProvider<F> {
    namespace: String,
    empty_message: Option<String>,
    provide: F,
}

impl<F> FnProvider<F>
where
    F: Fn(&SearchContext) -> Vec<CommandEntry> + Send + Sync,
{
    pub fn new(provide: F) -> Self {
        Self::in_namespace(DEFAULT_NAMESPACE, provide)
    }

    pub fn in_namespace(namespace: impl Into<String>, provide: F) -> Self {
        Self {
            namespace: namespace.into(),
            empty_message: None,
            provide,
        }
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = Some(message.into());
        self
    }
}

#[async_trait]
impl<F> Provider for FnProvider<F>
where
    F: Fn(&SearchContext) -> Vec<CommandEntry> + Send + Sync,
{
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn empty_message(&self) -> Option<&str> {
        self.empty_message.as_deref()
    }

    async fn provide(&self, context: &SearchContext) -> Result<Vec<CommandEntry>> {
        Ok((self.provide)(context))
    }
}

/// Lists registered commands visible from the owner scope
pub struct CommandProvider {
    commands: CommandRegistry,
}

impl CommandProvider {
    pub fn new(commands: CommandRegistry) -> Self {
        Self { commands }
    }
}

#[async_trait]
impl Provider for CommandProvider {
    async fn provide(&self, context: &SearchContext) -> Result<Vec<CommandEntry>> {
        let entries: Vec<CommandEntry> = self
            .commands
            .visible(context.owner_scope)
            .iter()
            .map(|c| c.to_entry())
            .collect();
        Ok(fuzzy_lookup(&context.search_value, entries, |e| &e.name))
    }
}

/// Lists labelled overlay hotkeys of the owner scope
pub struct HotkeyItemProvider {
    hotkeys: HotkeyRegistry,
}

impl HotkeyItemProvider {
    pub fn new(hotkeys: HotkeyRegistry) -> Self {
        Self { hotkeys }
    }
}

#[async_trait]
impl Provider for HotkeyItemProvider {
    async fn provide(&self, context: &SearchContext) -> Result<Vec<CommandEntry>> {
        let entries: Vec<CommandEntry> = self
            .hotkeys
            .overlay_items(context.owner_scope)
            .into_iter()
            .filter(|b| self.hotkeys.is_available(b.token))
            .filter_map(|b| {
                let label = capitalize(b.label.as_deref()?);
                let hotkeys = self.hotkeys.clone();
                let token = b.token;
                let mut entry = CommandEntry::from_action(
                    label,
                    Arc::new(move || {
                        hotkeys.trigger(token);
                        ActionOutcome::Done
                    }),
                )
                .with_hotkey(b.trigger);
                entry.category = b.category;
                Some(entry)
            })
            .collect();
        Ok(fuzzy_lookup(&context.search_value, entries, |e| &e.name))
    }
}

/// "aria STARK" -> "Aria stark"
fn capitalize(label: &str) -> String {
    let label = label.trim();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Providers keyed by id; registration order is merge order
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    entries: Vec<(String, Arc<dyn Provider>)>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: impl Into<String>, provider: Arc<dyn Provider>) -> Result<()> {
        let id = id.into();
        if self.contains(&id) {
            return Err(CommandError::DuplicateProvider(id));
        }
        debug!(provider = %id, namespace = provider.namespace(), "Provider registered");
        self.entries.push((id, provider));
        Ok(())
    }

    /// Replace the provider registered under `id`, keeping its position
    pub fn replace(&mut self, id: impl Into<String>, provider: Arc<dyn Provider>) {
        let id = id.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = provider,
            None => self.entries.push((id, provider)),
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| existing != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, provider)| Arc::clone(provider))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Every provider in registration order
    pub fn providers(&self) -> Vec<Arc<dyn Provider>> {
        self.entries.iter().map(|(_, p)| Arc::clone(p)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommandOptions, PaletteRequest};
    use palette_hotkeys::{ActiveElement, HotkeyOptions};
    use tokio::sync::mpsc;

    fn names(entries: &[CommandEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("Aria Stark"), "Aria stark");
        assert_eq!(capitalize("  robb STARK "), "Robb stark");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_registry_order_and_duplicates() {
        let mut registry = ProviderRegistry::new();
        let empty = || Arc::new(FnProvider::new(|_: &SearchContext| Vec::new())) as Arc<dyn Provider>;
        registry.add("command", empty()).unwrap();
        registry.add("data-hotkeys", empty()).unwrap();
        assert!(matches!(
            registry.add("command", empty()),
            Err(CommandError::DuplicateProvider(_))
        ));
        registry.replace("command", empty());
        assert_eq!(registry.ids(), vec!["command", "data-hotkeys"]);
        assert!(registry.remove("command"));
        assert_eq!(registry.ids(), vec!["data-hotkeys"]);
    }

    #[tokio::test]
    async fn test_command_provider_filters_by_search() {
        let (tx, _rx) = mpsc::unbounded_channel::<PaletteRequest>();
        let commands = CommandRegistry::new(HotkeyRegistry::new(ActiveElement::new()), tx);
        for name in ["Cersei Lannister", "Jaime Lannister", "Tywin Lannister"] {
            commands.add(name, || (), CommandOptions::default()).unwrap();
        }
        let provider = CommandProvider::new(commands);

        let all = provider
            .provide(&SearchContext::new(DEFAULT_NAMESPACE, "", ScopeId::ROOT))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let found = provider
            .provide(&SearchContext::new(DEFAULT_NAMESPACE, "jl", ScopeId::ROOT))
            .await
            .unwrap();
        assert_eq!(names(&found), vec!["Jaime Lannister"]);
    }

    #[tokio::test]
    async fn test_hotkey_items_are_labelled_overlay_bindings() {
        let hotkeys = HotkeyRegistry::new(ActiveElement::new());
        hotkeys
            .bind("a", || {}, HotkeyOptions::default().with_overlay(true).with_label("Aria Stark"))
            .unwrap();
        hotkeys
            .bind("r", || {}, HotkeyOptions::default().with_overlay(true))
            .unwrap();
        hotkeys
            .bind(
                "s",
                || {},
                HotkeyOptions::default()
                    .with_overlay(true)
                    .with_label("Sansa")
                    .with_is_available(|| false),
            )
            .unwrap();

        let provider = HotkeyItemProvider::new(hotkeys);
        let items = provider
            .provide(&SearchContext::new(DEFAULT_NAMESPACE, "", ScopeId::ROOT))
            .await
            .unwrap();
        assert_eq!(names(&items), vec!["Aria stark"]);
        assert_eq!(items[0].hotkey.as_ref().map(|c| c.to_string()).as_deref(), Some("alt+a"));
    }
}
