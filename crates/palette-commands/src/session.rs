//! Palette session state machine
//!
//! `Closed -> Opening -> Open <-> Drilled -> Closed`. The session never
//! awaits: every transition that needs provider output hands back a
//! [`ResolveRequest`] for the caller to run, and the finished batch comes
//! back through [`PaletteSession::apply`], which drops it when a later
//! request superseded it.

use palette_hotkeys::{ActiveGuard, HotkeyDisplay, Key, KeyEvent, ScopeId};
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::Arc;
use tracing::debug;

use crate::aggregator::{ProviderAggregator, ResolveRequest, ResolvedBatch};
use crate::bus::{PaletteBus, PaletteEvent};
use crate::category::{Category, CategoryRegistry};
use crate::namespace::{split_namespace, NamespaceRegistry};
use crate::provider::{Provider, SearchContext};
use crate::types::{ActionOutcome, CommandEntry, NamespaceConfig, PaletteConfig, DEFAULT_NAMESPACE};

pub const DEFAULT_PLACEHOLDER: &str = "Search for a command...";
pub const DEFAULT_EMPTY_MESSAGE: &str = "No command found";

/// Called once when the palette closes, whatever the path
pub type CloseCallback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteState {
    Closed,
    /// Waiting for the first results
    Opening,
    Open,
    /// Showing a nested configuration
    Drilled,
}

/// Result of selecting an entry
#[derive(Debug)]
pub enum Selection {
    /// Nothing selectable at that position
    Missing,
    /// The action ran and the palette closed
    Executed,
    /// The action returned a nested configuration
    Drilled(ResolveRequest),
}

/// Result of offering a key to the palette
#[derive(Debug)]
pub enum KeyHandling {
    Ignored,
    Handled,
    /// Handled, and new results must be resolved
    Resolve(ResolveRequest),
}

impl KeyHandling {
    pub fn is_handled(&self) -> bool {
        !matches!(self, KeyHandling::Ignored)
    }
}

impl From<Selection> for KeyHandling {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::Missing => KeyHandling::Ignored,
            Selection::Executed => KeyHandling::Handled,
            Selection::Drilled(request) => KeyHandling::Resolve(request),
        }
    }
}

/// One navigation level
#[derive(Clone, Default)]
struct Level {
    providers: Vec<Arc<dyn Provider>>,
    config_by_namespace: HashMap<String, NamespaceConfig>,
    namespace: String,
    search_value: String,
    /// Display order: grouped by category
    results: Vec<CommandEntry>,
    groups: Vec<(Category, usize)>,
    focus: usize,
}

impl Level {
    fn new(providers: Vec<Arc<dyn Provider>>, config_by_namespace: HashMap<String, NamespaceConfig>) -> Self {
        Self {
            providers,
            config_by_namespace,
            namespace: DEFAULT_NAMESPACE.to_string(),
            ..Default::default()
        }
    }

    fn markers(&self) -> Vec<&str> {
        let mut markers: Vec<&str> = Vec::new();
        for provider in &self.providers {
            let ns = provider.namespace();
            if ns != DEFAULT_NAMESPACE && !markers.contains(&ns) {
                markers.push(ns);
            }
        }
        markers
    }

    /// Route raw input to a namespace. Markers only apply from the default namespace.
    fn route(&mut self, text: &str) -> bool {
        let routed = if self.namespace == DEFAULT_NAMESPACE {
            split_namespace(text, self.markers()).map(|(m, rest)| (m.to_string(), rest.to_string()))
        } else {
            None
        };
        match routed {
            Some((marker, rest)) => {
                self.namespace = marker;
                self.search_value = rest;
                true
            }
            None => {
                self.search_value = text.to_string();
                false
            }
        }
    }
}

/// State of the command palette
pub struct PaletteSession {
    state: PaletteState,
    aggregator: ProviderAggregator,
    level: Level,
    stack: Vec<Level>,
    owner_scope: ScopeId,
    guard: Option<ActiveGuard>,
    on_close: Option<CloseCallback>,
    categories: CategoryRegistry,
    namespaces: NamespaceRegistry,
    placeholder: String,
    empty_message: String,
    bus: PaletteBus,
}

impl PaletteSession {
    pub fn new(bus: PaletteBus) -> Self {
        Self {
            state: PaletteState::Closed,
            aggregator: ProviderAggregator::new(),
            level: Level::default(),
            stack: Vec::new(),
            owner_scope: ScopeId::ROOT,
            guard: None,
            on_close: None,
            categories: CategoryRegistry::new(),
            namespaces: NamespaceRegistry::new(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            bus,
        }
    }

    pub fn with_categories(mut self, categories: CategoryRegistry) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_namespaces(mut self, namespaces: NamespaceRegistry) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn categories_mut(&mut self) -> &mut CategoryRegistry {
        &mut self.categories
    }

    pub fn namespaces_mut(&mut self) -> &mut NamespaceRegistry {
        &mut self.namespaces
    }

    pub fn bus(&self) -> &PaletteBus {
        &self.bus
    }

    pub fn state(&self) -> PaletteState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != PaletteState::Closed
    }

    /// Whether results tagged `seq` would still be applied
    pub fn is_current(&self, seq: u64) -> bool {
        self.is_open() && self.aggregator.is_current(seq)
    }

    pub fn namespace(&self) -> &str {
        &self.level.namespace
    }

    pub fn search_value(&self) -> &str {
        &self.level.search_value
    }

    /// Entries in display order
    pub fn results(&self) -> &[CommandEntry] {
        &self.level.results
    }

    pub fn focus(&self) -> usize {
        self.level.focus
    }

    /// Number of levels above the current one
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn owner_scope(&self) -> ScopeId {
        self.owner_scope
    }

    /// Open over `providers`, or over the config's own providers when it
    /// names some. An already open palette is reset to the new config.
    pub fn open(
        &mut self,
        config: PaletteConfig,
        providers: Vec<Arc<dyn Provider>>,
        owner_scope: ScopeId,
        guard: Option<ActiveGuard>,
        on_close: Option<CloseCallback>,
    ) -> ResolveRequest {
        if self.state == PaletteState::Closed {
            self.owner_scope = owner_scope;
        }
        if guard.is_some() {
            self.guard = guard;
        }
        if self.on_close.is_none() {
            self.on_close = on_close;
        }

        let PaletteConfig {
            providers: own,
            config_by_namespace,
            search_value,
        } = config;
        self.level = Level::new(own.unwrap_or(providers), config_by_namespace);
        self.level.route(search_value.as_deref().unwrap_or(""));
        self.stack.clear();
        self.state = PaletteState::Opening;
        debug!(owner = %self.owner_scope, namespace = %self.level.namespace, "Palette opening");
        self.begin()
    }

    fn begin(&mut self) -> ResolveRequest {
        let context = SearchContext::new(
            self.level.namespace.clone(),
            self.level.search_value.clone(),
            self.owner_scope,
        );
        self.aggregator.begin(context, &self.level.providers)
    }

    /// Apply finished results. Returns false when they were stale.
    pub fn apply(&mut self, batch: ResolvedBatch) -> bool {
        if self.state == PaletteState::Closed {
            debug!(seq = batch.seq, "Results for a closed palette dropped");
            return false;
        }
        let seq = batch.seq;
        let batch = match self.aggregator.accept(batch) {
            Some(batch) => batch,
            None => {
                self.bus.publish(PaletteEvent::StaleDropped { seq });
                return false;
            }
        };

        let groups = self.categories.group(batch.entries);
        self.level.groups = groups
            .iter()
            .map(|g| (g.category.clone(), g.entries.len()))
            .collect();
        self.level.results = groups.into_iter().flat_map(|g| g.entries).collect();
        self.level.focus = 0;

        if self.state == PaletteState::Opening {
            self.state = PaletteState::Open;
            self.bus.publish(PaletteEvent::Opened { seq });
        }
        self.bus.publish(PaletteEvent::ResultsChanged {
            seq,
            namespace: self.level.namespace.clone(),
            count: self.level.results.len(),
        });
        true
    }

    /// Replace the search text, switching namespace on a leading marker
    pub fn set_search(&mut self, text: &str) -> Option<ResolveRequest> {
        if !self.is_open() {
            return None;
        }
        if self.level.route(text) {
            self.bus.publish(PaletteEvent::NamespaceChanged {
                namespace: self.level.namespace.clone(),
            });
        }
        Some(self.begin())
    }

    /// Switch namespace, keeping the search text
    pub fn switch_namespace(&mut self, marker: &str) -> Option<ResolveRequest> {
        if !self.is_open() {
            return None;
        }
        if self.level.namespace != marker {
            self.level.namespace = marker.to_string();
            self.bus.publish(PaletteEvent::NamespaceChanged {
                namespace: marker.to_string(),
            });
        }
        Some(self.begin())
    }

    /// Backspace on an empty search: leave the namespace, else pop a level
    pub fn back(&mut self) -> KeyHandling {
        if !self.is_open() || !self.level.search_value.is_empty() {
            return KeyHandling::Ignored;
        }
        if self.level.namespace != DEFAULT_NAMESPACE {
            match self.switch_namespace(DEFAULT_NAMESPACE) {
                Some(request) => KeyHandling::Resolve(request),
                None => KeyHandling::Ignored,
            }
        } else if self.pop() {
            KeyHandling::Handled
        } else {
            KeyHandling::Ignored
        }
    }

    /// Restore the previous level exactly as it was. No-op at the bottom.
    pub fn pop(&mut self) -> bool {
        let previous = match self.stack.pop() {
            Some(level) => level,
            None => return false,
        };
        self.level = previous;
        self.aggregator.invalidate();
        self.state = if self.stack.is_empty() {
            PaletteState::Open
        } else {
            PaletteState::Drilled
        };
        self.bus.publish(PaletteEvent::Popped {
            depth: self.stack.len(),
        });
        true
    }

    fn drill(&mut self, config: PaletteConfig) -> ResolveRequest {
        let PaletteConfig {
            providers,
            config_by_namespace,
            search_value,
        } = config;
        let providers = providers.unwrap_or_else(|| self.level.providers.clone());
        let mut next = Level::new(providers, config_by_namespace);
        next.route(search_value.as_deref().unwrap_or(""));

        let previous = mem::replace(&mut self.level, next);
        self.stack.push(previous);
        self.state = PaletteState::Drilled;
        self.bus.publish(PaletteEvent::Drilled {
            depth: self.stack.len(),
        });
        self.begin()
    }

    /// Run the entry at `index` in display order
    pub fn select(&mut self, index: usize) -> Selection {
        if !matches!(self.state, PaletteState::Open | PaletteState::Drilled) {
            return Selection::Missing;
        }
        let entry = match self.level.results.get(index) {
            Some(entry) => entry.clone(),
            None => return Selection::Missing,
        };
        debug!(name = %entry.name, index, "Palette entry selected");
        match entry.run() {
            ActionOutcome::Done => {
                self.close();
                Selection::Executed
            }
            ActionOutcome::Open(config) => Selection::Drilled(self.drill(config)),
        }
    }

    pub fn select_focused(&mut self) -> Selection {
        self.select(self.level.focus)
    }

    pub fn focus_next(&mut self) {
        let len = self.level.results.len();
        if len > 0 {
            self.level.focus = (self.level.focus + 1) % len;
        }
    }

    pub fn focus_previous(&mut self) {
        let len = self.level.results.len();
        if len > 0 {
            self.level.focus = (self.level.focus + len - 1) % len;
        }
    }

    pub fn set_focus(&mut self, index: usize) -> bool {
        if index < self.level.results.len() {
            self.level.focus = index;
            true
        } else {
            false
        }
    }

    /// Cancel path: `Dismissed` then `Closed`
    pub fn dismiss(&mut self) {
        if !self.is_open() {
            return;
        }
        self.bus.publish(PaletteEvent::Dismissed);
        self.close();
    }

    /// Close from any state. Idempotent.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        self.state = PaletteState::Closed;
        self.aggregator.invalidate();
        self.stack.clear();
        self.level = Level::default();
        // Restore the active element before anyone else observes the close
        self.guard = None;
        debug!(owner = %self.owner_scope, "Palette closed");
        self.bus.publish(PaletteEvent::Closed);
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }

    /// Keys the open palette consumes itself
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyHandling {
        if !self.is_open() {
            return KeyHandling::Ignored;
        }
        let combo = &event.combo;
        if !combo.has_modifiers() {
            match combo.key() {
                Key::Escape => {
                    self.dismiss();
                    return KeyHandling::Handled;
                }
                Key::Enter => return self.select_focused().into(),
                Key::Down => {
                    self.focus_next();
                    return KeyHandling::Handled;
                }
                Key::Up => {
                    self.focus_previous();
                    return KeyHandling::Handled;
                }
                Key::Backspace => return self.back(),
                _ => {}
            }
        }
        if event.repeat {
            return KeyHandling::Ignored;
        }
        match self
            .level
            .results
            .iter()
            .position(|e| e.hotkey.as_ref() == Some(combo))
        {
            Some(index) => self.select(index).into(),
            None => KeyHandling::Ignored,
        }
    }

    fn namespace_config(&self) -> Option<&NamespaceConfig> {
        self.level.config_by_namespace.get(&self.level.namespace)
    }

    pub fn placeholder(&self) -> String {
        self.namespace_config()
            .and_then(|c| c.placeholder.clone())
            .or_else(|| {
                self.namespaces
                    .get(&self.level.namespace)
                    .and_then(|c| c.placeholder.clone())
            })
            .unwrap_or_else(|| self.placeholder.clone())
    }

    pub fn empty_message(&self) -> String {
        let namespace = self.level.namespace.as_str();
        self.namespace_config()
            .and_then(|c| c.empty_message.clone())
            .or_else(|| {
                self.level
                    .providers
                    .iter()
                    .filter(|p| p.namespace() == namespace)
                    .find_map(|p| p.empty_message().map(str::to_string))
            })
            .or_else(|| self.namespaces.get(namespace).and_then(|c| c.empty_message.clone()))
            .unwrap_or_else(|| self.empty_message.clone())
    }

    /// Everything a presentation layer needs to draw the palette
    pub fn view(&self, display: &HotkeyDisplay) -> PaletteView {
        if !self.is_open() {
            return PaletteView::closed();
        }
        let mut groups = Vec::with_capacity(self.level.groups.len());
        let mut index = 0;
        for (category, count) in &self.level.groups {
            let items = self.level.results[index..index + count]
                .iter()
                .enumerate()
                .map(|(offset, entry)| ViewItem {
                    index: index + offset,
                    name: entry.name.clone(),
                    hotkey_display: entry.hotkey.as_ref().map(|h| display.format(h)),
                    category: category.id.clone(),
                    focused: index + offset == self.level.focus,
                })
                .collect();
            groups.push(ViewGroup {
                category: category.id.clone(),
                label: category.label.clone(),
                items,
            });
            index += count;
        }
        let empty_message = if self.state != PaletteState::Opening && self.level.results.is_empty() {
            Some(self.empty_message())
        } else {
            None
        };
        PaletteView {
            state: self.state,
            namespace: self.level.namespace.clone(),
            search_value: self.level.search_value.clone(),
            placeholder: self.placeholder(),
            empty_message,
            footer: self.namespaces.footer_text(),
            groups,
            depth: self.stack.len(),
        }
    }
}

impl fmt::Debug for PaletteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaletteSession")
            .field("state", &self.state)
            .field("namespace", &self.level.namespace)
            .field("search_value", &self.level.search_value)
            .field("results", &self.level.results.len())
            .field("depth", &self.stack.len())
            .finish()
    }
}

/// Rendered row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewItem {
    /// Position passed to [`PaletteSession::select`]
    pub index: usize,
    pub name: String,
    pub hotkey_display: Option<String>,
    pub category: String,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewGroup {
    pub category: String,
    pub label: Option<String>,
    pub items: Vec<ViewItem>,
}

/// Snapshot of the palette for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteView {
    pub state: PaletteState,
    pub namespace: String,
    pub search_value: String,
    pub placeholder: String,
    /// Set when an open palette has nothing to show
    pub empty_message: Option<String>,
    pub footer: Option<String>,
    pub groups: Vec<ViewGroup>,
    pub depth: usize,
}

impl PaletteView {
    fn closed() -> Self {
        Self {
            state: PaletteState::Closed,
            namespace: DEFAULT_NAMESPACE.to_string(),
            search_value: String::new(),
            placeholder: String::new(),
            empty_message: None,
            footer: None,
            groups: Vec::new(),
            depth: 0,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &ViewItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    pub fn names(&self) -> Vec<&str> {
        self.items().map(|i| i.name.as_str()).collect()
    }

    /// "Name" or "Name HOTKEY" per row, as a list would print them
    pub fn lines(&self) -> Vec<String> {
        self.items()
            .map(|i| match &i.hotkey_display {
                Some(hotkey) => format!("{} {}", i.name, hotkey),
                None => i.name.clone(),
            })
            .collect()
    }

    pub fn focused(&self) -> Option<&ViewItem> {
        self.items().find(|i| i.focused)
    }
}
