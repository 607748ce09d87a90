//! Process-scoped command table

use palette_hotkeys::{
    Availability, HotkeyCallback, HotkeyOptions, HotkeyRegistry, KeyCombo, ScopeId,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::error::{CommandError, Result};
use crate::types::{
    ActionOutcome, Command, CommandAction, CommandDefinition, CommandId, CommandOptions,
    PaletteRequest,
};

struct RegistryState {
    next_id: u64,
    /// Registration order is listing order
    commands: Vec<Command>,
}

/// Registry of palette commands.
///
/// Commands carrying a hotkey get a binding in the shared [`HotkeyRegistry`];
/// a hotkey whose action returns a nested configuration asks the palette to
/// open through the request channel. Cloning yields another handle to the
/// same table.
#[derive(Clone)]
pub struct CommandRegistry {
    state: Arc<Mutex<RegistryState>>,
    hotkeys: HotkeyRegistry,
    requests: UnboundedSender<PaletteRequest>,
}

impl CommandRegistry {
    pub fn new(hotkeys: HotkeyRegistry, requests: UnboundedSender<PaletteRequest>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState {
                next_id: 0,
                commands: Vec::new(),
            })),
            hotkeys,
            requests,
        }
    }

    pub fn hotkeys(&self) -> &HotkeyRegistry {
        &self.hotkeys
    }

    /// Register a command built from its parts
    pub fn add<R, F>(&self, name: &str, f: F, options: CommandOptions) -> Result<CommandId>
    where
        R: Into<ActionOutcome>,
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.register(CommandDefinition::new(name, f).with_options(options))
    }

    /// Validate and register a command definition
    pub fn register(&self, definition: CommandDefinition) -> Result<CommandId> {
        let CommandDefinition {
            name,
            action,
            options,
        } = definition;
        let name = name.filter(|n| !n.trim().is_empty());
        let (name, action) = match (name, action) {
            (Some(name), Some(action)) => (name, action),
            _ => return Err(CommandError::InvalidCommand),
        };
        let hotkey: Option<KeyCombo> = options.hotkey.as_deref().map(str::parse).transpose()?;
        let scope = options
            .scope
            .unwrap_or_else(|| self.hotkeys.active_element().current());

        let hotkey_token = hotkey.as_ref().map(|combo| {
            let binding = HotkeyOptions {
                global: options.global,
                allow_repeat: options.hotkey_options.allow_repeat,
                is_available: both(
                    options.is_available.clone(),
                    options.hotkey_options.is_available.clone(),
                ),
                scope: Some(scope),
                ..Default::default()
            };
            self.hotkeys
                .register(combo.clone(), self.hotkey_callback(&action), binding)
        });

        let mut state = self.state.lock();
        state.next_id += 1;
        let id = CommandId(state.next_id);
        debug!(%id, name = %name, %scope, hotkey = ?hotkey.as_ref().map(|c| c.to_string()), "Command registered");
        state.commands.push(Command {
            id,
            name,
            action,
            category: options.category,
            hotkey,
            scope,
            global: options.global,
            is_available: options.is_available,
            hotkey_token,
        });
        Ok(id)
    }

    fn hotkey_callback(&self, action: &CommandAction) -> HotkeyCallback {
        let action = Arc::clone(action);
        let requests = self.requests.clone();
        Arc::new(move || {
            if let ActionOutcome::Open(config) = action() {
                // Receiver gone means the service was dropped
                let _ = requests.send(PaletteRequest::Open(config));
            }
        })
    }

    /// Remove a command and its hotkey. Returns false when already removed.
    pub fn remove(&self, id: CommandId) -> bool {
        let removed = {
            let mut state = self.state.lock();
            state
                .commands
                .iter()
                .position(|c| c.id == id)
                .map(|idx| state.commands.remove(idx))
        };
        match removed {
            Some(command) => {
                if let Some(token) = command.hotkey_token {
                    self.hotkeys.unregister(token);
                }
                debug!(%id, name = %command.name, "Command removed");
                true
            }
            None => false,
        }
    }

    /// Remove every command owned by `scope`
    pub fn remove_scope(&self, scope: ScopeId) -> usize {
        let ids: Vec<CommandId> = {
            let state = self.state.lock();
            state
                .commands
                .iter()
                .filter(|c| c.scope == scope)
                .map(|c| c.id)
                .collect()
        };
        ids.into_iter().filter(|id| self.remove(*id)).count()
    }

    /// Commands added through the returned guard are removed when it drops
    pub fn scoped(&self, scope: ScopeId) -> ScopedCommands {
        ScopedCommands {
            registry: self.clone(),
            scope,
            ids: Vec::new(),
        }
    }

    pub fn get(&self, id: CommandId) -> Option<Command> {
        self.state.lock().commands.iter().find(|c| c.id == id).cloned()
    }

    /// Every command in registration order
    pub fn list(&self) -> Vec<Command> {
        self.state.lock().commands.clone()
    }

    /// Commands a palette opened over `owner` may list, in registration order
    pub fn visible(&self, owner: ScopeId) -> Vec<Command> {
        let candidates: Vec<Command> = {
            let state = self.state.lock();
            state
                .commands
                .iter()
                .filter(|c| c.visible_from(owner))
                .cloned()
                .collect()
        };
        // Predicates run unlocked; they may inspect the registry
        candidates.into_iter().filter(Command::available).collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().commands.is_empty()
    }

    /// Remove every command
    pub fn clear(&self) {
        let drained: Vec<Command> = std::mem::take(&mut self.state.lock().commands);
        for command in drained {
            if let Some(token) = command.hotkey_token {
                self.hotkeys.unregister(token);
            }
        }
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.len())
            .finish()
    }
}

fn both(first: Option<Availability>, second: Option<Availability>) -> Option<Availability> {
    match (first, second) {
        (Some(a), Some(b)) => Some(Arc::new(move || a() && b())),
        (a, b) => a.or(b),
    }
}

/// Commands tied to the lifetime of a UI scope
pub struct ScopedCommands {
    registry: CommandRegistry,
    scope: ScopeId,
    ids: Vec<CommandId>,
}

impl ScopedCommands {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn add<R, F>(&mut self, name: &str, f: F, options: CommandOptions) -> Result<CommandId>
    where
        R: Into<ActionOutcome>,
        F: Fn() -> R + Send + Sync + 'static,
    {
        let id = self
            .registry
            .add(name, f, options.with_scope(self.scope))?;
        self.ids.push(id);
        Ok(id)
    }

    pub fn ids(&self) -> &[CommandId] {
        &self.ids
    }
}

impl Drop for ScopedCommands {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            self.registry.remove(id);
        }
        debug!(scope = %self.scope, "Scoped commands released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette_hotkeys::{ActiveElement, KeyEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    fn setup() -> (CommandRegistry, mpsc::UnboundedReceiver<PaletteRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hotkeys = HotkeyRegistry::new(ActiveElement::new());
        (CommandRegistry::new(hotkeys, tx), rx)
    }

    #[test]
    fn test_rejects_missing_name_or_action() {
        let (registry, _rx) = setup();
        let err = registry
            .register(CommandDefinition::default().with_name("Nameless action"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "A Command must have a name and an action function"
        );
        assert!(matches!(
            registry.add("", || (), CommandOptions::default()),
            Err(CommandError::InvalidCommand)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_hotkey_is_rejected() {
        let (registry, _rx) = setup();
        let result = registry.add("Bad", || (), CommandOptions::default().with_hotkey("hyper+a"));
        assert!(matches!(result, Err(CommandError::Hotkey(_))));
        assert!(registry.hotkeys().is_empty());
    }

    #[test]
    fn test_hotkey_runs_action_and_remove_unbinds() {
        let (registry, _rx) = setup();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let id = registry
            .add(
                "Count",
                move || {
                    c.fetch_add(1, Ordering::SeqCst);
                },
                CommandOptions::default().with_hotkey("alt+c"),
            )
            .unwrap();

        registry.hotkeys().dispatch(&KeyEvent::press("alt+c").unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        registry.hotkeys().dispatch(&KeyEvent::press("alt+c").unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.hotkeys().is_empty());
    }

    #[test]
    fn test_hotkey_requires_both_predicates() {
        let (registry, _rx) = setup();
        let count = Arc::new(AtomicUsize::new(0));
        let cases = [("a", true, true), ("b", true, false), ("c", false, true)];
        for (key, command_ok, hotkey_ok) in cases {
            let c = Arc::clone(&count);
            registry
                .add(
                    key,
                    move || {
                        c.fetch_add(1, Ordering::SeqCst);
                    },
                    CommandOptions::default()
                        .with_hotkey(key)
                        .with_is_available(move || command_ok)
                        .with_hotkey_available(move || hotkey_ok),
                )
                .unwrap();
        }
        for key in ["a", "b", "c"] {
            registry.hotkeys().dispatch(&KeyEvent::press(key).unwrap());
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let listed: Vec<String> = registry
            .visible(ScopeId::ROOT)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(listed, vec!["a", "b"]);
    }

    #[test]
    fn test_nested_config_from_hotkey_is_requested() {
        let (registry, mut rx) = setup();
        registry
            .add(
                "Drill",
                || crate::types::PaletteConfig::new().with_search_value("x"),
                CommandOptions::default().with_hotkey("control+d"),
            )
            .unwrap();
        registry.hotkeys().dispatch(&KeyEvent::press("control+d").unwrap());
        match rx.try_recv() {
            Ok(PaletteRequest::Open(config)) => {
                assert_eq!(config.search_value.as_deref(), Some("x"))
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_scope_defaults_to_active_element() {
        let (registry, _rx) = setup();
        let active = registry.hotkeys().active_element().clone();
        let component = active.new_scope();
        let guard = active.activate(component);
        let id = registry.add("Inner", || (), CommandOptions::default()).unwrap();
        drop(guard);

        assert_eq!(registry.get(id).unwrap().scope, component);
        assert!(registry.visible(ScopeId::ROOT).is_empty());
        assert_eq!(registry.visible(component).len(), 1);
    }

    #[test]
    fn test_scoped_commands_released_on_drop() {
        let (registry, _rx) = setup();
        let scope = registry.hotkeys().active_element().new_scope();
        {
            let mut scoped = registry.scoped(scope);
            scoped
                .add("One", || (), CommandOptions::default().with_hotkey("1"))
                .unwrap();
            scoped.add("Two", || (), CommandOptions::default()).unwrap();
            assert_eq!(registry.len(), 2);
            assert_eq!(registry.hotkeys().len(), 1);
        }
        assert!(registry.is_empty());
        assert!(registry.hotkeys().is_empty());
    }
}
