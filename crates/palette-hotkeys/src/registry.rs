//! Hotkey registry with scoped dispatch

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::conflict::ConflictDetector;
use crate::error::ParseError;
use crate::models::{KeyCombo, KeyEvent};
use crate::platform::HotkeyDisplay;
use crate::scope::{ActiveElement, ScopeId};

/// Callback run when a binding fires
pub type HotkeyCallback = Arc<dyn Fn() + Send + Sync>;

/// Predicate consulted at dispatch time
pub type Availability = Arc<dyn Fn() -> bool + Send + Sync>;

/// Handle returned by [`HotkeyRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HotkeyToken(u64);

impl fmt::Display for HotkeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hotkey#{}", self.0)
    }
}

/// Options for a single binding
#[derive(Clone, Default)]
pub struct HotkeyOptions {
    /// Fire regardless of the active element
    pub global: bool,
    /// Fire on hardware auto-repeat events too
    pub allow_repeat: bool,
    pub is_available: Option<Availability>,
    /// Owning scope; the active element at registration time when unset
    pub scope: Option<ScopeId>,
    /// Bare-key binding triggered through the overlay modifier
    pub overlay: bool,
    /// Human label, used when the binding is listed in the palette
    pub label: Option<String>,
    pub category: Option<String>,
}

impl HotkeyOptions {
    pub fn global() -> Self {
        HotkeyOptions {
            global: true,
            ..Default::default()
        }
    }

    pub fn with_global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn with_allow_repeat(mut self, allow_repeat: bool) -> Self {
        self.allow_repeat = allow_repeat;
        self
    }

    pub fn with_is_available(mut self, predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.is_available = Some(Arc::new(predicate));
        self
    }

    pub fn with_scope(mut self, scope: ScopeId) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_overlay(mut self, overlay: bool) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl fmt::Debug for HotkeyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyOptions")
            .field("global", &self.global)
            .field("allow_repeat", &self.allow_repeat)
            .field("is_available", &self.is_available.is_some())
            .field("scope", &self.scope)
            .field("overlay", &self.overlay)
            .field("label", &self.label)
            .field("category", &self.category)
            .finish()
    }
}

/// Read-only snapshot of a registered binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    pub token: HotkeyToken,
    /// Combo as registered
    pub combo: KeyCombo,
    /// Combo that actually triggers the binding (overlay modifier applied)
    pub trigger: KeyCombo,
    pub scope: ScopeId,
    pub global: bool,
    pub overlay: bool,
    pub label: Option<String>,
    pub category: Option<String>,
}

struct Binding {
    token: HotkeyToken,
    combo: KeyCombo,
    callback: HotkeyCallback,
    is_available: Option<Availability>,
    allow_repeat: bool,
    global: bool,
    scope: ScopeId,
    overlay: bool,
    label: Option<String>,
    category: Option<String>,
}

impl Binding {
    fn trigger(&self, display: &HotkeyDisplay) -> KeyCombo {
        if self.overlay {
            display.overlay_combo(&self.combo)
        } else {
            self.combo.clone()
        }
    }

    fn info(&self, display: &HotkeyDisplay) -> BindingInfo {
        BindingInfo {
            token: self.token,
            combo: self.combo.clone(),
            trigger: self.trigger(display),
            scope: self.scope,
            global: self.global,
            overlay: self.overlay,
            label: self.label.clone(),
            category: self.category.clone(),
        }
    }
}

struct RegistryState {
    next_token: u64,
    /// Registration order is dispatch order
    bindings: Vec<Binding>,
    display: HotkeyDisplay,
}

/// Outcome of a dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Bindings whose callback ran, in the order they ran
    pub fired: Vec<HotkeyToken>,
    /// Bindings that matched but were suppressed as auto-repeat
    pub suppressed_repeats: usize,
}

impl DispatchOutcome {
    pub fn handled(&self) -> bool {
        !self.fired.is_empty()
    }
}

/// Process-scoped table of hotkey bindings.
///
/// Cloning yields another handle to the same table.
#[derive(Clone)]
pub struct HotkeyRegistry {
    state: Arc<Mutex<RegistryState>>,
    active: ActiveElement,
}

impl HotkeyRegistry {
    pub fn new(active: ActiveElement) -> Self {
        Self::with_display(active, HotkeyDisplay::default())
    }

    pub fn with_display(active: ActiveElement, display: HotkeyDisplay) -> Self {
        HotkeyRegistry {
            state: Arc::new(Mutex::new(RegistryState {
                next_token: 0,
                bindings: Vec::new(),
                display,
            })),
            active,
        }
    }

    pub fn active_element(&self) -> &ActiveElement {
        &self.active
    }

    pub fn display(&self) -> HotkeyDisplay {
        self.state.lock().display.clone()
    }

    pub fn set_display(&self, display: HotkeyDisplay) {
        self.state.lock().display = display;
    }

    /// Register a binding and return its unregister token
    pub fn register(
        &self,
        combo: KeyCombo,
        callback: HotkeyCallback,
        options: HotkeyOptions,
    ) -> HotkeyToken {
        let scope = options.scope.unwrap_or_else(|| self.active.current());
        let mut state = self.state.lock();
        state.next_token += 1;
        let token = HotkeyToken(state.next_token);

        let binding = Binding {
            token,
            combo,
            callback,
            is_available: options.is_available,
            allow_repeat: options.allow_repeat,
            global: options.global,
            scope,
            overlay: options.overlay,
            label: options.label,
            category: options.category,
        };
        let trigger = binding.trigger(&state.display);

        let claimed_by = state.bindings.iter().find(|b| {
            b.global == binding.global
                && (binding.global || b.scope == binding.scope)
                && b.trigger(&state.display) == trigger
        });
        if let Some(existing) = claimed_by {
            warn!(
                %trigger,
                %scope,
                existing = %existing.token,
                new = %token,
                "Hotkey already claimed in this scope"
            );
        }

        debug!(%token, %trigger, %scope, global = binding.global, "Hotkey registered");
        state.bindings.push(binding);
        token
    }

    /// Parse `combo` and register it
    pub fn bind(
        &self,
        combo: &str,
        callback: impl Fn() + Send + Sync + 'static,
        options: HotkeyOptions,
    ) -> Result<HotkeyToken, ParseError> {
        let combo: KeyCombo = combo.parse()?;
        Ok(self.register(combo, Arc::new(callback), options))
    }

    /// Remove a binding. Returns false when the token was already gone.
    pub fn unregister(&self, token: HotkeyToken) -> bool {
        let mut state = self.state.lock();
        let before = state.bindings.len();
        state.bindings.retain(|b| b.token != token);
        let removed = state.bindings.len() != before;
        if removed {
            debug!(%token, "Hotkey unregistered");
        }
        removed
    }

    /// Run every enabled binding matching `event`, in registration order.
    ///
    /// Scoped bindings only match while their scope is the active element.
    /// Callbacks run after the table lock is released, so they may register
    /// or unregister bindings themselves.
    pub fn dispatch(&self, event: &KeyEvent) -> DispatchOutcome {
        let current = self.active.current();
        let mut outcome = DispatchOutcome::default();

        let candidates: Vec<(HotkeyToken, HotkeyCallback, Option<Availability>)> = {
            let state = self.state.lock();
            state
                .bindings
                .iter()
                .filter(|b| b.trigger(&state.display) == event.combo)
                .filter(|b| b.global || b.scope == current)
                .filter(|b| {
                    if event.repeat && !b.allow_repeat {
                        outcome.suppressed_repeats += 1;
                        false
                    } else {
                        true
                    }
                })
                .map(|b| (b.token, Arc::clone(&b.callback), b.is_available.clone()))
                .collect()
        };

        for (token, callback, is_available) in candidates {
            // An earlier callback may have unregistered this binding
            if !self.state.lock().bindings.iter().any(|b| b.token == token) {
                debug!(%token, "Hotkey unregistered during dispatch, skipped");
                continue;
            }
            if let Some(predicate) = is_available {
                if !predicate() {
                    debug!(%token, "Hotkey unavailable, skipped");
                    continue;
                }
            }
            callback();
            outcome.fired.push(token);
        }

        debug!(
            combo = %event.combo,
            repeat = event.repeat,
            fired = outcome.fired.len(),
            "Hotkey dispatched"
        );
        outcome
    }

    /// Run a binding's callback directly, bypassing key matching.
    ///
    /// Availability is still honoured. Returns false when the binding is gone
    /// or unavailable.
    pub fn trigger(&self, token: HotkeyToken) -> bool {
        let found = {
            let state = self.state.lock();
            state
                .bindings
                .iter()
                .find(|b| b.token == token)
                .map(|b| (Arc::clone(&b.callback), b.is_available.clone()))
        };
        match found {
            Some((callback, is_available)) => {
                if is_available.map(|p| p()).unwrap_or(true) {
                    callback();
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Whether the binding's availability predicate currently holds
    pub fn is_available(&self, token: HotkeyToken) -> bool {
        let predicate = {
            let state = self.state.lock();
            match state.bindings.iter().find(|b| b.token == token) {
                Some(binding) => binding.is_available.clone(),
                None => return false,
            }
        };
        predicate.map(|p| p()).unwrap_or(true)
    }

    pub fn get(&self, token: HotkeyToken) -> Option<BindingInfo> {
        let state = self.state.lock();
        state
            .bindings
            .iter()
            .find(|b| b.token == token)
            .map(|b| b.info(&state.display))
    }

    /// Snapshot of every binding in registration order
    pub fn bindings(&self) -> Vec<BindingInfo> {
        let state = self.state.lock();
        state
            .bindings
            .iter()
            .map(|b| b.info(&state.display))
            .collect()
    }

    /// Labelled overlay bindings owned by `scope`, in registration order
    pub fn overlay_items(&self, scope: ScopeId) -> Vec<BindingInfo> {
        let state = self.state.lock();
        state
            .bindings
            .iter()
            .filter(|b| b.overlay && b.label.is_some() && (b.global || b.scope == scope))
            .map(|b| b.info(&state.display))
            .collect()
    }

    /// Whether any binding would match `combo` in the current active scope
    pub fn is_bound(&self, combo: &KeyCombo) -> bool {
        let current = self.active.current();
        let state = self.state.lock();
        state
            .bindings
            .iter()
            .any(|b| (b.global || b.scope == current) && &b.trigger(&state.display) == combo)
    }

    /// (combo, scope) pairs claimed by more than one binding
    pub fn conflicts(&self) -> Vec<crate::conflict::Conflict> {
        ConflictDetector::detect(&self.bindings())
    }

    pub fn len(&self) -> usize {
        self.state.lock().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().bindings.is_empty()
    }

    pub fn clear(&self) {
        self.state.lock().bindings.clear();
    }
}

impl fmt::Debug for HotkeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyRegistry")
            .field("bindings", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_register_and_dispatch() {
        let registry = HotkeyRegistry::new(ActiveElement::new());
        let (count, cb) = counter();
        registry.bind("a", cb, HotkeyOptions::default()).unwrap();

        let outcome = registry.dispatch(&KeyEvent::press("a").unwrap());
        assert!(outcome.handled());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        registry.dispatch(&KeyEvent::press("b").unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_case_and_order_insensitive_match() {
        let registry = HotkeyRegistry::new(ActiveElement::new());
        let (count, cb) = counter();
        registry
            .bind("control+alt+E", cb, HotkeyOptions::default())
            .unwrap();
        registry.dispatch(&KeyEvent::press("Alt+Control+e").unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = HotkeyRegistry::new(ActiveElement::new());
        let (count, cb) = counter();
        let token = registry.bind("a", cb, HotkeyOptions::default()).unwrap();
        assert!(registry.unregister(token));
        assert!(!registry.unregister(token));
        registry.dispatch(&KeyEvent::press("a").unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_repeat_suppression() {
        let registry = HotkeyRegistry::new(ActiveElement::new());
        let (held, cb_held) = counter();
        let (plain, cb_plain) = counter();
        registry
            .bind("a", cb_held, HotkeyOptions::default().with_allow_repeat(true))
            .unwrap();
        registry.bind("b", cb_plain, HotkeyOptions::default()).unwrap();

        registry.dispatch(&KeyEvent::press("a").unwrap());
        registry.dispatch(&KeyEvent::repeated("a").unwrap());
        registry.dispatch(&KeyEvent::repeated("a").unwrap());
        registry.dispatch(&KeyEvent::press("b").unwrap());
        let outcome = registry.dispatch(&KeyEvent::repeated("b").unwrap());

        assert_eq!(held.load(Ordering::SeqCst), 3);
        assert_eq!(plain.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.suppressed_repeats, 1);
    }

    #[test]
    fn test_unavailable_binding_is_skipped() {
        let registry = HotkeyRegistry::new(ActiveElement::new());
        let (count, cb) = counter();
        registry
            .bind("a", cb, HotkeyOptions::default().with_is_available(|| false))
            .unwrap();
        let outcome = registry.dispatch(&KeyEvent::press("a").unwrap());
        assert!(!outcome.handled());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_scoped_binding_follows_active_element() {
        let active = ActiveElement::new();
        let registry = HotkeyRegistry::new(active.clone());
        let (scoped, cb_scoped) = counter();
        let (global, cb_global) = counter();
        registry.bind("b", cb_scoped, HotkeyOptions::default()).unwrap();
        registry.bind("a", cb_global, HotkeyOptions::global()).unwrap();

        let dialog = active.new_scope();
        let guard = active.activate(dialog);
        registry.dispatch(&KeyEvent::press("a").unwrap());
        registry.dispatch(&KeyEvent::press("b").unwrap());
        assert_eq!(global.load(Ordering::SeqCst), 1);
        assert_eq!(scoped.load(Ordering::SeqCst), 0);

        drop(guard);
        registry.dispatch(&KeyEvent::press("b").unwrap());
        assert_eq!(scoped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_all_matching_bindings_fire_in_order() {
        let registry = HotkeyRegistry::new(ActiveElement::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second"] {
            let order = Arc::clone(&order);
            registry
                .bind("x", move || order.lock().push(name), HotkeyOptions::default())
                .unwrap();
        }
        let outcome = registry.dispatch(&KeyEvent::press("x").unwrap());
        assert_eq!(outcome.fired.len(), 2);
        assert_eq!(*order.lock(), vec!["first", "second"]);
        assert_eq!(registry.conflicts().len(), 1);
    }

    #[test]
    fn test_overlay_binding_uses_overlay_modifier() {
        let registry = HotkeyRegistry::new(ActiveElement::new());
        let (count, cb) = counter();
        let token = registry
            .bind(
                "f",
                cb,
                HotkeyOptions::default().with_overlay(true).with_label("Click"),
            )
            .unwrap();

        registry.dispatch(&KeyEvent::press("f").unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        registry.dispatch(&KeyEvent::press("alt+f").unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let info = registry.get(token).unwrap();
        assert_eq!(info.trigger.to_string(), "alt+f");
        assert_eq!(registry.overlay_items(ScopeId::ROOT).len(), 1);
    }

    #[test]
    fn test_callback_may_unregister_itself() {
        let registry = HotkeyRegistry::new(ActiveElement::new());
        let slot: Arc<Mutex<Option<HotkeyToken>>> = Arc::new(Mutex::new(None));
        let inner_registry = registry.clone();
        let inner_slot = Arc::clone(&slot);
        let token = registry
            .bind(
                "q",
                move || {
                    if let Some(token) = *inner_slot.lock() {
                        inner_registry.unregister(token);
                    }
                },
                HotkeyOptions::default(),
            )
            .unwrap();
        *slot.lock() = Some(token);

        registry.dispatch(&KeyEvent::press("q").unwrap());
        assert!(registry.is_empty());
    }
}
