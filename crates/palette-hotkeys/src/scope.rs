//! Active-element tracking
//!
//! The UI has one active element at a time: the innermost modal surface (a
//! dialog, the command palette, a focused subtree) or the document root when
//! nothing else claims it. Scoped hotkeys and commands only fire while their
//! owner is the active element.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Identifier of a UI scope that can own hotkeys and commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    /// The document root, active when nothing else is
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn is_root(&self) -> bool {
        *self == ScopeId::ROOT
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "root")
        } else {
            write!(f, "scope#{}", self.0)
        }
    }
}

#[derive(Debug, Default)]
struct ActiveState {
    next_scope: u64,
    next_entry: u64,
    /// (entry, scope) pairs in activation order; the last one is active
    stack: Vec<(u64, ScopeId)>,
}

/// Process-wide active-element pointer.
///
/// Cloning yields another handle to the same pointer.
#[derive(Debug, Clone, Default)]
pub struct ActiveElement {
    state: Arc<Mutex<ActiveState>>,
}

impl ActiveElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh scope identifier
    pub fn new_scope(&self) -> ScopeId {
        let mut state = self.state.lock();
        state.next_scope += 1;
        ScopeId(state.next_scope)
    }

    /// The scope that currently owns the UI
    pub fn current(&self) -> ScopeId {
        self.state
            .lock()
            .stack
            .last()
            .map(|(_, scope)| *scope)
            .unwrap_or(ScopeId::ROOT)
    }

    pub fn is_active(&self, scope: ScopeId) -> bool {
        self.current() == scope
    }

    /// Number of outstanding activations
    pub fn depth(&self) -> usize {
        self.state.lock().stack.len()
    }

    /// Make `scope` the active element until the returned guard is dropped.
    ///
    /// Dropping a guard removes its own activation only, so guards released
    /// out of order still leave the most recent surviving activation active.
    pub fn activate(&self, scope: ScopeId) -> ActiveGuard {
        let entry = {
            let mut state = self.state.lock();
            state.next_entry += 1;
            let entry = state.next_entry;
            state.stack.push((entry, scope));
            entry
        };
        debug!(%scope, entry, "Active element acquired");
        ActiveGuard {
            owner: self.clone(),
            entry,
            scope,
        }
    }

    fn release(&self, entry: u64) {
        let mut state = self.state.lock();
        state.stack.retain(|(e, _)| *e != entry);
        let current = state.stack.last().map(|(_, s)| *s).unwrap_or(ScopeId::ROOT);
        debug!(entry, %current, "Active element released");
    }
}

/// Activation of a scope; restores the previous active element on drop
#[derive(Debug)]
pub struct ActiveGuard {
    owner: ActiveElement,
    entry: u64,
    scope: ScopeId,
}

impl ActiveGuard {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.owner.release(self.entry);
    }
}
