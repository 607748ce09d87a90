//! Stack of open modal dialogs
//!
//! Each open dialog owns an activation of the shared [`ActiveElement`], so
//! scoped hotkeys only reach the topmost dialog. Closing any dialog, in any
//! order, restores whatever was active before it.

use palette_hotkeys::{ActiveElement, ActiveGuard, Key, KeyEvent, Modifier, ScopeId};
use std::fmt;
use tracing::debug;

use crate::error::{DialogError, Result};
use crate::models::{DialogHandlers, DialogId, DialogOptions, Pointer, Position};

struct DialogSession<C> {
    id: DialogId,
    content: C,
    options: DialogOptions,
    handlers: DialogHandlers,
    position: Position,
    z_order: u32,
    guard: ActiveGuard,
}

struct Drag {
    id: DialogId,
    origin: Pointer,
    start: Position,
}

/// Open dialogs in open order; the last one is on top
pub struct DialogStack<C = String> {
    active: ActiveElement,
    sessions: Vec<DialogSession<C>>,
    next_id: u64,
    next_z: u32,
    drag: Option<Drag>,
}

impl<C> DialogStack<C> {
    pub fn new(active: ActiveElement) -> Self {
        Self {
            active,
            sessions: Vec::new(),
            next_id: 0,
            next_z: 0,
            drag: None,
        }
    }

    pub fn active_element(&self) -> &ActiveElement {
        &self.active
    }

    /// Open a dialog on top of the stack and make it the active element
    pub fn open(&mut self, content: C, options: DialogOptions, handlers: DialogHandlers) -> DialogId {
        self.next_id += 1;
        self.next_z += 1;
        let id = DialogId(self.next_id);
        let scope = self.active.new_scope();
        let guard = self.active.activate(scope);
        debug!(%id, %scope, size = %options.size, "Dialog opened");
        self.sessions.push(DialogSession {
            id,
            content,
            options,
            handlers,
            position: Position::ORIGIN,
            z_order: self.next_z,
            guard,
        });
        id
    }

    fn index(&self, id: DialogId) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    fn session(&self, id: DialogId) -> Result<&DialogSession<C>> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .ok_or(DialogError::NotFound(id))
    }

    /// Run the close callback, then remove the dialog.
    ///
    /// Returns false when the dialog is already gone.
    pub fn close(&mut self, id: DialogId) -> bool {
        let close = match self.index(id) {
            Some(idx) => self.sessions[idx].handlers.close.take(),
            None => return false,
        };
        if let Some(close) = close {
            close();
        }
        self.remove(id);
        true
    }

    /// Dismiss path: the dismiss callback, then the close path
    pub fn dismiss(&mut self, id: DialogId) -> bool {
        let dismiss = match self.index(id) {
            Some(idx) => self.sessions[idx].handlers.dismiss.take(),
            None => return false,
        };
        debug!(%id, "Dialog dismissed");
        if let Some(dismiss) = dismiss {
            dismiss();
        }
        self.close(id)
    }

    fn remove(&mut self, id: DialogId) {
        if let Some(idx) = self.index(id) {
            let session = self.sessions.remove(idx);
            if self.drag.as_ref().map(|d| d.id) == Some(id) {
                self.drag = None;
            }
            // Dropping the guard restores the previous active element
            drop(session.guard);
            debug!(%id, active = %self.active.current(), "Dialog removed");
        }
    }

    /// Close every dialog, topmost first
    pub fn close_all(&mut self) {
        while let Some(id) = self.top() {
            self.close(id);
        }
    }

    /// Keys for the topmost dialog: Escape dismisses, Control+Enter closes
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        let top = match self.top() {
            Some(id) => id,
            None => return false,
        };
        if event.repeat {
            return false;
        }
        let combo = &event.combo;
        match (combo.modifiers(), combo.key()) {
            ([], Key::Escape) => self.dismiss(top),
            ([Modifier::Control], Key::Enter) => self.close(top),
            _ => false,
        }
    }

    /// Click outside the topmost dialog
    pub fn outside_click(&mut self) -> bool {
        match self.top() {
            Some(id) if self.sessions.last().map(|s| s.options.dismiss_on_outside_click) == Some(true) => {
                self.dismiss(id)
            }
            _ => false,
        }
    }

    pub fn begin_drag(&mut self, id: DialogId, pointer: Pointer) -> Result<()> {
        let session = self.session(id)?;
        if session.options.fullscreen {
            return Err(DialogError::NotDraggable(id));
        }
        self.drag = Some(Drag {
            id,
            origin: pointer,
            start: session.position,
        });
        Ok(())
    }

    /// Move the dragged dialog by the pointer's offset from the drag origin
    pub fn drag_to(&mut self, pointer: Pointer) -> Result<Position> {
        let drag = self.drag.as_ref().ok_or(DialogError::NotDragging)?;
        let id = drag.id;
        let position = Position {
            top: drag
                .start
                .top
                .saturating_add(pointer.y.saturating_sub(drag.origin.y)),
            left: drag
                .start
                .left
                .saturating_add(pointer.x.saturating_sub(drag.origin.x)),
        };
        let idx = self.index(id).ok_or(DialogError::NotFound(id))?;
        self.sessions[idx].position = position;
        Ok(position)
    }

    pub fn end_drag(&mut self) -> Result<Position> {
        let drag = self.drag.take().ok_or(DialogError::NotDragging)?;
        Ok(self.session(drag.id)?.position)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Viewport resize: every dialog back to the origin, drag abandoned
    pub fn resize(&mut self) {
        for session in &mut self.sessions {
            session.position = Position::ORIGIN;
        }
        self.drag = None;
        debug!(dialogs = self.sessions.len(), "Dialog positions reset");
    }

    pub fn top(&self) -> Option<DialogId> {
        self.sessions.last().map(|s| s.id)
    }

    /// Dialog ids in open order
    pub fn ids(&self) -> Vec<DialogId> {
        self.sessions.iter().map(|s| s.id).collect()
    }

    pub fn is_open(&self, id: DialogId) -> bool {
        self.index(id).is_some()
    }

    pub fn position(&self, id: DialogId) -> Result<Position> {
        Ok(self.session(id)?.position)
    }

    pub fn z_order(&self, id: DialogId) -> Result<u32> {
        Ok(self.session(id)?.z_order)
    }

    pub fn options(&self, id: DialogId) -> Result<&DialogOptions> {
        Ok(&self.session(id)?.options)
    }

    pub fn content(&self, id: DialogId) -> Result<&C> {
        Ok(&self.session(id)?.content)
    }

    /// Scope the dialog activated; owner of its scoped hotkeys
    pub fn scope(&self, id: DialogId) -> Result<ScopeId> {
        Ok(self.session(id)?.guard.scope())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<C> fmt::Debug for DialogStack<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogStack")
            .field("ids", &self.ids())
            .field("dragging", &self.drag.as_ref().map(|d| d.id))
            .finish()
    }
}
