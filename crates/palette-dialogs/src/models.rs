//! Dialog options and geometry

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an open dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DialogId(pub(crate) u64);

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogSize {
    Sm,
    Md,
    #[default]
    Lg,
    Xl,
}

impl DialogSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogSize::Sm => "sm",
            DialogSize::Md => "md",
            DialogSize::Lg => "lg",
            DialogSize::Xl => "xl",
        }
    }
}

impl fmt::Display for DialogSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Offset of a dialog from where it first appeared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub top: i32,
    pub left: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { top: 0, left: 0 };

    pub fn new(top: i32, left: i32) -> Self {
        Self { top, left }
    }
}

/// Pointer coordinates reported by the input source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    pub x: i32,
    pub y: i32,
}

impl Pointer {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Presentation options of a dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogOptions {
    pub title: Option<String>,
    pub size: DialogSize,
    /// Fullscreen dialogs are not draggable
    pub fullscreen: bool,
    pub header: bool,
    pub footer: bool,
    pub dismiss_on_outside_click: bool,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            title: None,
            size: DialogSize::Lg,
            fullscreen: false,
            header: true,
            footer: true,
            dismiss_on_outside_click: false,
        }
    }
}

impl DialogOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_size(mut self, size: DialogSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_footer(mut self, footer: bool) -> Self {
        self.footer = footer;
        self
    }

    pub fn with_dismiss_on_outside_click(mut self, dismiss: bool) -> Self {
        self.dismiss_on_outside_click = dismiss;
        self
    }
}

/// Callback run once on a dialog's close or dismiss path
pub type DialogCallback = Box<dyn FnOnce() + Send>;

/// Close and dismiss callbacks of one dialog
#[derive(Default)]
pub struct DialogHandlers {
    pub(crate) close: Option<DialogCallback>,
    pub(crate) dismiss: Option<DialogCallback>,
}

impl DialogHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_close(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.close = Some(Box::new(f));
        self
    }

    pub fn on_dismiss(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.dismiss = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for DialogHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogHandlers")
            .field("close", &self.close.is_some())
            .field("dismiss", &self.dismiss.is_some())
            .finish()
    }
}
