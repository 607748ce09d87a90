//! Platform detection and human-readable hotkey display

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ParseError;
use crate::models::{Key, KeyCombo, Modifier};

/// Operating-system family, as far as hotkey display is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    Other,
}

impl Platform {
    /// Platform of the running process
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }

    /// Platform advertised by a browser-style user agent string
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.to_lowercase().contains("mac") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }

    pub fn is_mac(&self) -> bool {
        matches!(self, Platform::Mac)
    }

    /// Label shown for a modifier on this platform.
    ///
    /// On Mac the physical Control key is shown as COMMAND and Alt is shown
    /// as CONTROL.
    pub fn modifier_label(&self, modifier: Modifier) -> &'static str {
        match (self, modifier) {
            (Platform::Mac, Modifier::Alt) => "CONTROL",
            (Platform::Mac, Modifier::Control) => "COMMAND",
            (Platform::Mac, Modifier::Command) => "COMMAND",
            (Platform::Other, Modifier::Alt) => "ALT",
            (Platform::Other, Modifier::Control) => "CONTROL",
            (Platform::Other, Modifier::Command) => "META",
            (_, Modifier::Shift) => "SHIFT",
        }
    }
}

impl FromStr for Platform {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mac" | "macos" => Ok(Platform::Mac),
            "other" | "linux" | "windows" => Ok(Platform::Other),
            _ => Err(ParseError::UnknownPlatform(s.to_string())),
        }
    }
}

/// Parse a `+`-joined list of modifiers such as `"alt+control"`
pub fn parse_modifiers(s: &str) -> Result<Vec<Modifier>, ParseError> {
    let mut modifiers = s
        .split('+')
        .map(Modifier::from_str)
        .collect::<Result<Vec<_>, _>>()?;
    modifiers.sort();
    modifiers.dedup();
    Ok(modifiers)
}

/// Formats combos for people, following the platform's conventions and the
/// configured overlay modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyDisplay {
    platform: Platform,
    overlay_modifier: Vec<Modifier>,
}

impl HotkeyDisplay {
    pub fn new(platform: Platform, overlay_modifier: Vec<Modifier>) -> Self {
        HotkeyDisplay {
            platform,
            overlay_modifier,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn overlay_modifier(&self) -> &[Modifier] {
        &self.overlay_modifier
    }

    /// `"alt+control+e"` becomes `"ALT + CONTROL + E"` elsewhere and
    /// `"CONTROL + COMMAND + E"` on Mac
    pub fn format(&self, combo: &KeyCombo) -> String {
        combo
            .modifiers()
            .iter()
            .map(|m| self.platform.modifier_label(*m).to_string())
            .chain(std::iter::once(key_label(combo.key())))
            .collect::<Vec<_>>()
            .join(" + ")
    }

    /// Combo that triggers an overlay binding registered on `key`
    pub fn overlay_combo(&self, key: &KeyCombo) -> KeyCombo {
        key.with_modifiers(&self.overlay_modifier)
    }
}

impl Default for HotkeyDisplay {
    fn default() -> Self {
        HotkeyDisplay::new(Platform::detect(), vec![Modifier::Alt])
    }
}

fn key_label(key: &Key) -> String {
    key.token().to_uppercase()
}
