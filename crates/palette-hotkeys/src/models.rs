//! Core data models for hotkeys

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A keyboard modifier.
///
/// The declaration order is the canonical order used when a combo is
/// normalized and displayed: alt, control, shift, command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Alt,
    Control,
    Shift,
    Command,
}

impl Modifier {
    /// Canonical lowercase token
    pub fn token(&self) -> &'static str {
        match self {
            Modifier::Alt => "alt",
            Modifier::Control => "control",
            Modifier::Shift => "shift",
            Modifier::Command => "command",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Modifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alt" | "option" => Ok(Modifier::Alt),
            "ctrl" | "control" => Ok(Modifier::Control),
            "shift" => Ok(Modifier::Shift),
            "meta" | "cmd" | "command" => Ok(Modifier::Command),
            _ => Err(ParseError::InvalidModifier(s.to_string())),
        }
    }
}

/// A key on the keyboard
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    F(u8),
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Space,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Character keys folded to lowercase; other keys unchanged
    pub fn normalized(self) -> Key {
        match self {
            Key::Char(c) => {
                let mut lower = c.to_lowercase();
                match (lower.next(), lower.next()) {
                    (Some(l), None) => Key::Char(l),
                    _ => Key::Char(c),
                }
            }
            other => other,
        }
    }

    /// Canonical lowercase token
    pub fn token(&self) -> String {
        match self {
            Key::Char(c) => c.to_string(),
            Key::F(n) => format!("f{}", n),
            Key::Enter => "enter".to_string(),
            Key::Escape => "escape".to_string(),
            Key::Tab => "tab".to_string(),
            Key::Backspace => "backspace".to_string(),
            Key::Delete => "delete".to_string(),
            Key::Space => "space".to_string(),
            Key::Home => "home".to_string(),
            Key::End => "end".to_string(),
            Key::PageUp => "pageup".to_string(),
            Key::PageDown => "pagedown".to_string(),
            Key::Up => "arrowup".to_string(),
            Key::Down => "arrowdown".to_string(),
            Key::Left => "arrowleft".to_string(),
            Key::Right => "arrowright".to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl FromStr for Key {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "" => Err(ParseError::EmptyCombo),
            "enter" | "return" => Ok(Key::Enter),
            "escape" | "esc" => Ok(Key::Escape),
            "tab" => Ok(Key::Tab),
            "backspace" | "bksp" => Ok(Key::Backspace),
            "delete" | "del" => Ok(Key::Delete),
            "space" | " " => Ok(Key::Space),
            "home" => Ok(Key::Home),
            "end" => Ok(Key::End),
            "pageup" | "page_up" => Ok(Key::PageUp),
            "pagedown" | "page_down" => Ok(Key::PageDown),
            "up" | "arrowup" => Ok(Key::Up),
            "down" | "arrowdown" => Ok(Key::Down),
            "left" | "arrowleft" => Ok(Key::Left),
            "right" | "arrowright" => Ok(Key::Right),
            s if s.starts_with('f') && s.len() > 1 => {
                let num: u8 = s[1..].parse().map_err(|_| {
                    ParseError::InvalidKeySyntax(format!("Invalid function key: {}", s))
                })?;
                if (1..=12).contains(&num) {
                    Ok(Key::F(num))
                } else {
                    Err(ParseError::InvalidKeySyntax(format!(
                        "Function key must be F1-F12, got: {}",
                        s
                    )))
                }
            }
            s => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Key::Char(c)),
                    _ => Err(ParseError::InvalidKeySyntax(format!("Unknown key: {}", s))),
                }
            }
        }
    }
}

/// A normalized key combination: a sorted, de-duplicated modifier set plus
/// one base key.
///
/// Two combos written with different modifier order or casing compare equal:
/// `"Control+Alt+E"` and `"alt+control+e"` parse to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCombo {
    modifiers: Vec<Modifier>,
    key: Key,
}

impl KeyCombo {
    pub fn new(modifiers: impl IntoIterator<Item = Modifier>, key: Key) -> Self {
        let mut modifiers: Vec<Modifier> = modifiers.into_iter().collect();
        modifiers.sort();
        modifiers.dedup();
        KeyCombo {
            modifiers,
            key: key.normalized(),
        }
    }

    /// A combo made of a single key without modifiers
    pub fn bare(key: Key) -> Self {
        KeyCombo {
            modifiers: Vec::new(),
            key: key.normalized(),
        }
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn has_modifiers(&self) -> bool {
        !self.modifiers.is_empty()
    }

    /// Returns this combo with extra modifiers added
    pub fn with_modifiers(&self, extra: &[Modifier]) -> Self {
        KeyCombo::new(
            self.modifiers.iter().chain(extra.iter()).copied(),
            self.key.clone(),
        )
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier)?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for KeyCombo {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyCombo);
        }

        // A trailing "++" means the base key is '+' itself
        let (body, plus_key) = match trimmed.strip_suffix("++") {
            Some(rest) => (rest, true),
            None if trimmed == "+" => ("", true),
            None => (trimmed, false),
        };

        let mut parts: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('+').collect()
        };

        let key = if plus_key {
            Key::Char('+')
        } else {
            let last = parts.pop().ok_or(ParseError::EmptyCombo)?;
            Key::from_str(last)?
        };

        let modifiers = parts
            .iter()
            .map(|part| Modifier::from_str(part))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(KeyCombo::new(modifiers, key))
    }
}

impl TryFrom<String> for KeyCombo {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        KeyCombo::from_str(&value)
    }
}

impl From<KeyCombo> for String {
    fn from(combo: KeyCombo) -> Self {
        combo.to_string()
    }
}

/// A key-down event delivered by the keyboard-event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub combo: KeyCombo,
    /// Hardware auto-repeat of a held key
    pub repeat: bool,
}

impl KeyEvent {
    pub fn new(combo: KeyCombo, repeat: bool) -> Self {
        KeyEvent { combo, repeat }
    }

    /// A discrete key press
    pub fn press(combo: &str) -> Result<Self, ParseError> {
        Ok(KeyEvent::new(combo.parse()?, false))
    }

    /// An auto-repeat event for a held key
    pub fn repeated(combo: &str) -> Result<Self, ParseError> {
        Ok(KeyEvent::new(combo.parse()?, true))
    }
}
