//! Keyboard event types for input handling
//!
//! These types abstract over whatever the scripting host hands us for key
//! presses, so the registry and scripts never see host-specific key enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A keyboard event representing a key press, release, or repeat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardEvent {
    /// The key that was pressed
    pub key: KeyCode,
    /// Modifier keys that were held during the event
    pub modifiers: KeyModifiers,
    /// The kind of keyboard event (press, release, or repeat)
    pub kind: KeyEventKind,
}

/// Represents a key on the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyCode {
    /// A character key (a-z, 0-9, symbols, etc.)
    Char(char),
    /// Numeric keypad keys 0-9
    NumPad(u8),
    /// Enter/Return key
    Enter,
    /// Tab key
    Tab,
    /// Backspace key
    Backspace,
    /// Escape key
    Escape,
    /// Delete key
    Delete,
    /// Insert key
    Insert,
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up key
    PageUp,
    /// Page Down key
    PageDown,
    /// Up arrow key
    Up,
    /// Down arrow key
    Down,
    /// Left arrow key
    Left,
    /// Right arrow key
    Right,
    /// Function keys F1-F24
    F(u8),
    /// Null/Unknown key
    Null,
}

/// Modifier keys that can be held during a keyboard event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    /// Control key is held
    pub ctrl: bool,
    /// Alt/Option key is held
    pub alt: bool,
    /// Shift key is held
    pub shift: bool,
}

/// The kind of keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    /// Key was pressed
    Press,
    /// Key was released
    Release,
    /// Key is being held (repeat event)
    Repeat,
}

/// Error returned when a key name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key name: {0:?}")]
pub struct KeyParseError(pub String);

impl KeyboardEvent {
    /// Create a new keyboard event
    pub fn new(key: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> Self {
        Self {
            key,
            modifiers,
            kind,
        }
    }

    /// Create a keyboard event for a key press with no modifiers
    pub fn key_press(key: KeyCode) -> Self {
        Self::new(key, KeyModifiers::default(), KeyEventKind::Press)
    }

    /// Create a keyboard event for a key release with no modifiers
    pub fn key_release(key: KeyCode) -> Self {
        Self::new(key, KeyModifiers::default(), KeyEventKind::Release)
    }

    /// Create a keyboard event for a character release with no modifiers
    pub fn char_release(c: char) -> Self {
        Self::key_release(KeyCode::Char(c))
    }
}

impl KeyModifiers {
    /// Create a new set of modifiers with all modifiers set to false
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no modifiers are active
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(' ') => write!(f, "space"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::NumPad(n) => write!(f, "numpad{}", n),
            KeyCode::Enter => write!(f, "enter"),
            KeyCode::Tab => write!(f, "tab"),
            KeyCode::Backspace => write!(f, "backspace"),
            KeyCode::Escape => write!(f, "escape"),
            KeyCode::Delete => write!(f, "delete"),
            KeyCode::Insert => write!(f, "insert"),
            KeyCode::Home => write!(f, "home"),
            KeyCode::End => write!(f, "end"),
            KeyCode::PageUp => write!(f, "pageup"),
            KeyCode::PageDown => write!(f, "pagedown"),
            KeyCode::Up => write!(f, "up"),
            KeyCode::Down => write!(f, "down"),
            KeyCode::Left => write!(f, "left"),
            KeyCode::Right => write!(f, "right"),
            KeyCode::F(n) => write!(f, "f{}", n),
            KeyCode::Null => write!(f, "null"),
        }
    }
}

impl FromStr for KeyCode {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(KeyCode::Char(c.to_ascii_lowercase()));
        }

        let name = s.trim().to_ascii_lowercase();
        let key = match name.as_str() {
            "space" => KeyCode::Char(' '),
            "enter" | "return" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" | "back" => KeyCode::Backspace,
            "escape" | "esc" => KeyCode::Escape,
            "delete" | "del" => KeyCode::Delete,
            "insert" | "ins" => KeyCode::Insert,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "prior" => KeyCode::PageUp,
            "pagedown" | "next" => KeyCode::PageDown,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "null" => KeyCode::Null,
            // Host-side names for the punctuation keys
            "oempipe" | "oem5" | "backslash" => KeyCode::Char('\\'),
            "oemopenbrackets" | "oem4" => KeyCode::Char('['),
            "oemclosebrackets" | "oem6" => KeyCode::Char(']'),
            "oemsemicolon" | "oem1" => KeyCode::Char(';'),
            "oemquotes" | "oem7" => KeyCode::Char('\''),
            "oemcomma" => KeyCode::Char(','),
            "oemperiod" => KeyCode::Char('.'),
            "oemquestion" => KeyCode::Char('/'),
            other => return parse_numbered(other).ok_or_else(|| KeyParseError(s.to_string())),
        };

        Ok(key)
    }
}

/// Parse `numpadN`, `fN` and `dN` style names
fn parse_numbered(name: &str) -> Option<KeyCode> {
    if let Some(n) = name.strip_prefix("numpad") {
        let n: u8 = n.parse().ok()?;
        return (n <= 9).then_some(KeyCode::NumPad(n));
    }

    if let Some(n) = name.strip_prefix('f') {
        let n: u8 = n.parse().ok()?;
        return (1..=24).contains(&n).then_some(KeyCode::F(n));
    }

    if let Some(n) = name.strip_prefix('d') {
        let n: u32 = n.parse().ok()?;
        return char::from_digit(n, 10).map(KeyCode::Char);
    }

    None
}

impl TryFrom<String> for KeyCode {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyCode> for String {
    fn from(key: KeyCode) -> Self {
        key.to_string()
    }
}
