// src/keys.rs

//! Key identities as the host reports them.
//!
//! Two views of the same key press travel together in a [`KeyEvent`]:
//! the physical [`KeyCode`] (layout independent, e.g. `"KeyW"`), which the
//! frame sampler matches against the key mapping, and the logical
//! [`KeySymbol`] plus [`Modifiers`], which the discrete router uses for
//! editing shortcuts.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

bitflags! {
    /// Represents a keyboard modifier.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2; // Also known as Option on macOS
        const SUPER = 1 << 3; // Also known as Windows key or Command key
    }
}

/// A physical key identifier, using DOM `KeyboardEvent.code` naming
/// (`"KeyW"`, `"Digit1"`, `"ArrowLeft"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub String);

impl KeyCode {
    pub fn new(code: impl Into<String>) -> Self {
        KeyCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyCode {
    fn from(code: &str) -> Self {
        KeyCode(code.to_string())
    }
}

/// Represents a key symbol.
///
/// Only the keys the editor reacts to have dedicated variants; everything
/// printable arrives as `Char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum KeySymbol {
    Char(char),

    // Navigation keys
    Left,
    Right,
    Up,
    Down,
    Home,
    End,

    // Editing keys
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,

    // Modifier keys (when pressed and released without other keys)
    Shift,
    Control,
    Alt,
    Super,

    #[default]
    Unknown,
}

impl KeySymbol {
    /// Returns true if the key symbol represents a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            KeySymbol::Shift | KeySymbol::Control | KeySymbol::Alt | KeySymbol::Super
        )
    }

    /// Parses the names used by the input trace format (`left`, `enter`,
    /// single characters, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let symbol = match name.to_ascii_lowercase().as_str() {
            "left" => KeySymbol::Left,
            "right" => KeySymbol::Right,
            "up" => KeySymbol::Up,
            "down" => KeySymbol::Down,
            "home" => KeySymbol::Home,
            "end" => KeySymbol::End,
            "enter" => KeySymbol::Enter,
            "backspace" => KeySymbol::Backspace,
            "delete" => KeySymbol::Delete,
            "tab" => KeySymbol::Tab,
            "escape" | "esc" => KeySymbol::Escape,
            "space" => KeySymbol::Char(' '),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeySymbol::Char(c),
                    _ => return None,
                }
            }
        };
        Some(symbol)
    }
}

/// A single key transition as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub symbol: KeySymbol,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(code: impl Into<String>, symbol: KeySymbol, modifiers: Modifiers) -> Self {
        Self {
            code: KeyCode::new(code),
            symbol,
            modifiers,
        }
    }

    /// A key event whose physical code is irrelevant (shortcuts, marks).
    pub fn symbol(symbol: KeySymbol, modifiers: Modifiers) -> Self {
        Self::new(symbolic_code(symbol), symbol, modifiers)
    }
}

/// Synthesizes a stable code for symbol-only events so press/release
/// bookkeeping still pairs up.
fn symbolic_code(symbol: KeySymbol) -> String {
    match symbol {
        KeySymbol::Char(c) => format!("Symbol({})", c),
        other => format!("{:?}", other),
    }
}

/// The set of physical keys currently held down.
///
/// Ordered so that logging and iteration are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldKeys {
    keys: BTreeSet<KeyCode>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key was not already held.
    pub fn press(&mut self, code: KeyCode) -> bool {
        self.keys.insert(code)
    }

    /// Returns true if the key was held.
    pub fn release(&mut self, code: &KeyCode) -> bool {
        self.keys.remove(code)
    }

    pub fn is_held(&self, code: &KeyCode) -> bool {
        self.keys.contains(code)
    }

    /// True if every key in `codes` is held. An empty slice is never held.
    pub fn all_held(&self, codes: &[KeyCode]) -> bool {
        !codes.is_empty() && codes.iter().all(|c| self.keys.contains(c))
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyCode> {
        self.keys.iter()
    }
}

impl<'a> FromIterator<&'a str> for HeldKeys {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(KeyCode::from).collect(),
        }
    }
}
