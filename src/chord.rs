//! Chord normalization
//!
//! A chord is the string form of a binding: held modifiers in a fixed order
//! (`Ctrl`, `Alt`, `Shift`, `Meta`) followed by the primary key, joined by `+`.
//! Pointer bindings use one of three reserved tags (`Mouse3`, `Mouse4`,
//! `Mouse5`) instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HookError;

const POINTER_PREFIX: &str = "Mouse";

/// Modifier state at the moment a key went down
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeldModifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub meta: bool,
}

impl HeldModifiers {
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Default::default()
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Default::default()
        }
    }

    /// Build from names such as `"ctrl"`, `"Control"`, `"shift"`; unknown names are ignored.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut held = Self::default();
        for name in names {
            match name.as_ref().to_lowercase().as_str() {
                "ctrl" | "control" => held.ctrl = true,
                "alt" | "option" => held.alt = true,
                "shift" => held.shift = true,
                "meta" | "super" | "win" | "cmd" => held.meta = true,
                _ => {}
            }
        }
        held
    }

    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }
}

/// True for key names that are only a modifier on their own
pub fn is_modifier_key(key: &str) -> bool {
    matches!(key, "Shift" | "Control" | "Alt" | "Meta")
}

/// Pointer buttons, numbered like DOM `MouseEvent.button`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Back,
    Forward,
}

impl PointerButton {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(PointerButton::Primary),
            1 => Some(PointerButton::Middle),
            2 => Some(PointerButton::Secondary),
            3 => Some(PointerButton::Back),
            4 => Some(PointerButton::Forward),
            _ => None,
        }
    }

    /// Reserved chord tag; left and right buttons never bind.
    pub fn chord_tag(&self) -> Option<&'static str> {
        match self {
            PointerButton::Middle => Some("Mouse3"),
            PointerButton::Back => Some("Mouse4"),
            PointerButton::Forward => Some("Mouse5"),
            PointerButton::Primary | PointerButton::Secondary => None,
        }
    }
}

/// Normalized binding string
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chord(String);

impl Chord {
    /// Wrap an already-normalized chord (e.g. one read from settings).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    /// Compose a chord from a key press. Returns `None` for a bare modifier.
    pub fn compose(modifiers: HeldModifiers, key: &str) -> Option<Self> {
        if key.is_empty() || is_modifier_key(key) {
            return None;
        }
        let key = normalize_key(key);

        let mut parts: Vec<&str> = Vec::with_capacity(5);
        if modifiers.ctrl {
            parts.push("Ctrl");
        }
        if modifiers.alt {
            parts.push("Alt");
        }
        if modifiers.shift {
            parts.push("Shift");
        }
        if modifiers.meta {
            parts.push("Meta");
        }
        parts.push(&key);
        Some(Self(parts.join("+")))
    }

    /// Reserved tag for a qualifying pointer button.
    pub fn pointer(button: PointerButton) -> Option<Self> {
        button.chord_tag().map(|tag| Self(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pointer chords are delivered by the secondary channel, never hooked.
    pub fn is_pointer(&self) -> bool {
        self.0.starts_with(POINTER_PREFIX)
    }

    /// Split into modifiers and primary key for a native hook backend.
    pub fn parts(&self) -> Result<ChordParts, HookError> {
        let unparsable = || HookError::Unparsable(self.0.clone());
        if self.is_empty() || self.is_pointer() {
            return Err(unparsable());
        }
        let mut tokens: Vec<&str> = self.0.split('+').collect();
        // A bare "+" and "Ctrl++" style chords bind the plus key
        if self.0 == "+" {
            tokens = vec!["+"];
        } else if self.0.ends_with("++") {
            tokens.truncate(tokens.len().saturating_sub(2));
            tokens.push("+");
        }
        let key = tokens.pop().filter(|k| !k.is_empty()).ok_or_else(unparsable)?;

        let mut modifiers = HeldModifiers::default();
        for token in tokens {
            match token {
                "Ctrl" => modifiers.ctrl = true,
                "Alt" => modifiers.alt = true,
                "Shift" => modifiers.shift = true,
                "Meta" => modifiers.meta = true,
                _ => return Err(unparsable()),
            }
        }
        Ok(ChordParts {
            modifiers,
            key: key.to_string(),
        })
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Chord {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A keyboard chord split into its components
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChordParts {
    pub modifiers: HeldModifiers,
    pub key: String,
}

/// Space becomes `Space`; single printable characters are upper-cased.
fn normalize_key(key: &str) -> String {
    if key == " " {
        return "Space".to_string();
    }
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_uppercase().collect(),
        _ => key.to_string(),
    }
}
