//! Hotkey Binding Store
//!
//! Target id -> chord, kept in insertion order. Order matters: when two ids
//! share a chord, the one iterated first wins at registration time.

use indexmap::IndexMap;
use serde::Serialize;

use crate::chord::Chord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HotkeyBindings {
    map: IndexMap<String, Chord>,
}

impl HotkeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the persisted form, dropping blank chords.
    pub fn from_settings(raw: &IndexMap<String, String>) -> Self {
        let map = raw
            .iter()
            .map(|(id, chord)| (id.clone(), Chord::new(chord.as_str())))
            .filter(|(_, chord)| !chord.is_empty())
            .collect();
        Self { map }
    }

    pub fn to_settings(&self) -> IndexMap<String, String> {
        self.map
            .iter()
            .map(|(id, chord)| (id.clone(), chord.as_str().to_string()))
            .collect()
    }

    /// Bind `id`; rebinding keeps the id's original position.
    pub fn set(&mut self, id: impl Into<String>, chord: Chord) {
        self.map.insert(id.into(), chord);
    }

    /// Remove the binding for `id`, preserving the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<Chord> {
        self.map.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Chord> {
        self.map.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Chord)> {
        self.map.iter().map(|(id, chord)| (id.as_str(), chord))
    }

    /// First id (in map order) bound to `chord`.
    pub fn find_by_chord(&self, chord: &Chord) -> Option<&str> {
        self.map
            .iter()
            .find(|(_, bound)| *bound == chord)
            .map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebinding_keeps_position() {
        let mut bindings = HotkeyBindings::new();
        bindings.set("godmode", Chord::new("Ctrl+G"));
        bindings.set("anti-afk", Chord::new("Ctrl+A"));
        bindings.set("godmode", Chord::new("Ctrl+H"));

        let ids: Vec<&str> = bindings.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["godmode", "anti-afk"]);
        assert_eq!(bindings.get("godmode").unwrap().as_str(), "Ctrl+H");
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut bindings = HotkeyBindings::new();
        bindings.set("a", Chord::new("1"));
        bindings.set("b", Chord::new("2"));
        bindings.set("c", Chord::new("3"));
        assert_eq!(bindings.remove("b").unwrap().as_str(), "2");
        assert!(bindings.remove("b").is_none());

        let ids: Vec<&str> = bindings.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_find_by_chord_returns_first() {
        let mut bindings = HotkeyBindings::new();
        bindings.set("first", Chord::new("Mouse4"));
        bindings.set("second", Chord::new("Mouse4"));
        assert_eq!(bindings.find_by_chord(&Chord::new("Mouse4")), Some("first"));
        assert_eq!(bindings.find_by_chord(&Chord::new("Mouse5")), None);
    }

    #[test]
    fn test_settings_conversion_drops_blank_chords() {
        let mut raw = IndexMap::new();
        raw.insert("godmode".to_string(), "Ctrl+G".to_string());
        raw.insert("anti-afk".to_string(), "  ".to_string());

        let bindings = HotkeyBindings::from_settings(&raw);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.to_settings().get("godmode").unwrap(), "Ctrl+G");
    }
}
