use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::keyboard::model::{self, SPACE_CODE};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutName {
    #[default]
    Jis,
    Us,
}

impl LayoutName {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutName::Jis => "jis",
            LayoutName::Us => "us",
        }
    }

    pub fn next(self) -> Self {
        match self {
            LayoutName::Jis => LayoutName::Us,
            LayoutName::Us => LayoutName::Jis,
        }
    }
}

const JIS: &[(&str, char)] = &[
    ("Backquote", 'ろ'),
    ("Digit1", 'ぬ'),
    ("Digit2", 'ふ'),
    ("Digit3", 'あ'),
    ("Digit4", 'う'),
    ("Digit5", 'え'),
    ("Digit6", 'お'),
    ("Digit7", 'や'),
    ("Digit8", 'ゆ'),
    ("Digit9", 'よ'),
    ("Digit0", 'わ'),
    ("Minus", 'ほ'),
    ("Equal", 'へ'),
    ("KeyQ", 'た'),
    ("KeyW", 'て'),
    ("KeyE", 'い'),
    ("KeyR", 'す'),
    ("KeyT", 'か'),
    ("KeyY", 'ん'),
    ("KeyU", 'な'),
    ("KeyI", 'に'),
    ("KeyO", 'ら'),
    ("KeyP", 'せ'),
    ("BracketLeft", '゛'),
    ("BracketRight", '゜'),
    ("Backslash", 'む'),
    ("KeyA", 'ち'),
    ("KeyS", 'と'),
    ("KeyD", 'し'),
    ("KeyF", 'は'),
    ("KeyG", 'き'),
    ("KeyH", 'く'),
    ("KeyJ", 'ま'),
    ("KeyK", 'の'),
    ("KeyL", 'り'),
    ("Semicolon", 'れ'),
    ("Quote", 'け'),
    ("KeyZ", 'つ'),
    ("KeyX", 'さ'),
    ("KeyC", 'そ'),
    ("KeyV", 'ひ'),
    ("KeyB", 'こ'),
    ("KeyN", 'み'),
    ("KeyM", 'も'),
    ("Comma", 'ね'),
    ("Period", 'る'),
    ("Slash", 'め'),
];

// Letters only; still trains key positions on keyboards without the kana row.
const US: &[(&str, char)] = &[
    ("KeyQ", 'た'),
    ("KeyW", 'て'),
    ("KeyE", 'い'),
    ("KeyR", 'す'),
    ("KeyT", 'か'),
    ("KeyY", 'ん'),
    ("KeyU", 'な'),
    ("KeyI", 'に'),
    ("KeyO", 'ら'),
    ("KeyP", 'せ'),
    ("KeyA", 'ち'),
    ("KeyS", 'と'),
    ("KeyD", 'し'),
    ("KeyF", 'は'),
    ("KeyG", 'き'),
    ("KeyH", 'く'),
    ("KeyJ", 'ま'),
    ("KeyK", 'の'),
    ("KeyL", 'り'),
    ("KeyZ", 'つ'),
    ("KeyX", 'さ'),
    ("KeyC", 'そ'),
    ("KeyV", 'ひ'),
    ("KeyB", 'こ'),
    ("KeyN", 'み'),
    ("KeyM", 'も'),
];

/// Physical key code -> kana produced by that key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMap {
    entries: BTreeMap<String, char>,
}

impl KeyMap {
    pub fn for_layout(layout: LayoutName) -> Self {
        let table = match layout {
            LayoutName::Jis => JIS,
            LayoutName::Us => US,
        };
        table.iter().map(|&(code, ch)| (code, ch)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Kana for a physical key. Space always resolves to a literal space.
    pub fn resolve(&self, code: &str) -> Option<char> {
        if code == SPACE_CODE {
            return Some(' ');
        }
        self.entries.get(code).copied()
    }

    /// The one physical key trained for `ch`: the first key in keyboard row
    /// order that produces it. Unknown codes sort after every real key, then
    /// by code.
    pub fn key_for(&self, ch: char) -> Option<&str> {
        if ch == ' ' {
            return Some(SPACE_CODE);
        }
        self.entries
            .iter()
            .filter(|(_, mapped)| **mapped == ch)
            .min_by_key(|(code, _)| model::row_order(code))
            .map(|(code, _)| code.as_str())
    }

    pub fn contains_char(&self, ch: char) -> bool {
        self.entries.values().any(|&mapped| mapped == ch)
    }

    /// Every distinct kana the map can produce, in key row order.
    pub fn mapped_chars(&self) -> Vec<char> {
        let mut pairs: Vec<(&String, &char)> = self.entries.iter().collect();
        pairs.sort_by_key(|(code, _)| model::row_order(code));
        let mut out: Vec<char> = Vec::new();
        for (_, &ch) in pairs {
            if !out.contains(&ch) {
                out.push(ch);
            }
        }
        out
    }

    pub fn set(&mut self, code: &str, ch: Option<char>) {
        match ch {
            Some(ch) => {
                self.entries.insert(code.to_string(), ch);
            }
            None => {
                self.entries.remove(code);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, char)> {
        self.entries.iter().map(|(code, &ch)| (code.as_str(), ch))
    }
}

impl<'a> FromIterator<(&'a str, char)> for KeyMap {
    fn from_iter<I: IntoIterator<Item = (&'a str, char)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(code, ch)| (code.to_string(), ch))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jis_resolves_kana_row() {
        let map = KeyMap::for_layout(LayoutName::Jis);
        assert_eq!(map.resolve("KeyT"), Some('か'));
        assert_eq!(map.resolve("BracketLeft"), Some('゛'));
        assert_eq!(map.resolve("Space"), Some(' '));
        assert_eq!(map.resolve("Tab"), None);
    }

    #[test]
    fn test_us_is_letters_only() {
        let map = KeyMap::for_layout(LayoutName::Us);
        assert_eq!(map.len(), 26);
        assert_eq!(map.resolve("Digit1"), None);
    }

    #[test]
    fn test_key_for_prefers_row_order() {
        let mut map = KeyMap::for_layout(LayoutName::Jis);
        // Map a second key to か; KeyT comes first in row order.
        map.set("KeyZ", Some('か'));
        assert_eq!(map.key_for('か'), Some("KeyT"));
        map.set("Digit1", Some('か'));
        assert_eq!(map.key_for('か'), Some("Digit1"));
        assert_eq!(map.key_for('ゑ'), None);
        assert_eq!(map.key_for(' '), Some("Space"));
    }

    #[test]
    fn test_mapped_chars_are_distinct() {
        let mut map = KeyMap::for_layout(LayoutName::Us);
        map.set("KeyZ", Some('か'));
        let chars = map.mapped_chars();
        assert_eq!(chars.iter().filter(|&&c| c == 'か').count(), 1);
        assert!(!chars.contains(&'つ'));
    }

    #[test]
    fn test_serde_is_plain_object() {
        let map: KeyMap = [("KeyT", 'か')].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"KeyT":"か"}"#);
        let back: KeyMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
