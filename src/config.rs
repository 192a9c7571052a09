use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::pool;
use crate::keyboard::keymap::LayoutName;

pub const STREAM_LENGTH_RANGE: (usize, usize) = (10, 300);
pub const TIMER_SECONDS_RANGE: (u32, u32) = (10, 600);
pub const WORD_MAX_LEN_RANGE: (usize, usize) = (2, 12);
pub const SENTENCE_MAX_LEN_RANGE: (usize, usize) = (5, 60);

/// How key presses become kana.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// The terminal already delivers kana (OS kana input / IME).
    #[default]
    Native,
    /// Physical keys are translated through the key map.
    Mapped,
}

impl InputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InputMode::Native => "native",
            InputMode::Mapped => "mapped",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            InputMode::Native => InputMode::Mapped,
            InputMode::Mapped => InputMode::Native,
        }
    }
}

/// Source of targets in word mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordListKind {
    #[default]
    Basic,
    All,
    Custom,
}

impl WordListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WordListKind::Basic => "basic",
            WordListKind::All => "all",
            WordListKind::Custom => "custom",
        }
    }

    pub fn next(self) -> Self {
        match self {
            WordListKind::Basic => WordListKind::All,
            WordListKind::All => WordListKind::Custom,
            WordListKind::Custom => WordListKind::Basic,
        }
    }
}

/// Unknown or mistyped values fall back to the type's default instead of
/// failing the whole file.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = toml::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default, deserialize_with = "lenient")]
    pub layout: LayoutName,
    #[serde(default, deserialize_with = "lenient")]
    pub input_mode: InputMode,
    #[serde(default = "default_true")]
    pub show_keyboard: bool,
    #[serde(default = "default_true")]
    pub timer_enabled: bool,
    #[serde(default = "default_timer_seconds")]
    pub timer_seconds: u32,
    #[serde(default = "default_stream_length")]
    pub stream_length: usize,
    #[serde(default, deserialize_with = "lenient")]
    pub word_list: WordListKind,
    #[serde(default)]
    pub word_set_id: String,
    #[serde(default = "default_word_max_len")]
    pub word_max_len: usize,
    #[serde(default = "default_sentence_max_len")]
    pub sentence_max_len: usize,
    #[serde(default = "default_groups")]
    pub groups: BTreeMap<String, bool>,
}

fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_true() -> bool {
    true
}
fn default_timer_seconds() -> u32 {
    60
}
fn default_stream_length() -> usize {
    60
}
fn default_word_max_len() -> usize {
    6
}
fn default_sentence_max_len() -> usize {
    40
}
fn default_groups() -> BTreeMap<String, bool> {
    pool::GROUPS
        .iter()
        .map(|g| (g.id.to_string(), pool::enabled_by_default(g.id)))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            layout: LayoutName::default(),
            input_mode: InputMode::default(),
            show_keyboard: true,
            timer_enabled: true,
            timer_seconds: default_timer_seconds(),
            stream_length: default_stream_length(),
            word_list: WordListKind::default(),
            word_set_id: String::new(),
            word_max_len: default_word_max_len(),
            sentence_max_len: default_sentence_max_len(),
            groups: default_groups(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };
        config.validate();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kanadr")
            .join("config.toml")
    }

    /// Bring a loaded or imported config into range: clamp numeric settings,
    /// drop unknown practice groups and add missing ones with their default.
    pub fn validate(&mut self) {
        self.stream_length = self
            .stream_length
            .clamp(STREAM_LENGTH_RANGE.0, STREAM_LENGTH_RANGE.1);
        self.timer_seconds = self
            .timer_seconds
            .clamp(TIMER_SECONDS_RANGE.0, TIMER_SECONDS_RANGE.1);
        self.word_max_len = self
            .word_max_len
            .clamp(WORD_MAX_LEN_RANGE.0, WORD_MAX_LEN_RANGE.1);
        self.sentence_max_len = self
            .sentence_max_len
            .clamp(SENTENCE_MAX_LEN_RANGE.0, SENTENCE_MAX_LEN_RANGE.1);

        self.groups.retain(|id, _| pool::find_group(id).is_some());
        for group in pool::GROUPS {
            self.groups
                .entry(group.id.to_string())
                .or_insert_with(|| pool::enabled_by_default(group.id));
        }
        self.word_set_id = self.word_set_id.trim().to_string();
    }

    pub fn enabled_groups(&self) -> BTreeSet<String> {
        self.groups
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn toggle_group(&mut self, id: &str) {
        if let Some(on) = self.groups.get_mut(id) {
            *on = !*on;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.stream_length, 60);
        assert_eq!(config.timer_seconds, 60);
        assert!(config.timer_enabled);
        assert_eq!(config.groups.get("diac"), Some(&false));
        assert_eq!(config.groups.get("aiueo"), Some(&true));
    }

    #[test]
    fn test_unknown_enum_values_fall_back() {
        let toml_str = r#"
layout = "dvorak"
input_mode = 3
word_list = "custom"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.layout, LayoutName::Jis);
        assert_eq!(config.input_mode, InputMode::Native);
        assert_eq!(config.word_list, WordListKind::Custom);
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config {
            stream_length: 5,
            timer_seconds: 10_000,
            word_max_len: 0,
            sentence_max_len: 99,
            ..Config::default()
        };
        config.groups.clear();
        config.groups.insert("bogus".to_string(), true);
        config.groups.insert("diac".to_string(), true);

        config.validate();

        assert_eq!(config.stream_length, 10);
        assert_eq!(config.timer_seconds, 600);
        assert_eq!(config.word_max_len, 2);
        assert_eq!(config.sentence_max_len, 60);
        assert!(!config.groups.contains_key("bogus"));
        assert_eq!(config.groups.get("diac"), Some(&true));
        assert_eq!(config.groups.len(), pool::GROUPS.len());
    }

    #[test]
    fn test_enabled_groups_and_toggle() {
        let mut config = Config::default();
        assert!(!config.enabled_groups().contains("diac"));
        config.toggle_group("diac");
        assert!(config.enabled_groups().contains("diac"));
        config.toggle_group("unknown");
        assert_eq!(config.groups.len(), pool::GROUPS.len());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            layout: LayoutName::Us,
            input_mode: InputMode::Mapped,
            stream_length: 120,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }
}
