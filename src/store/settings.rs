use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;

use crate::config::Config;
use crate::generator::word_sets::{WordSet, normalize_word_sets};
use crate::keyboard::keymap::{KeyMap, LayoutName};
use crate::keyboard::model::{self, SPACE_CODE};
use crate::store::kv::{self, KeyValueStore, StoreError};
use crate::store::schema::{EXPORT_VERSION, ExportData};

pub const MAP_KEY: &str = "map";
pub const WORD_SETS_KEY: &str = "word_sets";

/// What an accepted import hands back to the caller.
#[derive(Clone, Debug)]
pub struct ImportedSettings {
    pub config: Config,
    pub map: KeyMap,
    pub word_sets: Vec<WordSet>,
}

/// Key map and custom word sets, persisted through a [`KeyValueStore`].
pub struct SettingsStore {
    backend: Box<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// The saved key map, or the layout's default when none is saved.
    pub fn load_keymap(&self, layout: LayoutName) -> KeyMap {
        let map: Option<KeyMap> = kv::load_json(self.backend.as_ref(), MAP_KEY);
        match map {
            Some(map) => map,
            None => KeyMap::for_layout(layout),
        }
    }

    pub fn save_keymap(&mut self, map: &KeyMap) -> Result<(), StoreError> {
        kv::save_json(self.backend.as_mut(), MAP_KEY, map)
    }

    /// Forget the customised map and return the layout's default.
    pub fn reset_keymap(&mut self, layout: LayoutName) -> Result<KeyMap, StoreError> {
        self.backend.remove(MAP_KEY)?;
        Ok(KeyMap::for_layout(layout))
    }

    /// Put `kana` on the physical key `code`, or clear the key with `None`,
    /// and save the map right away. Starts from the layout default when no
    /// map is saved yet.
    pub fn set_key(
        &mut self,
        layout: LayoutName,
        code: &str,
        kana: Option<char>,
    ) -> Result<KeyMap> {
        if code != SPACE_CODE && model::find(code).is_none() {
            bail!("Unknown key code '{code}'");
        }
        if let Some(ch) = kana
            && (ch.is_control() || ch.is_whitespace())
        {
            bail!("Cannot map {code} to {ch:?}");
        }
        let mut map = self.load_keymap(layout);
        map.set(code, kana);
        self.save_keymap(&map)?;
        tracing::info!(code, kana = ?kana, "key map edited");
        Ok(map)
    }

    pub fn load_word_sets(&self) -> Vec<WordSet> {
        normalize_word_sets(kv::load_json(self.backend.as_ref(), WORD_SETS_KEY))
    }

    pub fn save_word_sets(&mut self, sets: &[WordSet]) -> Result<(), StoreError> {
        kv::save_json(self.backend.as_mut(), WORD_SETS_KEY, &sets)
    }

    pub fn export(&self, config: &Config, map: &KeyMap) -> ExportData {
        ExportData {
            kanadr_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            config: config.clone(),
            map: map.clone(),
            word_sets: self.load_word_sets(),
        }
    }

    /// Validate an export blob and store its map and word sets together.
    /// The returned config is normalized; saving it is the caller's job.
    pub fn import(&mut self, data: ExportData) -> Result<ImportedSettings> {
        if data.kanadr_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.kanadr_export_version,
                EXPORT_VERSION
            );
        }

        let mut config = data.config;
        config.validate();
        let word_sets = normalize_word_sets(data.word_sets);
        let map = if data.map.is_empty() {
            KeyMap::for_layout(config.layout)
        } else {
            data.map
        };
        if !word_sets.iter().any(|s| s.id == config.word_set_id) {
            config.word_set_id = word_sets.first().map(|s| s.id.clone()).unwrap_or_default();
        }

        self.backend.set_many(&[
            (MAP_KEY, serde_json::to_string_pretty(&map)?),
            (WORD_SETS_KEY, serde_json::to_string_pretty(&word_sets)?),
        ])?;
        tracing::info!(
            keys = map.len(),
            word_sets = word_sets.len(),
            "settings imported"
        );

        Ok(ImportedSettings {
            config,
            map,
            word_sets,
        })
    }
}

pub fn write_export(path: &Path, data: &ExportData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn read_export(path: &Path) -> Result<ExportData> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a kanadr settings export", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::json_store::JsonStore;
    use crate::store::kv::MemoryStore;
    use tempfile::TempDir;

    fn word_set(id: &str, words: &[&str]) -> WordSet {
        WordSet {
            id: id.to_string(),
            name: format!("Set {id}"),
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    #[test]
    fn test_keymap_defaults_then_saved() {
        let mut settings = SettingsStore::new(Box::new(MemoryStore::new()));
        assert_eq!(
            settings.load_keymap(LayoutName::Us),
            KeyMap::for_layout(LayoutName::Us)
        );

        let mut map = KeyMap::for_layout(LayoutName::Jis);
        map.set("KeyT", Some('が'));
        settings.save_keymap(&map).unwrap();
        assert_eq!(settings.load_keymap(LayoutName::Us), map);

        let reset = settings.reset_keymap(LayoutName::Us).unwrap();
        assert_eq!(reset, KeyMap::for_layout(LayoutName::Us));
        assert_eq!(settings.load_keymap(LayoutName::Us), reset);
    }

    #[test]
    fn test_set_key_edits_and_persists() {
        let dir = TempDir::new().unwrap();
        let backend = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut settings = SettingsStore::new(Box::new(backend));

        let map = settings.set_key(LayoutName::Jis, "KeyQ", Some('ぬ')).unwrap();
        assert_eq!(map.resolve("KeyQ"), Some('ぬ'));
        // Untouched keys keep the layout default.
        assert_eq!(map.resolve("KeyT"), Some('か'));

        settings.set_key(LayoutName::Jis, "KeyT", None).unwrap();

        let backend = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let reopened = SettingsStore::new(Box::new(backend)).load_keymap(LayoutName::Us);
        assert_eq!(reopened.resolve("KeyQ"), Some('ぬ'));
        assert_eq!(reopened.resolve("KeyT"), None);
        assert_eq!(reopened.key_for('か'), None);
    }

    #[test]
    fn test_set_key_rejects_bad_input() {
        let mut settings = SettingsStore::new(Box::new(MemoryStore::new()));
        let err = settings
            .set_key(LayoutName::Jis, "KeyNope", Some('ね'))
            .unwrap_err();
        assert!(err.to_string().contains("Unknown key code"));
        assert!(settings.set_key(LayoutName::Jis, "KeyQ", Some('\n')).is_err());
        // Nothing was saved by the rejected edits.
        assert_eq!(
            settings.load_keymap(LayoutName::Us),
            KeyMap::for_layout(LayoutName::Us)
        );
    }

    #[test]
    fn test_word_sets_are_normalized_on_load() {
        let mut settings = SettingsStore::new(Box::new(MemoryStore::new()));
        settings
            .save_word_sets(&[word_set("a", &[" ねこ ", ""]), word_set("a", &[])])
            .unwrap();
        let sets = settings.load_word_sets();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].words, vec!["ねこ".to_string()]);
        assert_ne!(sets[0].id, sets[1].id);
    }

    #[test]
    fn test_export_import_round_trip() {
        let dir = TempDir::new().unwrap();
        let backend = JsonStore::with_base_dir(dir.path().join("a")).unwrap();
        let mut source = SettingsStore::new(Box::new(backend));
        source.save_word_sets(&[word_set("s1", &["すし"])]).unwrap();
        let config = Config {
            word_set_id: "s1".to_string(),
            stream_length: 90,
            ..Config::default()
        };
        let mut map = KeyMap::for_layout(LayoutName::Us);
        map.set("Digit1", Some('ぬ'));

        let path = dir.path().join("export.json");
        write_export(&path, &source.export(&config, &map)).unwrap();

        let backend = JsonStore::with_base_dir(dir.path().join("b")).unwrap();
        let mut target = SettingsStore::new(Box::new(backend));
        let imported = target.import(read_export(&path).unwrap()).unwrap();

        assert_eq!(imported.config, config);
        assert_eq!(imported.map, map);
        assert_eq!(target.load_keymap(LayoutName::Jis), map);
        assert_eq!(target.load_word_sets(), vec![word_set("s1", &["すし"])]);
    }

    #[test]
    fn test_import_rejects_unknown_version() {
        let mut settings = SettingsStore::new(Box::new(MemoryStore::new()));
        let mut data = settings.export(&Config::default(), &KeyMap::default());
        data.kanadr_export_version = 99;

        let err = settings.import(data).unwrap_err().to_string();
        assert!(err.contains("Unsupported export version"));
        assert!(err.contains("99"));
    }

    #[test]
    fn test_import_normalizes_contents() {
        let mut settings = SettingsStore::new(Box::new(MemoryStore::new()));
        let mut data = settings.export(
            &Config {
                stream_length: 1,
                word_set_id: "gone".to_string(),
                ..Config::default()
            },
            &KeyMap::default(),
        );
        data.word_sets = vec![word_set("", &["いぬ"])];

        let imported = settings.import(data).unwrap();
        assert_eq!(imported.config.stream_length, 10);
        assert_eq!(imported.map, KeyMap::for_layout(LayoutName::Jis));
        assert_eq!(imported.word_sets.len(), 1);
        assert_eq!(imported.config.word_set_id, imported.word_sets[0].id);
    }

    #[test]
    fn test_read_export_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(read_export(&path).is_err());
    }
}
