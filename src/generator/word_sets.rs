use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A user-defined list of practice words.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSet {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub words: Vec<String>,
}

fn fresh_id(taken: &BTreeSet<String>) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id = format!(
            "custom-{}-{:06x}",
            chrono::Utc::now().timestamp_millis(),
            rng.gen_range(0..0x100_0000u32)
        );
        if !taken.contains(&id) {
            return id;
        }
    }
}

/// Split pasted text into words: one per line, trimmed, blanks dropped.
pub fn parse_word_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Repair sets loaded from storage or an import.
///
/// Blank or duplicate ids are regenerated, blank names become
/// `Custom Set N`, and words are trimmed with empty ones removed.
pub fn normalize_word_sets(raw: Vec<WordSet>) -> Vec<WordSet> {
    let mut seen = BTreeSet::new();
    let mut normalized = Vec::with_capacity(raw.len());
    for entry in raw {
        let mut id = entry.id.trim().to_string();
        if id.is_empty() || seen.contains(&id) {
            id = fresh_id(&seen);
        }
        seen.insert(id.clone());

        let name = match entry.name.trim() {
            "" => format!("Custom Set {}", normalized.len() + 1),
            name => name.to_string(),
        };
        let words = entry
            .words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        normalized.push(WordSet { id, name, words });
    }
    normalized
}

/// An empty set with a unique id. A blank name gets the next default name and
/// a name already in use gets a numeric suffix.
pub fn new_word_set(name: &str, existing: &[WordSet]) -> WordSet {
    let taken: BTreeSet<String> = existing.iter().map(|s| s.id.clone()).collect();
    let base = match name.trim() {
        "" => format!("Custom Set {}", existing.len() + 1),
        name => name.to_string(),
    };
    let name = if existing.iter().any(|s| s.name == base) {
        format!("{base} ({})", existing.len() + 1)
    } else {
        base
    };
    WordSet {
        id: fresh_id(&taken),
        name,
        words: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(id: &str, name: &str, words: &[&str]) -> WordSet {
        WordSet {
            id: id.to_string(),
            name: name.to_string(),
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_word_lines() {
        assert_eq!(
            parse_word_lines("  ねこ \n\nいぬ\r\n   \n"),
            vec!["ねこ".to_string(), "いぬ".to_string()]
        );
    }

    #[test]
    fn test_normalize_fixes_ids_and_names() {
        let sets = normalize_word_sets(vec![
            set("a", " Animals ", &[" ねこ ", ""]),
            set("a", "", &[]),
            set("  ", "Food", &["すし"]),
        ]);
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].id, "a");
        assert_eq!(sets[0].name, "Animals");
        assert_eq!(sets[0].words, vec!["ねこ".to_string()]);
        assert_ne!(sets[1].id, "a");
        assert!(sets[1].id.starts_with("custom-"));
        assert_eq!(sets[1].name, "Custom Set 2");
        assert!(sets[2].id.starts_with("custom-"));
        assert_ne!(sets[1].id, sets[2].id);
    }

    #[test]
    fn test_missing_fields_deserialize() {
        let sets: Vec<WordSet> = serde_json::from_str(r#"[{"words":["ねこ"]}]"#).unwrap();
        let sets = normalize_word_sets(sets);
        assert_eq!(sets[0].name, "Custom Set 1");
        assert!(!sets[0].id.is_empty());
    }

    #[test]
    fn test_new_word_set_is_unique() {
        let existing = vec![set("custom-1", "One", &[])];
        let created = new_word_set("  ", &existing);
        assert_eq!(created.name, "Custom Set 2");
        assert_ne!(created.id, "custom-1");
        assert!(created.words.is_empty());

        let clash = new_word_set("One", &existing);
        assert_eq!(clash.name, "One (2)");
    }
}
