use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::generator::word_sets::WordSet;
use crate::keyboard::keymap::KeyMap;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeStats {
    pub correct: u64,
    pub wrong: u64,
    pub best_streak: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingStats {
    pub runs: u64,
    pub best_kpm: u32,
    pub streams: u64,
    pub correct: u64,
    pub wrong: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordStats {
    pub words: u64,
    pub correct: u64,
    pub wrong: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentenceStats {
    pub sentences: u64,
    pub correct: u64,
    pub wrong: u64,
}

/// Per-kana hit counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KanaStat {
    #[serde(rename = "c")]
    pub correct: u64,
    #[serde(rename = "w")]
    pub wrong: u64,
}

impl KanaStat {
    pub fn total(&self) -> u64 {
        self.correct + self.wrong
    }

    /// Accuracy in percent, or `None` before the first attempt.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.correct as f64 / total as f64 * 100.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsData {
    pub schema_version: u32,
    pub practice: PracticeStats,
    pub typing: TypingStats,
    pub word: WordStats,
    pub sentence: SentenceStats,
    pub kana: BTreeMap<char, KanaStat>,
}

impl Default for StatsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            practice: PracticeStats::default(),
            typing: TypingStats::default(),
            word: WordStats::default(),
            sentence: SentenceStats::default(),
            kana: BTreeMap::new(),
        }
    }
}

impl StatsData {
    pub fn kana_stat(&self, ch: char) -> KanaStat {
        self.kana.get(&ch).copied().unwrap_or_default()
    }
}

pub const EXPORT_VERSION: u32 = 1;

/// Settings blob written by `export` and read by `import`. Stats are not part
/// of it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub kanadr_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: Config,
    pub map: KeyMap,
    #[serde(default)]
    pub word_sets: Vec<WordSet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_defaults_from_partial_json() {
        let data: StatsData =
            serde_json::from_str(r#"{"practice":{"correct":3},"kana":{"ね":{"c":2,"w":1}}}"#)
                .unwrap();
        assert_eq!(data.schema_version, SCHEMA_VERSION);
        assert_eq!(data.practice.correct, 3);
        assert_eq!(data.practice.best_streak, 0);
        assert_eq!(data.typing, TypingStats::default());
        assert_eq!(data.kana_stat('ね').total(), 3);
        assert_eq!(data.kana_stat('こ'), KanaStat::default());
    }

    #[test]
    fn test_kana_stat_accuracy() {
        assert_eq!(KanaStat::default().accuracy(), None);
        let stat = KanaStat {
            correct: 3,
            wrong: 1,
        };
        assert_eq!(stat.accuracy(), Some(75.0));
    }
}
