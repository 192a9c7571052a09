use std::collections::BTreeSet;

use crate::keyboard::keymap::KeyMap;

/// A named set of kana that can be switched on for practice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PracticeGroup {
    pub id: &'static str,
    pub name: &'static str,
    pub items: &'static [char],
}

pub const GROUPS: &[PracticeGroup] = &[
    PracticeGroup {
        id: "aiueo",
        name: "あいうえお",
        items: &['あ', 'い', 'う', 'え', 'お'],
    },
    PracticeGroup {
        id: "k",
        name: "かきくけこ",
        items: &['か', 'き', 'く', 'け', 'こ'],
    },
    PracticeGroup {
        id: "s",
        name: "さしすせそ",
        items: &['さ', 'し', 'す', 'せ', 'そ'],
    },
    PracticeGroup {
        id: "t",
        name: "たちつてと",
        items: &['た', 'ち', 'つ', 'て', 'と'],
    },
    PracticeGroup {
        id: "n",
        name: "なにぬねの",
        items: &['な', 'に', 'ぬ', 'ね', 'の'],
    },
    PracticeGroup {
        id: "h",
        name: "はひふへほ",
        items: &['は', 'ひ', 'ふ', 'へ', 'ほ'],
    },
    PracticeGroup {
        id: "m",
        name: "まみむめも",
        items: &['ま', 'み', 'む', 'め', 'も'],
    },
    PracticeGroup {
        id: "y",
        name: "やゆよ",
        items: &['や', 'ゆ', 'よ'],
    },
    PracticeGroup {
        id: "r",
        name: "らりるれろ",
        items: &['ら', 'り', 'る', 'れ', 'ろ'],
    },
    PracticeGroup {
        id: "w",
        name: "わをん",
        items: &['わ', 'を', 'ん'],
    },
    PracticeGroup {
        id: "etc",
        name: "Extra (ね る め れ)",
        items: &['ね', 'る', 'め', 'れ'],
    },
    PracticeGroup {
        id: "diac",
        name: "゛゜ (dakuten/handakuten keys)",
        items: &['゛', '゜'],
    },
];

pub fn find_group(id: &str) -> Option<&'static PracticeGroup> {
    GROUPS.iter().find(|g| g.id == id)
}

/// Whether a group starts out enabled. Only the mark keys are opt-in.
pub fn enabled_by_default(id: &str) -> bool {
    id != "diac"
}

pub fn default_enabled_group_ids() -> BTreeSet<String> {
    GROUPS
        .iter()
        .filter(|g| enabled_by_default(g.id))
        .map(|g| g.id.to_string())
        .collect()
}

/// Concatenate the items of every enabled group, in group declaration order.
///
/// Kana shared by two groups appear twice, which weights them in random
/// selection. With `restrict_to_mapped`, only kana the key map can produce
/// are kept; if that leaves nothing, every mapped kana is returned instead.
pub fn build(enabled: &BTreeSet<String>, restrict_to_mapped: bool, keymap: &KeyMap) -> Vec<char> {
    let pool: Vec<char> = GROUPS
        .iter()
        .filter(|g| enabled.contains(g.id))
        .flat_map(|g| g.items.iter().copied())
        .collect();

    if !restrict_to_mapped {
        return pool;
    }

    let mapped: Vec<char> = pool
        .into_iter()
        .filter(|&ch| keymap.contains_char(ch))
        .collect();
    if mapped.is_empty() {
        keymap.mapped_chars()
    } else {
        mapped
    }
}

/// [`build`], but never empty: falls back to the default groups, then to the
/// first group, so a session always has something to show.
pub fn build_or_default(
    enabled: &BTreeSet<String>,
    restrict_to_mapped: bool,
    keymap: &KeyMap,
) -> Vec<char> {
    let pool = build(enabled, restrict_to_mapped, keymap);
    if !pool.is_empty() {
        return pool;
    }
    let pool = build(&default_enabled_group_ids(), restrict_to_mapped, keymap);
    if !pool.is_empty() {
        return pool;
    }
    GROUPS[0].items.to_vec()
}
