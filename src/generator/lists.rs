use rust_embed::Embed;

#[derive(Embed)]
#[folder = "assets/lists/"]
struct ListAssets;

const BASIC_WORDS: &str = "words-basic.txt";
const BASIC_SENTENCES: &str = "sentences-basic.txt";

fn load_lines(filename: &str) -> Vec<String> {
    let Some(file) = ListAssets::get(filename) else {
        tracing::warn!(filename, "bundled list missing");
        return Vec::new();
    };
    match std::str::from_utf8(file.data.as_ref()) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(err) => {
            tracing::warn!(filename, %err, "bundled list is not utf-8");
            Vec::new()
        }
    }
}

/// Built-in hiragana word and sentence lists.
#[derive(Clone, Debug)]
pub struct BuiltinLists {
    pub words: Vec<String>,
    pub sentences: Vec<String>,
}

impl BuiltinLists {
    pub fn load() -> Self {
        Self {
            words: load_lines(BASIC_WORDS),
            sentences: load_lines(BASIC_SENTENCES),
        }
    }
}

impl Default for BuiltinLists {
    fn default() -> Self {
        Self::load()
    }
}

/// Entries no longer than `max_len` characters; the whole list when none fit.
pub fn filter_by_len(list: &[String], max_len: usize) -> Vec<&str> {
    let fitting: Vec<&str> = list
        .iter()
        .filter(|entry| entry.chars().count() <= max_len)
        .map(String::as_str)
        .collect();
    if fitting.is_empty() {
        list.iter().map(String::as_str).collect()
    } else {
        fitting
    }
}
