use std::fs;
use std::path::PathBuf;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Deserializer};

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

pub const DEFAULT_THEME: &str = "catppuccin-mocha";

#[derive(Clone, Debug, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub colors: ThemeColors,
}

/// `#rrggbb`, an ANSI colour name or an index, as ratatui parses them.
fn color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse::<Color>().map_err(serde::de::Error::custom)
}

/// Palette for the trainer screens. Keys missing from a theme file keep the
/// default palette's colour.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeColors {
    #[serde(deserialize_with = "color")]
    pub bg: Color,
    #[serde(deserialize_with = "color")]
    pub fg: Color,
    #[serde(deserialize_with = "color")]
    pub text_correct: Color,
    #[serde(deserialize_with = "color")]
    pub text_incorrect: Color,
    #[serde(deserialize_with = "color")]
    pub text_incorrect_bg: Color,
    #[serde(deserialize_with = "color")]
    pub text_pending: Color,
    #[serde(deserialize_with = "color")]
    pub text_cursor_bg: Color,
    #[serde(deserialize_with = "color")]
    pub text_cursor_fg: Color,
    /// Base kana held back while its voicing mark may still follow.
    #[serde(deserialize_with = "color")]
    pub held_kana: Color,
    #[serde(deserialize_with = "color")]
    pub focused_key: Color,
    #[serde(deserialize_with = "color")]
    pub accent: Color,
    #[serde(deserialize_with = "color")]
    pub border: Color,
    #[serde(deserialize_with = "color")]
    pub header_bg: Color,
    #[serde(deserialize_with = "color")]
    pub header_fg: Color,
    #[serde(deserialize_with = "color")]
    pub bar_filled: Color,
    #[serde(deserialize_with = "color")]
    pub bar_empty: Color,
    #[serde(deserialize_with = "color")]
    pub error: Color,
    #[serde(deserialize_with = "color")]
    pub warning: Color,
    #[serde(deserialize_with = "color")]
    pub success: Color,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: Color::Rgb(0x1e, 0x1e, 0x2e),
            fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            text_correct: Color::Rgb(0xa6, 0xe3, 0xa1),
            text_incorrect: Color::Rgb(0xf3, 0x8b, 0xa8),
            text_incorrect_bg: Color::Rgb(0x45, 0x27, 0x3a),
            text_pending: Color::Rgb(0x58, 0x5b, 0x70),
            text_cursor_bg: Color::Rgb(0xf5, 0xe0, 0xdc),
            text_cursor_fg: Color::Rgb(0x1e, 0x1e, 0x2e),
            held_kana: Color::Rgb(0xfa, 0xb3, 0x87),
            focused_key: Color::Rgb(0xf9, 0xe2, 0xaf),
            accent: Color::Rgb(0x89, 0xb4, 0xfa),
            border: Color::Rgb(0x45, 0x47, 0x5a),
            header_bg: Color::Rgb(0x31, 0x32, 0x44),
            header_fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            bar_filled: Color::Rgb(0x89, 0xb4, 0xfa),
            bar_empty: Color::Rgb(0x31, 0x32, 0x44),
            error: Color::Rgb(0xf3, 0x8b, 0xa8),
            warning: Color::Rgb(0xf9, 0xe2, 0xaf),
            success: Color::Rgb(0xa6, 0xe3, 0xa1),
        }
    }
}

impl ThemeColors {
    /// Colour for an accuracy percentage; `None` means never practised.
    pub fn accuracy(&self, pct: Option<f64>) -> Color {
        match pct {
            None => self.text_pending,
            Some(p) if p >= 95.0 => self.success,
            Some(p) if p >= 80.0 => self.warning,
            Some(_) => self.error,
        }
    }
}

fn user_theme_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kanadr").join("themes"))
}

impl Theme {
    /// A user theme in `<config_dir>/kanadr/themes/` wins over a bundled one.
    pub fn load(name: &str) -> Option<Self> {
        let filename = format!("{name}.toml");
        if let Some(path) = user_theme_dir().map(|dir| dir.join(&filename))
            && let Ok(content) = fs::read_to_string(&path)
        {
            match toml::from_str::<Theme>(&content) {
                Ok(theme) => return Some(theme),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "ignoring unreadable user theme")
                }
            }
        }

        let file = ThemeAssets::get(&filename)?;
        let content = std::str::from_utf8(file.data.as_ref()).ok()?;
        match toml::from_str::<Theme>(content) {
            Ok(theme) => Some(theme),
            Err(err) => {
                tracing::error!(theme = name, %err, "bundled theme does not parse");
                None
            }
        }
    }

    /// Bundled theme names plus any user theme files, sorted and deduplicated.
    pub fn available_themes() -> Vec<String> {
        let mut names: Vec<String> = ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(str::to_string))
            .collect();
        if let Some(entries) = user_theme_dir().and_then(|dir| fs::read_dir(dir).ok()) {
            names.extend(entries.filter_map(|entry| {
                let name = entry.ok()?.file_name().into_string().ok()?;
                name.strip_suffix(".toml").map(str::to_string)
            }));
        }
        names.sort();
        names.dedup();
        names
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load(DEFAULT_THEME).unwrap_or_else(|| Self {
            name: "default".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_themes_parse() {
        let bundled: Vec<String> = ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(str::to_string))
            .collect();
        assert!(bundled.contains(&DEFAULT_THEME.to_string()));
        for name in bundled {
            let file = ThemeAssets::get(&format!("{name}.toml")).unwrap();
            let content = std::str::from_utf8(file.data.as_ref()).unwrap();
            let theme: Theme = toml::from_str(content).unwrap();
            assert_eq!(theme.name, name);
        }
    }

    #[test]
    fn test_partial_theme_keeps_defaults() {
        let theme: Theme = toml::from_str(
            "name = \"mine\"\n[colors]\naccent = \"#102030\"\nerror = \"red\"\n",
        )
        .unwrap();
        assert_eq!(theme.colors.accent, Color::Rgb(0x10, 0x20, 0x30));
        assert_eq!(theme.colors.error, Color::Red);
        assert_eq!(theme.colors.bg, ThemeColors::default().bg);
    }

    #[test]
    fn test_bad_colour_rejects_theme() {
        let parsed = toml::from_str::<Theme>("name = \"x\"\n[colors]\nbg = \"#zzzzzz\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_accuracy_bands() {
        let colors = ThemeColors::default();
        assert_eq!(colors.accuracy(None), colors.text_pending);
        assert_eq!(colors.accuracy(Some(100.0)), colors.success);
        assert_eq!(colors.accuracy(Some(85.0)), colors.warning);
        assert_eq!(colors.accuracy(Some(10.0)), colors.error);
    }
}
