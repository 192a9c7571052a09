use std::collections::HashSet;
use std::time::{Duration, Instant};

use kanadr::config::{
    Config, InputMode, SENTENCE_MAX_LEN_RANGE, STREAM_LENGTH_RANGE, TIMER_SECONDS_RANGE,
    WORD_MAX_LEN_RANGE,
};
use kanadr::engine::pool::GROUPS;
use kanadr::generator::{BuiltinLists, WordSet};
use kanadr::keyboard::keymap::{KeyMap, LayoutName};
use kanadr::keyboard::model;
use kanadr::session::{Mode, PracticeContext, SessionStatus, Trainer};
use kanadr::store::json_store::JsonStore;
use kanadr::store::settings::SettingsStore;
use kanadr::store::{KeyValueStore, MemoryStore, StatsStore};

use crate::ui::components::menu::{Menu, MenuAction};
use crate::ui::theme::Theme;

/// Depressed-key highlight is dropped when no release event arrives.
const KEY_HIGHLIGHT: Duration = Duration::from_millis(150);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    Practice(Mode),
    Stats,
    Settings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsField {
    Layout,
    InputMode,
    ShowKeyboard,
    Timer,
    TimerSeconds,
    StreamLength,
    WordList,
    WordSet,
    WordMaxLen,
    SentenceMaxLen,
    Theme,
    ResetKeyMap,
    /// Index into the practice groups.
    Group(usize),
}

pub fn settings_fields() -> Vec<SettingsField> {
    let mut fields = vec![
        SettingsField::Layout,
        SettingsField::InputMode,
        SettingsField::ShowKeyboard,
        SettingsField::Timer,
        SettingsField::TimerSeconds,
        SettingsField::StreamLength,
        SettingsField::WordList,
        SettingsField::WordSet,
        SettingsField::WordMaxLen,
        SettingsField::SentenceMaxLen,
        SettingsField::Theme,
        SettingsField::ResetKeyMap,
    ];
    fields.extend((0..GROUPS.len()).map(SettingsField::Group));
    fields
}

fn step<T>(value: T, delta: i64, range: (T, T)) -> T
where
    T: Copy + TryFrom<i64> + Into<i64>,
{
    let (lo, hi) = (range.0.into(), range.1.into());
    let next = (value.into() + delta).clamp(lo, hi);
    T::try_from(next).unwrap_or(value)
}

/// Settings and content every session reads.
pub struct TrainingSetup {
    pub config: Config,
    pub keymap: KeyMap,
    pub word_sets: Vec<WordSet>,
    pub lists: BuiltinLists,
}

impl TrainingSetup {
    pub fn ctx(&self) -> PracticeContext<'_> {
        PracticeContext {
            config: &self.config,
            keymap: &self.keymap,
            word_sets: &self.word_sets,
            lists: &self.lists,
        }
    }
}

pub struct App {
    pub screen: AppScreen,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub setup: TrainingSetup,
    pub trainer: Trainer,
    pub settings: SettingsStore,
    pub should_quit: bool,
    pub settings_selected: usize,
    pub confirm_reset: bool,
    pub depressed_keys: HashSet<String>,
    pub last_key_time: Option<Instant>,
    pub status_message: Option<String>,
    config_dirty: bool,
}

impl App {
    /// Open the on-disk stores; an unusable data directory degrades to an
    /// in-memory session.
    pub fn new(config: Config, layout: Option<LayoutName>) -> Self {
        let (stats_backend, settings_backend): (Box<dyn KeyValueStore>, Box<dyn KeyValueStore>) =
            match JsonStore::new() {
                Ok(store) => {
                    if store.recover_interrupted_writes() {
                        tracing::warn!("cleaned up an interrupted settings write");
                    }
                    (Box::new(store.clone()), Box::new(store))
                }
                Err(err) => {
                    tracing::warn!(%err, "data directory unavailable, nothing will be saved");
                    (Box::new(MemoryStore::new()), Box::new(MemoryStore::new()))
                }
            };
        Self::with_backends(config, layout, stats_backend, settings_backend)
    }

    /// `layout` overrides the configured layout and its saved map for this run.
    pub fn with_backends(
        config: Config,
        layout: Option<LayoutName>,
        stats_backend: Box<dyn KeyValueStore>,
        settings_backend: Box<dyn KeyValueStore>,
    ) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let settings = SettingsStore::new(settings_backend);
        let mut config = config;
        let keymap = match layout {
            Some(layout) => {
                config.layout = layout;
                KeyMap::for_layout(layout)
            }
            None => settings.load_keymap(config.layout),
        };
        let word_sets = settings.load_word_sets();

        Self {
            screen: AppScreen::Menu,
            menu: Menu::new(theme),
            theme,
            setup: TrainingSetup {
                config,
                keymap,
                word_sets,
                lists: BuiltinLists::load(),
            },
            trainer: Trainer::new(StatsStore::new(stats_backend)),
            settings,
            should_quit: false,
            settings_selected: 0,
            confirm_reset: false,
            depressed_keys: HashSet::new(),
            last_key_time: None,
            status_message: None,
            config_dirty: false,
        }
    }

    pub fn activate(&mut self, action: MenuAction) {
        match action {
            MenuAction::Practice(mode) => self.start_practice(mode),
            MenuAction::Stats => self.go_to_stats(),
            MenuAction::Settings => self.go_to_settings(),
            MenuAction::Quit => self.should_quit = true,
        }
    }

    pub fn current_mode(&self) -> Option<Mode> {
        match self.screen {
            AppScreen::Practice(mode) => Some(mode),
            _ => None,
        }
    }

    pub fn start_practice(&mut self, mode: Mode) {
        self.status_message = None;
        self.screen = AppScreen::Practice(mode);
        self.trainer.start(mode, &self.setup.ctx(), Instant::now());
    }

    /// Enter on a practice screen: start, pause or resume.
    pub fn toggle_pause(&mut self) {
        let Some(mode) = self.current_mode() else {
            return;
        };
        let now = Instant::now();
        match self.trainer.status(mode) {
            SessionStatus::Idle => self.start_practice(mode),
            SessionStatus::Running => self.trainer.pause(mode, now),
            SessionStatus::Paused => self.trainer.resume(mode, &self.setup.ctx(), now),
        }
    }

    /// End the run on purpose; a stream run is recorded.
    pub fn stop_run(&mut self) {
        let Some(mode) = self.current_mode() else {
            return;
        };
        if self.trainer.status(mode) == SessionStatus::Idle {
            return;
        }
        self.trainer.stop(mode, Instant::now());
        if mode == Mode::Stream
            && let Some(kpm) = self.trainer.stream.last_kpm()
        {
            self.status_message = Some(format!("Run saved: {kpm} KPM"));
        }
    }

    pub fn next_item(&mut self) {
        self.trainer.refresh_items(&self.setup.ctx());
    }

    /// A character key on a practice screen.
    pub fn key_char(&mut self, ch: char) {
        let now = Instant::now();
        let code = model::code_for_char(ch);
        if let Some(code) = code {
            self.depressed_keys.insert(code.to_string());
            self.last_key_time = Some(now);
        }
        match self.setup.config.input_mode {
            InputMode::Mapped => {
                if let Some(code) = code {
                    self.trainer.press_key(&self.setup.ctx(), code, now);
                }
            }
            InputMode::Native => self.trainer.type_char(&self.setup.ctx(), ch, now),
        }
    }

    pub fn key_released(&mut self, ch: char) {
        if let Some(code) = model::code_for_char(ch) {
            self.depressed_keys.remove(code);
        }
    }

    /// Pasted or IME-committed text in native mode.
    pub fn paste(&mut self, text: &str) {
        if self.setup.config.input_mode != InputMode::Native {
            return;
        }
        let ctx = self.setup.ctx();
        match self.trainer.buffer() {
            Some(mut buffer) => {
                buffer.push_str(text);
                self.trainer.set_buffer(&ctx, &buffer);
            }
            None => {
                let now = Instant::now();
                for ch in text.chars() {
                    self.trainer.type_char(&ctx, ch, now);
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        self.trainer.backspace(&self.setup.ctx());
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        let stream_was_running = self.trainer.status(Mode::Stream) == SessionStatus::Running;
        self.trainer.tick(&self.setup.ctx(), now);
        if stream_was_running
            && self.trainer.status(Mode::Stream) == SessionStatus::Idle
            && let Some(kpm) = self.trainer.stream.last_kpm()
        {
            self.status_message = Some(format!("Time's up: {kpm} KPM"));
        }

        if let Some(last) = self.last_key_time
            && now.duration_since(last) > KEY_HIGHLIGHT
        {
            self.depressed_keys.clear();
            self.last_key_time = None;
        }
    }

    pub fn go_to_menu(&mut self) {
        self.trainer.stop_all(Instant::now());
        if self.config_dirty {
            self.save_config();
        }
        self.confirm_reset = false;
        self.screen = AppScreen::Menu;
    }

    pub fn go_to_stats(&mut self) {
        self.trainer.stop_all(Instant::now());
        self.confirm_reset = false;
        self.screen = AppScreen::Stats;
    }

    pub fn go_to_settings(&mut self) {
        self.trainer.stop_all(Instant::now());
        self.settings_selected = 0;
        self.screen = AppScreen::Settings;
    }

    pub fn reset_stats(&mut self) {
        self.trainer.reset_stats();
        self.confirm_reset = false;
        tracing::info!("stats reset from the dashboard");
    }

    pub fn save_config(&mut self) {
        match self.setup.config.save() {
            Ok(()) => self.config_dirty = false,
            Err(err) => {
                tracing::warn!(%err, "could not save config");
                self.status_message = Some(format!("Could not save settings: {err}"));
            }
        }
    }

    pub fn settings_up(&mut self) {
        self.settings_selected = self.settings_selected.saturating_sub(1);
    }

    pub fn settings_down(&mut self) {
        self.settings_selected = (self.settings_selected + 1).min(settings_fields().len() - 1);
    }

    pub fn selected_field(&self) -> Option<SettingsField> {
        settings_fields().get(self.settings_selected).copied()
    }

    pub fn settings_cycle_forward(&mut self) {
        self.settings_change(true);
    }

    pub fn settings_cycle_backward(&mut self) {
        self.settings_change(false);
    }

    fn settings_change(&mut self, forward: bool) {
        let Some(field) = self.selected_field() else {
            return;
        };
        let sign: i64 = if forward { 1 } else { -1 };
        let config = &mut self.setup.config;
        match field {
            SettingsField::Layout => {
                config.layout = config.layout.next();
                self.reset_keymap();
            }
            SettingsField::InputMode => config.input_mode = config.input_mode.toggle(),
            SettingsField::ShowKeyboard => config.show_keyboard = !config.show_keyboard,
            SettingsField::Timer => config.timer_enabled = !config.timer_enabled,
            SettingsField::TimerSeconds => {
                config.timer_seconds = step(config.timer_seconds, 10 * sign, TIMER_SECONDS_RANGE);
            }
            SettingsField::StreamLength => {
                config.stream_length = step_usize(config.stream_length, 10 * sign, STREAM_LENGTH_RANGE);
            }
            SettingsField::WordList => {
                config.word_list = if forward {
                    config.word_list.next()
                } else {
                    config.word_list.next().next()
                };
            }
            SettingsField::WordSet => {
                let sets = &self.setup.word_sets;
                if !sets.is_empty() {
                    let current = sets.iter().position(|s| s.id == config.word_set_id);
                    let next = match (current, forward) {
                        (None, _) => 0,
                        (Some(i), true) => (i + 1) % sets.len(),
                        (Some(i), false) => (i + sets.len() - 1) % sets.len(),
                    };
                    config.word_set_id = sets[next].id.clone();
                }
            }
            SettingsField::WordMaxLen => {
                config.word_max_len = step_usize(config.word_max_len, sign, WORD_MAX_LEN_RANGE);
            }
            SettingsField::SentenceMaxLen => {
                config.sentence_max_len =
                    step_usize(config.sentence_max_len, 5 * sign, SENTENCE_MAX_LEN_RANGE);
            }
            SettingsField::Theme => self.cycle_theme(forward),
            SettingsField::ResetKeyMap => self.reset_keymap(),
            SettingsField::Group(i) => {
                if let Some(group) = GROUPS.get(i) {
                    config.toggle_group(group.id);
                }
            }
        }
        self.config_dirty = true;
    }

    fn reset_keymap(&mut self) {
        let layout = self.setup.config.layout;
        self.setup.keymap = match self.settings.reset_keymap(layout) {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(%err, "could not clear saved key map");
                KeyMap::for_layout(layout)
            }
        };
        self.status_message = Some(format!("Key map reset to {}", layout.as_str()));
    }

    fn cycle_theme(&mut self, forward: bool) {
        let themes = Theme::available_themes();
        if themes.is_empty() {
            return;
        }
        let current = themes.iter().position(|t| *t == self.setup.config.theme);
        let next = match (current, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % themes.len(),
            (Some(i), false) => (i + themes.len() - 1) % themes.len(),
        };
        if let Some(theme) = Theme::load(&themes[next]) {
            let theme: &'static Theme = Box::leak(Box::new(theme));
            self.theme = theme;
            self.menu.theme = theme;
            self.setup.config.theme = themes[next].clone();
        }
    }

    pub fn settings_label(&self, field: SettingsField) -> String {
        match field {
            SettingsField::Layout => "Keyboard Layout".to_string(),
            SettingsField::InputMode => "Input Mode".to_string(),
            SettingsField::ShowKeyboard => "Show Keyboard".to_string(),
            SettingsField::Timer => "Stream Timer".to_string(),
            SettingsField::TimerSeconds => "Timer Seconds".to_string(),
            SettingsField::StreamLength => "Stream Length".to_string(),
            SettingsField::WordList => "Word List".to_string(),
            SettingsField::WordSet => "Custom Word Set".to_string(),
            SettingsField::WordMaxLen => "Word Max Length".to_string(),
            SettingsField::SentenceMaxLen => "Sentence Max Length".to_string(),
            SettingsField::Theme => "Theme".to_string(),
            SettingsField::ResetKeyMap => "Reset Key Map".to_string(),
            SettingsField::Group(i) => GROUPS
                .get(i)
                .map(|g| format!("Group {}", g.name))
                .unwrap_or_default(),
        }
    }

    pub fn settings_value(&self, field: SettingsField) -> String {
        let config = &self.setup.config;
        let on_off = |on: bool| if on { "on" } else { "off" }.to_string();
        match field {
            SettingsField::Layout => config.layout.as_str().to_string(),
            SettingsField::InputMode => config.input_mode.as_str().to_string(),
            SettingsField::ShowKeyboard => on_off(config.show_keyboard),
            SettingsField::Timer => on_off(config.timer_enabled),
            SettingsField::TimerSeconds => format!("{}s", config.timer_seconds),
            SettingsField::StreamLength => config.stream_length.to_string(),
            SettingsField::WordList => config.word_list.as_str().to_string(),
            SettingsField::WordSet => self
                .setup
                .word_sets
                .iter()
                .find(|s| s.id == config.word_set_id)
                .map(|s| format!("{} ({} words)", s.name, s.words.len()))
                .unwrap_or_else(|| "none".to_string()),
            SettingsField::WordMaxLen => config.word_max_len.to_string(),
            SettingsField::SentenceMaxLen => config.sentence_max_len.to_string(),
            SettingsField::Theme => config.theme.clone(),
            SettingsField::ResetKeyMap => "press Enter".to_string(),
            SettingsField::Group(i) => GROUPS
                .get(i)
                .map(|g| on_off(config.groups.get(g.id).copied().unwrap_or(false)))
                .unwrap_or_default(),
        }
    }
}

fn step_usize(value: usize, delta: i64, range: (usize, usize)) -> usize {
    let next = (value as i64 + delta).clamp(range.0 as i64, range.1 as i64);
    next as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanadr::config::WordListKind;

    fn app() -> App {
        App::with_backends(
            Config::default(),
            None,
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
        )
    }

    fn select(app: &mut App, field: SettingsField) {
        app.settings_selected = settings_fields()
            .iter()
            .position(|f| *f == field)
            .unwrap();
    }

    #[test]
    fn test_step_clamps() {
        assert_eq!(step(600u32, 10, TIMER_SECONDS_RANGE), 600);
        assert_eq!(step(10u32, -10, TIMER_SECONDS_RANGE), 10);
        assert_eq!(step_usize(2, -1, WORD_MAX_LEN_RANGE), 2);
        assert_eq!(step_usize(55, 5, SENTENCE_MAX_LEN_RANGE), 60);
    }

    #[test]
    fn test_settings_cycle_numeric_and_enum() {
        let mut app = app();
        select(&mut app, SettingsField::TimerSeconds);
        app.settings_cycle_forward();
        assert_eq!(app.setup.config.timer_seconds, 70);

        select(&mut app, SettingsField::WordList);
        app.settings_cycle_backward();
        assert_eq!(app.setup.config.word_list, WordListKind::Custom);

        select(&mut app, SettingsField::Group(GROUPS.len() - 1));
        app.settings_cycle_forward();
        assert_eq!(app.setup.config.groups.get("diac"), Some(&true));
    }

    #[test]
    fn test_layout_change_replaces_keymap() {
        let mut app = app();
        select(&mut app, SettingsField::Layout);
        app.settings_cycle_forward();
        assert_eq!(app.setup.config.layout, LayoutName::Us);
        assert_eq!(app.setup.keymap, KeyMap::for_layout(LayoutName::Us));
    }

    #[test]
    fn test_layout_override() {
        let app = App::with_backends(
            Config::default(),
            Some(LayoutName::Us),
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
        );
        assert_eq!(app.setup.config.layout, LayoutName::Us);
        assert_eq!(app.setup.keymap, KeyMap::for_layout(LayoutName::Us));
    }

    #[test]
    fn test_mapped_typing_goes_through_keymap() {
        let mut app = app();
        app.setup.config.input_mode = InputMode::Mapped;
        app.start_practice(Mode::Drill);
        let key = app.trainer.drill.target_key().unwrap().to_string();
        let typed = model::find(&key).unwrap().base;
        app.key_char(typed);
        assert_eq!(app.trainer.drill.counters().correct, 1);
        assert!(app.depressed_keys.contains(&key));
    }

    #[test]
    fn test_leaving_practice_stops_without_recording() {
        let mut app = app();
        app.start_practice(Mode::Stream);
        app.go_to_menu();
        assert_eq!(app.trainer.active_mode(), None);
        assert_eq!(app.trainer.stats().snapshot().typing.runs, 0);

        app.start_practice(Mode::Stream);
        app.stop_run();
        assert_eq!(app.trainer.stats().snapshot().typing.runs, 1);
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_toggle_pause() {
        let mut app = app();
        app.start_practice(Mode::Word);
        app.toggle_pause();
        assert_eq!(app.trainer.status(Mode::Word), SessionStatus::Paused);
        app.toggle_pause();
        assert_eq!(app.trainer.status(Mode::Word), SessionStatus::Running);
    }
}
