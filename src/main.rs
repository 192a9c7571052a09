mod app;
mod event;
mod ui;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use kanadr::config::{Config, InputMode};
use kanadr::generator::word_sets;
use kanadr::keyboard::keymap::LayoutName;
use kanadr::keyboard::model;
use kanadr::session::drill::DrillFeedback;
use kanadr::session::round::TextRound;
use kanadr::session::{Mode, SessionStatus};
use kanadr::store::StatsStore;
use kanadr::store::json_store::JsonStore;
use kanadr::store::schema::StatsData;
use kanadr::store::settings::{self, SettingsStore};
use kanadr::trace_init;

use app::{App, AppScreen, settings_fields};
use event::{AppEvent, EventHandler};
use ui::components::keyboard_diagram::KeyboardDiagram;
use ui::components::progress_bar::ProgressBar;
use ui::components::stats_dashboard::StatsDashboard;
use ui::components::stats_sidebar::{SidebarStats, StatsSidebar};
use ui::components::typing_area::TypingArea;
use ui::layout::{KeyboardFit, PracticeLayout, pack_hint_lines, popup_rect};

fn parse_layout(s: &str) -> Result<LayoutName, String> {
    match s.to_ascii_lowercase().as_str() {
        "jis" => Ok(LayoutName::Jis),
        "us" => Ok(LayoutName::Us),
        other => Err(format!("unknown layout '{other}' (expected jis or us)")),
    }
}

fn parse_input_mode(s: &str) -> Result<InputMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "native" => Ok(InputMode::Native),
        "mapped" => Ok(InputMode::Mapped),
        other => Err(format!("unknown input mode '{other}' (expected native or mapped)")),
    }
}

#[derive(Parser)]
#[command(name = "kanadr", version, about = "Terminal kana keyboard trainer")]
struct Cli {
    #[arg(short, long, value_parser = parse_layout, help = "Keyboard layout for this run (jis, us)")]
    layout: Option<LayoutName>,

    #[arg(short, long, value_parser = parse_input_mode, help = "How keys become kana (native, mapped)")]
    input_mode: Option<InputMode>,

    #[arg(long, help = "Hide the on-screen keyboard")]
    no_keyboard: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write config, key map and word sets to a JSON file
    Export { file: PathBuf },
    /// Load config, key map and word sets from an export file
    Import { file: PathBuf },
    /// Clear all practice statistics
    ResetStats,
    /// Manage custom word sets
    #[command(subcommand)]
    WordSet(WordSetCommand),
    /// Show or edit which kana each physical key produces
    #[command(subcommand)]
    Keymap(KeymapCommand),
}

#[derive(Subcommand)]
enum KeymapCommand {
    /// Map a key code (e.g. KeyQ, Digit1, BracketLeft) to a kana
    Set { code: String, kana: char },
    /// Leave a key unmapped
    Clear { code: String },
    List,
}

#[derive(Subcommand)]
enum WordSetCommand {
    /// Create a set from a file with one word per line
    Add { name: String, file: PathBuf },
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = match trace_init::init_tracing(&trace_init::default_log_dir()) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };

    let mut config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(%err, "config unreadable, using defaults");
        Config::default()
    });

    if let Some(command) = cli.command {
        return run_command(command, &config);
    }

    if let Some(mode) = cli.input_mode {
        config.input_mode = mode;
    }
    if cli.no_keyboard {
        config.show_keyboard = false;
    }
    tracing::info!(
        layout = config.layout.as_str(),
        input_mode = config.input_mode.as_str(),
        "starting"
    );
    let mut app = App::new(config, cli.layout);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

    // Release events let the keyboard diagram show held keys.
    let keyboard_enhanced = execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(250));

    let result = run_app(&mut terminal, &mut app, &events);

    if keyboard_enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(%err, "exited with error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_command(command: Command, config: &Config) -> Result<()> {
    let store = JsonStore::new().context("opening data directory")?;
    store.recover_interrupted_writes();
    match command {
        Command::Export { file } => {
            let settings = SettingsStore::new(Box::new(store));
            let map = settings.load_keymap(config.layout);
            settings::write_export(&file, &settings.export(config, &map))?;
            println!("Exported settings to {}", file.display());
        }
        Command::Import { file } => {
            let data = settings::read_export(&file)?;
            let mut settings = SettingsStore::new(Box::new(store));
            let imported = settings.import(data)?;
            imported.config.save().context("saving imported config")?;
            println!(
                "Imported {} mapped keys and {} word sets",
                imported.map.len(),
                imported.word_sets.len()
            );
        }
        Command::ResetStats => {
            StatsStore::new(Box::new(store)).reset();
            println!("Statistics cleared");
        }
        Command::WordSet(WordSetCommand::Add { name, file }) => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut settings = SettingsStore::new(Box::new(store));
            let mut sets = settings.load_word_sets();
            let mut set = word_sets::new_word_set(&name, &sets);
            set.words = word_sets::parse_word_lines(&text);
            println!("Added '{}' ({} words) as {}", set.name, set.words.len(), set.id);
            sets.push(set);
            settings.save_word_sets(&sets)?;
        }
        Command::Keymap(KeymapCommand::Set { code, kana }) => {
            let mut settings = SettingsStore::new(Box::new(store));
            settings.set_key(config.layout, &code, Some(kana))?;
            println!("{code} -> {kana}");
        }
        Command::Keymap(KeymapCommand::Clear { code }) => {
            let mut settings = SettingsStore::new(Box::new(store));
            settings.set_key(config.layout, &code, None)?;
            println!("{code} cleared");
        }
        Command::Keymap(KeymapCommand::List) => {
            let map = SettingsStore::new(Box::new(store)).load_keymap(config.layout);
            for key in model::all_keys() {
                let kana = map.resolve(key.code).map_or("-".to_string(), |ch| ch.to_string());
                println!("{:<14}{:<4}{kana}", key.code, key.label);
            }
        }
        Command::WordSet(WordSetCommand::List) => {
            let settings = SettingsStore::new(Box::new(store));
            for set in settings.load_word_sets() {
                let marker = if set.id == config.word_set_id { "*" } else { " " };
                println!("{marker} {}  {} ({} words)", set.id, set.name, set.words.len());
            }
        }
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Paste(text) => {
                if app.current_mode().is_some() {
                    app.paste(&text);
                }
            }
            AppEvent::Tick => app.tick(),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            app.trainer.stop_all(Instant::now());
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    match (key.code, key.kind) {
        (KeyCode::Char(ch), KeyEventKind::Release) => {
            app.key_released(ch);
            return;
        }
        (_, KeyEventKind::Release) => return,
        _ => {}
    }

    // Repeats would inflate the counters.
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::Practice(_) => handle_practice_key(app, key),
        AppScreen::Stats => handle_stats_key(app, key),
        AppScreen::Settings => handle_settings_key(app, key),
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => {
            if let Some(action) = app.menu.selected_action() {
                app.activate(action);
            }
        }
        KeyCode::Char(ch) => {
            if let Some(action) = app.menu.action_for(ch) {
                app.activate(action);
            }
        }
        _ => {}
    }
}

fn handle_practice_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('n') {
            app.next_item();
        }
        return;
    }
    match key.code {
        KeyCode::Esc => app.go_to_menu(),
        KeyCode::Enter => app.toggle_pause(),
        KeyCode::Tab => app.stop_run(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(ch) => app.key_char(ch),
        _ => {}
    }
}

fn handle_stats_key(app: &mut App, key: KeyEvent) {
    if app.confirm_reset {
        match key.code {
            KeyCode::Char('y') => app.reset_stats(),
            KeyCode::Char('n') | KeyCode::Esc => app.confirm_reset = false,
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Char('x') => app.confirm_reset = true,
        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.go_to_menu(),
        KeyCode::Up | KeyCode::Char('k') => app.settings_up(),
        KeyCode::Down | KeyCode::Char('j') => app.settings_down(),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => app.settings_cycle_forward(),
        KeyCode::Left | KeyCode::Char('h') => app.settings_cycle_backward(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::Practice(mode) => render_practice(frame, app, mode),
        AppScreen::Stats => render_stats(frame, app),
        AppScreen::Settings => render_settings(frame, app),
    }
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let config = &app.setup.config;
    let data = app.trainer.stats().snapshot();
    let header_info = format!(
        " {} layout | {} input | {} mapped keys | best {} KPM",
        config.layout.as_str(),
        config.input_mode.as_str(),
        app.setup.keymap.len(),
        data.typing.best_kpm,
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " kanadr ",
            Style::default()
                .fg(colors.header_fg)
                .bg(colors.header_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            header_info,
            Style::default()
                .fg(colors.text_pending)
                .bg(colors.header_bg),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg));
    frame.render_widget(header, layout[0]);

    let menu_area = popup_rect(56, app.menu.items.len() as u16 * 3 + 8, layout[1]);
    frame.render_widget(&app.menu, menu_area);

    let footer_text = match &app.status_message {
        Some(message) => format!(" {message}"),
        None => " [1-4] Practice  [s] Stats  [c] Settings  [q] Quit ".to_string(),
    };
    let footer = Paragraph::new(Line::from(Span::styled(
        footer_text,
        Style::default().fg(colors.text_pending),
    )));
    frame.render_widget(footer, layout[2]);
}

fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Idle => "ready",
        SessionStatus::Running => "running",
        SessionStatus::Paused => "paused",
    }
}

fn lifetime_accuracy(data: &StatsData, mode: Mode) -> Option<f64> {
    let (correct, wrong) = match mode {
        Mode::Drill => (data.practice.correct, data.practice.wrong),
        Mode::Stream => (data.typing.correct, data.typing.wrong),
        Mode::Word => (data.word.correct, data.word.wrong),
        Mode::Sentence => (data.sentence.correct, data.sentence.wrong),
    };
    let total = correct + wrong;
    (total > 0).then(|| correct as f64 / total as f64 * 100.0)
}

fn text_round(app: &App, mode: Mode) -> Option<&TextRound> {
    match mode {
        Mode::Drill => None,
        Mode::Stream => app.trainer.stream.round(),
        Mode::Word => app.trainer.word.round(),
        Mode::Sentence => app.trainer.sentence.round(),
    }
}

fn render_practice(frame: &mut ratatui::Frame, app: &App, mode: Mode) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let now = Instant::now();
    let trainer = &app.trainer;
    let status = trainer.status(mode);
    let counters = match mode {
        Mode::Drill => trainer.drill.counters(),
        Mode::Stream => trainer.stream.counters(),
        Mode::Word => trainer.word.counters(),
        Mode::Sentence => trainer.sentence.counters(),
    };

    let hints = [
        "[Enter] Start/Pause",
        "[Tab] Finish run",
        "[Ctrl+N] Next item",
        "[Backspace] Delete",
        "[ESC] Menu",
    ];
    let hint_lines = pack_hint_lines(&hints, area.width as usize);
    let app_layout = PracticeLayout::new(
        area,
        app.setup.config.show_keyboard,
        hint_lines.len() as u16,
    );

    let mut header_text = format!(
        " {} | {} | Correct {} | Wrong {}",
        mode.label(),
        status_label(status),
        counters.correct,
        counters.wrong
    );
    if mode == Mode::Stream && status != SessionStatus::Idle {
        if let Some(secs) = trainer.stream.remaining_secs(now) {
            header_text.push_str(&format!(" | {secs}s left"));
        }
        header_text.push_str(&format!(" | {} KPM", trainer.stream.kpm(now)));
    }
    if let Some(message) = &app.status_message {
        header_text.push_str(&format!(" | {message}"));
    }
    let header = Paragraph::new(Line::from(Span::styled(
        header_text,
        Style::default()
            .fg(colors.header_fg)
            .bg(colors.header_bg)
            .add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(colors.header_bg));
    frame.render_widget(header, app_layout.header);

    let round = text_round(app, mode);
    match round {
        Some(round) => {
            let held = trainer.composer().pending().map(|key| key.ch);
            let typing = TypingArea::new(round, mode.label(), app.theme).held(held);
            frame.render_widget(typing, app_layout.text);
        }
        None if mode == Mode::Drill => render_drill_target(frame, app, app_layout.text),
        None => {
            let hint = Paragraph::new(Line::from(Span::styled(
                "Press Enter to start",
                Style::default().fg(colors.text_pending),
            )))
            .alignment(Alignment::Center)
            .block(Block::bordered().border_style(Style::default().fg(colors.border)));
            frame.render_widget(hint, app_layout.text);
        }
    }

    if let Some(progress_area) = app_layout.progress {
        let progress = match (mode, round) {
            (Mode::Stream, Some(round)) => match trainer.stream.duration() {
                Some(limit) => {
                    let elapsed = trainer.stream.elapsed(now);
                    ProgressBar::new(
                        "Time",
                        elapsed.as_secs_f64() / limit.as_secs_f64(),
                        app.theme,
                    )
                    .caption(format!("{:.0}s / {}s", elapsed.as_secs_f64(), limit.as_secs()))
                }
                None => text_progress(round, app),
            },
            (_, Some(round)) => text_progress(round, app),
            _ => {
                let acc = counters.accuracy();
                ProgressBar::new("Accuracy", acc.unwrap_or(0.0) / 100.0, app.theme).caption(
                    acc.map_or("-".to_string(), |a| format!("{a:.1}%")),
                )
            }
        };
        frame.render_widget(progress, progress_area);
    }

    if let Some(keyboard_area) = app_layout.keyboard {
        let ctx = app.setup.ctx();
        let kbd = KeyboardDiagram::new(
            &app.setup.keymap,
            trainer.expected_key(&ctx),
            &app.depressed_keys,
            app.theme,
        )
        .compact(app_layout.keyboard_fit == KeyboardFit::Compact);
        frame.render_widget(kbd, keyboard_area);
    }

    if let Some(sidebar_area) = app_layout.sidebar {
        let data = trainer.stats().snapshot();
        let target = trainer.expected_char();
        let stream_running = mode == Mode::Stream && status != SessionStatus::Idle;
        let stats = SidebarStats {
            counters,
            kpm: stream_running.then(|| trainer.stream.kpm(now)),
            elapsed_secs: stream_running.then(|| trainer.stream.elapsed(now).as_secs_f64()),
            lifetime_accuracy: lifetime_accuracy(data, mode),
            target,
            target_stat: target.map(|ch| data.kana_stat(ch)).unwrap_or_default(),
        };
        let sidebar = StatsSidebar::new(stats, mode == Mode::Drill, app.theme);
        frame.render_widget(sidebar, sidebar_area);
    }

    let lines: Vec<Line> = hint_lines
        .into_iter()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(colors.text_pending))))
        .collect();
    frame.render_widget(Paragraph::new(lines), app_layout.footer);
}

fn text_progress<'a>(round: &TextRound, app: &'a App) -> ProgressBar<'a> {
    let total = round.target().len().max(1);
    let done = round.progress().min(total);
    ProgressBar::new("Progress", done as f64 / total as f64, app.theme)
        .caption(format!("{done}/{}", round.target().len()))
}

fn render_drill_target(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let drill = &app.trainer.drill;

    let mut lines = vec![Line::from("")];
    match drill.target() {
        Some(target) => {
            lines.push(Line::from(Span::styled(
                target.to_string(),
                Style::default()
                    .fg(colors.focused_key)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            let feedback = match drill.feedback() {
                Some(DrillFeedback::Hit { got, .. }) => {
                    Span::styled(format!("{got} \u{2713}"), Style::default().fg(colors.success))
                }
                Some(DrillFeedback::Miss { got, expected, .. }) => Span::styled(
                    format!("{got} \u{2717}  expected {expected}"),
                    Style::default().fg(colors.error),
                ),
                None => Span::raw(""),
            };
            lines.push(Line::from(feedback));
            if let Some(label) = drill
                .target_key()
                .and_then(model::find)
                .map(|key| key.label)
            {
                lines.push(Line::from(Span::styled(
                    format!("key: {label}"),
                    Style::default().fg(colors.text_pending),
                )));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "Press Enter to start",
            Style::default().fg(colors.text_pending),
        ))),
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::bordered()
            .title(format!(" {} ", Mode::Drill.label()))
            .border_style(Style::default().fg(colors.border))
            .style(Style::default().bg(colors.bg)),
    );
    frame.render_widget(paragraph, area);
}

fn render_stats(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let dashboard = StatsDashboard::new(
        app.trainer.stats().snapshot(),
        app.confirm_reset,
        app.theme,
    );
    frame.render_widget(dashboard, area);
}

fn render_settings(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let fields = settings_fields();
    let centered = popup_rect(72, fields.len() as u16 + 6, area);

    let block = Block::bordered()
        .title(" Settings ")
        .border_style(Style::default().fg(colors.accent))
        .style(Style::default().bg(colors.bg));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(inner);

    let header = Paragraph::new(Line::from(Span::styled(
        "  Use arrows to navigate, Enter/Right to change, ESC to save & exit",
        Style::default().fg(colors.text_pending),
    )));
    header.render(layout[0], frame.buffer_mut());

    // Keep the selected row in view when the list is taller than the box.
    let visible = layout[1].height as usize;
    let first = app
        .settings_selected
        .saturating_sub(visible.saturating_sub(1));

    let lines: Vec<Line> = fields
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(i, &field)| {
            let is_selected = i == app.settings_selected;
            let indicator = if is_selected { " > " } else { "   " };
            let label_style = Style::default()
                .fg(if is_selected {
                    colors.accent
                } else {
                    colors.fg
                })
                .add_modifier(if is_selected {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });
            let value_style = Style::default().fg(if is_selected {
                colors.focused_key
            } else {
                colors.text_pending
            });
            Line::from(vec![
                Span::styled(
                    format!("{indicator}{:<24}", app.settings_label(field)),
                    label_style,
                ),
                Span::styled(format!("< {} >", app.settings_value(field)), value_style),
            ])
        })
        .collect();
    Paragraph::new(lines).render(layout[1], frame.buffer_mut());

    let footer_text = match &app.status_message {
        Some(message) => format!("  {message}"),
        None => "  [ESC] Save & back  [Enter/arrows] Change value".to_string(),
    };
    let footer = Paragraph::new(Line::from(Span::styled(
        footer_text,
        Style::default().fg(colors.accent),
    )));
    footer.render(layout[2], frame.buffer_mut());
}
