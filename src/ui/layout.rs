use ratatui::layout::{Constraint, Direction, Layout, Rect};

use kanadr::keyboard::model;

/// Keys per keyboard row; the widest row decides the diagram width.
const KEYS_PER_ROW: u16 = 13;
/// Rows of practice text kept visible before optional panels are dropped.
const MIN_TEXT_ROWS: u16 = 5;
/// Below this width the run sidebar is folded away.
const SIDEBAR_MIN_WIDTH: u16 = 100;
const PROGRESS_ROWS: u16 = 3;

/// How the on-screen keyboard fits, if at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyboardFit {
    Full,
    Compact,
    Hidden,
}

impl KeyboardFit {
    /// Bordered diagram width for a key cell `key_width` columns wide.
    const fn width(key_width: u16) -> u16 {
        KEYS_PER_ROW * key_width + 2
    }

    fn for_width(width: u16) -> Self {
        if width >= Self::width(5) {
            KeyboardFit::Full
        } else if width >= Self::width(3) {
            KeyboardFit::Compact
        } else {
            KeyboardFit::Hidden
        }
    }

    /// Key rows, the space bar row and the border.
    pub fn height(self) -> u16 {
        match self {
            KeyboardFit::Hidden => 0,
            _ => model::ROWS.len() as u16 + 3,
        }
    }
}

/// Areas of a practice screen. Optional panels are `None` when the terminal
/// is too small for them; the keyboard goes first, then the progress bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PracticeLayout {
    pub header: Rect,
    pub text: Rect,
    pub progress: Option<Rect>,
    pub keyboard: Option<Rect>,
    pub keyboard_fit: KeyboardFit,
    pub sidebar: Option<Rect>,
    pub footer: Rect,
}

impl PracticeLayout {
    pub fn new(area: Rect, want_keyboard: bool, footer_rows: u16) -> Self {
        let [header, body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(footer_rows),
            ])
            .areas(area);

        let (column, sidebar) = if body.width >= SIDEBAR_MIN_WIDTH {
            let [column, sidebar] = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                .areas(body);
            (column, Some(sidebar))
        } else {
            (body, None)
        };

        let mut fit = if want_keyboard {
            KeyboardFit::for_width(column.width)
        } else {
            KeyboardFit::Hidden
        };
        let mut spare = column.height.saturating_sub(MIN_TEXT_ROWS);
        let show_progress = spare >= PROGRESS_ROWS;
        if show_progress {
            spare -= PROGRESS_ROWS;
        }
        if spare < fit.height() {
            fit = KeyboardFit::Hidden;
        }

        let mut constraints = vec![Constraint::Min(MIN_TEXT_ROWS)];
        if show_progress {
            constraints.push(Constraint::Length(PROGRESS_ROWS));
        }
        if fit != KeyboardFit::Hidden {
            constraints.push(Constraint::Length(fit.height()));
        }
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(column);

        let progress = show_progress.then(|| rows[1]);
        let keyboard = (fit != KeyboardFit::Hidden).then(|| rows[rows.len() - 1]);

        Self {
            header,
            text: rows[0],
            progress,
            keyboard,
            keyboard_fit: fit,
            sidebar,
            footer,
        }
    }
}

/// Greedily packs footer hints into lines no wider than `width`.
pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    if width == 0 {
        return out;
    }
    let mut current = String::new();
    for hint in hints.iter().filter(|h| !h.is_empty()) {
        let needed = current.chars().count() + 2 + hint.chars().count();
        if !current.is_empty() && needed > width {
            out.push(std::mem::take(&mut current));
        }
        current.push_str("  ");
        current.push_str(hint);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// A `width` x `height` box centred in `area`, shrunk to fit.
pub fn popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
