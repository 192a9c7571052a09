use std::collections::HashSet;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Widget};

use kanadr::keyboard::finger::{self, Finger, Hand};
use kanadr::keyboard::keymap::KeyMap;
use kanadr::keyboard::model::{self, SPACE_CODE};

use crate::ui::theme::Theme;

/// The physical keyboard labelled with the kana each key produces.
pub struct KeyboardDiagram<'a> {
    keymap: &'a KeyMap,
    next_key: Option<&'a str>,
    depressed: &'a HashSet<String>,
    compact: bool,
    theme: &'a Theme,
}

impl<'a> KeyboardDiagram<'a> {
    pub fn new(
        keymap: &'a KeyMap,
        next_key: Option<&'a str>,
        depressed: &'a HashSet<String>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            keymap,
            next_key,
            depressed,
            compact: false,
            theme,
        }
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }
}

// Row stagger in cells, digit row first.
const OFFSETS: [u16; 4] = [0, 2, 3, 5];

fn finger_color(code: &str) -> Color {
    let assignment = finger::finger_for_code(code);
    match (assignment.hand, assignment.finger) {
        (Hand::Left, Finger::Pinky) => Color::Rgb(180, 100, 100),
        (Hand::Left, Finger::Ring) => Color::Rgb(180, 140, 80),
        (Hand::Left, Finger::Middle) => Color::Rgb(120, 160, 80),
        (Hand::Left, Finger::Index) => Color::Rgb(80, 140, 180),
        (Hand::Right, Finger::Index) => Color::Rgb(100, 140, 200),
        (Hand::Right, Finger::Middle) => Color::Rgb(120, 160, 80),
        (Hand::Right, Finger::Ring) => Color::Rgb(180, 140, 80),
        (Hand::Right, Finger::Pinky) => Color::Rgb(180, 100, 100),
        _ => Color::Rgb(120, 120, 120),
    }
}

/// Center `label` in a cell `width` columns wide. Kana take two columns.
fn key_cell(label: char, width: usize) -> String {
    let label_width = if label.is_ascii() { 1 } else { 2 };
    let pad = width.saturating_sub(label_width);
    let left = pad / 2;
    format!("{}{label}{}", " ".repeat(left), " ".repeat(pad - left))
}

impl KeyboardDiagram<'_> {
    fn key_style(&self, code: &str, mapped: bool) -> Style {
        let colors = &self.theme.colors;
        if self.next_key == Some(code) {
            Style::default()
                .fg(colors.bg)
                .bg(colors.accent)
                .add_modifier(Modifier::BOLD)
        } else if self.depressed.contains(code) {
            Style::default().fg(colors.bg).bg(colors.focused_key)
        } else if mapped {
            Style::default().fg(colors.fg).bg(finger_color(code))
        } else {
            Style::default().fg(colors.text_pending).bg(colors.bg)
        }
    }
}

impl Widget for KeyboardDiagram<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Keyboard ")
            .border_style(Style::default().fg(colors.border))
            .style(Style::default().bg(colors.bg));
        let inner = block.inner(area);
        block.render(area, buf);

        let (cell_width, key_width): (usize, u16) = if self.compact { (2, 3) } else { (4, 5) };
        if inner.height < model::ROWS.len() as u16 || inner.width < 13 * key_width {
            return;
        }

        for (row_idx, row) in model::ROWS.iter().enumerate() {
            let y = inner.y + row_idx as u16;
            let offset = OFFSETS.get(row_idx).copied().unwrap_or(0);

            for (col_idx, key) in row.iter().enumerate() {
                let x = inner.x + offset + col_idx as u16 * key_width;
                if x + key_width > inner.x + inner.width {
                    break;
                }
                let kana = self.keymap.resolve(key.code);
                let label = kana.unwrap_or_else(|| key.label.chars().next().unwrap_or(' '));
                let style = self.key_style(key.code, kana.is_some());
                buf.set_string(x, y, key_cell(label, cell_width), style);
            }
        }

        let space_y = inner.y + model::ROWS.len() as u16;
        if space_y < inner.y + inner.height {
            let width = (key_width * 6).min(inner.width);
            let x = inner.x + (inner.width - width) / 2;
            let style = self.key_style(SPACE_CODE, true);
            buf.set_string(x, space_y, format!("{:^w$}", "space", w = width as usize), style);
        }
    }
}
