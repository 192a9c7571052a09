use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use kanadr::engine::{Alignment, InputState};
use kanadr::session::round::TextRound;

use crate::ui::theme::Theme;

/// Target passage with live correct/wrong/cursor highlighting.
pub struct TypingArea<'a> {
    round: &'a TextRound,
    held: Option<char>,
    title: &'a str,
    theme: &'a Theme,
}

impl<'a> TypingArea<'a> {
    pub fn new(round: &'a TextRound, title: &'a str, theme: &'a Theme) -> Self {
        Self {
            round,
            held: None,
            title,
            theme,
        }
    }

    /// Base kana held back by the key composer, shown at the cursor.
    pub fn held(mut self, held: Option<char>) -> Self {
        self.held = held;
        self
    }
}

/// A render token maps a single target character to its display representation.
struct RenderToken {
    target_idx: usize,
    display: String,
    is_line_break: bool,
}

fn build_render_tokens(target: &[char]) -> Vec<RenderToken> {
    target
        .iter()
        .enumerate()
        .map(|(i, &ch)| match ch {
            '\n' => RenderToken {
                target_idx: i,
                display: "\u{21b5}".to_string(),
                is_line_break: true,
            },
            // Full-width so spaces line up with the kana around them.
            ' ' => RenderToken {
                target_idx: i,
                display: "\u{3000}".to_string(),
                is_line_break: false,
            },
            _ => RenderToken {
                target_idx: i,
                display: ch.to_string(),
                is_line_break: false,
            },
        })
        .collect()
}

/// The keystroke that was judged wrong at target position `idx`.
fn wrong_input(alignment: &Alignment, buffer: &[char], idx: usize) -> Option<char> {
    alignment
        .input_to_target
        .iter()
        .zip(&alignment.input_states)
        .position(|(target, state)| *target == Some(idx) && *state == InputState::Wrong)
        .and_then(|i| buffer.get(i).copied())
}

/// Base kana typed into the buffer that is still waiting for its mark.
fn pending_base(alignment: &Alignment, buffer: &[char]) -> Option<char> {
    if alignment.has_pending() {
        buffer.last().copied()
    } else {
        None
    }
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let target = self.round.target();
        let buffer = self.round.buffer();
        let alignment = self.round.alignment();
        let cursor = alignment.progress;
        let preedit = self.held.or_else(|| pending_base(alignment, buffer));

        let mut lines: Vec<Vec<Span>> = vec![Vec::new()];
        for token in build_render_tokens(target) {
            let idx = token.target_idx;
            let (display, style) = if alignment.wrong.contains(&idx) {
                let shown = wrong_input(alignment, buffer, idx)
                    .filter(|&ch| ch != ' ')
                    .map(|ch| ch.to_string())
                    .unwrap_or(token.display);
                (
                    shown,
                    Style::default()
                        .fg(colors.text_incorrect)
                        .bg(colors.text_incorrect_bg)
                        .add_modifier(Modifier::UNDERLINED),
                )
            } else if alignment.correct.contains(&idx) {
                (token.display, Style::default().fg(colors.text_correct))
            } else if idx == cursor {
                let style = Style::default()
                    .fg(colors.text_cursor_fg)
                    .bg(colors.text_cursor_bg);
                match preedit {
                    Some(base) => (
                        base.to_string(),
                        style.bg(colors.held_kana).add_modifier(Modifier::UNDERLINED),
                    ),
                    None => (token.display, style),
                }
            } else {
                (token.display, Style::default().fg(colors.text_pending))
            };

            if let Some(line) = lines.last_mut() {
                line.push(Span::styled(display, style));
            }
            if token.is_line_break {
                lines.push(Vec::new());
            }
        }

        let ratatui_lines: Vec<Line> = lines.into_iter().map(Line::from).collect();
        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border))
            .style(Style::default().bg(colors.bg));

        Paragraph::new(ratatui_lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tokens_widen_spaces() {
        let target: Vec<char> = "わたし は".chars().collect();
        let tokens = build_render_tokens(&target);
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[3].display, "\u{3000}");
        assert_eq!(tokens[4].target_idx, 4);
        assert!(tokens.iter().all(|t| !t.is_line_break));
    }

    #[test]
    fn test_render_tokens_newline() {
        let target: Vec<char> = "ね\nこ".chars().collect();
        let tokens = build_render_tokens(&target);
        assert!(tokens[1].is_line_break);
        assert_eq!(tokens[1].display, "\u{21b5}");
    }

    #[test]
    fn test_wrong_input_shows_typed_kana() {
        let mut round = TextRound::new("ねこ", false);
        round.apply("ろ");
        let shown = wrong_input(round.alignment(), round.buffer(), 0);
        assert_eq!(shown, Some('ろ'));
        assert_eq!(wrong_input(round.alignment(), round.buffer(), 1), None);
    }

    #[test]
    fn test_pending_base_is_previewed() {
        let mut round = TextRound::new("がこ", false);
        round.apply("か");
        assert_eq!(pending_base(round.alignment(), round.buffer()), Some('か'));
        round.apply("か゛");
        assert_eq!(pending_base(round.alignment(), round.buffer()), None);
    }
}
