use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use kanadr::engine::pool::GROUPS;
use kanadr::store::schema::StatsData;

use crate::ui::theme::Theme;

/// Kana with the lowest accuracy, worst first. Ties go to the kana missed
/// more often.
pub fn weakest_kana(data: &StatsData, limit: usize) -> Vec<(char, f64)> {
    let mut scored: Vec<(char, f64, u64)> = data
        .kana
        .iter()
        .filter_map(|(&ch, stat)| stat.accuracy().map(|acc| (ch, acc, stat.wrong)))
        .filter(|&(_, acc, _)| acc < 100.0)
        .collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(b.2.cmp(&a.2)));
    scored
        .into_iter()
        .take(limit)
        .map(|(ch, acc, _)| (ch, acc))
        .collect()
}

fn percent(correct: u64, wrong: u64) -> String {
    match correct + wrong {
        0 => "-".to_string(),
        total => format!("{:.1}%", correct as f64 / total as f64 * 100.0),
    }
}

pub struct StatsDashboard<'a> {
    data: &'a StatsData,
    confirm_reset: bool,
    theme: &'a Theme,
}

impl<'a> StatsDashboard<'a> {
    pub fn new(data: &'a StatsData, confirm_reset: bool, theme: &'a Theme) -> Self {
        Self {
            data,
            confirm_reset,
            theme,
        }
    }

    fn panel(&self, title: &str, rows: Vec<(&'static str, String)>, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let lines: Vec<Line> = rows
            .into_iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{label:<10}"), Style::default().fg(colors.fg)),
                    Span::styled(value, Style::default().fg(colors.accent)),
                ])
            })
            .collect();
        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .title(format!(" {title} "))
                    .border_style(Style::default().fg(colors.border)),
            )
            .render(area, buf);
    }

    fn render_summary(&self, area: Rect, buf: &mut Buffer) {
        let d = self.data;
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        self.panel(
            "Drill",
            vec![
                ("Correct", d.practice.correct.to_string()),
                ("Wrong", d.practice.wrong.to_string()),
                ("Accuracy", percent(d.practice.correct, d.practice.wrong)),
                ("Best run", d.practice.best_streak.to_string()),
            ],
            columns[0],
            buf,
        );
        self.panel(
            "Stream",
            vec![
                ("Runs", d.typing.runs.to_string()),
                ("Best KPM", d.typing.best_kpm.to_string()),
                ("Streams", d.typing.streams.to_string()),
                ("Accuracy", percent(d.typing.correct, d.typing.wrong)),
            ],
            columns[1],
            buf,
        );
        self.panel(
            "Words",
            vec![
                ("Words", d.word.words.to_string()),
                ("Correct", d.word.correct.to_string()),
                ("Wrong", d.word.wrong.to_string()),
                ("Accuracy", percent(d.word.correct, d.word.wrong)),
            ],
            columns[2],
            buf,
        );
        self.panel(
            "Sentences",
            vec![
                ("Sentences", d.sentence.sentences.to_string()),
                ("Correct", d.sentence.correct.to_string()),
                ("Wrong", d.sentence.wrong.to_string()),
                ("Accuracy", percent(d.sentence.correct, d.sentence.wrong)),
            ],
            columns[3],
            buf,
        );
    }

    /// One row per practice group, each kana coloured by its accuracy.
    fn render_heatmap(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let mut lines = Vec::with_capacity(GROUPS.len());
        for group in GROUPS {
            let mut spans = vec![Span::styled(
                format!("{:<8}", group.name),
                Style::default().fg(colors.text_pending),
            )];
            let mut seen = Vec::new();
            for &ch in group.items {
                if seen.contains(&ch) {
                    continue;
                }
                seen.push(ch);
                let accuracy = self.data.kana_stat(ch).accuracy();
                spans.push(Span::styled(
                    format!("{ch} "),
                    Style::default()
                        .fg(colors.accuracy(accuracy))
                        .add_modifier(if accuracy.is_some() {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                ));
            }
            lines.push(Line::from(spans));
        }
        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .title(" Kana Accuracy ")
                    .border_style(Style::default().fg(colors.border)),
            )
            .render(area, buf);
    }

    fn render_weakest(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let weakest = weakest_kana(self.data, area.height.saturating_sub(2) as usize);
        let lines: Vec<Line> = if weakest.is_empty() {
            vec![Line::from(Span::styled(
                "Nothing missed yet",
                Style::default().fg(colors.text_pending),
            ))]
        } else {
            weakest
                .into_iter()
                .map(|(ch, acc)| {
                    Line::from(vec![
                        Span::styled(format!("{ch}  "), Style::default().fg(colors.fg)),
                        Span::styled(
                            format!("{acc:.0}%"),
                            Style::default().fg(colors.accuracy(Some(acc))),
                        ),
                    ])
                })
                .collect()
        };
        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .title(" Weakest ")
                    .border_style(Style::default().fg(colors.border)),
            )
            .render(area, buf);
    }

    fn render_confirm(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let dialog_width = 36u16.min(area.width);
        let dialog_height = 5u16.min(area.height);
        let dialog_x = area.x + area.width.saturating_sub(dialog_width) / 2;
        let dialog_y = area.y + area.height.saturating_sub(dialog_height) / 2;
        let dialog_area = Rect::new(dialog_x, dialog_y, dialog_width, dialog_height);

        Clear.render(dialog_area, buf);
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Reset all statistics? (y/n)  ",
                Style::default().fg(colors.fg),
            )),
        ])
        .style(Style::default().bg(colors.bg))
        .block(
            Block::bordered()
                .title(" Confirm ")
                .border_style(Style::default().fg(colors.error))
                .style(Style::default().bg(colors.bg)),
        )
        .render(dialog_area, buf);
    }
}

impl Widget for StatsDashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Statistics ")
            .border_style(Style::default().fg(colors.accent))
            .style(Style::default().bg(colors.bg));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6),
                Constraint::Min(GROUPS.len() as u16 + 2),
                Constraint::Length(1),
            ])
            .split(inner);

        self.render_summary(layout[0], buf);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(16)])
            .split(layout[1]);
        self.render_heatmap(body[0], buf);
        self.render_weakest(body[1], buf);

        Paragraph::new(Line::from(Span::styled(
            "  [x] Reset stats  [ESC/q] Back",
            Style::default().fg(colors.accent),
        )))
        .render(layout[2], buf);

        if self.confirm_reset {
            self.render_confirm(area, buf);
        }
    }
}
