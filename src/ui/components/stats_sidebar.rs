use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use kanadr::session::Counters;
use kanadr::store::schema::KanaStat;

use crate::ui::theme::Theme;

/// Numbers shown next to a running session.
#[derive(Clone, Copy, Debug, Default)]
pub struct SidebarStats {
    pub counters: Counters,
    /// Correct kana per minute, for timed modes.
    pub kpm: Option<u32>,
    pub elapsed_secs: Option<f64>,
    /// All-time accuracy of the mode, to compare the run against.
    pub lifetime_accuracy: Option<f64>,
    pub target: Option<char>,
    pub target_stat: KanaStat,
}

pub struct StatsSidebar<'a> {
    stats: SidebarStats,
    show_streak: bool,
    theme: &'a Theme,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(stats: SidebarStats, show_streak: bool, theme: &'a Theme) -> Self {
        Self {
            stats,
            show_streak,
            theme,
        }
    }
}

fn format_delta(delta: f64, suffix: &str) -> String {
    if delta > 0.0 {
        format!("\u{2191}+{delta:.1}{suffix}")
    } else if delta < 0.0 {
        format!("\u{2193}{delta:.1}{suffix}")
    } else {
        format!("={suffix}")
    }
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let stats = self.stats;
        let label = |text: &'static str| Span::styled(text, Style::default().fg(colors.fg));

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(6)])
            .split(area);

        let accuracy = stats.counters.accuracy();
        let acc_str = accuracy.map_or("-".to_string(), |a| format!("{a:.1}%"));
        let mut lines = Vec::new();
        if let Some(kpm) = stats.kpm {
            lines.push(Line::from(vec![
                label("KPM: "),
                Span::styled(kpm.to_string(), Style::default().fg(colors.accent)),
            ]));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(vec![
            label("Accuracy: "),
            Span::styled(acc_str, Style::default().fg(colors.accuracy(accuracy))),
        ]));
        if let (Some(run), Some(lifetime)) = (accuracy, stats.lifetime_accuracy) {
            let delta = run - lifetime;
            let color = if delta > 0.0 {
                colors.success
            } else if delta < 0.0 {
                colors.error
            } else {
                colors.text_pending
            };
            lines.push(Line::from(vec![
                Span::styled("  vs all-time: ", Style::default().fg(colors.text_pending)),
                Span::styled(format_delta(delta, "%"), Style::default().fg(color)),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            label("Correct: "),
            Span::styled(
                stats.counters.correct.to_string(),
                Style::default().fg(colors.success),
            ),
        ]));
        lines.push(Line::from(vec![
            label("Errors:  "),
            Span::styled(
                stats.counters.wrong.to_string(),
                Style::default().fg(colors.error),
            ),
        ]));
        if self.show_streak {
            lines.push(Line::from(vec![
                label("Streak:  "),
                Span::styled(
                    format!("{} (best {})", stats.counters.streak, stats.counters.best_streak),
                    Style::default().fg(colors.accent),
                ),
            ]));
        } else {
            lines.push(Line::from(vec![
                label("Done:    "),
                Span::styled(
                    stats.counters.completed.to_string(),
                    Style::default().fg(colors.accent),
                ),
            ]));
        }
        if let Some(secs) = stats.elapsed_secs {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                label("Time: "),
                Span::styled(format!("{secs:.1}s"), Style::default().fg(colors.fg)),
            ]));
        }

        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .title(" This Run ")
                    .border_style(Style::default().fg(colors.border))
                    .style(Style::default().bg(colors.bg)),
            )
            .render(sections[0], buf);

        let kana_lines = match stats.target {
            Some(ch) => {
                let stat = stats.target_stat;
                let accuracy = stat.accuracy();
                vec![
                    Line::from(Span::styled(
                        ch.to_string(),
                        Style::default().fg(colors.focused_key),
                    )),
                    Line::from(vec![
                        label("Hits: "),
                        Span::styled(
                            format!("{}/{}", stat.correct, stat.total()),
                            Style::default().fg(colors.fg),
                        ),
                    ]),
                    Line::from(vec![
                        label("Acc:  "),
                        Span::styled(
                            accuracy.map_or("new".to_string(), |a| format!("{a:.0}%")),
                            Style::default().fg(colors.accuracy(accuracy)),
                        ),
                    ]),
                ]
            }
            None => vec![Line::from(Span::styled(
                "-",
                Style::default().fg(colors.text_pending),
            ))],
        };
        Paragraph::new(kana_lines)
            .block(
                Block::bordered()
                    .title(" Next Kana ")
                    .border_style(Style::default().fg(colors.border))
                    .style(Style::default().bg(colors.bg)),
            )
            .render(sections[1], buf);
    }
}
