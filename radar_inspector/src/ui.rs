use std::collections::VecDeque;

use chrono::Local;
use radar_core::{category_list, InsightStatus, RadarState, LEFT_COLUMN, RIGHT_COLUMN};
use radar_runtime::COMMAND_HELP;
use radar_schema::{Category, Rgb};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::editor::{EditTarget, LineEditor};

/// Chart coordinates run from 0 to 100 on both axes, top-left origin.
pub const CHART_SIDE: f64 = 100.0;

/// Clickable things recorded while drawing the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Item(i64),
    Title,
    Subtitle,
    Restore(usize),
}

pub struct UiState {
    pub logs: VecDeque<String>,
    pub max_logs: usize,
    pub editor: Option<LineEditor>,
    pub show_help: bool,
    pub notice: Option<String>,
    chart_area: Option<Rect>,
    hit_regions: Vec<(Rect, HitTarget)>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            logs: VecDeque::new(),
            max_logs: 7,
            editor: None,
            show_help: false,
            notice: None,
            chart_area: None,
            hit_regions: Vec::new(),
        }
    }
}

impl UiState {
    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }

    pub fn set_notice<S: Into<String>>(&mut self, notice: S) {
        self.notice = Some(notice.into());
    }

    pub fn is_editing(&self, target: EditTarget) -> bool {
        self.editor
            .as_ref()
            .is_some_and(|editor| editor.target() == target)
    }

    pub fn chart_area(&self) -> Option<Rect> {
        self.chart_area
    }

    pub fn target_at(&self, column: u16, row: u16) -> Option<HitTarget> {
        self.hit_regions
            .iter()
            .rev()
            .find(|(rect, _)| contains(*rect, column, row))
            .map(|(_, target)| *target)
    }

    fn register(&mut self, rect: Rect, target: HitTarget) {
        self.hit_regions.push((rect, target));
    }
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

/// Center of terminal cell `(column, row)` in chart coordinates, if it lies on the chart.
pub fn cell_to_chart(area: Rect, column: u16, row: u16) -> Option<(f64, f64)> {
    if area.width == 0 || area.height == 0 || !contains(area, column, row) {
        return None;
    }
    let x = (f64::from(column - area.x) + 0.5) / f64::from(area.width) * CHART_SIDE;
    let y = (f64::from(row - area.y) + 0.5) / f64::from(area.height) * CHART_SIDE;
    Some((x, y))
}

/// Half a cell, so a pointer on a bubble's edge cell still counts as a hit.
pub fn hit_slop(area: Rect) -> f64 {
    let cell_width = CHART_SIDE / f64::from(area.width.max(1));
    let cell_height = CHART_SIDE / f64::from(area.height.max(1));
    cell_width.max(cell_height) / 2.0
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

fn inner(area: Rect) -> Rect {
    area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    })
}

pub fn draw_ui(frame: &mut Frame, ui: &mut UiState, state: &RadarState) {
    ui.hit_regions.clear();
    let status_height = if state.error().is_some() { 3 } else { 1 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(status_height),
            Constraint::Min(12),
            Constraint::Length(9),
            Constraint::Length(3),
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], ui, state);
    draw_status(frame, chunks[1], ui, state);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(28),
            Constraint::Percentage(44),
            Constraint::Percentage(28),
        ])
        .split(chunks[2]);
    draw_category_column(frame, main[0], ui, state, &LEFT_COLUMN);
    draw_chart(frame, main[1], ui, state);
    draw_category_column(frame, main[2], ui, state, &RIGHT_COLUMN);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(38),
            Constraint::Percentage(37),
            Constraint::Percentage(25),
        ])
        .split(chunks[3]);
    draw_history(frame, bottom[0], ui, state);
    draw_logs(frame, bottom[1], ui);
    draw_commands(frame, bottom[2]);
    draw_prompt(frame, chunks[4], ui);

    draw_tooltip(frame, state);
    if ui.show_help {
        draw_help(frame);
    }
    draw_insight(frame, state);
}

fn editable_line<'a>(
    frame: &mut Frame,
    area: Rect,
    ui: &UiState,
    target: EditTarget,
    value: &'a str,
    style: Style,
) -> Line<'a> {
    match ui.editor.as_ref().filter(|editor| editor.target() == target) {
        Some(editor) => {
            let text = editor.text();
            let width = text.chars().count() as u16;
            let start = area.x + area.width.saturating_sub(width) / 2;
            frame.set_cursor(
                (start + editor.cursor() as u16).min(area.right().saturating_sub(1)),
                area.y,
            );
            Line::from(Span::styled(text, style.add_modifier(Modifier::UNDERLINED)))
        }
        None => Line::from(Span::styled(value, style)),
    }
}

fn draw_header(frame: &mut Frame, area: Rect, ui: &mut UiState, state: &RadarState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Market Context Radar");
    let inner = inner(area);
    frame.render_widget(block, area);

    let title_area = Rect { height: 1, ..inner };
    let subtitle_area = Rect {
        y: inner.y + 1,
        height: inner.height.saturating_sub(1),
        ..inner
    };
    let title = editable_line(
        frame,
        title_area,
        ui,
        EditTarget::Title,
        state.title(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    let subtitle = editable_line(
        frame,
        subtitle_area,
        ui,
        EditTarget::Subtitle,
        state.subtitle(),
        Style::default().fg(Color::Gray),
    );
    frame.render_widget(Paragraph::new(title).alignment(Alignment::Center), title_area);
    frame.render_widget(
        Paragraph::new(subtitle)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        subtitle_area,
    );
    ui.register(title_area, HitTarget::Title);
    ui.register(subtitle_area, HitTarget::Subtitle);
}

fn draw_status(frame: &mut Frame, area: Rect, ui: &UiState, state: &RadarState) {
    if let Some(error) = state.error() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title("Error (x to dismiss)");
        let text = Paragraph::new(Span::styled(error, Style::default().fg(Color::Red)))
            .wrap(Wrap { trim: true });
        frame.render_widget(block, area);
        frame.render_widget(text, inner(area));
        return;
    }

    let line = if state.is_importing() {
        Line::from(Span::styled(
            "Processing data...",
            Style::default().fg(Color::Cyan),
        ))
    } else if let Some(kind) = state.export_in_flight() {
        Line::from(Span::styled(
            format!("Downloading {kind}..."),
            Style::default().fg(Color::Cyan),
        ))
    } else if let Some(notice) = &ui.notice {
        Line::from(Span::raw(notice.as_str()))
    } else {
        Line::from(vec![
            Span::styled(
                format!("{} items", state.items().len()),
                Style::default().fg(Color::Green),
            ),
            Span::raw(" | click a bubble or row for an AI insight"),
        ])
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_category_column(
    frame: &mut Frame,
    area: Rect,
    ui: &mut UiState,
    state: &RadarState,
    categories: &[Category],
) {
    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(block, area);
    let inner = inner(area);
    let bottom = inner.bottom();
    let width = usize::from(inner.width);
    let mut y = inner.y;

    for category in categories {
        let Some(list) = category_list(state.groups(), *category, state.config()) else {
            continue;
        };
        if y >= bottom {
            break;
        }
        let accent = color(list.color);
        let header = Line::from(Span::styled(
            truncate(list.label, width),
            Style::default()
                .fg(accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ));
        frame.render_widget(Paragraph::new(header), Rect { y, height: 1, ..inner });
        y += 1;

        for item in list.items {
            if y >= bottom {
                break;
            }
            let badge = format!("{:>3} ", item.id);
            let text_width = width.saturating_sub(badge.chars().count());
            let row = Rect { y, height: 1, ..inner };
            let line = Line::from(vec![
                Span::styled(
                    badge,
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                ),
                Span::raw(truncate(&item.text, text_width)),
            ]);
            frame.render_widget(Paragraph::new(line), row);
            ui.register(row, HitTarget::Item(item.id));
            y += 1;
        }
        y += 1;
    }
}

fn draw_chart(frame: &mut Frame, area: Rect, ui: &mut UiState, state: &RadarState) {
    let block = Block::default().borders(Borders::ALL).title("Radar");
    let inner = block.inner(area);
    ui.chart_area = Some(inner);

    let scene = state.scene(CHART_SIDE);
    let cell_width = CHART_SIDE / f64::from(inner.width.max(1));
    let flip = |y: f64| CHART_SIDE - y;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, CHART_SIDE])
        .y_bounds([0.0, CHART_SIDE])
        .paint(|ctx| {
            for axis in &scene.axes {
                ctx.draw(&CanvasLine {
                    x1: axis.from.x,
                    y1: flip(axis.from.y),
                    x2: axis.to.x,
                    y2: flip(axis.to.y),
                    color: Color::DarkGray,
                });
            }
            for ring in &scene.rings {
                ctx.draw(&Circle {
                    x: scene.center.x,
                    y: flip(scene.center.y),
                    radius: ring.radius,
                    color: Color::DarkGray,
                });
            }
            for bubble in &scene.bubbles {
                ctx.draw(&Circle {
                    x: bubble.center.x,
                    y: flip(bubble.center.y),
                    radius: bubble.radius,
                    color: color(bubble.color),
                });
            }
            ctx.layer();

            for ring in &scene.rings {
                let text = format!(" {} ", ring.label);
                let offset = text.chars().count() as f64 * cell_width / 2.0;
                ctx.print(
                    ring.label_at.x - offset,
                    flip(ring.label_at.y),
                    Span::styled(
                        text,
                        Style::default().fg(Color::White).bg(color(Rgb::INK)),
                    ),
                );
            }
            for label in &scene.quadrant_labels {
                let width = label.text.chars().count() as f64 * cell_width;
                let x = if label.corner.is_right() {
                    label.anchor.x - width
                } else {
                    label.anchor.x
                };
                ctx.print(
                    x,
                    flip(label.anchor.y),
                    Span::styled(
                        label.text.clone(),
                        Style::default()
                            .fg(color(label.color))
                            .add_modifier(Modifier::BOLD),
                    ),
                );
            }
            for bubble in &scene.bubbles {
                let offset = bubble.label.chars().count() as f64 * cell_width / 2.0;
                ctx.print(
                    bubble.center.x - offset,
                    flip(bubble.center.y),
                    Span::styled(
                        bubble.label.clone(),
                        Style::default()
                            .fg(color(bubble.color))
                            .add_modifier(Modifier::BOLD),
                    ),
                );
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_history(frame: &mut Frame, area: Rect, ui: &mut UiState, state: &RadarState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Version History");
    frame.render_widget(block, area);
    let inner = inner(area);
    let history = state.history();
    if history.is_empty() {
        frame.render_widget(Paragraph::new("No versions available."), inner);
        return;
    }

    let width = usize::from(inner.width);
    let active = history.active_index();
    // Newest last; scroll so the most recent checkpoints stay visible.
    let visible = usize::from(inner.height);
    let skip = history.len().saturating_sub(visible);
    for (offset, (index, checkpoint)) in history
        .checkpoints()
        .iter()
        .enumerate()
        .skip(skip)
        .enumerate()
    {
        let row = Rect {
            y: inner.y + offset as u16,
            height: 1,
            ..inner
        };
        let is_active = active == Some(index);
        let button = if is_active { "[Active]" } else { "[Restore]" };
        let meta = format!(
            " {} - {} items ",
            checkpoint
                .timestamp
                .with_timezone(&Local)
                .format("%H:%M:%S"),
            checkpoint.items.len()
        );
        let name_width = width.saturating_sub(meta.chars().count() + button.len() + 4);
        let name_style = if is_active {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let line = Line::from(vec![
            Span::styled(format!("{index:>2} "), Style::default().fg(Color::DarkGray)),
            Span::styled(truncate(&checkpoint.name, name_width), name_style),
            Span::styled(meta, Style::default().fg(Color::DarkGray)),
            Span::styled(
                button,
                if is_active {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::Yellow)
                },
            ),
        ]);
        frame.render_widget(Paragraph::new(line), row);
        if !is_active {
            ui.register(row, HitTarget::Restore(index));
        }
    }
}

fn draw_logs(frame: &mut Frame, area: Rect, ui: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Logs");
    let lines: Vec<Line> = ui
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry)))
        .collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(paragraph, inner(area));
}

fn draw_commands(frame: &mut Frame, area: Rect) {
    let keys = [
        (":", "command prompt"),
        ("e / s", "edit title / subtitle"),
        ("i", "import file"),
        ("p / d", "download PNG / PDF"),
        ("c", "save checkpoint"),
        ("?", "command help"),
        ("q", "exit"),
    ];
    let lines: Vec<Line> = keys
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("{key:<6}"), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ])
        })
        .collect();
    let block = Block::default().borders(Borders::ALL).title("Commands");
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(paragraph, inner(area));
}

fn draw_prompt(frame: &mut Frame, area: Rect, ui: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Command");
    let inner = inner(area);
    frame.render_widget(block, area);
    let line = match ui.editor.as_ref().filter(|editor| editor.target() == EditTarget::Command) {
        Some(editor) => {
            frame.set_cursor(
                (inner.x + 1 + editor.cursor() as u16).min(inner.right().saturating_sub(1)),
                inner.y,
            );
            Line::from(vec![
                Span::styled(":", Style::default().fg(Color::Yellow)),
                Span::raw(editor.text()),
            ])
        }
        None => match ui.editor.as_ref() {
            Some(editor) => Line::from(Span::styled(
                format!("Editing {}: Enter to save, Esc to cancel", editor.target().label()),
                Style::default().fg(Color::DarkGray),
            )),
            None => Line::from(Span::styled(
                "Press : to type a command, ? for the list",
                Style::default().fg(Color::DarkGray),
            )),
        },
    };
    frame.render_widget(Paragraph::new(line), inner);
}

fn draw_tooltip(frame: &mut Frame, state: &RadarState) {
    let Some(tooltip) = state.tooltip() else {
        return;
    };
    let screen = frame.size();
    let chars = tooltip.content.chars().count();
    let width = (chars.saturating_add(2).clamp(10, 42) as u16).min(screen.width);
    let text_width = usize::from(width.saturating_sub(2)).max(1);
    let lines = chars.div_ceil(text_width);
    let height = u16::try_from(lines.saturating_add(2))
        .unwrap_or(u16::MAX)
        .min(screen.height);
    let x = (tooltip.x as u16).saturating_add(2).min(screen.right().saturating_sub(width));
    let y = (tooltip.y as u16).saturating_add(1).min(screen.bottom().saturating_sub(height));
    let area = Rect {
        x,
        y,
        width,
        height,
    };
    let paragraph = Paragraph::new(tooltip.content.as_str())
        .style(Style::default().fg(Color::White).bg(color(Rgb::INK)))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn percent_of(length: u16, percent: u16) -> u16 {
    (u32::from(length) * u32::from(percent.min(100)) / 100) as u16
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = percent_of(area.width, percent_x);
    let height = percent_of(area.height, percent_y);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_help(frame: &mut Frame) {
    let area = centered(frame.size(), 60, 50);
    let lines: Vec<Line> = COMMAND_HELP
        .iter()
        .map(|(usage, description)| {
            Line::from(vec![
                Span::styled(format!("{usage:<20}"), Style::default().fg(Color::Yellow)),
                Span::raw(*description),
            ])
        })
        .collect();
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Commands (? to close)"),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn draw_insight(frame: &mut Frame, state: &RadarState) {
    let Some(view) = state.insight() else {
        return;
    };
    let area = centered(frame.size(), 70, 60);
    let style = state.config().category(view.item.category);
    let mut lines = vec![
        Line::from(Span::styled(
            view.item.text.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" {} ", style.label),
            Style::default().fg(Color::White).bg(color(style.color)),
        )),
        Line::default(),
    ];
    match &view.status {
        InsightStatus::Loading => lines.push(Line::from(Span::styled(
            "Generating insight...",
            Style::default().fg(Color::DarkGray),
        ))),
        InsightStatus::Ready(text) => {
            lines.extend(text.lines().map(|line| Line::from(line.to_string())));
        }
    }
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("AI Insight (Esc to close)"),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_map_to_chart_percentages() {
        let area = Rect::new(10, 5, 50, 20);
        assert_eq!(cell_to_chart(area, 10, 5), Some((1.0, 2.5)));
        let (x, y) = cell_to_chart(area, 59, 24).unwrap();
        assert!((x - 99.0).abs() < 1e-9 && (y - 97.5).abs() < 1e-9);
        assert_eq!(cell_to_chart(area, 9, 5), None);
        assert_eq!(cell_to_chart(area, 60, 5), None);
        assert!((hit_slop(area) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn latest_hit_region_wins() {
        let mut ui = UiState::default();
        ui.register(Rect::new(0, 0, 10, 1), HitTarget::Title);
        ui.register(Rect::new(2, 0, 3, 1), HitTarget::Item(4));
        assert_eq!(ui.target_at(3, 0), Some(HitTarget::Item(4)));
        assert_eq!(ui.target_at(8, 0), Some(HitTarget::Title));
        assert_eq!(ui.target_at(8, 1), None);
    }

    #[test]
    fn logs_are_trimmed_and_bounded() {
        let mut ui = UiState::default();
        for index in 0..10 {
            ui.push_log(format!("line {index}\n"));
        }
        ui.push_log("\n");
        assert_eq!(ui.logs.len(), ui.max_logs);
        assert_eq!(ui.logs.front().map(String::as_str), Some("line 9"));
    }

    #[test]
    fn overlays_fit_very_wide_terminals() {
        let area = Rect::new(0, 0, u16::MAX, u16::MAX);
        let modal = centered(area, 70, 60);
        assert_eq!(modal.width, percent_of(u16::MAX, 70));
        assert!(modal.right() <= area.right() && modal.bottom() <= area.bottom());
        assert_eq!(percent_of(1000, 150), 1000);
    }

    #[test]
    fn tooltip_handles_text_longer_than_a_u16() {
        use radar_core::RadarConfig;
        use radar_schema::{Category, Impact, MarketItem};
        use ratatui::backend::TestBackend;
        use ratatui::Terminal;

        let long_text = "x".repeat(70_000);
        let items = vec![MarketItem::new(1, long_text, Category::Macro, Impact::Near)];
        let mut state = RadarState::new(RadarConfig::builtin(), items, 1);
        state.hover_bubble(1, 5.0, 5.0);

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| draw_tooltip(frame, &state)).unwrap();
    }

    #[test]
    fn truncation_marks_cut_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer line", 6), "a lon…");
    }
}
