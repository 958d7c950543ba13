use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ConnectionStatus, Dialog, Focus, Level, MENU_ITEMS};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(8),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_form(frame, app, chunks[1]);
    render_users(frame, app, chunks[2]);
    render_scan(frame, app, chunks[3]);
    render_activity(frame, app, chunks[4]);

    if let Some(index) = app.menu {
        render_menu(frame, index);
    }
    if let Some(dialog) = app.dialogs.front() {
        render_dialog(frame, dialog);
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Info => Color::Green,
        Level::Warning => Color::Yellow,
        Level::Error => Color::Red,
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (status, color) = match &app.connection {
        ConnectionStatus::Connecting => ("connecting".to_string(), Color::Yellow),
        ConnectionStatus::Ready(identity) => (format!("online as {}", identity), Color::Green),
        ConnectionStatus::Failed => ("offline".to_string(), Color::Red),
    };
    let line = Line::from(vec![
        Span::styled("rfidbot", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {} ", app.platform_name)),
        Span::styled(status, Style::default().fg(color)),
        Span::raw(format!("  channel {}", app.settings.channel_id)),
        Span::styled(
            "   F10 menu  Tab focus  Ctrl+Q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::BadgeId | Focus::Name | Focus::Message);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Add User (Enter) ")
        .border_style(focus_style(focused));
    let inner = block.inner(area);

    let fields = [
        ("RFID", &app.form.badge_id, Focus::BadgeId),
        ("Name", &app.form.name, Focus::Name),
        ("Custom Text", &app.form.message, Focus::Message),
    ];
    let lines: Vec<Line> = fields
        .iter()
        .map(|(label, value, focus)| {
            Line::from(vec![
                Span::styled(format!("{:<12} ", label), focus_style(app.focus == *focus)),
                Span::raw(value.as_str()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if let Some(row) = fields.iter().position(|(_, _, f)| *f == app.focus) {
        let value = fields[row].1;
        let x = cursor_x(inner, 13, value);
        frame.set_cursor_position((x, inner.y + row as u16));
    }
}

fn render_users(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .registry
        .rows()
        .map(|record| ListItem::new(record.listing_line()))
        .collect();
    let title = format!(" Users ({})  Del: delete ", app.registry.len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(focus_style(app.focus == Focus::Users)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(app.selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_scan(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Scan;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" RFID Input ")
        .border_style(focus_style(focused));
    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(app.scan.as_str()).block(block), area);

    if focused && app.dialogs.is_empty() && app.menu.is_none() {
        let x = cursor_x(inner, 0, app.scan.as_str());
        frame.set_cursor_position((x, inner.y));
    }
}

fn render_activity(frame: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .activity
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    entry.at.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(entry.text.as_str(), Style::default().fg(level_color(entry.level))),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Activity ")),
        area,
    );
}

fn render_menu(frame: &mut Frame, selected: usize) {
    let area = centered_rect(36, MENU_ITEMS.len() as u16 + 2, frame.area());
    let lines: Vec<Line> = MENU_ITEMS
        .iter()
        .enumerate()
        .map(|(i, (section, label, _))| {
            let style = if i == selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::styled(format!(" {:<9} {}", section, label), style)
        })
        .collect();
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Menu ")),
        area,
    );
}

fn render_dialog(frame: &mut Frame, dialog: &Dialog) {
    match dialog {
        Dialog::Message { level, title, body } => {
            let height = u16::try_from(body.lines().count())
                .unwrap_or(u16::MAX)
                .saturating_add(4);
            let area = centered_rect(70, height, frame.area());
            let block = Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title))
                .border_style(Style::default().fg(level_color(*level)));
            let text = format!("{}\n\n[Enter] OK", body);
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
                area,
            );
        }
        Dialog::Prompt {
            title,
            label,
            input,
            ..
        } => {
            let area = centered_rect(60, 6, frame.area());
            let block = Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title));
            let inner = block.inner(area);
            let lines = vec![
                Line::raw(label.as_str()),
                Line::styled(input.as_str(), Style::default().fg(Color::Yellow)),
                Line::raw(""),
                Line::styled("[Enter] OK  [Esc] Cancel", Style::default().fg(Color::DarkGray)),
            ];
            frame.render_widget(Clear, area);
            frame.render_widget(Paragraph::new(lines).block(block), area);
            let x = cursor_x(inner, 0, input);
            frame.set_cursor_position((x, inner.y + 1));
        }
    }
}

/// Column just past `text`, starting `offset` cells into `inner`, kept on
/// the last column of `inner` when the text is wider than the box
fn cursor_x(inner: Rect, offset: u16, text: &str) -> u16 {
    let width = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
    inner
        .x
        .saturating_add(offset)
        .saturating_add(width)
        .min(inner.right().saturating_sub(1))
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
