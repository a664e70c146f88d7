mod help;
mod list;

use crate::app::{InputMode, Mode, ViewState};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
};
use std::time::{SystemTime, UNIX_EPOCH};

/// Top-level render: tabs, banners, search bar, card list, status bar.
pub fn render(state: &ViewState, frame: &mut Frame) {
    let area = frame.area();
    let banners = banners(state);
    let search_height = if state.mode == Mode::Search { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(banners.len() as u16),
            Constraint::Length(search_height),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    render_tabs(state, frame, chunks[0]);
    for (row, banner) in banners.into_iter().enumerate() {
        let area = Rect {
            y: chunks[1].y + row as u16,
            height: 1,
            ..chunks[1]
        };
        frame.render_widget(banner, area.intersection(chunks[1]));
    }
    if state.mode == Mode::Search {
        render_search_bar(state, frame, chunks[2]);
    }
    list::render(state, frame, chunks[3], spinner_tick());
    render_status(state, frame, chunks[4]);

    // Render help overlay on top if active
    if state.show_help {
        help::render(frame);
    }
}

fn render_tabs(state: &ViewState, frame: &mut Frame, area: Rect) {
    let titles: Vec<Line> = Mode::ALL.iter().map(|m| Line::from(m.label())).collect();
    let selected = Mode::ALL.iter().position(|m| *m == state.mode).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Movie Rater "),
        );
    frame.render_widget(tabs, area);
}

/// Offline and error lines are independent; both show when both are set.
fn banners(state: &ViewState) -> Vec<Paragraph<'static>> {
    let mut banners = Vec::new();
    if state.is_offline() {
        let text = if state.connectivity.forced_offline {
            " Offline (press o to reconnect)"
        } else {
            " Offline: the catalog is unreachable"
        };
        banners.push(
            Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::Yellow)),
        );
    }
    if state.has_error {
        let message = state
            .error_message
            .clone()
            .unwrap_or_else(|| "Something went wrong".to_string());
        banners.push(
            Paragraph::new(format!(" {}", message))
                .style(Style::default().fg(Color::White).bg(Color::Red)),
        );
    }
    banners
}

fn render_search_bar(state: &ViewState, frame: &mut Frame, area: Rect) {
    let style = match state.input_mode {
        InputMode::Editing => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default().fg(Color::DarkGray),
    };
    let label = if state.input_mode == InputMode::Editing {
        " Query (Enter/Esc to stop editing): "
    } else {
        " Query (/): "
    };
    let bar = Paragraph::new(format!("{}{}", label, state.input))
        .style(style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style)
                .title(" Search "),
        );
    frame.render_widget(bar, area);

    // Set cursor position when editing
    if state.input_mode == InputMode::Editing {
        let cursor_x = area.x + 1 + label.len() as u16 + unicode_width::UnicodeWidthStr::width(state.input.as_str()) as u16;
        frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn render_status(state: &ViewState, frame: &mut Frame, area: Rect) {
    let key = |k: &'static str| {
        Span::styled(
            k,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    };
    let mut spans = vec![
        key(" Tab"),
        Span::raw(" Switch  "),
        key("←→"),
        Span::raw(" Page  "),
    ];
    if state.mode == Mode::Search {
        spans.push(key("1-9"));
        spans.push(Span::raw(" Rate  "));
    }
    spans.extend([
        key("?"),
        Span::raw(" Help  "),
        key("q"),
        Span::raw(" Quit  "),
        Span::styled(state.status_msg.clone(), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn spinner_tick() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_millis() / 150) as usize)
        .unwrap_or(0)
}
