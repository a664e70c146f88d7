use crate::app::{Mode, ViewState};
use crate::projection::{BadgeColor, DisplayRecord};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn render(state: &ViewState, frame: &mut Frame, area: Rect, spinner_tick: usize) {
    let records = state.records();

    let page_info = format!(" Page {} of {} ", state.current_page(), state.total_pages().max(1));
    let title = match state.mode {
        Mode::Search if state.search.query.is_empty() => " Results ".to_string(),
        Mode::Search => format!(" Results for \"{}\" ", state.search.query),
        Mode::Rated => format!(" Rated by you [{}] ", state.overlay.total_count()),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
        .title_bottom(Line::from(page_info).alignment(Alignment::Right));

    if records.is_empty() {
        let text = empty_message(state, spinner_tick);
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // Card text width inside borders and highlight symbol
    let width = (area.width as usize).saturating_sub(6);
    let items: Vec<ListItem> = records
        .iter()
        .map(|record| card(record, state.displayed_rating(record.movie_id), width))
        .collect();

    let list_widget = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected()));
    frame.render_stateful_widget(list_widget, area, &mut list_state);
}

fn empty_message(state: &ViewState, spinner_tick: usize) -> String {
    match state.mode {
        Mode::Search if state.search.query.is_empty() && !state.search.is_fetching() => {
            "Type a query (press /) to search for movies".to_string()
        }
        Mode::Search if state.search.is_loading => {
            format!("{} Searching...", SPINNER[spinner_tick % SPINNER.len()])
        }
        Mode::Search => "No movies found".to_string(),
        Mode::Rated if state.session.is_creating() => "Creating a guest session...".to_string(),
        Mode::Rated if state.session.id().is_none() => "No guest session".to_string(),
        Mode::Rated if state.overlay.rated().is_none() && state.rated.is_polling() => {
            format!("{} Loading your ratings...", SPINNER[spinner_tick % SPINNER.len()])
        }
        Mode::Rated if state.overlay.rated().is_none() => "Ratings not loaded yet".to_string(),
        Mode::Rated => "You have not rated any movies yet".to_string(),
    }
}

fn card(record: &DisplayRecord, rating: f64, width: usize) -> ListItem<'static> {
    let mut head = Vec::new();
    if let Some(badge) = &record.rating_badge {
        head.push(Span::styled(
            format!(" {} ", badge.text),
            Style::default()
                .fg(Color::Black)
                .bg(badge_color(badge.color))
                .add_modifier(Modifier::BOLD),
        ));
        head.push(Span::raw(" "));
    }
    head.push(Span::styled(
        record.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    if let Some(date) = &record.formatted_date {
        head.push(Span::styled(
            format!("  {}", date),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let genres = if record.genre_names.is_empty() {
        "-".to_string()
    } else {
        record.genre_names.join(", ")
    };

    let mut lines = vec![
        Line::from(head),
        Line::from(Span::styled(
            truncate_str(&genres, width),
            Style::default().fg(Color::Cyan),
        )),
        Line::from(truncate_str(record.overview.trim(), width)),
        Line::from(vec![
            Span::styled(rating_bar(rating), Style::default().fg(Color::Yellow)),
            Span::styled(
                if rating > 0.0 {
                    format!(" {:.1}", rating)
                } else {
                    " not rated".to_string()
                },
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ];
    if let Some(url) = &record.poster_url {
        lines.push(Line::from(Span::styled(
            truncate_str(url, width),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(""));
    ListItem::new(lines)
}

fn badge_color(color: BadgeColor) -> Color {
    match color {
        BadgeColor::Red => Color::Red,
        BadgeColor::Orange => Color::Rgb(255, 165, 0),
        BadgeColor::Yellow => Color::Yellow,
        BadgeColor::Green => Color::Green,
    }
}

/// Ten cells, one per point, with a half cell for .5.
fn rating_bar(rating: f64) -> String {
    let halves = (rating.clamp(0.0, 10.0) * 2.0).round() as usize;
    let full = halves / 2;
    let half = halves % 2;
    let mut bar = "★".repeat(full);
    if half == 1 {
        bar.push('½');
    }
    bar.push_str(&"·".repeat(10 - full - half));
    bar
}

/// Truncate to `max_width` display columns, adding "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut used = 0;
    let mut result = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        result.push(c);
    }
    result.push('…');
    result
}
