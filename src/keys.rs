use crate::app::{InputMode, Mode, ViewState};
use crate::message::Msg;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Rating step for `+`/`-` on the selected card.
const RATING_STEP: f64 = 0.5;

/// Translate a key press. Purely visual state (help, selection, edit mode)
/// is changed in place; everything else becomes messages for the reducer.
pub fn handle_key(state: &mut ViewState, key: KeyEvent) -> Vec<Msg> {
    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        state.should_quit = true;
        return Vec::new();
    }

    if state.input_mode == InputMode::Editing {
        return handle_input_key(state, key);
    }

    // Help toggle
    if key.code == KeyCode::Char('?') {
        state.show_help = !state.show_help;
        return Vec::new();
    }

    // If help is showing, any key closes it
    if state.show_help {
        state.show_help = false;
        return Vec::new();
    }

    match key.code {
        KeyCode::Char('q') => {
            state.should_quit = true;
            Vec::new()
        }
        KeyCode::Tab | KeyCode::BackTab => vec![Msg::SetMode(state.mode.next())],
        KeyCode::Char('o') => vec![Msg::ToggleOffline],
        KeyCode::Down | KeyCode::Char('j') => {
            state.select_next();
            Vec::new()
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.select_prev();
            Vec::new()
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => next_page(state),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => prev_page(state),
        _ if state.mode == Mode::Search => handle_search_key(state, key),
        _ => Vec::new(),
    }
}

fn handle_search_key(state: &mut ViewState, key: KeyEvent) -> Vec<Msg> {
    match key.code {
        KeyCode::Char('/') => {
            state.input_mode = InputMode::Editing;
            Vec::new()
        }
        KeyCode::Char(c @ '0'..='9') => {
            let rating = match c.to_digit(10) {
                Some(0) => 10.0,
                Some(d) => f64::from(d),
                None => return Vec::new(),
            };
            rate_selected(state, rating)
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            adjust_pending(state, RATING_STEP);
            Vec::new()
        }
        KeyCode::Char('-') => {
            adjust_pending(state, -RATING_STEP);
            Vec::new()
        }
        KeyCode::Enter => match state.selected_movie().map(|m| m.id) {
            Some(id) => {
                let rating = state.displayed_rating(id);
                rate_selected(state, rating)
            }
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn handle_input_key(state: &mut ViewState, key: KeyEvent) -> Vec<Msg> {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            state.input_mode = InputMode::Normal;
            Vec::new()
        }
        KeyCode::Backspace => {
            let mut text = state.input.clone();
            if text.pop().is_none() {
                return Vec::new();
            }
            vec![Msg::InputChanged(text)]
        }
        KeyCode::Char(c) => {
            let mut text = state.input.clone();
            text.push(c);
            vec![Msg::InputChanged(text)]
        }
        _ => Vec::new(),
    }
}

fn rate_selected(state: &ViewState, rating: f64) -> Vec<Msg> {
    match state.selected_movie() {
        Some(movie) if rating > 0.0 => vec![Msg::Rate {
            movie_id: movie.id,
            rating,
        }],
        _ => Vec::new(),
    }
}

/// Move the widget value without sending anything; Enter submits it.
fn adjust_pending(state: &mut ViewState, delta: f64) {
    if let Some(id) = state.selected_movie().map(|m| m.id) {
        let value = (state.displayed_rating(id) + delta).clamp(0.0, 10.0);
        state.pending_ratings.insert(id, value);
    }
}

fn next_page(state: &ViewState) -> Vec<Msg> {
    let page = state.current_page();
    if u64::from(page) < state.total_pages() {
        vec![Msg::ChangePage(page + 1)]
    } else {
        Vec::new()
    }
}

fn prev_page(state: &ViewState) -> Vec<Msg> {
    let page = state.current_page();
    if page > 1 {
        vec![Msg::ChangePage(page - 1)]
    } else {
        Vec::new()
    }
}
