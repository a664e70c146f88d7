use crate::catalog::{Genre, Movie, MovieId};
use crate::config::Config;
use crate::overlay::{RatedState, RatingOverlay};
use crate::projection::{self, DisplayRecord};
use crate::query::{InputDebouncer, QueryController};
use crate::session::GuestSessionManager;
use crate::store::SessionStore;
use std::collections::HashMap;
use std::time::Duration;

/// Which of the two paginated views is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Search,
    Rated,
}

impl Mode {
    pub fn next(self) -> Self {
        match self {
            Self::Search => Self::Rated,
            Self::Rated => Self::Search,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Search => "Search",
            Self::Rated => "Rated",
        }
    }

    pub const ALL: [Mode; 2] = [Self::Search, Self::Rated];
}

/// Input mode for the search bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Network presence, from the background probe or forced by the user.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityState {
    pub probe_offline: bool,
    pub forced_offline: bool,
}

impl ConnectivityState {
    pub fn is_offline(&self) -> bool {
        self.probe_offline || self.forced_offline
    }
}

/// Fixed settings the view needs from the config.
#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub page_size: u32,
    pub poster_base_url: String,
    pub debounce: Duration,
}

impl From<&Config> for ViewSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.page_size.max(1),
            poster_base_url: config.poster_base_url.clone(),
            debounce: config.debounce(),
        }
    }
}

/// Top-level view state. Network-driven fields change only through
/// `reducer::update`; selection, help and input mode are plain UI state.
pub struct ViewState {
    pub mode: Mode,
    pub session: GuestSessionManager,
    pub search: QueryController,
    pub rated: RatedState,
    pub overlay: RatingOverlay,
    pub connectivity: ConnectivityState,
    pub genres: Vec<Genre>,
    pub has_error: bool,
    pub error_message: Option<String>,
    pub settings: ViewSettings,

    // Search bar
    pub input: String,
    pub input_mode: InputMode,
    pub debouncer: InputDebouncer,

    // Card selection, one per view
    pub search_selected: usize,
    pub rated_selected: usize,

    /// Values the rating widget shows before the next poll confirms them.
    pub pending_ratings: HashMap<MovieId, f64>,

    pub show_help: bool,
    pub should_quit: bool,
    pub status_msg: String,
}

impl ViewState {
    pub fn new(store: Box<dyn SessionStore>, settings: ViewSettings) -> Self {
        Self {
            mode: Mode::Search,
            session: GuestSessionManager::new(store),
            search: QueryController::default(),
            rated: RatedState::default(),
            overlay: RatingOverlay::default(),
            connectivity: ConnectivityState::default(),
            genres: Vec::new(),
            has_error: false,
            error_message: None,
            settings,

            input: String::new(),
            input_mode: InputMode::Normal,
            debouncer: InputDebouncer::default(),

            search_selected: 0,
            rated_selected: 0,

            pending_ratings: HashMap::new(),

            show_help: false,
            should_quit: false,
            status_msg: "Starting...".to_string(),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.connectivity.is_offline()
    }

    /// Movies of the active view, in display order. A cleared query shows
    /// nothing, whatever the last answer held.
    pub fn active_movies(&self) -> Vec<&Movie> {
        match self.mode {
            Mode::Search if self.search.query.is_empty() => Vec::new(),
            Mode::Search => self.search.movies.iter().collect(),
            Mode::Rated => self
                .overlay
                .rated()
                .map(|r| r.results.iter().map(|item| &item.movie).collect())
                .unwrap_or_default(),
        }
    }

    /// Display records for the active view.
    pub fn records(&self) -> Vec<DisplayRecord> {
        projection::project_list(
            self.active_movies(),
            &self.genres,
            &self.overlay,
            &self.settings.poster_base_url,
        )
    }

    pub fn current_page(&self) -> u32 {
        match self.mode {
            Mode::Search => self.search.page,
            Mode::Rated => self.rated.page,
        }
    }

    pub fn total_pages(&self) -> u64 {
        match self.mode {
            Mode::Search => self.search.total_pages(self.settings.page_size),
            Mode::Rated => self
                .overlay
                .total_count()
                .div_ceil(u64::from(self.settings.page_size)),
        }
    }

    pub fn selected(&self) -> usize {
        match self.mode {
            Mode::Search => self.search_selected,
            Mode::Rated => self.rated_selected,
        }
    }

    fn selected_mut(&mut self) -> &mut usize {
        match self.mode {
            Mode::Search => &mut self.search_selected,
            Mode::Rated => &mut self.rated_selected,
        }
    }

    pub fn selected_movie(&self) -> Option<&Movie> {
        self.active_movies().get(self.selected()).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.active_movies().len();
        let selected = self.selected_mut();
        if *selected + 1 < len {
            *selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        let selected = self.selected_mut();
        *selected = selected.saturating_sub(1);
    }

    /// Keep both selections inside their lists after a list is replaced.
    pub fn clamp_selection(&mut self) {
        let search_len = self.search.movies.len();
        let rated_len = self.overlay.rated().map_or(0, |r| r.results.len());
        self.search_selected = self.search_selected.min(search_len.saturating_sub(1));
        self.rated_selected = self.rated_selected.min(rated_len.saturating_sub(1));
    }

    /// What the rating widget shows for a movie: a pending value if the user
    /// just rated it, otherwise the polled rating.
    pub fn displayed_rating(&self, movie_id: MovieId) -> f64 {
        self.pending_ratings
            .get(&movie_id)
            .copied()
            .unwrap_or_else(|| self.overlay.rating_for(movie_id))
    }

    pub fn set_error(&mut self, message: String) {
        self.has_error = true;
        self.error_message = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.has_error = false;
        self.error_message = None;
    }
}

/// Snap a rating to the half-star scale the catalog accepts.
pub fn normalize_rating(rating: f64) -> f64 {
    ((rating * 2.0).round() / 2.0).clamp(0.5, 10.0)
}
