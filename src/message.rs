use crate::app::Mode;
use crate::catalog::{CatalogError, Genre, MovieId, RatedResponse, SearchPage};
use std::time::Duration;

/// Monotonic tag attached to each outgoing request so late answers can be told apart.
pub type RequestId = u64;

/// A search fetch as issued by the query controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub id: RequestId,
    pub query: String,
    pub page: u32,
}

/// A rated-list poll for one session and page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub id: RequestId,
    pub session_id: String,
    pub page: u32,
}

/// Everything that can change the view state.
#[derive(Debug)]
pub enum Msg {
    /// Startup: bootstrap the session and load the genre table.
    Started,
    /// Fixed-cadence tick driving the rated-list poll.
    Tick,
    /// Raw contents of the search input after a keystroke.
    InputChanged(String),
    /// The debounce timer for keystroke `generation` ran out.
    DebounceElapsed(u64),
    SubmitQuery(String),
    ChangePage(u32),
    SetMode(Mode),
    Rate { movie_id: MovieId, rating: f64 },
    ConnectivityChanged { online: bool },
    ToggleOffline,

    SessionCreated(Result<String, CatalogError>),
    GenresLoaded(Result<Vec<Genre>, CatalogError>),
    SearchLoaded {
        request: SearchRequest,
        result: Result<SearchPage, CatalogError>,
    },
    RatedLoaded {
        request: PollRequest,
        result: Result<RatedResponse, CatalogError>,
    },
    RatingWritten {
        movie_id: MovieId,
        result: Result<(), CatalogError>,
    },
}

/// Side effects requested by the reducer; the runtime carries them out.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateSession,
    FetchGenres,
    Search(SearchRequest),
    PollRated(PollRequest),
    SetRating {
        movie_id: MovieId,
        session_id: String,
        rating: f64,
    },
    Debounce { generation: u64, delay: Duration },
}
