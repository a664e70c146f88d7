use crate::catalog::{Movie, SearchPage};
use crate::message::{RequestId, SearchRequest};

/// Whether a search answer made it onto the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// An answer to a newer request was already applied.
    Stale,
}

/// Search query, page cursor and the list currently on screen.
#[derive(Debug)]
pub struct QueryController {
    /// Query of the last applied answer.
    pub query: String,
    pub page: u32,
    pub total_count: u64,
    pub movies: Vec<Movie>,
    pub is_loading: bool,
    next_id: RequestId,
    latest_applied: RequestId,
}

impl Default for QueryController {
    fn default() -> Self {
        Self {
            query: String::new(),
            page: 1,
            total_count: 0,
            movies: Vec::new(),
            is_loading: false,
            next_id: 0,
            latest_applied: 0,
        }
    }
}

impl QueryController {
    /// Returns the fetch to issue, if any. An empty query clears the query
    /// and total count; an unchanged query fetches nothing.
    pub fn submit_query(&mut self, new_query: &str) -> Option<SearchRequest> {
        self.is_loading = true;

        if new_query.is_empty() {
            self.query.clear();
            self.total_count = 0;
            // Anything still in flight belongs to a query the user abandoned.
            self.latest_applied = self.next_id;
            return None;
        }

        if new_query != self.query {
            return Some(self.issue(new_query.to_string(), 1));
        }

        self.is_loading = self.is_fetching();
        None
    }

    /// Fetch `page` for the current query, even when the query is empty.
    pub fn change_page(&mut self, page: u32) -> SearchRequest {
        let page = page.max(1);
        self.page = page;
        self.is_loading = true;
        self.issue(self.query.clone(), page)
    }

    pub fn apply_success(&mut self, request: SearchRequest, result: SearchPage) -> FetchOutcome {
        if request.id <= self.latest_applied {
            return FetchOutcome::Stale;
        }
        self.latest_applied = request.id;
        self.movies = result.results;
        self.query = request.query;
        self.total_count = result.total_results;
        self.page = request.page;
        self.is_loading = false;
        FetchOutcome::Applied
    }

    pub fn apply_failure(&mut self, request_id: RequestId) -> FetchOutcome {
        if request_id <= self.latest_applied {
            return FetchOutcome::Stale;
        }
        self.latest_applied = request_id;
        self.is_loading = false;
        FetchOutcome::Applied
    }

    pub fn total_pages(&self, page_size: u32) -> u64 {
        self.total_count.div_ceil(u64::from(page_size.max(1)))
    }

    /// Whether a fetch is out whose answer would still be applied.
    pub fn is_fetching(&self) -> bool {
        self.next_id > self.latest_applied
    }

    fn issue(&mut self, query: String, page: u32) -> SearchRequest {
        self.next_id += 1;
        tracing::debug!(request = self.next_id, %query, page, "search fetch");
        SearchRequest {
            id: self.next_id,
            query,
            page,
        }
    }
}

/// Trailing-edge debounce for the search input: only the last keystroke of
/// a burst is submitted.
#[derive(Debug, Default)]
pub struct InputDebouncer {
    generation: u64,
    pending: Option<String>,
}

impl InputDebouncer {
    /// Record the input text; returns the generation to arm a timer with.
    pub fn keystroke(&mut self, text: String) -> u64 {
        self.generation += 1;
        self.pending = Some(text);
        self.generation
    }

    /// The text to submit when the timer for `generation` fires, or `None`
    /// when a later keystroke superseded it.
    pub fn elapsed(&mut self, generation: u64) -> Option<String> {
        if generation == self.generation {
            self.pending.take()
        } else {
            None
        }
    }
}
