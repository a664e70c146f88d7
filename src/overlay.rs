use crate::catalog::{MovieId, RatedPage};
use crate::message::{PollRequest, RequestId};

/// Structural equality, used to decide whether a polled page changed anything.
pub fn equal<T: PartialEq + ?Sized>(a: &T, b: &T) -> bool {
    a == b
}

/// The guest's own rating for one movie.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingEntry {
    pub movie_id: MovieId,
    pub rating: f64,
}

pub fn project_entries(page: &RatedPage) -> Vec<RatingEntry> {
    page.results
        .iter()
        .map(|item| RatingEntry {
            movie_id: item.movie.id,
            rating: item.rating,
        })
        .collect()
}

/// Local copy of the guest's ratings, rebuilt wholesale from each poll.
#[derive(Debug, Default)]
pub struct RatingOverlay {
    entries: Vec<RatingEntry>,
    raw: Option<RatedPage>,
}

impl RatingOverlay {
    /// Replace the overlay with a freshly polled page. Returns `false` (and
    /// keeps the old value) when the page equals the previous one.
    pub fn apply(&mut self, page: RatedPage) -> bool {
        if self.raw.as_ref().is_some_and(|prev| equal(prev, &page)) {
            return false;
        }
        self.entries = project_entries(&page);
        self.raw = Some(page);
        true
    }

    /// The guest's rating for `movie_id`, or 0 when not rated.
    pub fn rating_for(&self, movie_id: MovieId) -> f64 {
        self.entries
            .iter()
            .find(|e| e.movie_id == movie_id)
            .map(|e| e.rating)
            .unwrap_or(0.0)
    }

    pub fn entries(&self) -> &[RatingEntry] {
        &self.entries
    }

    /// The last polled rated page, if any.
    pub fn rated(&self) -> Option<&RatedPage> {
        self.raw.as_ref()
    }

    pub fn total_count(&self) -> u64 {
        self.raw.as_ref().map_or(0, |r| r.total_results)
    }
}

/// Page cursor and poll bookkeeping for the rated view.
#[derive(Debug)]
pub struct RatedState {
    pub page: u32,
    next_id: RequestId,
    in_flight: Option<RequestId>,
}

impl Default for RatedState {
    fn default() -> Self {
        Self {
            page: 1,
            next_id: 0,
            in_flight: None,
        }
    }
}

impl RatedState {
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn is_polling(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a poll unless one is already outstanding.
    pub fn begin_poll(&mut self, session_id: &str) -> Option<PollRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        self.next_id += 1;
        self.in_flight = Some(self.next_id);
        Some(PollRequest {
            id: self.next_id,
            session_id: session_id.to_string(),
            page: self.page,
        })
    }

    /// Mark `request` finished. Returns `true` when its answer still matches
    /// the current page and should be applied.
    pub fn finish(&mut self, request: &PollRequest) -> bool {
        if self.in_flight == Some(request.id) {
            self.in_flight = None;
        }
        request.page == self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Movie, RatedMovie};

    fn rated(id: MovieId, rating: f64) -> RatedMovie {
        RatedMovie {
            movie: Movie {
                id,
                title: format!("Movie {}", id),
                overview: String::new(),
                poster_path: None,
                release_date: None,
                genre_ids: vec![],
                vote_average: None,
            },
            rating,
        }
    }

    fn page(items: Vec<RatedMovie>) -> RatedPage {
        RatedPage {
            page: 1,
            total_results: items.len() as u64,
            results: items,
        }
    }

    #[test]
    fn test_unrated_defaults_to_zero() {
        let overlay = RatingOverlay::default();
        assert_eq!(overlay.rating_for(42), 0.0);
        assert!(overlay.rated().is_none());
        assert_eq!(overlay.total_count(), 0);
    }

    #[test]
    fn test_apply_projects_entries_in_order() {
        let mut overlay = RatingOverlay::default();
        assert!(overlay.apply(page(vec![rated(3, 7.0), rated(1, 4.5)])));
        assert_eq!(
            overlay.entries(),
            &[
                RatingEntry { movie_id: 3, rating: 7.0 },
                RatingEntry { movie_id: 1, rating: 4.5 },
            ]
        );
        assert_eq!(overlay.rating_for(1), 4.5);
        assert_eq!(overlay.total_count(), 2);
    }

    #[test]
    fn test_equal_page_is_not_reapplied() {
        let mut overlay = RatingOverlay::default();
        assert!(overlay.apply(page(vec![rated(3, 7.0)])));
        assert!(!overlay.apply(page(vec![rated(3, 7.0)])));
        assert!(overlay.apply(page(vec![rated(3, 8.0)])));
        assert_eq!(overlay.rating_for(3), 8.0);
    }

    #[test]
    fn test_equal_is_structural() {
        let a = page(vec![rated(1, 5.0)]);
        let b = page(vec![rated(1, 5.0)]);
        assert!(equal(&a, &b));
        assert!(!equal(&a, &page(vec![])));
        assert!(equal("abc", "abc"));
    }

    #[test]
    fn test_single_poll_in_flight() {
        let mut state = RatedState::default();
        let first = state.begin_poll("s").unwrap();
        assert!(state.begin_poll("s").is_none());
        assert!(state.finish(&first));
        assert!(!state.is_polling());
        let second = state.begin_poll("s").unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_answer_for_old_page_is_dropped() {
        let mut state = RatedState::default();
        let request = state.begin_poll("s").unwrap();
        state.set_page(2);
        assert!(!state.finish(&request));
        assert!(!state.is_polling());
    }
}
