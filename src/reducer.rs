//! The single state transition function.
//!
//! `update()` applies one message to the view state and returns the side
//! effects the runtime should carry out. It performs no network I/O; the only
//! I/O reachable from here is the session store behind the session manager.

use crate::app::{Mode, ViewState, normalize_rating};
use crate::catalog::RatedResponse;
use crate::message::{Command, Msg};
use crate::query::FetchOutcome;

pub fn update(state: &mut ViewState, msg: Msg) -> Vec<Command> {
    match msg {
        Msg::Started => {
            let mut commands = Vec::new();
            if state.session.ensure_session() {
                commands.push(Command::CreateSession);
            }
            commands.push(Command::FetchGenres);
            commands.extend(poll_rated(state));
            state.status_msg = "Type / to search".to_string();
            commands
        }

        Msg::Tick => poll_rated(state).into_iter().collect(),

        Msg::InputChanged(text) => {
            state.input = text.clone();
            let generation = state.debouncer.keystroke(text);
            vec![Command::Debounce {
                generation,
                delay: state.settings.debounce,
            }]
        }

        Msg::DebounceElapsed(generation) => match state.debouncer.elapsed(generation) {
            Some(text) => submit_query(state, &text),
            None => Vec::new(),
        },

        Msg::SubmitQuery(text) => submit_query(state, &text),

        Msg::ChangePage(page) => match state.mode {
            Mode::Search => {
                let request = state.search.change_page(page);
                state.search_selected = 0;
                vec![Command::Search(request)]
            }
            Mode::Rated => {
                state.rated.set_page(page);
                state.rated_selected = 0;
                poll_rated(state).into_iter().collect()
            }
        },

        Msg::SetMode(mode) => {
            state.mode = mode;
            Vec::new()
        }

        Msg::Rate { movie_id, rating } => {
            let rating = normalize_rating(rating);
            state.pending_ratings.insert(movie_id, rating);
            match state.session.id() {
                Some(session_id) => {
                    state.status_msg = format!("Rated {} / 10", rating);
                    vec![Command::SetRating {
                        movie_id,
                        session_id: session_id.to_string(),
                        rating,
                    }]
                }
                None => {
                    tracing::warn!(movie_id, "No guest session yet, rating not sent");
                    state.status_msg = "No guest session yet, rating not sent".to_string();
                    Vec::new()
                }
            }
        }

        Msg::ConnectivityChanged { online } => {
            if state.connectivity.probe_offline == !online {
                return Vec::new();
            }
            tracing::info!(online, "Connectivity changed");
            state.connectivity.probe_offline = !online;
            poll_rated(state).into_iter().collect()
        }

        Msg::ToggleOffline => {
            state.connectivity.forced_offline = !state.connectivity.forced_offline;
            state.status_msg = if state.connectivity.forced_offline {
                "Offline mode on".to_string()
            } else {
                "Offline mode off".to_string()
            };
            poll_rated(state).into_iter().collect()
        }

        Msg::SessionCreated(Ok(id)) => {
            tracing::info!("Guest session created");
            state.session.session_created(id);
            poll_rated(state).into_iter().collect()
        }

        Msg::SessionCreated(Err(e)) => {
            tracing::error!("Guest session creation failed: {}", e);
            state.session.creation_failed();
            state.set_error(e.user_message());
            Vec::new()
        }

        Msg::GenresLoaded(Ok(genres)) => {
            tracing::debug!(count = genres.len(), "Genre table loaded");
            state.genres = genres;
            Vec::new()
        }

        Msg::GenresLoaded(Err(e)) => {
            tracing::error!("Genre fetch failed: {}", e);
            state.set_error(e.user_message());
            Vec::new()
        }

        Msg::SearchLoaded { request, result } => {
            let request_id = request.id;
            match result {
                Ok(page) => {
                    let total = page.total_results;
                    match state.search.apply_success(request, page) {
                        FetchOutcome::Applied => {
                            state.clear_error();
                            state.clamp_selection();
                            state.status_msg = format!(
                                "{} results for \"{}\"",
                                total, state.search.query
                            );
                        }
                        FetchOutcome::Stale => {
                            tracing::debug!(request = request_id, "Discarded stale search answer");
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(request = request_id, "Search failed: {}", e);
                    if state.search.apply_failure(request_id) == FetchOutcome::Applied {
                        state.set_error(e.user_message());
                    }
                }
            }
            Vec::new()
        }

        Msg::RatedLoaded { request, result } => {
            let current_page = state.rated.finish(&request);
            let current_session = state.session.is_current(&request.session_id);
            match result {
                Ok(RatedResponse::SessionInvalid) => {
                    if current_session && state.session.invalidate() {
                        return vec![Command::CreateSession];
                    }
                }
                Ok(RatedResponse::Page(page)) => {
                    if current_page && current_session && state.overlay.apply(page) {
                        state.pending_ratings.clear();
                        state.clamp_selection();
                    }
                }
                Err(e) => {
                    tracing::error!("Rated list poll failed: {}", e);
                    state.set_error(e.user_message());
                }
            }
            Vec::new()
        }

        Msg::RatingWritten { movie_id, result } => {
            match result {
                Ok(()) => tracing::debug!(movie_id, "Rating stored"),
                Err(e) => tracing::warn!(movie_id, "Rating write failed: {}", e),
            }
            Vec::new()
        }
    }
}

fn submit_query(state: &mut ViewState, text: &str) -> Vec<Command> {
    match state.search.submit_query(text) {
        Some(request) => {
            state.search_selected = 0;
            vec![Command::Search(request)]
        }
        None => Vec::new(),
    }
}

/// A rated-list poll, when online, a session exists and none is in flight.
fn poll_rated(state: &mut ViewState) -> Option<Command> {
    if state.is_offline() {
        return None;
    }
    let session_id = state.session.id()?.to_string();
    state.rated.begin_poll(&session_id).map(Command::PollRated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ViewSettings;
    use crate::catalog::{CatalogError, Movie, RatedMovie, RatedPage, SearchPage};
    use crate::message::{PollRequest, SearchRequest};
    use crate::store::MemorySessionStore;
    use std::time::Duration;

    fn settings() -> ViewSettings {
        ViewSettings {
            page_size: 20,
            poster_base_url: "https://img".to_string(),
            debounce: Duration::from_millis(400),
        }
    }

    fn state_with_session(id: &str) -> ViewState {
        let mut state = ViewState::new(Box::new(MemorySessionStore::with_id(id)), settings());
        state.session.ensure_session();
        state
    }

    fn movie(id: i64) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            overview: String::new(),
            poster_path: None,
            release_date: Some("2008-07-18".to_string()),
            genre_ids: vec![],
            vote_average: Some(8.5),
        }
    }

    fn rated_page(items: &[(i64, f64)]) -> RatedPage {
        RatedPage {
            page: 1,
            results: items
                .iter()
                .map(|&(id, rating)| RatedMovie {
                    movie: movie(id),
                    rating,
                })
                .collect(),
            total_results: items.len() as u64,
        }
    }

    fn search_request(commands: &[Command]) -> SearchRequest {
        commands
            .iter()
            .find_map(|c| match c {
                Command::Search(r) => Some(r.clone()),
                _ => None,
            })
            .expect("no search command")
    }

    fn poll_request(commands: &[Command]) -> PollRequest {
        commands
            .iter()
            .find_map(|c| match c {
                Command::PollRated(r) => Some(r.clone()),
                _ => None,
            })
            .expect("no poll command")
    }

    fn server_error() -> CatalogError {
        CatalogError::Status {
            status: 500,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_startup_without_stored_session_creates_one() {
        let store = MemorySessionStore::default();
        let mut state = ViewState::new(Box::new(store.clone()), settings());
        let commands = update(&mut state, Msg::Started);
        assert!(commands.contains(&Command::CreateSession));
        assert!(commands.contains(&Command::FetchGenres));
        // No session yet, so no poll.
        assert!(!commands.iter().any(|c| matches!(c, Command::PollRated(_))));

        let commands = update(&mut state, Msg::SessionCreated(Ok("guest".to_string())));
        assert_eq!(store.value().as_deref(), Some("guest"));
        assert_eq!(poll_request(&commands).session_id, "guest");
    }

    #[test]
    fn test_startup_with_stored_session_polls_immediately() {
        let mut state = ViewState::new(Box::new(MemorySessionStore::with_id("kept")), settings());
        let commands = update(&mut state, Msg::Started);
        assert!(!commands.contains(&Command::CreateSession));
        assert_eq!(poll_request(&commands).session_id, "kept");
    }

    #[test]
    fn test_batman_scenario() {
        let mut state = state_with_session("s");
        let commands = update(&mut state, Msg::SubmitQuery("batman".to_string()));
        let request = search_request(&commands);
        assert_eq!(request.page, 1);
        assert!(state.search.is_loading);

        update(
            &mut state,
            Msg::SearchLoaded {
                request,
                result: Ok(SearchPage {
                    page: 1,
                    results: vec![movie(1)],
                    total_results: 42,
                }),
            },
        );
        assert_eq!(state.records().len(), 1);
        assert_eq!(state.total_pages(), 3);
        assert!(!state.search.is_loading);
        assert!(!state.has_error);
    }

    #[test]
    fn test_empty_query_never_fetches() {
        let mut state = state_with_session("s");
        let commands = update(&mut state, Msg::SubmitQuery("batman".to_string()));
        update(
            &mut state,
            Msg::SearchLoaded {
                request: search_request(&commands),
                result: Ok(SearchPage {
                    page: 1,
                    results: vec![movie(1)],
                    total_results: 42,
                }),
            },
        );
        let commands = update(&mut state, Msg::SubmitQuery(String::new()));
        assert!(commands.is_empty());
        assert_eq!(state.search.total_count, 0);
        assert_eq!(state.total_pages(), 0);
    }

    #[test]
    fn test_search_failure_sets_error_flag() {
        let mut state = state_with_session("s");
        let commands = update(&mut state, Msg::SubmitQuery("batman".to_string()));
        update(
            &mut state,
            Msg::SearchLoaded {
                request: search_request(&commands),
                result: Err(server_error()),
            },
        );
        assert!(state.has_error);
        assert!(!state.search.is_loading);
        assert!(state.error_message.is_some());
    }

    #[test]
    fn test_change_page_touches_one_counter() {
        let mut state = state_with_session("s");
        let commands = update(&mut state, Msg::ChangePage(3));
        assert_eq!(search_request(&commands).page, 3);
        assert_eq!(state.search.page, 3);
        assert_eq!(state.rated.page, 1);

        update(&mut state, Msg::SetMode(Mode::Rated));
        let commands = update(&mut state, Msg::ChangePage(2));
        assert!(!commands.iter().any(|c| matches!(c, Command::Search(_))));
        assert_eq!(poll_request(&commands).page, 2);
        assert_eq!(state.rated.page, 2);
        assert_eq!(state.search.page, 3);
    }

    #[test]
    fn test_set_mode_keeps_pages_and_fetches_nothing() {
        let mut state = state_with_session("s");
        update(&mut state, Msg::ChangePage(4));
        assert!(update(&mut state, Msg::SetMode(Mode::Rated)).is_empty());
        assert!(update(&mut state, Msg::SetMode(Mode::Search)).is_empty());
        assert_eq!(state.search.page, 4);
        assert_eq!(state.rated.page, 1);
    }

    #[test]
    fn test_invalid_session_recreated_exactly_once() {
        let store = MemorySessionStore::with_id("expired");
        let mut state = ViewState::new(Box::new(store.clone()), settings());
        state.session.ensure_session();
        state.overlay.apply(rated_page(&[(1, 5.0)]));

        let poll = poll_request(&update(&mut state, Msg::Tick));
        // A second poll for the same session, as if issued before the first answered.
        let duplicate = PollRequest {
            id: poll.id + 1,
            ..poll.clone()
        };

        let commands = update(
            &mut state,
            Msg::RatedLoaded {
                request: poll,
                result: Ok(RatedResponse::SessionInvalid),
            },
        );
        assert_eq!(commands, vec![Command::CreateSession]);
        assert_eq!(state.session.id(), None);
        assert_eq!(store.value(), None);

        let commands = update(
            &mut state,
            Msg::RatedLoaded {
                request: duplicate,
                result: Ok(RatedResponse::SessionInvalid),
            },
        );
        assert!(commands.is_empty());
        assert_eq!(store.clears(), 1);
        // The overlay is untouched by the rejected answers.
        assert_eq!(state.overlay.rating_for(1), 5.0);
        assert!(!state.has_error);
    }

    #[test]
    fn test_rating_round_trip_through_poll() {
        let mut state = state_with_session("s");
        let commands = update(&mut state, Msg::SubmitQuery("batman".to_string()));
        update(
            &mut state,
            Msg::SearchLoaded {
                request: search_request(&commands),
                result: Ok(SearchPage {
                    page: 1,
                    results: vec![movie(9)],
                    total_results: 1,
                }),
            },
        );

        let commands = update(&mut state, Msg::Rate { movie_id: 9, rating: 7.0 });
        assert_eq!(
            commands,
            vec![Command::SetRating {
                movie_id: 9,
                session_id: "s".to_string(),
                rating: 7.0,
            }]
        );
        assert_eq!(state.displayed_rating(9), 7.0);
        assert_eq!(state.records()[0].user_rating, 0.0);

        let poll = poll_request(&update(&mut state, Msg::Tick));
        update(
            &mut state,
            Msg::RatedLoaded {
                request: poll,
                result: Ok(RatedResponse::Page(rated_page(&[(9, 7.0)]))),
            },
        );
        assert_eq!(state.records()[0].user_rating, 7.0);
        assert!(state.pending_ratings.is_empty());
    }

    #[test]
    fn test_offline_stops_polling_and_keeps_ratings() {
        let mut state = state_with_session("s");
        let poll = poll_request(&update(&mut state, Msg::Tick));
        update(
            &mut state,
            Msg::RatedLoaded {
                request: poll,
                result: Ok(RatedResponse::Page(rated_page(&[(3, 6.0)]))),
            },
        );

        update(&mut state, Msg::ConnectivityChanged { online: false });
        assert!(state.is_offline());
        assert!(update(&mut state, Msg::Tick).is_empty());
        assert!(update(&mut state, Msg::Tick).is_empty());
        assert_eq!(state.overlay.rating_for(3), 6.0);

        let commands = update(&mut state, Msg::ConnectivityChanged { online: true });
        assert_eq!(poll_request(&commands).session_id, "s");
    }

    #[test]
    fn test_forced_offline_also_gates_poll() {
        let mut state = state_with_session("s");
        update(&mut state, Msg::ToggleOffline);
        assert!(update(&mut state, Msg::Tick).is_empty());
        assert!(!update(&mut state, Msg::ToggleOffline).is_empty());
    }

    #[test]
    fn test_poll_waits_for_previous_answer() {
        let mut state = state_with_session("s");
        let first = poll_request(&update(&mut state, Msg::Tick));
        assert!(update(&mut state, Msg::Tick).is_empty());
        update(
            &mut state,
            Msg::RatedLoaded {
                request: first,
                result: Err(server_error()),
            },
        );
        assert!(state.has_error);
        assert!(!update(&mut state, Msg::Tick).is_empty());
    }

    #[test]
    fn test_stale_search_answer_does_not_overwrite() {
        let mut state = state_with_session("s");
        let first = search_request(&update(&mut state, Msg::SubmitQuery("batman".to_string())));
        let second = search_request(&update(&mut state, Msg::ChangePage(2)));

        update(
            &mut state,
            Msg::SearchLoaded {
                request: second,
                result: Ok(SearchPage {
                    page: 2,
                    results: vec![movie(21)],
                    total_results: 42,
                }),
            },
        );
        update(
            &mut state,
            Msg::SearchLoaded {
                request: first,
                result: Ok(SearchPage {
                    page: 1,
                    results: vec![movie(1)],
                    total_results: 42,
                }),
            },
        );
        assert_eq!(state.search.page, 2);
        assert_eq!(state.search.movies[0].id, 21);
    }

    #[test]
    fn test_debounced_input_submits_latest_text() {
        let mut state = state_with_session("s");
        let first = update(&mut state, Msg::InputChanged("bat".to_string()));
        let second = update(&mut state, Msg::InputChanged("batman".to_string()));
        let generation = |cmds: &[Command]| match cmds {
            [Command::Debounce { generation, .. }] => *generation,
            other => panic!("unexpected {:?}", other),
        };

        assert!(update(&mut state, Msg::DebounceElapsed(generation(first.as_slice()))).is_empty());
        let commands = update(&mut state, Msg::DebounceElapsed(generation(second.as_slice())));
        assert_eq!(search_request(&commands).query, "batman");
        assert_eq!(state.input, "batman");
    }

    #[test]
    fn test_rate_without_session_sends_nothing() {
        let mut state = ViewState::new(Box::new(MemorySessionStore::default()), settings());
        assert!(update(&mut state, Msg::Rate { movie_id: 1, rating: 5.0 }).is_empty());
    }
}
