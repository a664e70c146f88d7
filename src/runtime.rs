use crate::app::ViewState;
use crate::catalog::{CatalogClient, CatalogError, RatedPage, RatedResponse};
use crate::message::{Command, Msg};
use crate::reducer;
use crate::session::GuestSessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Executes reducer commands as background tasks. Every result comes back
/// as a `Msg` on the channel, carrying the request it answers.
pub struct Runtime {
    catalog: Arc<dyn CatalogClient>,
    tx: UnboundedSender<Msg>,
}

impl Runtime {
    pub fn new(catalog: Arc<dyn CatalogClient>, tx: UnboundedSender<Msg>) -> Self {
        Self { catalog, tx }
    }

    /// Run one message through the reducer and start whatever it asks for.
    pub fn apply(&self, state: &mut ViewState, msg: Msg) {
        for command in reducer::update(state, msg) {
            self.dispatch(command);
        }
    }

    pub fn dispatch(&self, command: Command) {
        let catalog = Arc::clone(&self.catalog);
        let tx = self.tx.clone();

        match command {
            Command::CreateSession => {
                tokio::spawn(async move {
                    let result = catalog.create_session().await;
                    let _ = tx.send(Msg::SessionCreated(result));
                });
            }
            Command::FetchGenres => {
                tokio::spawn(async move {
                    let result = catalog.genres().await;
                    let _ = tx.send(Msg::GenresLoaded(result));
                });
            }
            Command::Search(request) => {
                tokio::spawn(async move {
                    let result = catalog.search_movies(&request.query, request.page).await;
                    let _ = tx.send(Msg::SearchLoaded { request, result });
                });
            }
            Command::PollRated(request) => {
                tokio::spawn(async move {
                    let result = catalog.rated_movies(&request.session_id, request.page).await;
                    let _ = tx.send(Msg::RatedLoaded { request, result });
                });
            }
            Command::SetRating {
                movie_id,
                session_id,
                rating,
            } => {
                tokio::spawn(async move {
                    let result = catalog.set_rating(movie_id, &session_id, rating).await;
                    let _ = tx.send(Msg::RatingWritten { movie_id, result });
                });
            }
            Command::Debounce { generation, delay } => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Msg::DebounceElapsed(generation));
                });
            }
        }
    }
}

/// One rated page for a one-shot caller outside the event loop. A rejected
/// session is replaced once and the page asked for again.
pub async fn fetch_rated(
    catalog: &dyn CatalogClient,
    session: &mut GuestSessionManager,
    page: u32,
) -> Result<RatedPage, CatalogError> {
    let mut needs_create = session.ensure_session();
    for _ in 0..2 {
        if needs_create {
            match catalog.create_session().await {
                Ok(id) => session.session_created(id),
                Err(e) => {
                    session.creation_failed();
                    return Err(e);
                }
            }
        }
        let Some(id) = session.id().map(str::to_string) else {
            return Err(CatalogError::SessionRefused);
        };

        match catalog.rated_movies(&id, page).await? {
            RatedResponse::Page(rated) => return Ok(rated),
            RatedResponse::SessionInvalid => {
                tracing::info!(session = %id, "stored session rejected, creating a new one");
                needs_create = session.invalidate();
            }
        }
    }
    Err(CatalogError::SessionRefused)
}

/// Host and port the connectivity probe dials, taken from the API base URL.
pub fn probe_target(base_url: &str) -> Option<(String, u16)> {
    let url = reqwest::Url::parse(base_url).ok()?;
    let host = url.host_str()?.to_string();
    let port = url.port_or_known_default()?;
    Some((host, port))
}

/// Whether a TCP connection to the target opens within the timeout.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, tokio::net::TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

/// Periodically probe the catalog host and report transitions only.
pub fn spawn_connectivity_probe(
    host: String,
    port: u16,
    interval: Duration,
    tx: UnboundedSender<Msg>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last: Option<bool> = None;
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let online = probe(&host, port, PROBE_TIMEOUT).await;
            if last != Some(online) {
                last = Some(online);
                if tx.send(Msg::ConnectivityChanged { online }).is_err() {
                    break;
                }
            }
        }
    })
}
