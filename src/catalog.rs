use crate::config::Config;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type MovieId = i64;
pub type GenreId = i64;

/// A movie as returned by search and rated-list calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_results: u64,
}

/// A rated-list item: the movie plus the guest's own rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedMovie {
    #[serde(flatten)]
    pub movie: Movie,
    pub rating: f64,
}

/// One page of the guest session's rated movies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RatedPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<RatedMovie>,
    #[serde(default)]
    pub total_results: u64,
}

/// The rated-list call either yields a page or reports the session as no longer valid.
#[derive(Debug, Clone, PartialEq)]
pub enum RatedResponse {
    Page(RatedPage),
    SessionInvalid,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct GuestSession {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    guest_session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    status_message: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog API error: HTTP {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Catalog refused to create a guest session")]
    SessionRefused,
}

impl CatalogError {
    /// Short text for the error banner.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Http(e) if e.is_timeout() => "The catalog did not answer in time".to_string(),
            CatalogError::Http(_) => "Could not reach the movie catalog".to_string(),
            CatalogError::Status { status, message } => {
                format!("Catalog error ({}): {}", status, message)
            }
            CatalogError::Decode(_) => "The catalog sent a response we could not read".to_string(),
            CatalogError::SessionRefused => "Could not start a guest session".to_string(),
        }
    }
}

/// Remote movie catalog operations.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn create_session(&self) -> Result<String, CatalogError>;

    async fn genres(&self) -> Result<Vec<Genre>, CatalogError>;

    async fn search_movies(&self, query: &str, page: u32) -> Result<SearchPage, CatalogError>;

    async fn rated_movies(&self, session_id: &str, page: u32)
    -> Result<RatedResponse, CatalogError>;

    async fn set_rating(
        &self,
        movie_id: MovieId,
        session_id: &str,
        rating: f64,
    ) -> Result<(), CatalogError>;
}

/// TMDB v3 implementation over reqwest.
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &Config, api_key: &str) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("movie-rater/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let response = self
            .http
            .get(self.url(path))
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

fn status_error(status: u16, body: &[u8]) -> CatalogError {
    let message = serde_json::from_slice::<StatusBody>(body)
        .ok()
        .and_then(|b| b.status_message)
        .unwrap_or_else(|| "request failed".to_string());
    CatalogError::Status { status, message }
}

/// Interpret a rated-list body. A `"success": false` flag means the guest
/// session was rejected, whatever the HTTP status says.
pub fn parse_rated_body(status: u16, body: &[u8]) -> Result<RatedResponse, CatalogError> {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) if !(200..300).contains(&status) => return Err(status_error(status, body)),
        Err(e) => return Err(e.into()),
    };
    if value.get("success") == Some(&serde_json::Value::Bool(false)) {
        return Ok(RatedResponse::SessionInvalid);
    }
    if !(200..300).contains(&status) {
        return Err(status_error(status, body));
    }
    Ok(RatedResponse::Page(serde_json::from_value(value)?))
}

#[async_trait]
impl CatalogClient for TmdbClient {
    async fn create_session(&self) -> Result<String, CatalogError> {
        let session: GuestSession = self
            .get_json("/authentication/guest_session/new", &[])
            .await?;
        match session.guest_session_id {
            Some(id) if session.success && !id.is_empty() => Ok(id),
            _ => Err(CatalogError::SessionRefused),
        }
    }

    async fn genres(&self) -> Result<Vec<Genre>, CatalogError> {
        let list: GenreList = self.get_json("/genre/movie/list", &[]).await?;
        Ok(list.genres)
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<SearchPage, CatalogError> {
        self.get_json(
            "/search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    async fn rated_movies(
        &self,
        session_id: &str,
        page: u32,
    ) -> Result<RatedResponse, CatalogError> {
        let response = self
            .http
            .get(self.url(&format!("/guest_session/{}/rated/movies", session_id)))
            .query(&[("api_key", self.api_key.as_str())])
            .query(&[("page", page.to_string())])
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        parse_rated_body(status, &body)
    }

    async fn set_rating(
        &self,
        movie_id: MovieId,
        session_id: &str,
        rating: f64,
    ) -> Result<(), CatalogError> {
        let response = self
            .http
            .post(self.url(&format!("/movie/{}/rating", movie_id)))
            .query(&[("api_key", self.api_key.as_str()), ("guest_session_id", session_id)])
            .json(&serde_json::json!({ "value": rating }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(status_error(status.as_u16(), &body));
        }
        Ok(())
    }
}
