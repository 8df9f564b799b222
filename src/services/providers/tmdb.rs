//! TMDB poster provider
//!
//! Searches `/search/movie` by title and builds the poster URL from the
//! first result's `poster_path`. The first hit is taken as-is; results are
//! not disambiguated by year or genre.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::providers::{describe_failure, PosterResolver},
};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Clone)]
pub struct TmdbPosterResolver {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
}

impl TmdbPosterResolver {
    pub fn new(
        api_key: String,
        api_url: String,
        image_base_url: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the first catalog hit for `title`, if any
    pub async fn search_first(&self, title: &str) -> AppResult<Option<TmdbMovie>> {
        let url = format!("{}/search/movie", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("query", title),
                ("include_adult", "false"),
                ("language", "en-US"),
                ("page", "1"),
            ])
            .send()
            .await
            .map_err(|e| AppError::PosterLookup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::PosterLookup(
                describe_failure("TMDB", response).await,
            ));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::PosterLookup(format!("Failed to parse TMDB response: {}", e)))?;

        tracing::debug!(
            title = %title,
            results = body.results.len(),
            provider = "tmdb",
            "Title search completed"
        );

        Ok(body.results.into_iter().next())
    }

    pub fn poster_url(&self, poster_path: &str) -> String {
        format!(
            "{}/{}",
            self.image_base_url,
            poster_path.trim_start_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl PosterResolver for TmdbPosterResolver {
    async fn resolve_poster(&self, title: &str) -> Option<String> {
        match self.search_first(title).await {
            Ok(Some(movie)) => {
                let poster = movie
                    .poster_path
                    .as_deref()
                    .filter(|path| !path.trim().is_empty())
                    .map(|path| self.poster_url(path));
                match &poster {
                    Some(url) => tracing::debug!(
                        title = %title,
                        tmdb_id = movie.id,
                        matched_title = ?movie.title,
                        release_date = ?movie.release_date,
                        poster = %url,
                        "Poster resolved"
                    ),
                    None => tracing::info!(
                        title = %title,
                        tmdb_id = movie.id,
                        matched_title = ?movie.title,
                        "First TMDB result has no poster"
                    ),
                }
                poster
            }
            Ok(None) => {
                tracing::info!(title = %title, "No TMDB results for title");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, title = %title, "Poster lookup failed");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
