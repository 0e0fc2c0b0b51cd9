//! services/api/src/adapters/tmdb.rs
//!
//! This module contains the adapter for the TMDB catalog API.
//! It implements the `CatalogService` port from the `core` crate.

use async_trait::async_trait;
use movie_diary_core::domain::TitleDetails;
use movie_diary_core::ports::{CatalogService, PortError, PortResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::check_status;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `CatalogService` port over TMDB's REST API.
#[derive(Clone)]
pub struct TmdbCatalogAdapter {
    client: reqwest::Client,
    base_url: String,
    image_base_url: String,
    api_key: String,
    language: String,
}

impl TmdbCatalogAdapter {
    /// Creates a new `TmdbCatalogAdapter`.
    ///
    /// * `base_url` - API root, e.g. `https://api.themoviedb.org/3`.
    /// * `image_base_url` - prefix for poster paths, e.g. `https://image.tmdb.org/t/p/w500`.
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        image_base_url: String,
        api_key: String,
        language: String,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
            api_key,
            language,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> PortResult<T> {
        debug!("TMDB GET /{}", path);
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        check_status(response, &format!("TMDB /{}", path))?
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    fn poster_url(&self, poster_path: Option<String>) -> Option<String> {
        poster_path
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}{}", self.image_base_url, path))
    }

    fn movie_to_details(&self, movie: MovieResponse) -> TitleDetails {
        TitleDetails {
            title: movie.title,
            poster_url: self.poster_url(movie.poster_path),
            overview: movie.overview.filter(|o| !o.is_empty()),
            release_date: movie.release_date.filter(|d| !d.is_empty()),
        }
    }

    fn tv_to_details(&self, show: TvResponse) -> TitleDetails {
        TitleDetails {
            title: show.name,
            poster_url: self.poster_url(show.poster_path),
            overview: show.overview.filter(|o| !o.is_empty()),
            release_date: show.first_air_date.filter(|d| !d.is_empty()),
        }
    }
}

//=========================================================================================
// TMDB Response Shapes
//=========================================================================================

#[derive(Deserialize)]
struct MovieResponse {
    title: String,
    poster_path: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
}

#[derive(Deserialize)]
struct TvResponse {
    name: String,
    poster_path: Option<String>,
    overview: Option<String>,
    first_air_date: Option<String>,
}

//=========================================================================================
// `CatalogService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogService for TmdbCatalogAdapter {
    async fn get_movie_details(&self, movie_id: u64) -> PortResult<TitleDetails> {
        let movie = self.fetch::<MovieResponse>(&format!("movie/{}", movie_id)).await?;
        Ok(self.movie_to_details(movie))
    }

    async fn get_tv_details(&self, tv_id: u64) -> PortResult<TitleDetails> {
        let show = self.fetch::<TvResponse>(&format!("tv/{}", tv_id)).await?;
        Ok(self.tv_to_details(show))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> TmdbCatalogAdapter {
        TmdbCatalogAdapter::new(
            reqwest::Client::new(),
            "https://api.example/3/".to_string(),
            "https://img.example/w500/".to_string(),
            "key".to_string(),
            "ko-KR".to_string(),
        )
    }

    #[test]
    fn movie_poster_path_is_expanded() {
        let movie: MovieResponse = serde_json::from_value(json!({
            "id": 550,
            "title": "파이트 클럽",
            "poster_path": "/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
            "overview": "",
            "release_date": "1999-10-15",
            "vote_average": 8.4,
        }))
        .unwrap();
        let details = adapter().movie_to_details(movie);
        assert_eq!(details.title, "파이트 클럽");
        assert_eq!(
            details.poster_url.as_deref(),
            Some("https://img.example/w500/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg")
        );
        assert_eq!(details.overview, None);
        assert_eq!(details.release_date.as_deref(), Some("1999-10-15"));
    }

    #[test]
    fn tv_name_becomes_title_and_missing_poster_stays_absent() {
        let show: TvResponse = serde_json::from_value(json!({
            "id": 1399,
            "name": "Game of Thrones",
            "poster_path": null,
            "first_air_date": "2011-04-17",
        }))
        .unwrap();
        let details = adapter().tv_to_details(show);
        assert_eq!(details.title, "Game of Thrones");
        assert_eq!(details.poster_url, None);
    }
}
