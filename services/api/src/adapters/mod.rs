pub mod firestore;
pub mod layout;
pub mod tmdb;

pub use firestore::FirestoreAdapter;
pub use layout::ReportedLayout;
pub use tmdb::TmdbCatalogAdapter;

use movie_diary_core::ports::{PortError, PortResult};
use reqwest::{Response, StatusCode};

/// Maps a non-success HTTP status onto the port error taxonomy.
pub(crate) fn check_status(response: Response, what: &str) -> PortResult<Response> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(PortError::NotFound(what.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PortError::Unauthorized),
        status if !status.is_success() => Err(PortError::Unexpected(format!(
            "{} returned {}",
            what, status
        ))),
        _ => Ok(response),
    }
}
