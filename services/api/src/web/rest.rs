//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the feed endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::onboarding::{self, AnchorRequest, MeasuredBox};
use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use movie_diary_core::domain::{
    Activity, ActivityFilter, MediaType, ReviewSignal, TrendingEntry,
};
use movie_diary_core::feed::ReviewPreviewRequest;
use movie_diary_core::panel::{Panel, PanelState};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        recent_reviews_handler,
        activities_handler,
        trending_handler,
        onboarding::get_tour_handler,
        onboarding::start_tour_handler,
        onboarding::next_step_handler,
        onboarding::prev_step_handler,
        onboarding::skip_tour_handler,
        onboarding::complete_tour_handler,
        onboarding::anchor_handler,
        onboarding::end_tour_handler,
    ),
    components(
        schemas(AnchorRequest, MeasuredBox)
    ),
    tags(
        (name = "Movie Diary API", description = "Display-ready feeds and the onboarding tour.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Request Payload Structs
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

//=========================================================================================
// Landing Fallback
//=========================================================================================

/// Editorial picks shown on the landing page before any user has reviewed anything.
pub fn landing_fallback() -> Vec<ReviewSignal> {
    [
        (496243, "Parasite", 5.0, "A class satire that turns into a thriller halfway down the stairs."),
        (670, "Oldboy", 4.5, "Fifteen years in a room, five days to find out why."),
        (11423, "Memories of Murder", 5.0, "A procedural about everything the detectives never find."),
        (705996, "Decision to Leave", 4.5, "A detective story told like a love letter, or the reverse."),
        (290098, "The Handmaiden", 4.5, "Three acts, three narrators, one very careful con."),
    ]
    .into_iter()
    .map(|(movie_id, title, rating, excerpt)| ReviewSignal {
        id: format!("pick-{}", movie_id),
        movie_id,
        media_type: MediaType::Movie,
        title: Some(title.to_string()),
        poster_url: None,
        rating: Some(rating),
        excerpt: excerpt.to_string(),
        author: "Editors".to_string(),
        date: "2024.01.01".to_string(),
    })
    .collect()
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Latest reviews for the landing page, one per title.
#[utoipa::path(
    get,
    path = "/reviews/recent",
    responses(
        (status = 200, description = "Review previews (`ready`), or editorial picks when nothing is reviewed yet")
    )
)]
pub async fn recent_reviews_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<PanelState<ReviewSignal>> {
    let request = ReviewPreviewRequest {
        count: app_state.config.review_preview_count,
        oversample: app_state.config.review_oversample,
    };
    let fallback = landing_fallback();
    let panel = Panel::new();
    panel
        .refresh(app_state.feed.recent_review_signals(request, &fallback))
        .await;
    Json(panel.state().await)
}

/// The activity feed, newest first.
#[utoipa::path(
    get,
    path = "/activities",
    params(
        ("type" = Option<String>, Query, description = "`all` (default) or one activity type, e.g. `review`.")
    ),
    responses(
        (status = 200, description = "Feed items (`ready`) or `empty`"),
        (status = 400, description = "Unknown activity type")
    )
)]
pub async fn activities_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<PanelState<Activity>>, (StatusCode, String)> {
    let filter = match query.kind.as_deref() {
        None => ActivityFilter::All,
        Some(raw) => raw.parse::<ActivityFilter>().map_err(|e| {
            warn!("Rejected feed filter: {}", e);
            (StatusCode::BAD_REQUEST, e)
        })?,
    };

    let panel = Panel::new();
    panel
        .refresh(app_state.feed.activity_feed(app_state.config.feed_page_size, filter))
        .await;
    Ok(Json(panel.state().await))
}

/// The trending grid, in the store's ranking.
#[utoipa::path(
    get,
    path = "/trending",
    responses(
        (status = 200, description = "Ranked titles (`ready`) or `empty` when there is no data yet")
    )
)]
pub async fn trending_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<PanelState<TrendingEntry>> {
    let panel = Panel::new();
    panel
        .refresh(app_state.feed.trending(app_state.config.trending_count))
        .await;
    Json(panel.state().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn landing_fallback_has_unique_titles() {
        let picks = landing_fallback();
        assert_eq!(picks.len(), 5);
        let ids: HashSet<_> = picks.iter().map(|p| p.movie_id).collect();
        assert_eq!(ids.len(), picks.len());
        assert!(picks.iter().all(|p| p.title.is_some()));
    }
}
