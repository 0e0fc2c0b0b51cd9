//! services/api/src/web/onboarding.rs
//!
//! Axum handlers that drive the signed-in user's guided tour, plus the
//! application's default tour.

use crate::adapters::ReportedLayout;
use crate::web::middleware::UserId;
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use movie_diary_core::anchor::{ElementBox, Placement};
use movie_diary_core::domain::{OnboardingStep, StepPosition};
use movie_diary_core::onboarding::TourSnapshot;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

//=========================================================================================
// Default Tour
//=========================================================================================

/// The tour shown to new users, in order.
pub fn default_tour() -> Vec<OnboardingStep> {
    vec![
        OnboardingStep::centered(
            "welcome",
            "Welcome to your movie diary",
            "Keep track of everything you watch, and see what your friends are watching.",
        ),
        OnboardingStep::centered(
            "search",
            "Find a title",
            "Search any movie or series to see its details.",
        )
        .anchored("[data-tour=\"search\"]", StepPosition::Bottom),
        OnboardingStep::centered(
            "log",
            "Log what you watched",
            "Add a title to your diary with a date and a rating.",
        )
        .anchored("[data-tour=\"log-button\"]", StepPosition::Bottom),
        OnboardingStep::centered(
            "review",
            "Write a review",
            "Share your thoughts. Reviews show up on the landing page and in the feed.",
        )
        .anchored("[data-tour=\"review\"]", StepPosition::Top),
        OnboardingStep::centered(
            "lists",
            "Build lists",
            "Group titles into lists like \"Rainy Sunday\" or \"Best of 2024\".",
        )
        .anchored("[data-tour=\"lists\"]", StepPosition::Right),
        OnboardingStep::centered(
            "feed",
            "Follow the feed",
            "Logs, reviews, polls and debates from the people you follow.",
        )
        .anchored("[data-tour=\"feed\"]", StepPosition::Left),
        OnboardingStep::centered(
            "profile",
            "Your profile",
            "Your diary, favorites and stats live here. You can replay this tour from settings.",
        )
        .anchored("[data-tour=\"profile\"]", StepPosition::Bottom),
    ]
}

//=========================================================================================
// Request Payload Structs
//=========================================================================================

/// One element box measured by the browser, in viewport coordinates.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct MeasuredBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// The boxes of the tour targets currently mounted on the page, keyed by selector.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnchorRequest {
    #[serde(default)]
    pub boxes: HashMap<String, MeasuredBox>,
}

impl AnchorRequest {
    fn into_layout(self) -> ReportedLayout {
        ReportedLayout::new(
            self.boxes
                .into_iter()
                .map(|(selector, b)| {
                    let element = ElementBox {
                        top: b.top,
                        left: b.left,
                        width: b.width,
                        height: b.height,
                    };
                    (selector, element)
                })
                .collect(),
        )
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Current tour state. The first call for a user loads their persisted record.
#[utoipa::path(
    get,
    path = "/onboarding",
    responses((status = 200, description = "Tour snapshot"), (status = 401, description = "Missing user id")),
    params(("x-user-id" = String, Header, description = "The signed-in user's id."))
)]
pub async fn get_tour_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> Json<TourSnapshot> {
    let engine = app_state.tours.engine_for(&user_id).await;
    Json(engine.snapshot().await)
}

/// Opens the tour at the first step, even if it was finished or skipped before.
#[utoipa::path(
    post,
    path = "/onboarding/start",
    responses((status = 200, description = "Tour snapshot")),
    params(("x-user-id" = String, Header, description = "The signed-in user's id."))
)]
pub async fn start_tour_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> Json<TourSnapshot> {
    let engine = app_state.tours.engine_for(&user_id).await;
    Json(engine.start().await)
}

/// Advances one step. On the last step this finishes the tour.
#[utoipa::path(
    post,
    path = "/onboarding/next",
    responses((status = 200, description = "Tour snapshot")),
    params(("x-user-id" = String, Header, description = "The signed-in user's id."))
)]
pub async fn next_step_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> Json<TourSnapshot> {
    let engine = app_state.tours.engine_for(&user_id).await;
    Json(engine.next().await)
}

/// Goes back one step.
#[utoipa::path(
    post,
    path = "/onboarding/prev",
    responses((status = 200, description = "Tour snapshot")),
    params(("x-user-id" = String, Header, description = "The signed-in user's id."))
)]
pub async fn prev_step_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> Json<TourSnapshot> {
    let engine = app_state.tours.engine_for(&user_id).await;
    Json(engine.prev().await)
}

/// Closes the tour and records it as skipped.
#[utoipa::path(
    post,
    path = "/onboarding/skip",
    responses((status = 200, description = "Tour snapshot")),
    params(("x-user-id" = String, Header, description = "The signed-in user's id."))
)]
pub async fn skip_tour_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> Json<TourSnapshot> {
    let engine = app_state.tours.engine_for(&user_id).await;
    Json(engine.skip().await)
}

/// Closes the tour and records it as finished.
#[utoipa::path(
    post,
    path = "/onboarding/complete",
    responses((status = 200, description = "Tour snapshot")),
    params(("x-user-id" = String, Header, description = "The signed-in user's id."))
)]
pub async fn complete_tour_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> Json<TourSnapshot> {
    let engine = app_state.tours.engine_for(&user_id).await;
    Json(engine.complete().await)
}

/// Tooltip placement for the current step, given the boxes the browser measured.
#[utoipa::path(
    post,
    path = "/onboarding/anchor",
    request_body = AnchorRequest,
    responses((status = 200, description = "`anchored` with a coordinate, or `centered`")),
    params(("x-user-id" = String, Header, description = "The signed-in user's id."))
)]
pub async fn anchor_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Json(request): Json<AnchorRequest>,
) -> Json<Placement> {
    let engine = app_state.tours.engine_for(&user_id).await;
    let layout = request.into_layout();
    Json(engine.placement(&layout).await)
}

/// Ends the user's tour session (sign-out). Pending auto-start is cancelled.
#[utoipa::path(
    delete,
    path = "/onboarding",
    responses((status = 204, description = "Session ended"), (status = 404, description = "No active session")),
    params(("x-user-id" = String, Header, description = "The signed-in user's id."))
)]
pub async fn end_tour_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> impl IntoResponse {
    if app_state.tours.sign_out(&user_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
