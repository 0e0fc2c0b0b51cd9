pub mod middleware;
pub mod onboarding;
pub mod rest;
pub mod state;

pub use middleware::require_user;
pub use rest::{activities_handler, recent_reviews_handler, trending_handler};

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use state::AppState;

/// Builds the API router: public feed routes plus user-scoped tour routes.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no identity required)
    let public_routes = Router::new()
        .route("/reviews/recent", get(recent_reviews_handler))
        .route("/activities", get(activities_handler))
        .route("/trending", get(trending_handler));

    // User-scoped routes
    let tour_routes = Router::new()
        .route(
            "/onboarding",
            get(onboarding::get_tour_handler).delete(onboarding::end_tour_handler),
        )
        .route("/onboarding/start", post(onboarding::start_tour_handler))
        .route("/onboarding/next", post(onboarding::next_step_handler))
        .route("/onboarding/prev", post(onboarding::prev_step_handler))
        .route("/onboarding/skip", post(onboarding::skip_tour_handler))
        .route("/onboarding/complete", post(onboarding::complete_tour_handler))
        .route("/onboarding/anchor", post(onboarding::anchor_handler))
        .layer(axum_middleware::from_fn(require_user));

    Router::new()
        .merge(public_routes)
        .merge(tour_routes)
        .with_state(app_state)
}
