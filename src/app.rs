use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", post(handlers::login))
        .route("/count/add", post(handlers::count_add))
        .route("/count/sub", post(handlers::count_sub))
        .route("/count/reset", post(handlers::count_reset))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/count", post(handlers::count))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
