//! HTTP handlers
//!
//! Axum request handlers for the leaderboard dashboard.

pub mod leaderboard;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::app::LeaderboardService;
use crate::domain::ports::EvaluationRepository;

pub use leaderboard::{get_dashboard, get_group, get_leaderboard};

/// Application state shared across all handlers
pub struct AppState<R>
where
    R: EvaluationRepository,
{
    pub leaderboard: Arc<LeaderboardService<R>>,
}

// derive(Clone) would require R: Clone
impl<R> Clone for AppState<R>
where
    R: EvaluationRepository,
{
    fn clone(&self) -> Self {
        Self {
            leaderboard: self.leaderboard.clone(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the dashboard router
pub fn router<R>(state: AppState<R>) -> Router
where
    R: EvaluationRepository + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/", get(get_dashboard::<R>))
        .route("/leaderboard", get(get_leaderboard::<R>))
        .route("/groups/:number", get(get_group::<R>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
