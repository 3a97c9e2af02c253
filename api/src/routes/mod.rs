use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod metrics;
pub mod webhook;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(webhook::router())
        .merge(metrics::router())
}
