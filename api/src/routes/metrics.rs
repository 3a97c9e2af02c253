use axum::extract::State;
use axum::{Json, Router, routing::get};
use brick_core::metrics::MetricsSnapshot;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(get_metrics))
}

/// Dispatch and fallback counters since process start
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Current counters", body = MetricsSnapshot)
    ),
    tag = "system"
)]
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{StubClient, state_with};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use brick_core::ActionName;
    use serde_json::Value;
    use tower::ServiceExt;

    #[tokio::test]
    async fn exposes_dispatch_counts() {
        let state = state_with(StubClient::answering("hi"));
        state.metrics.record_dispatch(ActionName::AdjustPrice);
        state.metrics.record_dispatch(ActionName::AdjustPrice);
        state.metrics.record_fallback(false, 12);

        let response = router()
            .with_state(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["dispatched"]["action_adjust_price"], 2);
        assert_eq!(json["dispatched"]["action_process_order"], 0);
        assert_eq!(json["fallback_default"], 1);
        assert_eq!(json["fallback_avg_latency_ms"], 12.0);
    }
}
