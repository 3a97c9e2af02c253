use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use brick_core::wire::{WebhookRequest, WebhookResponse};
use brick_core::{ActionContext, DispatchError, Envelope, FALLBACK_ACTION, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extract::{map_json_rejection, request_id};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/actions", get(list_actions))
}

#[derive(Serialize, ToSchema)]
pub struct ActionsResponse {
    /// Every action with a registered handler.
    pub actions: Vec<String>,
    /// Name routed to the model-backed fallback.
    pub fallback: String,
}

/// Run the action the dialogue manager selected for this turn
///
/// Turns naming the fallback action, turns whose intent confidence is below
/// the configured threshold, and unknown actions are answered by the
/// fallback handler. Fallback replies always succeed; a failing model yields
/// a fixed apology.
#[utoipa::path(
    post,
    path = "/webhook",
    request_body = WebhookRequest,
    responses(
        (status = 200, description = "Reply, UI payload and slot events", body = WebhookResponse),
        (status = 400, description = "Malformed envelope", body = brick_core::error::ApiError),
        (status = 500, description = "Internal error", body = brick_core::error::ApiError)
    ),
    tag = "actions"
)]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<WebhookRequest>, JsonRejection>,
) -> Result<Json<WebhookResponse>, AppError> {
    let request_id = request_id(&headers);

    let Json(request) = body.map_err(|rejection| {
        state.metrics.record_malformed_envelope();
        map_json_rejection(rejection, request_id.clone())
    })?;
    let envelope = request.into_envelope().map_err(|err| {
        state.metrics.record_malformed_envelope();
        AppError::from_dispatch(err, &request_id)
    })?;

    let ctx = ActionContext::new(
        request_id.clone(),
        state.clock.clone(),
        state.metrics.clone(),
    );
    let response = route_turn(&state, &envelope, &ctx)
        .await
        .map_err(|err| AppError::from_dispatch(err, &request_id))?;

    Ok(Json(response.into()))
}

async fn route_turn(
    state: &AppState,
    envelope: &Envelope,
    ctx: &ActionContext,
) -> Result<Response, DispatchError> {
    if envelope.action_name == FALLBACK_ACTION {
        return Ok(run_fallback(state, envelope, ctx).await);
    }

    if let Some(confidence) = envelope
        .intent_confidence()
        .filter(|confidence| *confidence < state.fallback_threshold)
    {
        tracing::info!(
            parent: &ctx.span,
            confidence,
            threshold = state.fallback_threshold,
            action = %envelope.action_name,
            "low intent confidence, answering with fallback"
        );
        return Ok(run_fallback(state, envelope, ctx).await);
    }

    match state.registry.dispatch(&envelope.action_name, envelope, ctx) {
        Err(DispatchError::UnknownAction(_)) => Ok(run_fallback(state, envelope, ctx).await),
        other => other,
    }
}

async fn run_fallback(state: &AppState, envelope: &Envelope, ctx: &ActionContext) -> Response {
    let cancel = state.shutdown.child_token();
    // Dropping the request future (client gone) cancels the completion call.
    let _cancel_on_drop = cancel.clone().drop_guard();
    state.fallback.run(envelope, ctx, &cancel).await
}

/// List the actions this server can run
#[utoipa::path(
    get,
    path = "/actions",
    responses(
        (status = 200, description = "Registered action names", body = ActionsResponse)
    ),
    tag = "actions"
)]
pub async fn list_actions(State(state): State<AppState>) -> Json<ActionsResponse> {
    Json(ActionsResponse {
        actions: state
            .registry
            .actions()
            .map(|action| action.as_str().to_string())
            .collect(),
        fallback: FALLBACK_ACTION.to_string(),
    })
}
