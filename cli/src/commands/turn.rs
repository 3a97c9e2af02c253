use std::sync::Arc;

use brick_core::envelope::{Entity, Intent, LatestMessage};
use brick_core::wire::{Tracker, WebhookRequest, WebhookResponse};
use brick_core::{
    ActionContext, ActionRegistry, Clock, DispatchError, DispatchMetrics, SlotMap, SystemClock,
    Tables,
};
use chrono_tz::Tz;
use clap::Args;
use serde_json::{Value, json};

use crate::util::{api_request, exit_error, print_outcome};

#[derive(Args)]
pub struct TurnArgs {
    /// Action to run (e.g. action_process_order)
    #[arg(long)]
    pub action: String,

    /// The user's message for this turn
    #[arg(long)]
    pub text: String,

    /// Classified intent name
    #[arg(long)]
    pub intent: Option<String>,

    /// Intent confidence in [0, 1]
    #[arg(long, requires = "intent")]
    pub confidence: Option<f64>,

    /// Extracted entity (repeatable: name=value; numbers and booleans are typed)
    #[arg(long)]
    pub entity: Vec<String>,

    /// Current slot value (repeatable: name=<json>)
    #[arg(long)]
    pub slot: Vec<String>,

    /// Conversation id
    #[arg(long, default_value = "cli")]
    pub sender: String,

    /// Skip pretty-printing (raw JSON for piping)
    #[arg(long)]
    pub raw: bool,
}

/// `name=value`; values that parse as JSON numbers or booleans keep that type.
fn parse_entity(raw: &str) -> Result<Entity, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid entity: '{raw}'"))?;
    let value = serde_json::from_str::<Value>(value)
        .ok()
        .filter(|parsed| parsed.is_number() || parsed.is_boolean())
        .unwrap_or_else(|| Value::String(value.to_string()));
    Ok(Entity {
        name: name.trim().to_string(),
        value,
    })
}

fn parse_slot(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid slot: '{raw}'"))?;
    let value = serde_json::from_str(value)
        .map_err(|e| format!("Invalid JSON for slot '{name}': {e}"))?;
    Ok((name.trim().to_string(), value))
}

/// The webhook body the dialogue manager would send for this turn.
fn webhook_request(args: &TurnArgs) -> Result<WebhookRequest, String> {
    let entities = args
        .entity
        .iter()
        .map(|raw| parse_entity(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let slots = args
        .slot
        .iter()
        .map(|raw| parse_slot(raw))
        .collect::<Result<SlotMap, _>>()?;

    Ok(WebhookRequest {
        next_action: args.action.clone(),
        sender_id: Some(args.sender.clone()),
        tracker: Tracker {
            latest_message: LatestMessage {
                text: args.text.clone(),
                intent: args.intent.as_ref().map(|name| Intent {
                    name: name.clone(),
                    confidence: args.confidence,
                }),
                entities,
            },
            slots,
            events: Vec::new(),
        },
    })
}

fn request_or_exit(args: &TurnArgs) -> WebhookRequest {
    webhook_request(args).unwrap_or_else(|e| {
        exit_error(
            &e,
            Some("Entities are name=value, slots are name=<json>, e.g. --slot 'ordered_items=[]'"),
        )
    })
}

/// POST the turn to a running action server.
pub async fn send(api_url: &str, args: TurnArgs) -> i32 {
    let request = request_or_exit(&args);
    let body = serde_json::to_value(&request)
        .unwrap_or_else(|e| exit_error(&format!("Failed to encode request: {e}"), None));
    api_request(api_url, reqwest::Method::POST, "/webhook", Some(body), args.raw).await
}

/// Dispatch through the standard registry and return the wire payload plus
/// the slot state after applying the response's mutations.
fn run_turn(
    registry: &ActionRegistry,
    request: WebhookRequest,
    clock: Arc<dyn Clock>,
) -> Result<Value, DispatchError> {
    let envelope = request.into_envelope()?;
    let ctx = ActionContext::new(
        uuid::Uuid::now_v7().to_string(),
        clock,
        Arc::new(DispatchMetrics::default()),
    );

    let response = registry.dispatch(&envelope.action_name, &envelope, &ctx)?;
    let mut slots = envelope.slots.clone();
    response.apply_to(&mut slots);

    Ok(json!({
        "response": WebhookResponse::from(response),
        "slots": slots,
    }))
}

fn dispatch_error_json(err: &DispatchError) -> Value {
    match err {
        DispatchError::UnknownAction(name) => json!({
            "error": "unknown_action",
            "message": err.to_string(),
            "action": name,
            "docs_hint": "The model-backed fallback only runs in the server. Use `brick actions` against a server or pick a registered action."
        }),
        DispatchError::MalformedEnvelope { field, .. } => json!({
            "error": "malformed_envelope",
            "message": err.to_string(),
            "field": field,
        }),
    }
}

/// Run the turn in-process; no server or completion service involved.
pub fn run_local(args: TurnArgs, timezone: Tz) -> i32 {
    let request = request_or_exit(&args);
    let registry = ActionRegistry::standard(Tables::standard())
        .unwrap_or_else(|e| exit_error(&format!("Standard registry is unusable: {e}"), None));
    match run_turn(&registry, request, Arc::new(SystemClock::new(timezone))) {
        Ok(output) => {
            print_outcome(&output, args.raw, true);
            0
        }
        Err(err) => {
            print_outcome(&dispatch_error_json(&err), args.raw, false);
            1
        }
    }
}
