use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderName;
use brick_core::{ActionRegistry, DispatchMetrics, FallbackHandler, SystemClock, Tables};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod extract;
mod llm;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Brick Action Server",
        version = "0.1.0",
        description = "Custom actions for the Brick dining assistant. A dialogue manager posts one turn per request and receives the reply, a UI payload and slot events."
    ),
    paths(
        routes::health::health_check,
        routes::webhook::handle_webhook,
        routes::webhook::list_actions,
        routes::metrics::get_metrics,
    ),
    components(schemas(
        HealthResponse,
        routes::webhook::ActionsResponse,
        brick_core::error::ApiError,
        brick_core::wire::WebhookRequest,
        brick_core::wire::Tracker,
        brick_core::wire::TrackerEvent,
        brick_core::wire::WebhookResponse,
        brick_core::wire::BotMessage,
        brick_core::wire::WireEvent,
        brick_core::envelope::LatestMessage,
        brick_core::envelope::Intent,
        brick_core::envelope::Entity,
        brick_core::metrics::MetricsSnapshot,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of registered actions.
    pub actions: usize,
    /// Whether a completion API key is configured for the fallback.
    pub fallback_configured: bool,
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM.
fn spawn_shutdown_signal(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
            _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
        }

        shutdown.cancel();
    });
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brick_api=debug,brick_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match config::AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let registry = match ActionRegistry::standard(Tables::standard()) {
        Ok(registry) => registry,
        Err(err) => {
            tracing::error!(error = %err, "action registry is incomplete");
            std::process::exit(1);
        }
    };

    let completion_client = match llm::OpenAiClient::new(&config.llm) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(error = %err, "failed to build completion client");
            std::process::exit(1);
        }
    };
    let fallback_configured = completion_client.is_configured();
    if !fallback_configured {
        tracing::warn!("OPENAI_API_KEY is not set; fallback turns will get the default apology");
    }

    let shutdown = CancellationToken::new();
    spawn_shutdown_signal(shutdown.clone());

    let app_state = state::AppState {
        registry: Arc::new(registry),
        fallback: Arc::new(FallbackHandler::new(
            Arc::new(completion_client),
            config.llm.settings.clone(),
        )),
        clock: Arc::new(SystemClock::new(config.timezone)),
        metrics: Arc::new(DispatchMetrics::default()),
        shutdown: shutdown.clone(),
        fallback_threshold: config.fallback_threshold,
        fallback_configured,
    };

    let request_id_header = HeaderName::from_static(extract::REQUEST_ID_HEADER);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    request_id_header.clone(),
                    MakeRequestUuid,
                ))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id_header))
                .layer(middleware::cors::build_cors_layer(&config.cors_origins)),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(
        %addr,
        timezone = %config.timezone,
        fallback_threshold = config.fallback_threshold,
        "Brick action server listening"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("HTTP server received shutdown signal");
        })
        .await;
    if let Err(err) = served {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }
}
