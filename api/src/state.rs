use std::sync::Arc;

use brick_core::{ActionRegistry, Clock, DispatchMetrics, FallbackHandler};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ActionRegistry>,
    pub fallback: Arc<FallbackHandler>,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<DispatchMetrics>,
    /// Cancelled on shutdown; each fallback call derives a child token from it.
    pub shutdown: CancellationToken,
    pub fallback_threshold: f64,
    pub fallback_configured: bool,
}
