use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

use crate::action::ActionName;

/// Dispatch counters shared by every request of a process.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    dispatched: [AtomicU64; ActionName::ALL.len()],
    unknown_actions: AtomicU64,
    malformed_envelopes: AtomicU64,
    fallback_model: AtomicU64,
    fallback_default: AtomicU64,
    fallback_latency_ms_total: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MetricsSnapshot {
    pub dispatched: BTreeMap<String, u64>,
    pub unknown_actions: u64,
    pub malformed_envelopes: u64,
    pub fallback_model: u64,
    pub fallback_default: u64,
    pub fallback_avg_latency_ms: f64,
}

impl DispatchMetrics {
    pub fn record_dispatch(&self, action: ActionName) {
        let index = ActionName::ALL
            .iter()
            .position(|candidate| *candidate == action)
            .unwrap_or_default();
        self.dispatched[index].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown_action(&self) {
        self.unknown_actions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed_envelope(&self) {
        self.malformed_envelopes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self, from_model: bool, latency_ms: u64) {
        if from_model {
            self.fallback_model.fetch_add(1, Ordering::Relaxed);
        } else {
            self.fallback_default.fetch_add(1, Ordering::Relaxed);
        }
        self.fallback_latency_ms_total
            .fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let dispatched = ActionName::ALL
            .iter()
            .zip(self.dispatched.iter())
            .map(|(action, count)| (action.as_str().to_string(), count.load(Ordering::Relaxed)))
            .collect();
        let fallback_model = self.fallback_model.load(Ordering::Relaxed);
        let fallback_default = self.fallback_default.load(Ordering::Relaxed);
        let fallbacks = fallback_model + fallback_default;
        let fallback_avg_latency_ms = if fallbacks > 0 {
            self.fallback_latency_ms_total.load(Ordering::Relaxed) as f64 / fallbacks as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            dispatched,
            unknown_actions: self.unknown_actions.load(Ordering::Relaxed),
            malformed_envelopes: self.malformed_envelopes.load(Ordering::Relaxed),
            fallback_model,
            fallback_default,
            fallback_avg_latency_ms,
        }
    }
}
