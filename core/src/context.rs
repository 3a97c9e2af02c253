use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::metrics::DispatchMetrics;

/// Source of the restaurant's local wall-clock time.
///
/// Pricing, forecasting and recommendations key off the time at request
/// time, not the message timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the system clock and converts it into the restaurant's time zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Per-invocation observability and environment handles.
///
/// Passed explicitly into every handler call; handlers log with this span as
/// their parent and count through `metrics` instead of touching globals.
#[derive(Clone)]
pub struct ActionContext {
    pub request_id: String,
    pub span: tracing::Span,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<DispatchMetrics>,
}

impl ActionContext {
    pub fn new(request_id: impl Into<String>, clock: Arc<dyn Clock>, metrics: Arc<DispatchMetrics>) -> Self {
        let request_id = request_id.into();
        let span = tracing::info_span!("action", request_id = %request_id);
        Self {
            request_id,
            span,
            clock,
            metrics,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    #[cfg(test)]
    pub(crate) fn fixed(now: NaiveDateTime) -> Self {
        Self::new(
            "test-request",
            Arc::new(FixedClock(now)),
            Arc::new(DispatchMetrics::default()),
        )
    }
}

#[cfg(test)]
pub(crate) fn at(date: &str, time: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M")
        .expect("test timestamp should parse")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn fixed_clock_is_stable() {
        let ctx = ActionContext::fixed(at("2024-03-15", "12:30"));
        assert_eq!(ctx.now(), ctx.now());
        assert_eq!(ctx.now().hour(), 12);
    }

    #[test]
    fn system_clock_applies_zone_offset() {
        let utc = SystemClock::default().now();
        let kolkata = SystemClock::new(chrono_tz::Asia::Kolkata).now();
        let offset = (kolkata - utc).num_minutes();
        assert!((325..=335).contains(&offset), "offset was {offset} minutes");
    }
}
