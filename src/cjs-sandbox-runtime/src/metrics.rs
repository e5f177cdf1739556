/*!
Metric definitions for loader sessions and module loads.
*/

use crate::error::LoadError;

// Gauge, active sessions
static METRIC_ACTIVE_SESSIONS: &str = "active_loader_sessions";

// Counters, totals during the lifetime of the process
static METRIC_TOTAL_SESSIONS: &str = "loader_sessions_total";
pub(crate) static METRIC_MODULES_LOADED: &str = "modules_loaded_total";
pub(crate) static METRIC_CACHE_HITS: &str = "module_cache_hits_total";
pub(crate) static METRIC_MODULE_FAILURES: &str = "module_failures_total";
pub(crate) static METRIC_FAILURE_KIND_LABEL: &str = "kind";

/// Tracks a live session: bumps the gauge on creation and drops it again
/// when the session goes away.
pub(crate) struct SessionMetricsGuard(());

impl SessionMetricsGuard {
    pub(crate) fn new() -> Self {
        metrics::gauge!(METRIC_ACTIVE_SESSIONS).increment(1);
        metrics::counter!(METRIC_TOTAL_SESSIONS).increment(1);
        Self(())
    }
}

impl Drop for SessionMetricsGuard {
    fn drop(&mut self) {
        metrics::gauge!(METRIC_ACTIVE_SESSIONS).decrement(1);
    }
}

pub(crate) fn record_loaded() {
    metrics::counter!(METRIC_MODULES_LOADED).increment(1);
}

pub(crate) fn record_cache_hit() {
    metrics::counter!(METRIC_CACHE_HITS).increment(1);
}

pub(crate) fn record_failure(err: &LoadError) {
    record_failure_kind(err.kind());
}

pub(crate) fn record_failure_kind(kind: &'static str) {
    metrics::counter!(METRIC_MODULE_FAILURES, METRIC_FAILURE_KIND_LABEL => kind).increment(1);
}
