//! Reconciliation metrics
//!
//! Prometheus-compatible counters recorded through the `metrics` facade.
//! No exporter is installed here; the host application chooses one.

use std::time::Duration;

/// Record the outcome of one `ensure_index` call
pub fn record_reconcile(ok: bool, duration: Duration) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(
        "spire_reconcile_total",
        "outcome" => outcome,
    )
    .increment(1);

    metrics::histogram!("spire_reconcile_duration_seconds").record(duration.as_secs_f64());
}

/// Record a failed admin call
pub fn record_admin_error(op: &str, error_type: &str) {
    metrics::counter!(
        "spire_admin_errors_total",
        "op" => op.to_string(),
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}

/// Record an index created by reconciliation
pub fn record_index_created(index: &str) {
    metrics::counter!(
        "spire_index_created_total",
        "index" => index.to_string(),
    )
    .increment(1);
}

/// Record an alias bound by reconciliation
pub fn record_alias_created(alias: &str) {
    metrics::counter!(
        "spire_alias_created_total",
        "alias" => alias.to_string(),
    )
    .increment(1);
}

/// Record a background retry tick
pub fn record_retry_tick(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(
        "spire_retry_ticks_total",
        "outcome" => outcome,
    )
    .increment(1);
}
