use std::net::SocketAddr;
use std::time::Instant;

use crate::engine::EngineError;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: availability calls. Labels: op, outcome.
pub const QUERIES_TOTAL: &str = "mietfach_availability_queries_total";

/// Histogram: call latency in seconds. Labels: op.
pub const QUERY_DURATION_SECONDS: &str = "mietfach_query_duration_seconds";

/// Histogram: distinct units per batch call.
pub const BATCH_UNITS: &str = "mietfach_batch_units";

// ── Gateway ─────────────────────────────────────────────────────

/// Counter: failed contract fetches. Labels: kind.
pub const GATEWAY_FAILURES_TOTAL: &str = "mietfach_gateway_failures_total";

pub const CACHE_HITS_TOTAL: &str = "mietfach_cache_hits_total";
pub const CACHE_MISSES_TOTAL: &str = "mietfach_cache_misses_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a call outcome to a short label for metrics.
pub fn outcome_label<T>(result: &Result<T, EngineError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind().as_str(),
    }
}

pub(crate) fn record_query(op: &'static str, outcome: &'static str, started: Instant) {
    metrics::counter!(QUERIES_TOTAL, "op" => op, "outcome" => outcome).increment(1);
    metrics::histogram!(QUERY_DURATION_SECONDS, "op" => op)
        .record(started.elapsed().as_secs_f64());
}
