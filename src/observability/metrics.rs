//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wallet_connect_total` (counter): connect attempts by outcome
//! - `wallet_refresh_total` (counter): refreshes by outcome
//! - `wallet_refresh_stale_total` (counter): refreshes discarded as stale
//! - `wallet_provider_events_total` (counter): provider events by kind
//! - `wallet_session_active` (gauge): 1=connected, 0=disconnected

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_connect(outcome: &'static str) {
    metrics::counter!("wallet_connect_total", "outcome" => outcome).increment(1);
}

pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("wallet_refresh_total", "outcome" => outcome).increment(1);
    if outcome == "stale" {
        metrics::counter!("wallet_refresh_stale_total").increment(1);
    }
}

pub fn record_provider_event(kind: &'static str) {
    metrics::counter!("wallet_provider_events_total", "kind" => kind).increment(1);
}

pub fn set_session_active(active: bool) {
    metrics::gauge!("wallet_session_active").set(if active { 1.0 } else { 0.0 });
}
