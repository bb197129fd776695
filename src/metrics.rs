//! Process-wide request and in-flight-fetch metrics.
//!
//! The sink is an injected service rather than an ambient global so handlers
//! can be exercised against a recording fake in tests. The production
//! implementation sits on top of the `metrics` facade with a Prometheus
//! recorder for pull-based scraping at `/metrics`.

use std::sync::{Once, OnceLock};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

use crate::error::{AppError, Result};

pub const REQUESTS_TOTAL: &str = "apod_requests_total";
pub const FETCHES_IN_PROGRESS: &str = "apod_fetches_in_progress";

/// Counter/gauge sink shared by all in-flight requests.
pub trait MetricsSink: Send + Sync {
    /// Bump the request counter, labeled by method and matched route.
    /// Called once per inbound request before routing logic runs.
    fn record_request(&self, method: &str, endpoint: &str);

    fn fetch_started(&self);

    fn fetch_finished(&self);

    /// Render current samples in the Prometheus exposition format.
    fn render(&self) -> String;
}

/// RAII bracket around a provider call: increments the in-flight gauge on
/// construction and decrements on drop, so early returns and error paths
/// cannot leak a count.
pub struct FetchGuard<'a> {
    sink: &'a dyn MetricsSink,
}

impl<'a> FetchGuard<'a> {
    pub fn new(sink: &'a dyn MetricsSink) -> Self {
        sink.fetch_started();
        Self { sink }
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.sink.fetch_finished();
    }
}

// The Prometheus recorder can only be installed once per process. The Once
// serializes installation so concurrent first calls wait for the winner, and
// the OnceLock keeps the handle so every later install reuses it.
static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// [`MetricsSink`] backed by the global Prometheus recorder.
pub struct PrometheusMetrics {
    handle: PrometheusHandle,
}

impl PrometheusMetrics {
    pub fn install() -> Result<Self> {
        INIT.call_once(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                describe_counter!(REQUESTS_TOTAL, "Total number of requests");
                describe_gauge!(FETCHES_IN_PROGRESS, "Number of picture fetches in progress");
                info!("Prometheus recorder installed");
                let _ = HANDLE.set(handle);
            }
            Err(e) => {
                warn!(error = %e, "Failed to install Prometheus recorder");
            }
        });
        HANDLE
            .get()
            .cloned()
            .map(|handle| Self { handle })
            .ok_or_else(|| AppError::Config("failed to install Prometheus recorder".into()))
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record_request(&self, method: &str, endpoint: &str) {
        counter!(
            REQUESTS_TOTAL,
            "method" => method.to_string(),
            "endpoint" => endpoint.to_string()
        )
        .increment(1);
    }

    fn fetch_started(&self) {
        gauge!(FETCHES_IN_PROGRESS).increment(1.0);
    }

    fn fetch_finished(&self) {
        gauge!(FETCHES_IN_PROGRESS).decrement(1.0);
    }

    fn render(&self) -> String {
        self.handle.render()
    }
}
