//! Prometheus metrics for provider operations
//!
//! Exposes Platform API activity and cluster teardown progress:
//! - API request counts and durations per operation
//! - Delete loop actions taken per tick

use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Provider metrics registry
///
/// Thread-safe container for all Prometheus metrics.
/// Clone is cheap (Arc internally).
#[derive(Clone)]
pub struct ProviderMetrics {
    registry: Registry,
    /// Platform API requests by operation and outcome (ok, not_found, retryable, fatal)
    pub api_requests_total: IntCounterVec,
    /// Platform API request duration in seconds
    pub api_request_duration_seconds: HistogramVec,
    /// Cluster delete loop ticks by decided action
    pub cluster_delete_ticks_total: IntCounterVec,
}

impl ProviderMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let api_requests_total = IntCounterVec::new(
            Opts::new(
                "castai_api_requests_total",
                "Total number of Platform API requests",
            ),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(api_requests_total.clone()))?;

        let api_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "castai_api_request_duration_seconds",
                "Duration of Platform API requests in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["operation"],
        )?;
        registry.register(Box::new(api_request_duration_seconds.clone()))?;

        let cluster_delete_ticks_total = IntCounterVec::new(
            Opts::new(
                "castai_cluster_delete_ticks_total",
                "Cluster delete loop ticks by decided action",
            ),
            &["action"], // trigger_delete, trigger_disconnect, wait, done
        )?;
        registry.register(Box::new(cluster_delete_ticks_total.clone()))?;

        Ok(Self {
            registry,
            api_requests_total,
            api_request_duration_seconds,
            cluster_delete_ticks_total,
        })
    }

    /// Record one finished API request
    pub fn record_request(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.api_requests_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.api_request_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Record one delete loop tick
    pub fn record_delete_tick(&self, action: &str) {
        self.cluster_delete_ticks_total
            .with_label_values(&[action])
            .inc();
    }

    /// Encode all metrics to Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Failed to encode metrics as UTF-8: {}", e))
        })
    }
}

/// Shared metrics handle
pub type SharedMetrics = Arc<ProviderMetrics>;

/// Create a new shared metrics instance
pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    Ok(Arc::new(ProviderMetrics::new()?))
}
