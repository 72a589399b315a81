//! Observability for manifest conversion
//!
//! Provides:
//! - Prometheus metrics (conversions, errors by kind, latency, probes compiled)
//! - Structured logging with tracing
//!
//! The conversion functions themselves stay pure; callers wrap them with
//! [`ConversionMetrics::track`] to record what happened.

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{ConversionError, Result};
use crate::models::ContainerSpec;

/// Histogram buckets for conversion latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ConversionMetricsInner> = OnceLock::new();

struct ConversionMetricsInner {
    conversions: IntCounter,
    conversion_errors: IntCounterVec,
    conversion_latency_seconds: Histogram,
    probes_compiled: IntCounterVec,
}

impl ConversionMetricsInner {
    fn new() -> Self {
        Self {
            conversions: register_int_counter!(
                "kf_manifest_conversions_total",
                "Number of manifest conversions attempted"
            )
            .expect("Failed to register conversions_total"),

            conversion_errors: register_int_counter_vec!(
                "kf_manifest_conversion_errors_total",
                "Number of manifest conversions rejected, by error kind",
                &["kind"]
            )
            .expect("Failed to register conversion_errors_total"),

            conversion_latency_seconds: register_histogram!(
                "kf_manifest_conversion_latency_seconds",
                "Time spent converting a single application",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register conversion_latency_seconds"),

            probes_compiled: register_int_counter_vec!(
                "kf_manifest_probes_compiled_total",
                "Health probes produced, by check type",
                &["type"]
            )
            .expect("Failed to register probes_compiled_total"),
        }
    }
}

/// Handle to the process-wide conversion metrics
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct ConversionMetrics {
    _private: (),
}

impl Default for ConversionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ConversionMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ConversionMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_conversions(&self) {
        self.inner().conversions.inc();
    }

    pub fn inc_conversion_errors(&self, kind: &str) {
        self.inner()
            .conversion_errors
            .with_label_values(&[kind])
            .inc();
    }

    pub fn observe_conversion_latency(&self, duration_secs: f64) {
        self.inner()
            .conversion_latency_seconds
            .observe(duration_secs);
    }

    /// Count the probe a container ended up with
    pub fn record_probe(&self, container: &ContainerSpec) {
        let kind = container
            .readiness_probe
            .as_ref()
            .map(|p| p.handler.kind())
            .unwrap_or("none");
        self.inner().probes_compiled.with_label_values(&[kind]).inc();
    }

    /// Run a conversion, recording its latency and outcome
    pub fn track<T>(
        &self,
        logger: &StructuredLogger,
        app: &str,
        operation: &str,
        convert: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        self.inc_conversions();
        let start = Instant::now();
        let result = convert();
        self.observe_conversion_latency(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => logger.log_conversion(app, operation),
            Err(err) => {
                self.inc_conversion_errors(err.kind());
                logger.log_conversion_error(app, operation, err);
            }
        }
        result
    }

    /// Render every registered metric in the Prometheus text format
    pub fn gather_text(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Structured logger for conversion events
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    /// `source` names where manifests come from, usually a file path
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn log_conversion(&self, app: &str, operation: &str) {
        info!(
            event = "conversion_succeeded",
            source = %self.source,
            app = %app,
            operation = %operation,
            "Converted application"
        );
    }

    pub fn log_conversion_error(&self, app: &str, operation: &str, error: &ConversionError) {
        warn!(
            event = "conversion_failed",
            source = %self.source,
            app = %app,
            operation = %operation,
            kind = error.kind(),
            error = %error,
            "Application manifest rejected"
        );
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "export_started",
            source = %self.source,
            version = %version,
            "Manifest export started"
        );
    }
}
