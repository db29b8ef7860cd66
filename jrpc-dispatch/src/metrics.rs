//! Dispatcher metrics
//!
//! OpenTelemetry instruments recorded by the dispatcher when enabled with
//! [`DispatcherBuilder::with_metrics`](crate::DispatcherBuilder::with_metrics).
//! They go to whatever meter provider is installed globally, usually the one
//! set up by `jrpc_core::init_observability`.
//!
//! # Metrics Collected
//!
//! - **jrpc.dispatch.calls.total**: calls executed, by `method` and `outcome`
//! - **jrpc.dispatch.call.duration**: call latency in seconds, by `method`
//! - **jrpc.dispatch.batch.size**: number of items per batch
//! - **jrpc.dispatch.errors.total**: error responses, by `code`
//! - **jrpc.dispatch.batches.rejected**: batches refused (empty or over limit)

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Instruments used by the dispatcher
pub struct DispatchMetrics {
    /// Calls executed
    pub calls_total: Counter<u64>,
    /// Call duration in seconds
    pub call_duration: Histogram<f64>,
    /// Batch size distribution
    pub batch_size: Histogram<u64>,
    /// Error responses by code
    pub errors_total: Counter<u64>,
    /// Batches refused before execution
    pub batches_rejected: Counter<u64>,
}

impl DispatchMetrics {
    /// Instruments on the global meter named `jrpc-dispatch`
    pub fn new() -> Self {
        let meter = global::meter("jrpc-dispatch");
        Self::new_with_meter(&meter)
    }

    /// Instruments on a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            calls_total: meter
                .u64_counter("jrpc.dispatch.calls.total")
                .with_description("Total number of calls executed")
                .build(),
            call_duration: meter
                .f64_histogram("jrpc.dispatch.call.duration")
                .with_description("Call processing duration in seconds")
                .build(),
            batch_size: meter
                .u64_histogram("jrpc.dispatch.batch.size")
                .with_description("Number of items in batch requests")
                .build(),
            errors_total: meter
                .u64_counter("jrpc.dispatch.errors.total")
                .with_description("Total number of error responses")
                .build(),
            batches_rejected: meter
                .u64_counter("jrpc.dispatch.batches.rejected")
                .with_description("Batches rejected before execution")
                .build(),
        }
    }

    /// Record one executed call
    pub fn record_call(&self, method: &str, outcome: &'static str, duration_secs: f64) {
        let attributes = [
            KeyValue::new("method", method.to_string()),
            KeyValue::new("outcome", outcome),
        ];
        self.calls_total.add(1, &attributes);
        self.call_duration
            .record(duration_secs, &[KeyValue::new("method", method.to_string())]);
    }

    /// Record an error response
    pub fn record_error(&self, code: i32) {
        self.errors_total
            .add(1, &[KeyValue::new("code", i64::from(code))]);
    }

    /// Record an accepted batch
    pub fn record_batch(&self, size: usize) {
        self.batch_size.record(size as u64, &[]);
    }

    /// Record a refused batch
    pub fn record_batch_rejected(&self, reason: &'static str) {
        self.batches_rejected
            .add(1, &[KeyValue::new("reason", reason)]);
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}
