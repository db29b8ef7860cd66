//! Logging, tracing and metrics bootstrap
//!
//! The dispatcher itself only emits `tracing` events and spans and records
//! OpenTelemetry instruments through the global meter. Hosts call
//! [`init_observability`] once at startup to decide where that data goes:
//!
//! - a `tracing-subscriber` registry with an `EnvFilter` and a fmt layer
//!   (JSON or compact),
//! - optionally an OpenTelemetry layer exporting spans over OTLP/gRPC,
//! - optionally a meter provider exporting metrics over OTLP/gRPC.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jrpc_core::TelemetryConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::new("billing-rpc")
//!         .with_endpoint("http://localhost:4317")
//!         .with_traces(true);
//!
//!     jrpc_core::init_observability(config).expect("telemetry init failed");
//!     tracing::info!("dispatcher starting");
//! }
//! ```

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{metrics::SdkMeterProvider, trace::SdkTracerProvider};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Handles to the SDK providers installed globally
///
/// `global::set_*_provider` keeps its copy in a static that is never
/// dropped, so shutdown goes through these clones.
struct Providers {
    tracer: Option<SdkTracerProvider>,
    meter: Option<SdkMeterProvider>,
}

static PROVIDERS: Mutex<Providers> = Mutex::new(Providers {
    tracer: None,
    meter: None,
});

fn providers() -> MutexGuard<'static, Providers> {
    PROVIDERS.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn register_tracer_provider(provider: SdkTracerProvider) {
    providers().tracer = Some(provider.clone());
    global::set_tracer_provider(provider);
}

fn register_meter_provider(provider: SdkMeterProvider) {
    providers().meter = Some(provider.clone());
    global::set_meter_provider(provider);
}

/// Telemetry settings
///
/// Defaults: local logging only (no OTLP export), JSON log lines, level
/// from `RUST_LOG` or `info`, endpoint from `OTEL_EXPORTER_OTLP_ENDPOINT` or
/// `http://localhost:4317`.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to exported spans and metrics
    pub service_name: String,

    /// Service version attached to exported spans and metrics
    pub service_version: String,

    /// OTLP collector endpoint (gRPC)
    pub otlp_endpoint: String,

    /// Export spans over OTLP
    pub enable_traces: bool,

    /// Export metrics over OTLP
    pub enable_metrics: bool,

    /// Emit log lines as JSON instead of the compact text format
    pub json_logs: bool,

    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "jrpc".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: false,
            enable_metrics: false,
            json_logs: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl TelemetryConfig {
    /// Default configuration with a custom service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint, e.g. "http://collector:4317"
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the fallback log filter ("error", "warn", "info", "debug", "trace")
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version reported to the collector
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Enable or disable metric export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Choose JSON (`true`) or compact text (`false`) log lines
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    fn resource(&self) -> opentelemetry_sdk::Resource {
        opentelemetry_sdk::Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the global subscriber and, if enabled, the OTLP providers
///
/// Call once at startup. A second call returns an error because the global
/// subscriber is already set.
pub fn init_observability(config: TelemetryConfig) -> Result<(), BoxError> {
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        "telemetry initialized"
    );

    Ok(())
}

fn init_tracer(config: &TelemetryConfig) -> Result<opentelemetry_sdk::trace::Tracer, BoxError> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    register_tracer_provider(provider);

    Ok(tracer)
}

fn init_metrics(config: &TelemetryConfig) -> Result<(), BoxError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(30))
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    register_meter_provider(provider);
    Ok(())
}

fn init_tracing_subscriber(
    config: &TelemetryConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<(), BoxError> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));
    let registry = tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter);

    if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .json(),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).compact())
            .try_init()?;
    }

    Ok(())
}

/// Flush and shut down the providers installed by [`init_observability`]
///
/// Pending span batches and the last metric interval are exported before
/// this returns. Both providers are shut down even if the first one
/// fails; the first failure is returned. Calling it again, or without any
/// OTLP export enabled, is a no-op.
pub fn shutdown_observability() -> Result<(), BoxError> {
    let (tracer, meter) = {
        let mut providers = providers();
        (providers.tracer.take(), providers.meter.take())
    };

    if tracer.is_none() && meter.is_none() {
        return Ok(());
    }
    tracing::info!("telemetry shutting down");

    let mut first_error: Option<BoxError> = None;

    if let Some(provider) = tracer {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "tracer provider shutdown failed");
            first_error.get_or_insert(Box::new(e));
        }
    }

    if let Some(provider) = meter {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "meter provider shutdown failed");
            first_error.get_or_insert(Box::new(e));
        }
    }

    first_error.map_or(Ok(()), Err)
}
