//! Process-wide tracing setup, selected by [`Environment`].
//!
//! | environment | sink                                             |
//! |-------------|--------------------------------------------------|
//! | development | text log appended to `log_file` (stderr fallback)|
//! | test        | none                                             |
//! | production  | OTLP traces, logs and metrics (`otel` feature)   |
//!
//! The configured [`LogLevel`](megawave_config::LogLevel) is the default
//! directive; `RUST_LOG`, when set, refines it.

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use megawave_config::{Config, Environment, LogLevel};
use megawave_core::{Meter, OvenMetrics};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Keeps exporters alive; flushes them on drop.
#[derive(Default)]
#[must_use = "dropping the guard shuts down telemetry export"]
pub struct TelemetryGuard {
    #[cfg(feature = "otel")]
    providers: Option<otel::Providers>,
}

impl TelemetryGuard {
    /// The oven's meter. `local` always counts; when OTLP export is active the
    /// same events also go to the collector.
    #[cfg_attr(not(feature = "otel"), allow(clippy::unused_self))]
    pub fn meter(&self, local: Arc<OvenMetrics>) -> Arc<dyn Meter> {
        #[cfg(feature = "otel")]
        if let Some(providers) = &self.providers {
            return Arc::new(otel::OtelMeter::new(&providers.meter, local));
        }
        local
    }
}

#[cfg(feature = "otel")]
impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(providers) = self.providers.take() {
            providers.shutdown();
        }
    }
}

pub fn init(config: &Config) -> Result<TelemetryGuard> {
    let filter = env_filter(config.log_level);

    match config.environment {
        Environment::Development => {
            init_log_file(config, filter)?;
            Ok(TelemetryGuard::default())
        }
        Environment::Test => Ok(TelemetryGuard::default()),
        Environment::Production => init_production(config, filter),
    }
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.level_filter().into())
        .from_env_lossy()
}

fn init_log_file(config: &Config, filter: EnvFilter) -> Result<()> {
    let with_source = config.log_level == LogLevel::Debug;
    let path = &config.log_file;

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_file(with_source)
                        .with_line_number(with_source)
                        .with_writer(Mutex::new(file)),
                )
                .with(filter)
                .try_init()
                .context("failed to install tracing subscriber")?;
            tracing::info!(path = %path.display(), "Logging initialized");
        }
        Err(e) => {
            // Raw mode owns stdout; stderr is the only safe fallback.
            eprintln!(
                "warning: could not open log file {}: {e}, using stderr",
                path.display()
            );
            init_stderr(filter, with_source)?;
        }
    }
    Ok(())
}

fn init_stderr(filter: EnvFilter, with_source: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_file(with_source)
                .with_line_number(with_source)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init()
        .context("failed to install tracing subscriber")
}

#[cfg(feature = "otel")]
fn init_production(config: &Config, filter: EnvFilter) -> Result<TelemetryGuard> {
    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        return Ok(TelemetryGuard::default());
    };
    let providers = otel::init(endpoint, filter)?;
    Ok(TelemetryGuard {
        providers: Some(providers),
    })
}

#[cfg(not(feature = "otel"))]
fn init_production(config: &Config, filter: EnvFilter) -> Result<TelemetryGuard> {
    if config.otlp_endpoint.is_some() {
        eprintln!("warning: built without the `otel` feature, OTLP export disabled; using stderr");
        init_stderr(filter, false)?;
    }
    Ok(TelemetryGuard::default())
}

#[cfg(feature = "otel")]
mod otel {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use megawave_core::{Button, Meter, OvenMetrics};
    use opentelemetry::KeyValue;
    use opentelemetry::metrics::{Counter, MeterProvider};
    use opentelemetry::trace::TracerProvider;
    use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
    use opentelemetry_otlp::{LogExporter, MetricExporter, SpanExporter, WithExportConfig};
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::logs::SdkLoggerProvider;
    use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
    use opentelemetry_sdk::trace::SdkTracerProvider;
    use tracing_subscriber::filter::Directive;
    use tracing_subscriber::{EnvFilter, prelude::*};

    const SERVICE_NAME: &str = "megawave";

    /// Exporter internals log through `tracing` too; bridging them back into
    /// OTLP would feed the log exporter its own output.
    const EXPORTER_TARGETS: [&str; 6] = [
        "opentelemetry",
        "opentelemetry_sdk",
        "opentelemetry_otlp",
        "tonic",
        "h2",
        "hyper",
    ];

    pub(super) struct Providers {
        tracer: SdkTracerProvider,
        pub(super) meter: SdkMeterProvider,
        logger: SdkLoggerProvider,
    }

    impl Providers {
        /// Flushes pending batches. Errors are printed: the subscriber that
        /// would log them is the one being torn down.
        pub(super) fn shutdown(self) {
            if let Err(e) = self.tracer.shutdown() {
                eprintln!("Error shutting down tracing provider: {e}");
            }
            if let Err(e) = self.meter.shutdown() {
                eprintln!("Error shutting down meter provider: {e}");
            }
            if let Err(e) = self.logger.shutdown() {
                eprintln!("Error shutting down logger provider: {e}");
            }
        }
    }

    pub(super) fn init(endpoint: &str, filter: EnvFilter) -> Result<Providers> {
        let endpoint = with_scheme(endpoint);
        let resource = Resource::builder().with_service_name(SERVICE_NAME).build();

        let spans = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.as_str())
            .build()
            .context("failed to build OTLP span exporter")?;
        let tracer = SdkTracerProvider::builder()
            .with_batch_exporter(spans)
            .with_resource(resource.clone())
            .build();

        let metrics = MetricExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.as_str())
            .build()
            .context("failed to build OTLP metric exporter")?;
        let meter = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(metrics).build())
            .with_resource(resource.clone())
            .build();

        let logs = LogExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.as_str())
            .build()
            .context("failed to build OTLP log exporter")?;
        let logger = SdkLoggerProvider::builder()
            .with_batch_exporter(logs)
            .with_resource(resource)
            .build();

        let mut filter = filter;
        for target in EXPORTER_TARGETS {
            let directive: Directive = format!("{target}=off")
                .parse()
                .context("invalid exporter filter directive")?;
            filter = filter.add_directive(directive);
        }

        tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(tracer.tracer(SERVICE_NAME)))
            .with(OpenTelemetryTracingBridge::new(&logger))
            .with(filter)
            .try_init()
            .context("failed to install tracing subscriber")?;

        Ok(Providers {
            tracer,
            meter,
            logger,
        })
    }

    /// Forwards oven events to OTel counters as well as the in-process
    /// [`OvenMetrics`] used for the exit summary.
    pub(super) struct OtelMeter {
        local: Arc<OvenMetrics>,
        button_presses: Counter<u64>,
        cooking_sessions: Counter<u64>,
    }

    impl OtelMeter {
        pub(super) fn new(provider: &SdkMeterProvider, local: Arc<OvenMetrics>) -> Self {
            let meter = provider.meter(SERVICE_NAME);
            Self {
                local,
                button_presses: meter
                    .u64_counter("microwave.button_presses")
                    .with_description("Button presses by type and cooking state")
                    .build(),
                cooking_sessions: meter
                    .u64_counter("microwave.cooking_sessions")
                    .with_description("Cooking sessions started")
                    .build(),
            }
        }
    }

    impl Meter for OtelMeter {
        fn record_button_press(&self, button: Button, while_cooking: bool) {
            self.local.record_button_press(button, while_cooking);
            self.button_presses.add(
                1,
                &[
                    KeyValue::new("type", button.as_str()),
                    KeyValue::new("while_cooking", while_cooking),
                ],
            );
        }

        fn record_cooking_session(&self) {
            self.local.record_cooking_session();
            self.cooking_sessions.add(1, &[]);
        }
    }

    /// The tonic exporter needs a URI; bare `host:port` is taken as plaintext.
    pub(super) fn with_scheme(endpoint: &str) -> String {
        if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{endpoint}")
        }
    }

}
