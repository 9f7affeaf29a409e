//! Logging and optional OpenTelemetry export for the daemon
//!
//! Layers are stacked on one registry:
//! - `EnvFilter` (`RUST_LOG`, default `sendq=info`)
//! - stdout formatter, pretty or JSON per `logging.format`
//! - daily-rolling JSON file sink when `logging.directory` is set
//! - OTLP span export when built with `--features telemetry` and
//!   `OTEL_EXPORTER_OTLP_ENDPOINT` is set

use crate::config::{LogFormat, LoggingConfig};
use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

const DEFAULT_FILTER: &str = "sendq=info";
const LOG_FILE_PREFIX: &str = "sendqd.log";

/// Keeps background writers and exporters alive; flushes them on drop
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    #[cfg(feature = "telemetry")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        {
            if let Some(provider) = self.provider.take() {
                if let Err(e) = provider.shutdown() {
                    eprintln!("OpenTelemetry shutdown failed: {}", e);
                }
            }
        }
    }
}

pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    layers.push(match config.format {
        LogFormat::Json => fmt::layer().json().boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    });

    let file_guard = match &config.directory {
        Some(directory) => {
            let directory = shellexpand::tilde(directory).into_owned();
            std::fs::create_dir_all(&directory)?;
            let appender = tracing_appender::rolling::daily(&directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt::layer().json().with_ansi(false).with_writer(writer).boxed());
            Some(guard)
        }
        None => None,
    };

    #[cfg(feature = "telemetry")]
    let provider = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => {
            let (layer, provider) = otel::layer(&endpoint)?;
            layers.push(layer);
            Some(provider)
        }
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;

    #[cfg(not(feature = "telemetry"))]
    {
        if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
            tracing::warn!("OTEL_EXPORTER_OTLP_ENDPOINT set but feature 'telemetry' not enabled");
        }
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
        #[cfg(feature = "telemetry")]
        provider,
    })
}

#[cfg(feature = "telemetry")]
mod otel {
    use super::BoxedLayer;
    use anyhow::Result;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};
    use tracing_subscriber::Layer;

    pub(super) fn layer(endpoint: &str) -> Result<(BoxedLayer, TracerProvider)> {
        let service_name =
            std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "sendqd".to_string());

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_resource(Resource::new(vec![
                KeyValue::new("service.name", service_name.clone()),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            ]))
            .build();

        let tracer = provider.tracer(service_name);
        let layer = tracing_opentelemetry::layer().with_tracer(tracer).boxed();
        Ok((layer, provider))
    }
}
