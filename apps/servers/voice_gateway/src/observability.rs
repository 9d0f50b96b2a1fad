//! Tracing setup (`SPEC_FULL.md` §10.1): an `EnvFilter`-driven subscriber,
//! pretty by default and JSON when `LOG_JSON=1`, with optional OTLP span
//! export gated behind `OTEL_EXPORTER_OTLP_ENDPOINT`. Mirrors the
//! `init_tracing`/`metrics::observability::init` split already used in
//! this repo's other server binaries.

use std::str::FromStr;

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace, Resource};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::JsonFields;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::config::Config;

/// Holds the OTLP tracer provider alive for the process lifetime; dropping
/// it flushes any buffered spans on shutdown.
pub struct TracingGuard {
	otel_enabled: bool,
}

impl Drop for TracingGuard {
	fn drop(&mut self) {
		if self.otel_enabled {
			opentelemetry::global::shutdown_tracer_provider();
		}
	}
}

/// Installs the global `tracing` subscriber. Call once, before any other
/// task starts.
pub fn init(config: &Config) -> TracingGuard {
	let filter = EnvFilter::from_str(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"));

	let fmt_layer: Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync> = if config.log_json {
		Box::new(
			tracing_subscriber::fmt::layer()
				.fmt_fields(JsonFields::default())
				.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false)),
		)
	} else {
		Box::new(tracing_subscriber::fmt::layer().event_format(tracing_subscriber::fmt::format().pretty()))
	};

	let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);
	let otel_enabled = config.otel_exporter_otlp_endpoint.is_some();

	match config.otel_exporter_otlp_endpoint.as_deref().map(build_tracer) {
		Some(Ok(tracer)) => {
			registry.with(tracing_opentelemetry::layer().with_tracer(tracer)).init();
		}
		Some(Err(e)) => {
			registry.init();
			tracing::warn!(error = %e, "failed to initialize OTLP export, continuing with local tracing only");
		}
		None => registry.init(),
	}

	TracingGuard { otel_enabled }
}

fn build_tracer(endpoint: &str) -> Result<opentelemetry_sdk::trace::Tracer, opentelemetry::trace::TraceError> {
	use opentelemetry::trace::TracerProvider as _;

	let resource = Resource::new(vec![KeyValue::new("service.name", "voice_gateway")]);

	let tracer_provider = opentelemetry_otlp::new_pipeline()
		.tracing()
		.with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
		.with_trace_config(trace::config().with_resource(resource))
		.install_batch(opentelemetry_sdk::runtime::Tokio)?;

	Ok(tracer_provider.tracer("voice_gateway"))
}
