//! Tracing subscriber initialization.
//!
//! # Usage
//!
//! ```no_run
//! use factsink_observe::{TracingOptions, init_tracing};
//!
//! init_tracing(&TracingOptions::default()).unwrap();
//! ```
//!
//! Logs always go to stderr so that command output on stdout stays clean.

use std::str::FromStr;
use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Env var selecting the log line format (`text` or `json`).
pub const LOG_FORMAT_ENV: &str = "FACTSINK_LOG_FORMAT";
/// Env var enabling the OpenTelemetry stdout bridge when set to `1` or `true`.
pub const OTEL_ENV: &str = "FACTSINK_OTEL";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines with span close timing.
    #[default]
    Text,
    /// One JSON object per event (CloudWatch friendly).
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("invalid log format: '{other}'")),
        }
    }
}

/// How the global subscriber should be built.
#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// Filter used when `RUST_LOG` is not set (e.g. `"info"`, `"factsink=debug"`).
    pub default_filter: String,
    pub format: LogFormat,
    /// Bridge spans to OpenTelemetry with a stdout exporter.
    pub otel: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            format: LogFormat::Text,
            otel: false,
        }
    }
}

impl TracingOptions {
    /// Apply `FACTSINK_LOG_FORMAT` and `FACTSINK_OTEL` on top of `self`.
    ///
    /// An unparseable format value is ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(format) = lookup(LOG_FORMAT_ENV).and_then(|v| v.parse().ok()) {
            self.format = format;
        }
        if let Some(flag) = lookup(OTEL_ENV) {
            self.otel = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// - `RUST_LOG` wins over `options.default_filter`.
/// - Installs either a text `fmt` layer or a JSON layer, both on stderr.
/// - When `options.otel` is set, also bridges spans to OpenTelemetry using a
///   stdout exporter.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or the
/// default filter does not parse.
pub fn init_tracing(options: &TracingOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.default_filter)?,
    };

    let text_layer = (options.format == LogFormat::Text).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
    });

    let json_layer = (options.format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(false)
    });

    let otel_layer = if options.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("factsink");

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

/// Flush pending spans and shut down the OpenTelemetry tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" TEXT ".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let options = TracingOptions::default()
            .with_env_overrides(lookup(&[(LOG_FORMAT_ENV, "json"), (OTEL_ENV, "1")]));
        assert_eq!(options.format, LogFormat::Json);
        assert!(options.otel);
    }

    #[test]
    fn test_bad_format_is_ignored() {
        let options = TracingOptions {
            format: LogFormat::Json,
            ..TracingOptions::default()
        }
        .with_env_overrides(lookup(&[(LOG_FORMAT_ENV, "yaml")]));
        assert_eq!(options.format, LogFormat::Json);
        assert!(!options.otel);
    }

    #[test]
    fn test_shutdown_without_otel_is_noop() {
        shutdown_tracing();
    }
}
