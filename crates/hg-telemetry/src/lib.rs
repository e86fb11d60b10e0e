//! # Hashgraph Guard Telemetry
//!
//! Observability plumbing shared by every subsystem crate.
//!
//! ## Components
//!
//! - **Logging**: `tracing` subscriber setup (`init_logging`), plain or JSON
//! - **Rate-limited logging**: `RateLimitedLogger`, at most one line per period
//! - **Metrics**: the `MetricsSink` port. Components receive an
//!   `Arc<dyn MetricsSink>` at construction; nothing registers into a global.
//!   `InMemoryMetrics` for tests and embedding, `PrometheusMetrics` behind the
//!   `metrics` feature.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hg_telemetry::{init_logging, InMemoryMetrics, TelemetryConfig};
//!
//! init_logging(&TelemetryConfig::from_env())?;
//! let metrics = std::sync::Arc::new(InMemoryMetrics::new());
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HG_SERVICE_NAME` | `hashgraph-guard` | Service name attached to log lines |
//! | `HG_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `HG_JSON_LOGS` | `false` | JSON formatted logs |

mod config;
mod logging;
mod metrics;
mod rate_limited;

pub use config::TelemetryConfig;
pub use logging::init_logging;
#[cfg(feature = "metrics")]
pub use metrics::PrometheusMetrics;
pub use metrics::{InMemoryMetrics, MetricsSink, NoopMetrics};
pub use rate_limited::RateLimitedLogger;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
