//! Metrics sinks.
//!
//! All metrics follow the naming convention: `hg_<component>_<metric>[_total]`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g. `hg_branching_events_total`)
//! - **Gauge**: Value that can go up or down (e.g. `hg_branching_weight_fraction`)
//!
//! Components hold an `Arc<dyn MetricsSink>` handed to them at construction.
//! There is no global registry: two components given two sinks never share state.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;

/// Destination for counters and gauges.
pub trait MetricsSink: Send + Sync + fmt::Debug {
    /// Add `by` to the counter `name`.
    fn increment_counter(&self, name: &'static str, by: u64);

    /// Set the gauge `name` to `value`.
    fn set_gauge(&self, name: &'static str, value: f64);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment_counter(&self, _name: &'static str, _by: u64) {}

    fn set_gauge(&self, _name: &'static str, _value: f64) {}
}

/// Keeps the latest value of every metric in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: Mutex<BTreeMap<&'static str, u64>>,
    gauges: Mutex<BTreeMap<&'static str, f64>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of counter `name` (zero if never incremented).
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    /// Current value of gauge `name`, if it was ever set.
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.lock().get(name).copied()
    }

    /// Snapshot of all counters, sorted by name.
    pub fn counters(&self) -> BTreeMap<&'static str, u64> {
        self.counters.lock().clone()
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment_counter(&self, name: &'static str, by: u64) {
        *self.counters.lock().entry(name).or_insert(0) += by;
    }

    fn set_gauge(&self, name: &'static str, value: f64) {
        self.gauges.lock().insert(name, value);
    }
}

#[cfg(feature = "metrics")]
pub use prometheus_sink::PrometheusMetrics;

#[cfg(feature = "metrics")]
mod prometheus_sink {
    use super::MetricsSink;
    use crate::TelemetryError;
    use parking_lot::Mutex;
    use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
    use std::collections::HashMap;

    /// Prometheus-backed sink owning its own `Registry`.
    ///
    /// Metrics are created and registered on first use.
    #[derive(Debug)]
    pub struct PrometheusMetrics {
        registry: Registry,
        counters: Mutex<HashMap<&'static str, IntCounter>>,
        gauges: Mutex<HashMap<&'static str, Gauge>>,
    }

    impl PrometheusMetrics {
        pub fn new() -> Self {
            Self::with_registry(Registry::new())
        }

        pub fn with_registry(registry: Registry) -> Self {
            Self {
                registry,
                counters: Mutex::new(HashMap::new()),
                gauges: Mutex::new(HashMap::new()),
            }
        }

        pub fn registry(&self) -> &Registry {
            &self.registry
        }

        /// Render every registered metric in the text exposition format.
        pub fn render(&self) -> Result<String, TelemetryError> {
            let mut buffer = Vec::new();
            TextEncoder::new()
                .encode(&self.registry.gather(), &mut buffer)
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
        }

        fn counter(&self, name: &'static str) -> Option<IntCounter> {
            let mut counters = self.counters.lock();
            if let Some(counter) = counters.get(name) {
                return Some(counter.clone());
            }
            let counter = IntCounter::new(name, name)
                .and_then(|c| self.registry.register(Box::new(c.clone())).map(|_| c));
            match counter {
                Ok(counter) => {
                    counters.insert(name, counter.clone());
                    Some(counter)
                }
                Err(e) => {
                    tracing::warn!(metric = name, error = %e, "Failed to register counter");
                    None
                }
            }
        }

        fn gauge(&self, name: &'static str) -> Option<Gauge> {
            let mut gauges = self.gauges.lock();
            if let Some(gauge) = gauges.get(name) {
                return Some(gauge.clone());
            }
            let gauge = Gauge::new(name, name)
                .and_then(|g| self.registry.register(Box::new(g.clone())).map(|_| g));
            match gauge {
                Ok(gauge) => {
                    gauges.insert(name, gauge.clone());
                    Some(gauge)
                }
                Err(e) => {
                    tracing::warn!(metric = name, error = %e, "Failed to register gauge");
                    None
                }
            }
        }
    }

    impl Default for PrometheusMetrics {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MetricsSink for PrometheusMetrics {
        fn increment_counter(&self, name: &'static str, by: u64) {
            if let Some(counter) = self.counter(name) {
                counter.inc_by(by);
            }
        }

        fn set_gauge(&self, name: &'static str, value: f64) {
            if let Some(gauge) = self.gauge(name) {
                gauge.set(value);
            }
        }
    }

}
