//! Owned metric registry with schema-checked labels.
//!
//! Every metric is registered once with a fixed label schema. Updates pass
//! label values positionally and are validated against that schema before
//! touching the underlying `prometheus` collectors, whose counters and
//! histograms are updated atomically.
//!
//! Each metric keeps its own `prometheus::Registry` so `export()` can walk
//! metrics in name order and still print the header of a metric that has
//! not seen any observation yet.

use parking_lot::RwLock;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Errors raised by misuse of the [`MetricRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("metric `{name}` is already registered with a different kind or label schema")]
    DuplicateMetric { name: String },

    #[error("metric `{name}` is not registered")]
    UnknownMetric { name: String },

    #[error("metric `{name}` expects {expected} label values, got {actual}")]
    LabelArity {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("metric `{name}` is a {actual}, not a {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("metric `{name}` cannot observe {value}: values must be finite and non-negative")]
    InvalidObservation { name: String, value: f64 },

    #[error("metric `{name}` has invalid bucket bounds: {reason}")]
    InvalidBuckets { name: String, reason: &'static str },

    #[error(transparent)]
    Backend(#[from] prometheus::Error),
}

/// Kind of a registered metric. Histograms carry their bucket upper bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricKind {
    Counter,
    Histogram { buckets: Vec<f64> },
}

impl MetricKind {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram { .. } => "histogram",
        }
    }
}

/// Registration-time description of a metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDesc {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_keys: Vec<String>,
}

impl MetricDesc {
    // ---
    pub fn counter(name: &str, help: &str, label_keys: &[&str]) -> Self {
        // ---
        Self {
            name: name.to_string(),
            help: help.to_string(),
            kind: MetricKind::Counter,
            label_keys: label_keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn histogram(name: &str, help: &str, label_keys: &[&str], buckets: &[f64]) -> Self {
        // ---
        Self {
            name: name.to_string(),
            help: help.to_string(),
            kind: MetricKind::Histogram {
                buckets: buckets.to_vec(),
            },
            label_keys: label_keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

enum Instrument {
    Counter(IntCounterVec),
    Histogram(HistogramVec),
}

struct RegisteredMetric {
    desc: MetricDesc,
    instrument: Instrument,
    registry: Registry,
}

impl RegisteredMetric {
    // ---
    fn check_arity(&self, label_values: &[&str]) -> Result<(), RegistryError> {
        // ---
        if label_values.len() != self.desc.label_keys.len() {
            return Err(RegistryError::LabelArity {
                name: self.desc.name.clone(),
                expected: self.desc.label_keys.len(),
                actual: label_values.len(),
            });
        }
        Ok(())
    }
}

/// Process-wide metric collection, constructed once and shared by handle.
#[derive(Default)]
pub struct MetricRegistry {
    metrics: RwLock<BTreeMap<String, RegisteredMetric>>,
}

impl MetricRegistry {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a metric.
    ///
    /// Registering an identical description twice is a no-op. A name that is
    /// already taken by a different kind, label schema or bucket layout fails
    /// with [`RegistryError::DuplicateMetric`].
    pub fn register(&self, desc: MetricDesc) -> Result<(), RegistryError> {
        // ---
        let mut metrics = self.metrics.write();

        if let Some(existing) = metrics.get(&desc.name) {
            if existing.desc.kind == desc.kind && existing.desc.label_keys == desc.label_keys {
                return Ok(());
            }
            return Err(RegistryError::DuplicateMetric { name: desc.name });
        }

        let label_keys: Vec<&str> = desc.label_keys.iter().map(String::as_str).collect();
        let registry = Registry::new();

        let instrument = match &desc.kind {
            MetricKind::Counter => {
                let vec = IntCounterVec::new(Opts::new(&desc.name, &desc.help), &label_keys)?;
                if label_keys.is_empty() {
                    vec.get_metric_with_label_values::<&str>(&[])?;
                }
                registry.register(Box::new(vec.clone()))?;
                Instrument::Counter(vec)
            }
            MetricKind::Histogram { buckets } => {
                validate_buckets(&desc.name, buckets)?;
                let opts = HistogramOpts::new(&desc.name, &desc.help).buckets(buckets.clone());
                let vec = HistogramVec::new(opts, &label_keys)?;
                if label_keys.is_empty() {
                    vec.get_metric_with_label_values::<&str>(&[])?;
                }
                registry.register(Box::new(vec.clone()))?;
                Instrument::Histogram(vec)
            }
        };

        tracing::debug!(metric = %desc.name, kind = desc.kind.as_str(), "Registered metric");

        metrics.insert(
            desc.name.clone(),
            RegisteredMetric {
                desc,
                instrument,
                registry,
            },
        );
        Ok(())
    }

    /// Add 1 to the counter `name` at the given label values.
    pub fn increment(&self, name: &str, label_values: &[&str]) -> Result<(), RegistryError> {
        // ---
        let metrics = self.metrics.read();
        let metric = lookup(&metrics, name)?;
        metric.check_arity(label_values)?;

        match &metric.instrument {
            Instrument::Counter(vec) => {
                vec.get_metric_with_label_values(label_values)?.inc();
                Ok(())
            }
            Instrument::Histogram(_) => Err(kind_mismatch(metric, "counter")),
        }
    }

    /// Record `value` into the histogram `name` at the given label values.
    pub fn observe(
        &self,
        name: &str,
        label_values: &[&str],
        value: f64,
    ) -> Result<(), RegistryError> {
        // ---
        let metrics = self.metrics.read();
        let metric = lookup(&metrics, name)?;
        metric.check_arity(label_values)?;

        match &metric.instrument {
            Instrument::Histogram(vec) => {
                if !value.is_finite() || value < 0.0 {
                    return Err(RegistryError::InvalidObservation {
                        name: name.to_string(),
                        value,
                    });
                }
                vec.get_metric_with_label_values(label_values)?.observe(value);
                Ok(())
            }
            Instrument::Counter(_) => Err(kind_mismatch(metric, "histogram")),
        }
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.metrics.read().contains_key(name)
    }

    /// Snapshot every metric in Prometheus text exposition format.
    ///
    /// Metrics are ordered by name and label-sets are sorted within each
    /// metric. A metric without observations still yields its header lines.
    pub fn export(&self) -> String {
        // ---
        let metrics = self.metrics.read();
        let encoder = TextEncoder::new();
        let mut out = String::new();

        for metric in metrics.values() {
            let families = metric.registry.gather();

            if families.is_empty() {
                let desc = &metric.desc;
                let _ = writeln!(out, "# HELP {} {}", desc.name, escape_help(&desc.help));
                let _ = writeln!(out, "# TYPE {} {}", desc.name, desc.kind.as_str());
                continue;
            }

            let mut buffer = Vec::new();
            if let Err(err) = encoder.encode(&families, &mut buffer) {
                tracing::error!(metric = %metric.desc.name, ?err, "Failed to encode metric family");
                continue;
            }
            out.push_str(&String::from_utf8_lossy(&buffer));
        }

        out
    }
}

fn lookup<'a>(
    metrics: &'a BTreeMap<String, RegisteredMetric>,
    name: &str,
) -> Result<&'a RegisteredMetric, RegistryError> {
    // ---
    metrics.get(name).ok_or_else(|| RegistryError::UnknownMetric {
        name: name.to_string(),
    })
}

fn kind_mismatch(metric: &RegisteredMetric, expected: &'static str) -> RegistryError {
    // ---
    RegistryError::KindMismatch {
        name: metric.desc.name.clone(),
        expected,
        actual: metric.desc.kind.as_str(),
    }
}

fn validate_buckets(name: &str, buckets: &[f64]) -> Result<(), RegistryError> {
    // ---
    let invalid = |reason| RegistryError::InvalidBuckets {
        name: name.to_string(),
        reason,
    };

    if buckets.is_empty() {
        return Err(invalid("at least one bound is required"));
    }
    if buckets.iter().any(|b| !b.is_finite()) {
        return Err(invalid("bounds must be finite"));
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid("bounds must be strictly ascending"));
    }
    Ok(())
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}
