//! Metric collection framework for the evaluation engine.
//!
//! Each [`MetricCollector`] implementation answers for one metric family
//! (factor readings, device status, task lifecycle) and produces current
//! [`Metric`]s across all targets of that family. Collectors are held in a
//! [`CollectorRegistry`]; adding a metric family means adding a collector,
//! the engine is untouched.

pub mod device;
pub mod factor;
pub mod task;

#[cfg(test)]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use ecomon_common::types::Metric;

/// A metric family provider.
///
/// Implementations must be idempotent and side-effect-free: the recovery
/// monitor re-collects through the same registry used at alert creation
/// time, so a collect call can happen repeatedly for the same target.
#[async_trait]
pub trait MetricCollector: Send + Sync {
    /// Returns the collector name (e.g., `"factor"`, `"device"`), used for
    /// logging.
    fn name(&self) -> &str;

    /// Whether this collector answers for `metric`.
    fn supports(&self, metric: &str) -> bool;

    /// Current measurements for `metric` across all targets of this family.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source query fails.
    async fn collect_all(&self, metric: &str) -> Result<Vec<Metric>>;
}

/// Registry holding one collector per metric family.
pub struct CollectorRegistry {
    collectors: Vec<Box<dyn MetricCollector>>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self {
            collectors: Vec::new(),
        }
    }

    pub fn register(&mut self, collector: Box<dyn MetricCollector>) {
        self.collectors.push(collector);
    }

    /// Whether any registered collector answers for `metric`.
    pub fn supports(&self, metric: &str) -> bool {
        self.collectors.iter().any(|c| c.supports(metric))
    }

    /// Collects `metric` via the first supporting collector. An unrecognized
    /// metric yields an empty list rather than an error; the engine moves on
    /// to other metrics and rules.
    pub async fn collect_all(&self, metric: &str) -> Result<Vec<Metric>> {
        match self.collectors.iter().find(|c| c.supports(metric)) {
            Some(collector) => collector.collect_all(metric).await,
            None => {
                tracing::debug!(metric, "No collector registered for metric");
                Ok(Vec::new())
            }
        }
    }
}

impl Default for CollectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
