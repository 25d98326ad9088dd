use crate::MetricCollector;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecomon_common::types::{Metric, TargetType};
use std::sync::Arc;

/// Factor metrics are namespaced `factor.<code>` (e.g. `factor.ph`,
/// `factor.cod`), so the collector answers for the whole family without
/// enumerating codes.
pub const FACTOR_METRIC_PREFIX: &str = "factor.";

/// Extracts the factor code from a namespaced metric name.
pub fn factor_code(metric: &str) -> Option<&str> {
    metric
        .strip_prefix(FACTOR_METRIC_PREFIX)
        .filter(|code| !code.is_empty())
}

/// 某站点某因子的最新读数
#[derive(Debug, Clone)]
pub struct FactorReading {
    pub site_id: String,
    pub site_name: String,
    pub value: f64,
    pub reading_time: DateTime<Utc>,
}

/// Where the latest per-site readings of a factor come from. The composition
/// root adapts its reading store behind this trait.
#[async_trait]
pub trait FactorReadingSource: Send + Sync {
    async fn latest_readings(&self, factor: &str) -> Result<Vec<FactorReading>>;
}

/// Collector for site factor measurements (pH, COD, turbidity, ...).
pub struct FactorCollector {
    source: Arc<dyn FactorReadingSource>,
}

impl FactorCollector {
    pub fn new(source: Arc<dyn FactorReadingSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl MetricCollector for FactorCollector {
    fn name(&self) -> &str {
        "factor"
    }

    fn supports(&self, metric: &str) -> bool {
        factor_code(metric).is_some()
    }

    async fn collect_all(&self, metric: &str) -> Result<Vec<Metric>> {
        let Some(code) = factor_code(metric) else {
            return Ok(Vec::new());
        };
        let readings = self.source.latest_readings(code).await?;
        Ok(readings
            .into_iter()
            .map(|r| Metric {
                name: metric.to_string(),
                target_type: TargetType::Site,
                target_id: r.site_id,
                target_name: r.site_name,
                value: r.value,
                collected_at: r.reading_time,
            })
            .collect())
    }
}
