use ecomon_alert::engine::RuleEngine;
use ecomon_alert::recovery::RecoveryMonitor;
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Drives the two sweep cadences. Each loop runs its sweep to completion
/// before the next tick is honored, so sweeps of the same kind never
/// overlap; the evaluation and recovery cadences are independent of each
/// other.
pub struct SweepScheduler {
    engine: Arc<RuleEngine>,
    monitor: Arc<RecoveryMonitor>,
    evaluation_interval_secs: u64,
    recovery_interval_secs: u64,
}

impl SweepScheduler {
    pub fn new(
        engine: Arc<RuleEngine>,
        monitor: Arc<RecoveryMonitor>,
        evaluation_interval_secs: u64,
        recovery_interval_secs: u64,
    ) -> Self {
        Self {
            engine,
            monitor,
            evaluation_interval_secs,
            recovery_interval_secs,
        }
    }

    pub async fn run_evaluation(&self) {
        tracing::info!(
            interval_secs = self.evaluation_interval_secs,
            "Evaluation sweep scheduler started"
        );
        let mut tick = interval(Duration::from_secs(self.evaluation_interval_secs));
        loop {
            tick.tick().await;
            if let Err(e) = self.engine.run_sweep().await {
                tracing::error!(error = %e, "Evaluation sweep failed");
            }
        }
    }

    pub async fn run_recovery(&self) {
        tracing::info!(
            interval_secs = self.recovery_interval_secs,
            "Recovery sweep scheduler started"
        );
        let mut tick = interval(Duration::from_secs(self.recovery_interval_secs));
        loop {
            tick.tick().await;
            if let Err(e) = self.monitor.run_sweep().await {
                tracing::error!(error = %e, "Recovery sweep failed");
            }
        }
    }
}
