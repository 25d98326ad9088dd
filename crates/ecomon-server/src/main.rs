use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use ecomon_alert::engine::RuleEngine;
use ecomon_alert::recovery::RecoveryMonitor;
use ecomon_collector::device::DeviceStatusCollector;
use ecomon_collector::factor::FactorCollector;
use ecomon_collector::task::TaskLifecycleCollector;
use ecomon_collector::CollectorRegistry;
use ecomon_common::types::NotifyChannelType;
use ecomon_notify::dispatcher::Dispatcher;
use ecomon_notify::plugin::ChannelRegistry;
use ecomon_notify::DeliveryChannel;
use ecomon_storage::Store;

use ecomon_server::config::ServerConfig;
use ecomon_server::scheduler::SweepScheduler;
use ecomon_server::seed;
use ecomon_server::sources::{StoreDeviceSource, StoreFactorSource, StoreTaskGateway};

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  ecomon-server [config.toml]                         Start the server");
    eprintln!("  ecomon-server init-rules <config.toml> <seed.json>  Initialize alert rules from seed file");
    eprintln!("  ecomon-server init-users <config.toml> <seed.json>  Initialize users from seed file");
}

#[tokio::main]
async fn main() -> Result<()> {
    ecomon_common::id::init(1, 1);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ecomon=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("init-rules") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-rules requires <config.toml> and <seed.json> arguments")
            })?;
            let seed_path = args.get(3).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-rules requires <seed.json> argument")
            })?;
            let config = ServerConfig::load(config_path)?;
            let store = Store::new(&config.database.url).await?;
            seed::seed_rules(&store, seed_path).await
        }
        Some("init-users") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-users requires <config.toml> and <seed.json> arguments")
            })?;
            let seed_path = args.get(3).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-users requires <seed.json> argument")
            })?;
            let config = ServerConfig::load(config_path)?;
            let store = Store::new(&config.database.url).await?;
            seed::seed_users(&store, seed_path).await
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args
                .get(1)
                .map(|s| s.as_str())
                .unwrap_or("config/server.toml");
            run_server(config_path).await
        }
    }
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = match ServerConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(config_path, error = %e, "Config not loadable, using defaults");
            ServerConfig::default()
        }
    };

    let store = Arc::new(Store::new(&config.database.url).await?);

    // metric collector registry: one collector per family
    let task_gateway = Arc::new(StoreTaskGateway::new(
        store.clone(),
        config.monitor.task_expiring_window_minutes,
        config.monitor.remediation_deadline_hours,
    ));
    let mut registry = CollectorRegistry::new();
    registry.register(Box::new(FactorCollector::new(Arc::new(
        StoreFactorSource::new(store.clone()),
    ))));
    registry.register(Box::new(DeviceStatusCollector::new(Arc::new(
        StoreDeviceSource::new(store.clone(), config.monitor.device_offline_minutes),
    ))));
    registry.register(Box::new(TaskLifecycleCollector::new(task_gateway.clone())));
    let registry = Arc::new(registry);

    // delivery channels from config, instantiated through the plugin registry
    let plugins = ChannelRegistry::default();
    let mut channels: HashMap<NotifyChannelType, Arc<dyn DeliveryChannel>> = HashMap::new();
    for entry in &config.notify.channels {
        if !entry.enabled {
            continue;
        }
        let channel_type: NotifyChannelType = match entry.channel_type.parse() {
            Ok(ct) => ct,
            Err(e) => {
                tracing::warn!(channel = %entry.channel_type, error = %e, "Skipping unknown channel type");
                continue;
            }
        };
        let config_json = serde_json::to_value(&entry.config)?;
        match plugins.create_channel(&entry.channel_type, &config_json) {
            Ok(channel) => {
                tracing::info!(channel = %channel_type, "Notification channel configured");
                channels.insert(channel_type, Arc::from(channel));
            }
            Err(e) => {
                tracing::warn!(channel = %channel_type, error = %e, "Skipping misconfigured channel");
            }
        }
    }

    let (signal_tx, signal_rx) = mpsc::unbounded_channel();

    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        channels,
        config.notify.max_concurrent,
    ));
    tokio::spawn(dispatcher.clone().run(signal_rx));

    let engine = Arc::new(RuleEngine::new(
        store.clone(),
        store.clone(),
        registry.clone(),
        task_gateway,
        signal_tx.clone(),
    ));
    let monitor = Arc::new(RecoveryMonitor::new(
        store.clone(),
        store.clone(),
        registry,
        signal_tx,
    ));

    let scheduler = Arc::new(SweepScheduler::new(
        engine,
        monitor,
        config.sweep.evaluation_interval_secs,
        config.sweep.recovery_interval_secs,
    ));
    {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run_evaluation().await });
    }
    {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run_recovery().await });
    }

    tracing::info!("ecomon server started");
    signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, exiting");
    Ok(())
}
