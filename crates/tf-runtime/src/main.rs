//! TradeLedger runtime entry point.

use anyhow::{Context, Result};
use std::sync::Arc;
use tf_integrity::{
    AlertSink, AlertSinkConfig, IntegrityChecker, IntegrityConfig, IntegrityScheduler,
    InMemoryStorageBackend, LoggingNotifier, Sha256Hasher, SchedulerConfig,
};
use tf_ledger::FileBackedLedgerStore;
use tf_lifecycle::{LifecycleConfig, LifecycleService, TransitionTable};
use tf_runtime::{LifecycleDirectory, RuntimeConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    info!("===========================================");
    info!("  TradeLedger Runtime v0.1.0");
    info!("===========================================");

    let config = RuntimeConfig::from_env();
    info!("Ledger log: {}", config.ledger_path.display());
    info!(
        "Integrity cadences: incremental {:?}, full {:?}",
        config.incremental_every, config.full_every
    );

    // A malformed transition table must fail here, never at runtime.
    let table = TransitionTable::default_rules()
        .context("transition table failed startup validation")?;

    let ledger = Arc::new(
        FileBackedLedgerStore::open(&config.ledger_path)
            .context("failed to open ledger log")?,
    );
    let clock = Arc::new(shared_types::SystemTimeSource);

    let lifecycle = Arc::new(LifecycleService::new(
        table,
        ledger.clone(),
        clock.clone(),
        LifecycleConfig {
            require_bol_verification: config.require_bol_verification,
        },
    ));

    // Storage and notification backends are host concerns; this runtime
    // wires the in-memory storage and the logging notifier. Deployments
    // swap in disk/object-store and email adapters here.
    let storage = Arc::new(InMemoryStorageBackend::new());
    let alerts = Arc::new(AlertSink::new(
        clock.clone(),
        Arc::new(LoggingNotifier),
        AlertSinkConfig {
            recipients: config.alert_recipients.clone(),
        },
    ));
    let checker = Arc::new(IntegrityChecker::new(
        Arc::new(Sha256Hasher),
        storage,
        Arc::new(LifecycleDirectory::new(lifecycle.clone())),
        ledger,
        alerts,
        clock,
        IntegrityConfig {
            read_retries: config.read_retries,
            ..IntegrityConfig::default()
        },
    ));

    let scheduler = IntegrityScheduler::spawn(
        checker,
        SchedulerConfig {
            incremental_every: config.incremental_every,
            full_every: config.full_every,
        },
    );
    info!("All subsystems initialized and running");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");
    scheduler.shutdown();

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;
    Ok(())
}
