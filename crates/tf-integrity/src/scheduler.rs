//! # Integrity Scheduler
//!
//! Background cadences over the checker: a frequent incremental check and
//! a rare full sweep. On-demand checks go straight to the shared
//! [`IntegrityChecker`]; nothing user-facing blocks on these loops.

use crate::checker::{CancelFlag, IntegrityChecker};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Scheduler cadences.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Incremental (watermark) check cadence.
    pub incremental_every: Duration,
    /// Full sweep cadence.
    pub full_every: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            incremental_every: Duration::from_secs(60 * 60),
            full_every: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Handle over the two background loops.
pub struct IntegrityScheduler {
    cancel: CancelFlag,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl IntegrityScheduler {
    /// Spawn the incremental and full-sweep loops on the current tokio
    /// runtime.
    pub fn spawn(checker: Arc<IntegrityChecker>, config: SchedulerConfig) -> Self {
        let cancel = CancelFlag::new();
        let SchedulerConfig {
            incremental_every,
            full_every,
        } = config;

        let incremental = {
            let checker = checker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(incremental_every);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                ticker.tick().await; // consume the immediate first tick
                loop {
                    ticker.tick().await;
                    if cancel.is_cancelled() {
                        break;
                    }
                    let since = checker.latest_watermark();
                    let report = checker.check_incremental(since).await;
                    if report.issues() > 0 {
                        tracing::warn!(
                            "[tf-integrity] incremental check found {} issue(s)",
                            report.issues()
                        );
                    }
                }
            })
        };

        let full = {
            let checker = checker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(full_every);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if cancel.is_cancelled() {
                        break;
                    }
                    let report = checker.check_full(&cancel).await;
                    tracing::info!(
                        "[tf-integrity] daily sweep: {} checked, {} issue(s)",
                        report.checked,
                        report.issues()
                    );
                }
            })
        };

        Self {
            cancel,
            handles: Mutex::new(vec![incremental, full]),
        }
    }

    /// Cancellation flag shared with in-flight sweeps.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Stop the loops. An in-flight full sweep exits between documents;
    /// result rows already written stay.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
        tracing::info!("[tf-integrity] scheduler stopped");
    }
}

impl Drop for IntegrityScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }
}
