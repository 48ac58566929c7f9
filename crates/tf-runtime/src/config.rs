//! # Runtime Configuration
//!
//! Defaults overridable from the environment. Only the composition root
//! reads the environment; the core services take explicit config structs.

use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Path of the ledger log file.
    pub ledger_path: PathBuf,
    /// Recipients for forwarded integrity alerts.
    pub alert_recipients: Vec<String>,
    /// Incremental integrity check cadence.
    pub incremental_every: Duration,
    /// Full sweep cadence.
    pub full_every: Duration,
    /// Storage reads retried before recording a file as missing.
    pub read_retries: u32,
    /// Whether paying an invoice completes its transaction only after every
    /// linked Bill of Lading is verified.
    pub require_bol_verification: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("./data/ledger.bin"),
            alert_recipients: Vec::new(),
            incremental_every: Duration::from_secs(60 * 60),
            full_every: Duration::from_secs(24 * 60 * 60),
            read_retries: 3,
            require_bol_verification: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration, overriding defaults from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("TF_LEDGER_PATH") {
            config.ledger_path = PathBuf::from(path);
        }
        if let Ok(recipients) = std::env::var("TF_ALERT_RECIPIENTS") {
            config.alert_recipients = recipients
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(secs) = env_u64("TF_INCREMENTAL_SECS") {
            config.incremental_every = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("TF_FULL_SWEEP_SECS") {
            config.full_every = Duration::from_secs(secs);
        }
        if let Some(retries) = env_u64("TF_READ_RETRIES") {
            config.read_retries = retries as u32;
        }
        if let Ok(flag) = std::env::var("TF_REQUIRE_BOL_VERIFICATION") {
            config.require_bol_verification = flag.eq_ignore_ascii_case("true") || flag == "1";
        }

        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
