//! # TradeLedger Runtime
//!
//! Composition root for the TradeLedger subsystems: loads configuration,
//! wires the lifecycle service, ledger store, and integrity checker
//! together, and runs the background integrity cadences.
//!
//! ## Modular Structure
//!
//! - `adapters` - Port implementations connecting subsystems
//! - `config` - Environment-driven runtime configuration
//!
//! The binary (`main.rs`) performs the startup sequence:
//!
//! 1. Initialize the tracing subscriber
//! 2. Load configuration from the environment
//! 3. Validate the transition table (fatal on configuration error)
//! 4. Open the ledger log and replay it
//! 5. Construct services and start the integrity scheduler
//! 6. Run until ctrl-c, then shut the scheduler down

pub mod adapters;
pub mod config;

pub use adapters::LifecycleDirectory;
pub use config::RuntimeConfig;
