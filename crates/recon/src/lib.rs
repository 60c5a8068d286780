//! `cauldron-recon`: anomaly/match reconciliation for cauldron feeds.
//!
//! Pure engine crate: receives the parsed catalog and anomaly log, returns
//! one aggregate per cauldron. No CLI or IO dependencies.

pub mod aggregate;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod load;
pub mod matcher;
pub mod model;
pub mod window;

pub use config::ReconConfig;
pub use diagnostics::Diagnostic;
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use model::{AggregatedUnit, AnomalyLog, ReconInput, ReconResult, Reconciliation, StorageUnit};
pub use window::DateWindow;
