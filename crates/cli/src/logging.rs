//! stderr logging for the CLI.
//!
//! The engine logs through the `log` facade; the subscriber installed here
//! forwards those records too. `RUST_LOG` wins over `-v`.

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter for a `-v` count: 0 → warn, 1 → info, 2+ → debug.
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    // A second init (tests) is harmless; keep whichever subscriber won.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
