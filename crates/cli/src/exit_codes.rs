//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 60-69   | recon            | Reconciliation run codes                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use cauldron_recon::ReconError;

// =============================================================================
// Universal
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Config could not be parsed or failed validation, or no window could be
/// resolved from flags, config, or log metadata.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// Runtime failure: unreadable file, malformed feed JSON, bad metadata date,
/// output not writable.
pub const EXIT_RECON_RUNTIME: u8 = 61;

/// Run completed but produced diagnostics while `strict = true`.
pub const EXIT_RECON_DIAGNOSTICS: u8 = 62;

/// Map a library error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::DateParse { .. } | ReconError::Json { .. } | ReconError::Io(_) => {
            EXIT_RECON_RUNTIME
        }
    }
}
