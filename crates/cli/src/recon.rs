//! `cauldron run` / `cauldron validate`: config-driven anomaly reconciliation.

use std::path::{Path, PathBuf};

use cauldron_recon::config::WindowConfig;
use cauldron_recon::load::{load_catalog, load_log};
use cauldron_recon::{ReconConfig, ReconError, ReconInput};
use chrono::NaiveDate;
use clap::Subcommand;

use crate::exit_codes::{recon_exit_code, EXIT_RECON_DIAGNOSTICS, EXIT_RECON_RUNTIME};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile an anomaly log against a cauldron catalog
    #[command(after_help = "\
Examples:
  cauldron run weekly.recon.toml
  cauldron run weekly.recon.toml --json
  cauldron run weekly.recon.toml --output result.json
  cauldron run weekly.recon.toml --start 2025-10-31 --end 2025-11-01")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Print the JSON result to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file (overrides [output].json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// First day of the window, inclusive (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day of the window, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  cauldron validate weekly.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, json, output, start, end } => {
            let overrides = WindowConfig { start_date: start, end_date: end };
            cmd_recon_run(config, json, output, overrides)
        }
        ReconCommands::Validate { config } => cmd_recon_validate(config),
    }
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::ConfigParse(msg) if msg.contains("_date") => {
                Some("window dates are quoted strings, e.g. start_date = \"2025-10-30\"".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

fn read_file(path: &Path, what: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| {
        CliError::from(ReconError::Io(format!("cannot read {what} {}: {e}", path.display())))
    })
}

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = read_file(config_path, "config")?;
    Ok(ReconConfig::from_toml(&config_str)?)
}

fn cmd_recon_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    overrides: WindowConfig,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let catalog_str = read_file(&base_dir.join(&config.inputs.catalog), "catalog")?;
    let log_str = read_file(&base_dir.join(&config.inputs.log), "anomaly log")?;
    let input = ReconInput {
        catalog: load_catalog(&catalog_str)?,
        log: load_log(&log_str)?,
    };

    let window = config.resolve_window(&overrides, input.log.metadata.as_ref())?;

    let result = cauldron_recon::run(&config, &input, &window);

    // Output
    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;

    let output_path = output_file.or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p)));
    if let Some(ref path) = output_path {
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "{}: {} cauldrons ({} active), {} anomalies ({} mismatches, {} unpaired), {} matches, {} diagnostics",
        result.meta.window,
        s.units,
        s.units_with_activity,
        s.anomalies,
        s.mismatches,
        s.unpaired_drains + s.unpaired_tickets,
        s.matches,
        result.diagnostics.len(),
    );

    if config.strict && !result.diagnostics.is_empty() {
        for d in &result.diagnostics {
            eprintln!("  {d}");
        }
        return Err(recon_err(
            EXIT_RECON_DIAGNOSTICS,
            format!("{} diagnostic(s) with strict = true", result.diagnostics.len()),
        ));
    }

    Ok(())
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    let window = match (config.window.start_date, config.window.end_date) {
        (Some(start), Some(end)) => format!("{start}..={end}"),
        (None, None) => "window from log metadata".to_string(),
        _ => "partial window, rest from log metadata".to_string(),
    };
    eprintln!(
        "valid: recon '{}' over {} + {} ({}){}",
        config.name,
        config.inputs.catalog,
        config.inputs.log,
        window,
        if config.strict { ", strict" } else { "" },
    );
    Ok(())
}
