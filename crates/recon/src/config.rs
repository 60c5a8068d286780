use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ReconError;
use crate::model::LogMetadata;
use crate::window::{parse_date, DateWindow};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    /// Treat any diagnostic as a failed run.
    #[serde(default)]
    pub strict: bool,
    pub inputs: InputConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Feed files, relative to the config file's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub catalog: String,
    pub log: String,
}

/// Either bound may be left out and filled from a higher-priority source or
/// from the log's metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowConfig {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }
        if self.inputs.catalog.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "inputs.catalog must name a file".into(),
            ));
        }
        if self.inputs.log.trim().is_empty() {
            return Err(ReconError::ConfigValidation("inputs.log must name a file".into()));
        }
        if let Some(ref json) = self.output.json {
            if json.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "output.json must name a file when set".into(),
                ));
            }
        }
        Ok(())
    }

    /// Pick each bound from `overrides`, then `[window]`, then log metadata.
    pub fn resolve_window(
        &self,
        overrides: &WindowConfig,
        metadata: Option<&LogMetadata>,
    ) -> Result<DateWindow, ReconError> {
        let start = match overrides.start_date.or(self.window.start_date) {
            Some(d) => d,
            None => match metadata {
                Some(m) => parse_date("metadata.start_date", &m.start_date)?,
                None => return Err(missing_bound("start")),
            },
        };
        let end = match overrides.end_date.or(self.window.end_date) {
            Some(d) => d,
            None => match metadata {
                Some(m) => parse_date("metadata.end_date", &m.end_date)?,
                None => return Err(missing_bound("end")),
            },
        };

        let window = DateWindow::new(start, end);
        if window.is_empty() {
            log::warn!("window {window} has start after end; nothing will be reconciled");
        }
        Ok(window)
    }
}

fn missing_bound(which: &str) -> ReconError {
    ReconError::ConfigValidation(format!(
        "no {which} date: pass --{which}, set [window].{which}_date, or use a log with metadata"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
