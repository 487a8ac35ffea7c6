use std::path::PathBuf;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the opening day of a cycle is chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMode {
    /// First trading day after the previous expiration.
    NextSession,
    /// Monday of expiration week (days 11-17), falling back to Tuesday (12-18).
    #[default]
    MondayTuesday,
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisParameters {
    /// Bars dated before this are ignored entirely.
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub prices_csv: PathBuf,
    pub settlements_csv: PathBuf,
    /// Where cycles.csv, summary.json and opex.log land. None keeps the run
    /// console-only.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub parameters: AnalysisParameters,
    #[serde(default)]
    pub anchor_mode: AnchorMode,
    #[serde(default)]
    pub quiet: bool,
    #[serde(default = "default_write_artifacts")]
    pub write_artifacts: bool,
}

const fn default_write_artifacts() -> bool {
    true
}

impl Config {
    pub fn new(prices_csv: impl Into<PathBuf>, settlements_csv: impl Into<PathBuf>) -> Self {
        Self {
            prices_csv: prices_csv.into(),
            settlements_csv: settlements_csv.into(),
            output_dir: None,
            parameters: AnalysisParameters::default(),
            anchor_mode: AnchorMode::default(),
            quiet: false,
            write_artifacts: default_write_artifacts(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.prices_csv, &self.settlements_csv] {
            if !path.exists() {
                return Err(ConfigError::MissingInput { path: path.clone() });
            }
        }
        Ok(())
    }
}

const fn default_vroc_period() -> usize {
    15
}

const fn default_vroc_threshold() -> f64 {
    100.0
}

/// Volume rate-of-change scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VrocConfig {
    pub volume_csv: PathBuf,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_vroc_period")]
    pub period: usize,
    /// Percent; a day is flagged when its VROC is strictly above this.
    #[serde(default = "default_vroc_threshold")]
    pub threshold: f64,
}

impl VrocConfig {
    pub fn new(volume_csv: impl Into<PathBuf>) -> Self {
        Self {
            volume_csv: volume_csv.into(),
            output_dir: None,
            period: default_vroc_period(),
            threshold: default_vroc_threshold(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.volume_csv.exists() {
            return Err(ConfigError::MissingInput {
                path: self.volume_csv.clone(),
            });
        }
        if self.period == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "period",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.threshold.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "threshold",
                reason: format!("{} is not a finite percentage", self.threshold),
            });
        }
        Ok(())
    }
}

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_FORMATS: [&str; 3] = [ISO_DATE_FORMAT, "%m/%d/%Y", "%Y/%m/%d"];

fn invalid_date(raw: &str) -> ConfigError {
    ConfigError::InvalidDate {
        raw: raw.to_string(),
    }
}

/// Strict `YYYY-MM-DD`, as accepted on the command line.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT).map_err(|_| invalid_date(raw))
}

/// Parse the calendar dates that show up in exported price files.
///
/// Accepts ISO dates, US `MM/DD/YYYY`, `YYYY/MM/DD`, and full RFC 3339
/// timestamps (the time part is dropped).
pub fn parse_date(raw: &str) -> Result<NaiveDate, ConfigError> {
    let trimmed = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.date_naive());
    }
    // "2024-02-16 00:00:00" style exports.
    if let Some((day, _)) = trimmed.split_once(' ') {
        if let Ok(date) = parse_iso_date(day) {
            return Ok(date);
        }
    }
    Err(invalid_date(raw))
}
