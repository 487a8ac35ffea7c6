//! Error taxonomy for the expiration-cycle engine.
//!
//! Every variant is fatal: the engine runs a single pass over static
//! historical data and any inconsistency aborts the run with the date that
//! exposed it.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Settlement lookups must match exactly one record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    #[error("no settlement price recorded for expiration {date}")]
    NotFound { date: NaiveDate },

    #[error("settlement price for expiration {date} is ambiguous: {matches} records share that date")]
    Ambiguous { date: NaiveDate, matches: usize },
}

/// Input data violates an invariant the cycle engine depends on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error(
        "Error in data: could not find Thursday or Friday expiration (day-of-month past 21 on {date} with no candidate this month)"
    )]
    MissingExpiration { date: NaiveDate },

    #[error("Error in data: could not find Monday or Tuesday open before expiration {expiration}")]
    MissingAnchor { expiration: NaiveDate },

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error("Day bars not strictly ascending at index {index}: {previous} followed by {current}")]
    UnsortedBars {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
}

impl IntegrityError {
    /// The date that exposed the fault.
    pub fn date(&self) -> NaiveDate {
        match self {
            IntegrityError::MissingExpiration { date } => *date,
            IntegrityError::MissingAnchor { expiration } => *expiration,
            IntegrityError::Settlement(SettlementError::NotFound { date })
            | IntegrityError::Settlement(SettlementError::Ambiguous { date, .. }) => *date,
            IntegrityError::UnsortedBars { current, .. } => *current,
        }
    }
}

/// Raised before any data is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("input file {path:?} does not exist")]
    MissingInput { path: PathBuf },

    #[error("invalid date '{raw}'. Expected YYYY-MM-DD")]
    InvalidDate { raw: String },

    #[error("invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}
