use crate::day::DayRecord;
use crate::error::RegulationError;
use polars::prelude::PolarsError;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    DataFrame(PolarsError),
    Io(io::Error),
    Csv(csv::Error),
    InvalidData(String),
    Regulation(RegulationError),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::DataFrame(err) => write!(f, "dataframe conversion error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            PersistenceError::Regulation(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<PolarsError> for PersistenceError {
    fn from(value: PolarsError) -> Self {
        Self::DataFrame(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<RegulationError> for PersistenceError {
    fn from(value: RegulationError) -> Self {
        Self::Regulation(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Collection-level checks for a loaded day table: dates strictly ascending
/// (which also rules out duplicates) and every session non-empty.
pub fn validate_days(days: &[DayRecord]) -> PersistenceResult<()> {
    for (idx, day) in days.iter().enumerate() {
        if day.till <= day.from {
            return Err(PersistenceError::InvalidData(format!(
                "day {} has a session that does not end after it starts",
                day.date
            )));
        }
        if idx > 0 && day.date <= days[idx - 1].date {
            return Err(PersistenceError::InvalidData(format!(
                "day {} is not after the preceding day {}; records must be date-ascending without duplicates",
                day.date,
                days[idx - 1].date
            )));
        }
    }
    Ok(())
}

pub mod file;

pub use file::{
    CsvDefaults, load_timesheet_from_csv, load_timesheet_from_json, save_diagnostics_to_csv,
    save_timesheet_to_csv, save_timesheet_to_json,
};
