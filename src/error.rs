use chrono::NaiveDate;
use polars::prelude::PolarsError;
use std::fmt;

/// Errors surfaced by the regularization engine.
///
/// `Validation` and `Infeasible` are user-input problems. The remaining
/// variants signal internal-consistency failures: for any input that passed
/// the feasibility check they must never occur, and they indicate a bug in
/// the redistribution or reconstruction policy rather than bad data.
#[derive(Debug)]
pub enum RegulationError {
    Validation(String),
    Infeasible {
        required_minutes: i64,
        available_minutes: i64,
    },
    NoProgress {
        remaining_minutes: i64,
    },
    FixedDayConflict {
        date: NaiveDate,
        window_minutes: i64,
        total_minutes: i64,
    },
    ResidualNonCompliance {
        date: NaiveDate,
        total_minutes: i64,
        break_minutes: Option<i64>,
    },
    TotalMismatch {
        old_minutes: i64,
        new_minutes: i64,
    },
    DataFrame(PolarsError),
}

impl RegulationError {
    /// Minutes by which the required duration exceeds the legally available
    /// capacity. Zero for every variant except `Infeasible`.
    pub fn shortfall_minutes(&self) -> i64 {
        match self {
            RegulationError::Infeasible {
                required_minutes,
                available_minutes,
            } => (required_minutes - available_minutes).max(0),
            _ => 0,
        }
    }
}

impl fmt::Display for RegulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegulationError::Validation(message) => write!(f, "invalid input: {message}"),
            RegulationError::Infeasible {
                required_minutes,
                available_minutes,
            } => write!(
                f,
                "schedule is infeasible: required {required_minutes} minutes exceed available {available_minutes} minutes (shortfall {})",
                required_minutes - available_minutes
            ),
            RegulationError::NoProgress { remaining_minutes } => write!(
                f,
                "redistribution stalled with {remaining_minutes} excess minutes unplaced despite a positive feasibility check"
            ),
            RegulationError::FixedDayConflict {
                date,
                window_minutes,
                total_minutes,
            } => write!(
                f,
                "fully fixed day {date} has a {window_minutes} minute window but was assigned {total_minutes} minutes"
            ),
            RegulationError::ResidualNonCompliance {
                date,
                total_minutes,
                break_minutes,
            } => match break_minutes {
                Some(brk) => write!(
                    f,
                    "day {date} still violates the regulations after adjustment (total {total_minutes} minutes, break {brk} minutes)"
                ),
                None => write!(
                    f,
                    "day {date} still violates the regulations after adjustment (total {total_minutes} minutes)"
                ),
            },
            RegulationError::TotalMismatch {
                old_minutes,
                new_minutes,
            } => write!(
                f,
                "adjusted schedule totals {new_minutes} minutes but the recorded schedule totals {old_minutes} minutes"
            ),
            RegulationError::DataFrame(err) => write!(f, "dataframe error: {err}"),
        }
    }
}

impl std::error::Error for RegulationError {}

impl From<PolarsError> for RegulationError {
    fn from(value: PolarsError) -> Self {
        Self::DataFrame(value)
    }
}
