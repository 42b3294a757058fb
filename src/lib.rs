pub mod calculations;
pub mod day;
pub mod error;
pub mod flags;
pub mod persistence;
pub mod rules;
pub mod timesheet;

pub use day::DayRecord;
pub use error::RegulationError;
pub use flags::DayFlags;
pub use persistence::{
    CsvDefaults, PersistenceError, load_timesheet_from_csv, load_timesheet_from_json,
    save_diagnostics_to_csv, save_timesheet_to_csv, save_timesheet_to_json, validate_days,
};
pub use rules::WorkRules;
pub use timesheet::{RegularizationSummary, Timesheet, format_minutes};
