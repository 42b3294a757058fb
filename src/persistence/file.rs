use super::{PersistenceError, PersistenceResult};
use crate::{DayRecord, Timesheet, WorkRules};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct TimesheetSnapshot {
    rules: WorkRules,
    days: Vec<DayRecord>,
}

impl TimesheetSnapshot {
    fn from_timesheet(timesheet: &Timesheet) -> PersistenceResult<Self> {
        let days = timesheet.days()?;
        super::validate_days(&days)?;
        Ok(Self {
            rules: timesheet.rules().clone(),
            days,
        })
    }

    fn into_timesheet(self) -> PersistenceResult<Timesheet> {
        super::validate_days(&self.days)?;
        Ok(Timesheet::from_days(self.days, self.rules)?)
    }
}

pub fn save_timesheet_to_json<P: AsRef<Path>>(
    timesheet: &Timesheet,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = TimesheetSnapshot::from_timesheet(timesheet)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_timesheet_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Timesheet> {
    let file = File::open(path)?;
    let snapshot: TimesheetSnapshot = serde_json::from_reader(file)?;
    snapshot.into_timesheet()
}

/// Fallback month/year for input rows that carry only a day-of-month.
#[derive(Debug, Clone, Copy)]
pub struct CsvDefaults {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
struct DayCsvRecord {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    day: Option<String>,
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    till: Option<String>,
    #[serde(default)]
    flags: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_time(input: &str) -> PersistenceResult<NaiveTime> {
    NaiveTime::parse_from_str(input, "%H:%M")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid time '{input}': {e}")))
}

impl DayCsvRecord {
    fn resolve_date(&self, row: usize, defaults: CsvDefaults) -> PersistenceResult<NaiveDate> {
        if let Some(date) = non_empty(&self.date) {
            return NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{date}': {e}")));
        }

        let day = non_empty(&self.day)
            .ok_or_else(|| {
                PersistenceError::InvalidData(format!("row {row} carries neither a date nor a day"))
            })?
            .parse::<u32>()
            .map_err(|e| PersistenceError::InvalidData(format!("invalid day in row {row}: {e}")))?;
        let month = match non_empty(&self.month) {
            Some(month) => month.parse::<u32>().map_err(|e| {
                PersistenceError::InvalidData(format!("invalid month in row {row}: {e}"))
            })?,
            None => defaults.month,
        };
        let year = match non_empty(&self.year) {
            Some(year) => year.parse::<i32>().map_err(|e| {
                PersistenceError::InvalidData(format!("invalid year in row {row}: {e}"))
            })?,
            None => defaults.year,
        };

        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            PersistenceError::InvalidData(format!(
                "row {row} does not name a valid date: {year:04}-{month:02}-{day:02}"
            ))
        })
    }

    fn into_day_record(self, row: usize, defaults: CsvDefaults, rules: &WorkRules) -> PersistenceResult<DayRecord> {
        let date = self.resolve_date(row, defaults)?;
        // Empty time cells default to midnight, empty flag cells to no flags.
        let from = parse_time(non_empty(&self.from).unwrap_or("00:00"))?;
        let till = parse_time(non_empty(&self.till).unwrap_or("00:00"))?;
        let flags = non_empty(&self.flags).unwrap_or("");
        Ok(DayRecord::new(date, from, till, flags, rules)?)
    }
}

/// Load raw day rows from a CSV file.
///
/// The header must carry `from`, `till`, `flags`, and either `date` or `day`;
/// `month`/`year` columns are optional and fall back to `defaults` per cell.
pub fn load_timesheet_from_csv<P: AsRef<Path>>(
    path: P,
    defaults: CsvDefaults,
    rules: WorkRules,
) -> PersistenceResult<Timesheet> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    for required in ["from", "till", "flags"] {
        if !headers.iter().any(|h| h == required) {
            return Err(PersistenceError::InvalidData(format!(
                "could not find column `{required}`"
            )));
        }
    }
    if !headers.iter().any(|h| h == "date" || h == "day") {
        return Err(PersistenceError::InvalidData(
            "could not find column `date` or `day`".into(),
        ));
    }

    let mut timesheet = Timesheet::new_with_rules(rules.clone());
    for (row, record) in reader.deserialize::<DayCsvRecord>().enumerate() {
        let record = record?;
        let day = record.into_day_record(row + 1, defaults, &rules)?;
        timesheet.push_day(day)?;
    }

    if timesheet.day_count() == 0 {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no day records".into(),
        ));
    }

    Ok(timesheet)
}

#[derive(Serialize)]
struct AdjustedCsvRecord {
    weekday: String,
    day: u32,
    month: u32,
    year: i32,
    from: String,
    till: String,
    flags: String,
}

/// Write the adjusted schedule: one row per day with the reconstructed times
/// formatted `HH:MM`. Requires a prior `regularize` run.
pub fn save_timesheet_to_csv<P: AsRef<Path>>(
    timesheet: &Timesheet,
    path: P,
) -> PersistenceResult<()> {
    let days = timesheet.days()?;
    super::validate_days(&days)?;

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for day in &days {
        let (new_from, new_till) = match (day.new_from, day.new_till) {
            (Some(from), Some(till)) => (from, till),
            _ => {
                return Err(PersistenceError::InvalidData(format!(
                    "day {} has no adjusted times; run regularize before exporting",
                    day.date
                )));
            }
        };
        writer.serialize(AdjustedCsvRecord {
            weekday: day.weekday_abbr(),
            day: day.date.day(),
            month: day.date.month(),
            year: day.date.year(),
            from: format_clock(new_from),
            till: format_clock(new_till),
            flags: day.flags.to_flag_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct DiagnosticCsvRecord {
    date: String,
    weekday: String,
    from: String,
    till: String,
    flags: String,
    business_trip: bool,
    fix_lower: bool,
    fix_upper: bool,
    max_minutes: i64,
    total_minutes: i64,
    break_minutes: String,
    window_start: String,
    window_end: String,
    capacity_minutes: String,
    excess_minutes: i64,
    spare_minutes: i64,
    adjustment_minutes: i64,
    new_from: String,
    new_till: String,
    new_total_minutes: String,
    new_break_minutes: String,
    compliant: String,
    new_compliant: String,
}

/// Write the full table with every derived column, for inspection.
pub fn save_diagnostics_to_csv<P: AsRef<Path>>(
    timesheet: &Timesheet,
    path: P,
) -> PersistenceResult<()> {
    let days = timesheet.days()?;

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for day in &days {
        writer.serialize(DiagnosticCsvRecord {
            date: day.date.format("%Y-%m-%d").to_string(),
            weekday: day.weekday_abbr(),
            from: format_timestamp(day.from),
            till: format_timestamp(day.till),
            flags: day.flags.to_flag_string(),
            business_trip: day.flags.business_trip,
            fix_lower: day.flags.fix_lower,
            fix_upper: day.flags.fix_upper,
            max_minutes: day.max_minutes,
            total_minutes: day.total_minutes,
            break_minutes: format_option_i64(day.break_minutes),
            window_start: format_option_timestamp(day.window_start),
            window_end: format_option_timestamp(day.window_end),
            capacity_minutes: format_option_i64(day.capacity_minutes),
            excess_minutes: day.excess_minutes,
            spare_minutes: day.spare_minutes,
            adjustment_minutes: day.adjustment_minutes,
            new_from: format_option_timestamp(day.new_from),
            new_till: format_option_timestamp(day.new_till),
            new_total_minutes: format_option_i64(day.new_total_minutes),
            new_break_minutes: format_option_i64(day.new_break_minutes),
            compliant: format_option_bool(day.compliant),
            new_compliant: format_option_bool(day.new_compliant),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn format_clock(value: NaiveDateTime) -> String {
    value.format("%H:%M").to_string()
}

fn format_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

fn format_option_timestamp(value: Option<NaiveDateTime>) -> String {
    value.map(format_timestamp).unwrap_or_default()
}

fn format_option_i64(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_option_bool(value: Option<bool>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
