use crate::day::DayRecord;
use crate::error::RegulationError;
use crate::rules::WorkRules;
use chrono::{Duration, NaiveDateTime};
use polars::prelude::*;

/// Permitted [earliest start, latest end] range for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DayWindow {
    pub fn length_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Derives each day's allowed window from its fixing mode, the regulatory
/// time-of-day bounds, and the neighboring days' recorded times.
///
/// Reads only raw columns; neighbor references use the immutable recorded
/// times, never adjusted values.
pub struct WindowPass<'a> {
    df: &'a DataFrame,
    rules: &'a WorkRules,
}

impl<'a> WindowPass<'a> {
    pub fn new(df: &'a DataFrame, rules: &'a WorkRules) -> Self {
        Self { df, rules }
    }

    pub fn execute(&self) -> Result<Vec<DayWindow>, RegulationError> {
        let height = self.df.height();

        let from_ca = self.df.column("from")?.datetime()?;
        let till_ca = self.df.column("till")?.datetime()?;
        let lower_ca = self.df.column("fix_lower")?.bool()?;
        let upper_ca = self.df.column("fix_upper")?.bool()?;
        let max_ca = self.df.column("max_minutes")?.i64()?;
        let date_ca = self.df.column("date")?.date()?;

        let mut froms: Vec<NaiveDateTime> = Vec::with_capacity(height);
        let mut tills: Vec<NaiveDateTime> = Vec::with_capacity(height);
        for idx in 0..height {
            let from = from_ca
                .get(idx)
                .map(DayRecord::datetime_from_ms)
                .ok_or_else(|| PolarsError::ComputeError("day row missing from".into()))?;
            let till = till_ca
                .get(idx)
                .map(DayRecord::datetime_from_ms)
                .ok_or_else(|| PolarsError::ComputeError("day row missing till".into()))?;
            froms.push(from);
            tills.push(till);
        }

        let rest = Duration::minutes(self.rules.min_rest_minutes);
        let mut windows = Vec::with_capacity(height);

        for idx in 0..height {
            let from = froms[idx];
            let till = tills[idx];
            let fix_lower = lower_ca.get(idx).unwrap_or(false);
            let fix_upper = upper_ca.get(idx).unwrap_or(false);
            let max = Duration::minutes(max_ca.get(idx).unwrap_or(0));

            let window = match (fix_lower, fix_upper) {
                (true, false) => DayWindow {
                    start: from,
                    end: from + max,
                },
                (false, true) => DayWindow {
                    start: till - max,
                    end: till,
                },
                (true, true) => DayWindow {
                    start: from,
                    end: till,
                },
                (false, false) => {
                    let mut start = from.date().and_time(self.rules.earliest_start);
                    if idx > 0 {
                        start = start.max(tills[idx - 1] + rest);
                    }
                    let mut end = till.date().and_time(self.rules.latest_end);
                    if idx + 1 < height {
                        end = end.min(froms[idx + 1] - rest);
                    }
                    DayWindow { start, end }
                }
            };

            if window.end < window.start {
                let date = date_ca
                    .get(idx)
                    .map(DayRecord::date_from_i32)
                    .unwrap_or(from.date());
                return Err(RegulationError::Validation(format!(
                    "day {date} has a negative window: earliest start {} is after latest end {}",
                    window.start.format("%Y-%m-%d %H:%M"),
                    window.end.format("%Y-%m-%d %H:%M")
                )));
            }

            windows.push(window);
        }

        Ok(windows)
    }
}
