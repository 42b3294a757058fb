use crate::day::DayRecord;
use crate::error::RegulationError;
use chrono::{Duration, NaiveDateTime};
use polars::prelude::*;

/// Recomputes concrete start/end timestamps from each day's new total
/// duration and fixing mode.
///
/// Pinned boundaries stay pinned; an unconstrained day is recentered on its
/// original midpoint, clamped into the window. The end is always derived from
/// the start so the reconstructed duration equals the new total exactly.
pub struct ReconstructionPass<'a> {
    df: &'a DataFrame,
}

impl<'a> ReconstructionPass<'a> {
    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    pub fn execute(&self) -> Result<Vec<(NaiveDateTime, NaiveDateTime)>, RegulationError> {
        let height = self.df.height();

        let date_ca = self.df.column("date")?.date()?;
        let from_ca = self.df.column("from")?.datetime()?;
        let total_ca = self.df.column("total_minutes")?.i64()?;
        let new_total_ca = self.df.column("new_total_minutes")?.i64()?;
        let start_ca = self.df.column("window_start")?.datetime()?;
        let end_ca = self.df.column("window_end")?.datetime()?;
        let lower_ca = self.df.column("fix_lower")?.bool()?;
        let upper_ca = self.df.column("fix_upper")?.bool()?;

        let mut adjusted = Vec::with_capacity(height);

        for idx in 0..height {
            let window_start = start_ca
                .get(idx)
                .map(DayRecord::datetime_from_ms)
                .ok_or_else(|| PolarsError::ComputeError("day row missing window_start".into()))?;
            let window_end = end_ca
                .get(idx)
                .map(DayRecord::datetime_from_ms)
                .ok_or_else(|| PolarsError::ComputeError("day row missing window_end".into()))?;
            let new_total = new_total_ca.get(idx).ok_or_else(|| {
                PolarsError::ComputeError("day row missing new_total_minutes".into())
            })?;
            let fix_lower = lower_ca.get(idx).unwrap_or(false);
            let fix_upper = upper_ca.get(idx).unwrap_or(false);

            let bounds = match (fix_lower, fix_upper) {
                (true, true) => {
                    let window_minutes = (window_end - window_start).num_minutes();
                    if window_minutes != new_total {
                        let date = date_ca
                            .get(idx)
                            .map(DayRecord::date_from_i32)
                            .unwrap_or(window_start.date());
                        return Err(RegulationError::FixedDayConflict {
                            date,
                            window_minutes,
                            total_minutes: new_total,
                        });
                    }
                    (window_start, window_end)
                }
                (true, false) => (window_start, window_start + Duration::minutes(new_total)),
                (false, true) => (window_end - Duration::minutes(new_total), window_end),
                (false, false) => {
                    let from = from_ca
                        .get(idx)
                        .map(DayRecord::datetime_from_ms)
                        .ok_or_else(|| PolarsError::ComputeError("day row missing from".into()))?;
                    let total = total_ca.get(idx).unwrap_or(0);

                    // Feasible range for the session midpoint, then clamp the
                    // recorded midpoint into it.
                    let half = Duration::minutes(new_total / 2);
                    let rest_half = Duration::minutes(new_total - new_total / 2);
                    let lowest = window_start + half;
                    let highest = window_end - rest_half;
                    let old_center = from + Duration::minutes(total / 2);
                    let new_center = old_center.max(lowest).min(highest);

                    let new_from = new_center - half;
                    (new_from, new_from + Duration::minutes(new_total))
                }
            };

            adjusted.push(bounds);
        }

        Ok(adjusted)
    }
}
