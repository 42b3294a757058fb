use crate::error::RegulationError;
use polars::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayCapacity {
    pub capacity_minutes: i64,
    pub excess_minutes: i64,
    pub spare_minutes: i64,
}

/// Per-day capacities plus the aggregate balance the feasibility gate checks.
#[derive(Debug, Clone)]
pub struct FeasibilityReport {
    pub days: Vec<DayCapacity>,
    pub required_minutes: i64,
    pub available_minutes: i64,
}

impl FeasibilityReport {
    pub fn is_feasible(&self) -> bool {
        self.available_minutes >= self.required_minutes
    }

    pub fn shortfall_minutes(&self) -> i64 {
        (self.required_minutes - self.available_minutes).max(0)
    }

    pub fn excess_minutes(&self) -> i64 {
        self.days.iter().map(|d| d.excess_minutes).sum()
    }

    pub fn spare_minutes(&self) -> i64 {
        self.days.iter().map(|d| d.spare_minutes).sum()
    }
}

/// Computes each day's legal capacity against its recorded duration and
/// decides whether the total excess can be absorbed at all.
///
/// A fully fixed day's capacity is exactly its window length; for every other
/// mode the window length is additionally capped by the day's duration
/// ceiling.
pub struct FeasibilityPass<'a> {
    df: &'a DataFrame,
}

impl<'a> FeasibilityPass<'a> {
    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    pub fn execute(&self) -> Result<FeasibilityReport, RegulationError> {
        let height = self.df.height();

        let start_ca = self.df.column("window_start")?.datetime()?;
        let end_ca = self.df.column("window_end")?.datetime()?;
        let total_ca = self.df.column("total_minutes")?.i64()?;
        let max_ca = self.df.column("max_minutes")?.i64()?;
        let lower_ca = self.df.column("fix_lower")?.bool()?;
        let upper_ca = self.df.column("fix_upper")?.bool()?;

        let mut days = Vec::with_capacity(height);
        let mut required_minutes = 0;
        let mut available_minutes = 0;

        for idx in 0..height {
            let start_ms = start_ca
                .get(idx)
                .ok_or_else(|| PolarsError::ComputeError("day row missing window_start".into()))?;
            let end_ms = end_ca
                .get(idx)
                .ok_or_else(|| PolarsError::ComputeError("day row missing window_end".into()))?;
            let window_minutes = (end_ms - start_ms) / 60_000;

            let total = total_ca.get(idx).unwrap_or(0);
            let fully_fixed =
                lower_ca.get(idx).unwrap_or(false) && upper_ca.get(idx).unwrap_or(false);
            let capacity = if fully_fixed {
                window_minutes
            } else {
                window_minutes.min(max_ca.get(idx).unwrap_or(0))
            };

            required_minutes += total;
            available_minutes += capacity;
            days.push(DayCapacity {
                capacity_minutes: capacity,
                excess_minutes: (total - capacity).max(0),
                spare_minutes: (capacity - total).max(0),
            });
        }

        Ok(FeasibilityReport {
            days,
            required_minutes,
            available_minutes,
        })
    }
}
