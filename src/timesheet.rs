use crate::calculations::compliance::{self, CompliancePass, ComplianceOutcome};
use crate::calculations::feasibility::{FeasibilityPass, FeasibilityReport};
use crate::calculations::reconstruction::ReconstructionPass;
use crate::calculations::redistribution::{RedistributionOutcome, RedistributionPass};
use crate::calculations::window::{DayWindow, WindowPass};
use crate::day::DayRecord;
use crate::error::RegulationError;
use crate::rules::WorkRules;
use chrono::NaiveDateTime;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Render whole minutes as `H:MM` (hours are not capped at 24, so grand
/// totals stay readable).
pub fn format_minutes(minutes: i64) -> String {
    if minutes < 0 {
        format!("-{}:{:02}", -minutes / 60, (-minutes) % 60)
    } else {
        format!("{}:{:02}", minutes / 60, minutes % 60)
    }
}

/// Diagnostic totals of one regularization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegularizationSummary {
    pub day_count: usize,
    pub required_minutes: i64,
    pub available_minutes: i64,
    pub excess_minutes: i64,
    pub spare_minutes: i64,
    pub moved_minutes: i64,
    pub adjusted_days: usize,
    pub old_total_minutes: i64,
    pub new_total_minutes: i64,
    pub compliant_before: usize,
    pub compliant_after: usize,
}

impl RegularizationSummary {
    fn empty() -> Self {
        Self {
            day_count: 0,
            required_minutes: 0,
            available_minutes: 0,
            excess_minutes: 0,
            spare_minutes: 0,
            moved_minutes: 0,
            adjusted_days: 0,
            old_total_minutes: 0,
            new_total_minutes: 0,
            compliant_before: 0,
            compliant_after: 0,
        }
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("days={}", self.day_count));
        parts.push(format!(
            "required={}",
            format_minutes(self.required_minutes)
        ));
        parts.push(format!(
            "available={}",
            format_minutes(self.available_minutes)
        ));
        if self.moved_minutes > 0 {
            parts.push(format!("moved={}", format_minutes(self.moved_minutes)));
            parts.push(format!("adjusted_days={}", self.adjusted_days));
        }
        parts.push(format!("total={}", format_minutes(self.new_total_minutes)));
        parts.push(format!(
            "compliant={}->{}",
            self.compliant_before, self.compliant_after
        ));
        parts.join(", ")
    }
}

/// An ordered table of day records plus the regulatory limits that apply to
/// it. The table is the single owner of all records; every pass reads and
/// writes its columns in place.
#[derive(Debug)]
pub struct Timesheet {
    df: DataFrame,
    rules: WorkRules,
}

impl Default for Timesheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Timesheet {
    pub fn new() -> Self {
        Self::new_with_rules(WorkRules::default())
    }

    pub fn new_with_rules(rules: WorkRules) -> Self {
        let schema = Self::default_schema();
        Self {
            df: DataFrame::empty_with_schema(&schema),
            rules,
        }
    }

    pub fn from_days(
        days: Vec<DayRecord>,
        rules: WorkRules,
    ) -> Result<Self, RegulationError> {
        let mut timesheet = Self::new_with_rules(rules);
        for day in days {
            timesheet.push_day(day)?;
        }
        Ok(timesheet)
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn rules(&self) -> &WorkRules {
        &self.rules
    }

    pub fn day_count(&self) -> usize {
        self.df.height()
    }

    pub fn days(&self) -> Result<Vec<DayRecord>, RegulationError> {
        let mut days = Vec::with_capacity(self.df.height());
        for idx in 0..self.df.height() {
            days.push(DayRecord::from_dataframe_row(&self.df, idx)?);
        }
        Ok(days)
    }

    /// Append a day. Records must arrive in strictly ascending date order;
    /// neighbor lookups and break computation depend on it.
    pub fn push_day(&mut self, day: DayRecord) -> Result<(), RegulationError> {
        let height = self.df.height();
        if height > 0 {
            let last = self
                .df
                .column("date")?
                .date()?
                .get(height - 1)
                .map(DayRecord::date_from_i32)
                .ok_or_else(|| PolarsError::ComputeError("day row missing date".into()))?;
            if day.date <= last {
                return Err(RegulationError::Validation(format!(
                    "day {} is not after the preceding day {last}; records must be date-ascending without duplicates",
                    day.date
                )));
            }
        }
        let new_row = day.to_dataframe_row()?;
        self.df = self.df.vstack(&new_row)?;
        Ok(())
    }

    fn default_schema() -> Schema {
        let datetime = DataType::Datetime(TimeUnit::Milliseconds, None);
        Schema::from_iter(vec![
            Field::new("date".into(), DataType::Date),
            Field::new("weekday".into(), DataType::String),
            Field::new("from".into(), datetime.clone()),
            Field::new("till".into(), datetime.clone()),
            Field::new("flags".into(), DataType::String),
            Field::new("business_trip".into(), DataType::Boolean),
            Field::new("fix_lower".into(), DataType::Boolean),
            Field::new("fix_upper".into(), DataType::Boolean),
            Field::new("max_minutes".into(), DataType::Int64),
            Field::new("total_minutes".into(), DataType::Int64),
            Field::new("break_minutes".into(), DataType::Int64),
            Field::new("window_start".into(), datetime.clone()),
            Field::new("window_end".into(), datetime.clone()),
            Field::new("capacity_minutes".into(), DataType::Int64),
            Field::new("excess_minutes".into(), DataType::Int64),
            Field::new("spare_minutes".into(), DataType::Int64),
            Field::new("adjustment_minutes".into(), DataType::Int64),
            Field::new("new_from".into(), datetime.clone()),
            Field::new("new_till".into(), datetime),
            Field::new("new_total_minutes".into(), DataType::Int64),
            Field::new("new_break_minutes".into(), DataType::Int64),
            Field::new("compliant".into(), DataType::Boolean),
            Field::new("new_compliant".into(), DataType::Boolean),
        ])
    }

    /// Run the full regularization pipeline: totals, windows, feasibility,
    /// redistribution, reconstruction, compliance.
    ///
    /// The passes operate on a working copy of the table that is swapped in
    /// only when every pass succeeds, so a failed run leaves the timesheet
    /// untouched.
    pub fn regularize(&mut self) -> Result<RegularizationSummary, RegulationError> {
        if self.df.height() == 0 {
            return Ok(RegularizationSummary::empty());
        }

        let mut df = self.df.clone();

        Self::derive_totals(&mut df)?;
        let compliant_before = Self::mark_raw_compliance(&mut df, &self.rules)?;

        let windows = WindowPass::new(&df, &self.rules).execute()?;
        Self::persist_windows(&mut df, &windows)?;

        let report = FeasibilityPass::new(&df).execute()?;
        Self::persist_capacities(&mut df, &report)?;
        log::info!(
            "flexi-time available: {}, required: {}",
            format_minutes(report.spare_minutes()),
            format_minutes(report.excess_minutes())
        );
        if !report.is_feasible() {
            return Err(RegulationError::Infeasible {
                required_minutes: report.required_minutes,
                available_minutes: report.available_minutes,
            });
        }

        let outcome = RedistributionPass::new(&df).execute()?;
        Self::persist_redistribution(&mut df, &outcome)?;

        let adjusted = ReconstructionPass::new(&df).execute()?;
        Self::persist_adjusted_times(&mut df, &adjusted)?;

        let compliance = CompliancePass::new(&df, &self.rules).execute()?;
        Self::persist_compliance(&mut df, &compliance)?;

        let summary = RegularizationSummary {
            day_count: df.height(),
            required_minutes: report.required_minutes,
            available_minutes: report.available_minutes,
            excess_minutes: report.excess_minutes(),
            spare_minutes: report.spare_minutes(),
            moved_minutes: outcome.moved_minutes,
            adjusted_days: outcome
                .adjustment_minutes
                .iter()
                .filter(|a| **a > 0)
                .count(),
            old_total_minutes: report.required_minutes,
            new_total_minutes: compliance.new_total_minutes.iter().sum(),
            compliant_before,
            compliant_after: compliance.compliant.iter().filter(|c| **c).count(),
        };

        self.df = df;
        Ok(summary)
    }

    fn derive_totals(df: &mut DataFrame) -> Result<(), RegulationError> {
        let height = df.height();
        let from_ca = df.column("from")?.datetime()?;
        let till_ca = df.column("till")?.datetime()?;

        let mut froms = Vec::with_capacity(height);
        let mut tills = Vec::with_capacity(height);
        for idx in 0..height {
            let from = from_ca
                .get(idx)
                .ok_or_else(|| PolarsError::ComputeError("day row missing from".into()))?;
            let till = till_ca
                .get(idx)
                .ok_or_else(|| PolarsError::ComputeError("day row missing till".into()))?;
            froms.push(from);
            tills.push(till);
        }

        let mut totals = Vec::with_capacity(height);
        let mut breaks: Vec<Option<i64>> = Vec::with_capacity(height);
        for idx in 0..height {
            totals.push((tills[idx] - froms[idx]) / 60_000);
            breaks.push(if idx > 0 {
                Some((froms[idx] - tills[idx - 1]) / 60_000)
            } else {
                None
            });
        }

        let total_series = Series::new(PlSmallStr::from_static("total_minutes"), totals);
        df.replace("total_minutes", total_series)?;
        let break_series = Series::new(PlSmallStr::from_static("break_minutes"), breaks);
        df.replace("break_minutes", break_series)?;
        Ok(())
    }

    fn mark_raw_compliance(
        df: &mut DataFrame,
        rules: &WorkRules,
    ) -> Result<usize, RegulationError> {
        let height = df.height();
        let total_ca = df.column("total_minutes")?.i64()?;
        let break_ca = df.column("break_minutes")?.i64()?;
        let max_ca = df.column("max_minutes")?.i64()?;
        let lower_ca = df.column("fix_lower")?.bool()?;
        let upper_ca = df.column("fix_upper")?.bool()?;

        let mut values = Vec::with_capacity(height);
        for idx in 0..height {
            let fully_fixed =
                lower_ca.get(idx).unwrap_or(false) && upper_ca.get(idx).unwrap_or(false);
            values.push(compliance::day_is_compliant(
                total_ca.get(idx).unwrap_or(0),
                break_ca.get(idx),
                max_ca.get(idx).unwrap_or(0),
                fully_fixed,
                rules,
            ));
        }
        let count = values.iter().filter(|c| **c).count();

        let series = Series::new(PlSmallStr::from_static("compliant"), values);
        df.replace("compliant", series)?;
        Ok(count)
    }

    fn persist_windows(df: &mut DataFrame, windows: &[DayWindow]) -> Result<(), RegulationError> {
        let starts: Vec<Option<i64>> = windows
            .iter()
            .map(|w| Some(DayRecord::datetime_to_ms(w.start)))
            .collect();
        let ends: Vec<Option<i64>> = windows
            .iter()
            .map(|w| Some(DayRecord::datetime_to_ms(w.end)))
            .collect();
        Self::replace_datetime_column(df, "window_start", starts)?;
        Self::replace_datetime_column(df, "window_end", ends)?;
        Ok(())
    }

    fn persist_capacities(
        df: &mut DataFrame,
        report: &FeasibilityReport,
    ) -> Result<(), RegulationError> {
        let capacity: Vec<i64> = report.days.iter().map(|d| d.capacity_minutes).collect();
        let excess: Vec<i64> = report.days.iter().map(|d| d.excess_minutes).collect();
        let spare: Vec<i64> = report.days.iter().map(|d| d.spare_minutes).collect();

        df.replace(
            "capacity_minutes",
            Series::new(PlSmallStr::from_static("capacity_minutes"), capacity),
        )?;
        df.replace(
            "excess_minutes",
            Series::new(PlSmallStr::from_static("excess_minutes"), excess),
        )?;
        df.replace(
            "spare_minutes",
            Series::new(PlSmallStr::from_static("spare_minutes"), spare),
        )?;
        Ok(())
    }

    fn persist_redistribution(
        df: &mut DataFrame,
        outcome: &RedistributionOutcome,
    ) -> Result<(), RegulationError> {
        df.replace(
            "adjustment_minutes",
            Series::new(
                PlSmallStr::from_static("adjustment_minutes"),
                outcome.adjustment_minutes.clone(),
            ),
        )?;
        df.replace(
            "new_total_minutes",
            Series::new(
                PlSmallStr::from_static("new_total_minutes"),
                outcome.new_total_minutes.clone(),
            ),
        )?;
        Ok(())
    }

    fn persist_adjusted_times(
        df: &mut DataFrame,
        adjusted: &[(NaiveDateTime, NaiveDateTime)],
    ) -> Result<(), RegulationError> {
        let froms: Vec<Option<i64>> = adjusted
            .iter()
            .map(|(from, _)| Some(DayRecord::datetime_to_ms(*from)))
            .collect();
        let tills: Vec<Option<i64>> = adjusted
            .iter()
            .map(|(_, till)| Some(DayRecord::datetime_to_ms(*till)))
            .collect();
        Self::replace_datetime_column(df, "new_from", froms)?;
        Self::replace_datetime_column(df, "new_till", tills)?;
        Ok(())
    }

    fn persist_compliance(
        df: &mut DataFrame,
        outcome: &ComplianceOutcome,
    ) -> Result<(), RegulationError> {
        df.replace(
            "new_total_minutes",
            Series::new(
                PlSmallStr::from_static("new_total_minutes"),
                outcome.new_total_minutes.clone(),
            ),
        )?;
        df.replace(
            "new_break_minutes",
            Series::new(
                PlSmallStr::from_static("new_break_minutes"),
                outcome.new_break_minutes.clone(),
            ),
        )?;
        df.replace(
            "new_compliant",
            Series::new(
                PlSmallStr::from_static("new_compliant"),
                outcome.compliant.clone(),
            ),
        )?;
        Ok(())
    }

    fn replace_datetime_column(
        df: &mut DataFrame,
        name: &str,
        values_ms: Vec<Option<i64>>,
    ) -> Result<(), RegulationError> {
        let series = Series::new(name.into(), values_ms)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        df.replace(name, series)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn day(date: (i32, u32, u32), from: (u32, u32), till: (u32, u32), flags: &str) -> DayRecord {
        DayRecord::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            NaiveTime::from_hms_opt(from.0, from.1, 0).unwrap(),
            NaiveTime::from_hms_opt(till.0, till.1, 0).unwrap(),
            flags,
            &WorkRules::default(),
        )
        .unwrap()
    }

    #[test]
    fn default_schema_contains_expected_columns() {
        let schema = Timesheet::default_schema();
        let expected = vec![
            "date",
            "weekday",
            "from",
            "till",
            "flags",
            "business_trip",
            "fix_lower",
            "fix_upper",
            "max_minutes",
            "total_minutes",
            "break_minutes",
            "window_start",
            "window_end",
            "capacity_minutes",
            "excess_minutes",
            "spare_minutes",
            "adjustment_minutes",
            "new_from",
            "new_till",
            "new_total_minutes",
            "new_break_minutes",
            "compliant",
            "new_compliant",
        ];
        for name in expected {
            assert!(schema.contains(name.into()), "missing column {name}");
        }
    }

    #[test]
    fn push_day_rejects_out_of_order_dates() {
        let mut timesheet = Timesheet::new();
        timesheet.push_day(day((2025, 2, 4), (8, 0), (17, 0), "")).unwrap();
        let err = timesheet
            .push_day(day((2025, 2, 3), (8, 0), (17, 0), ""))
            .unwrap_err();
        assert!(matches!(err, RegulationError::Validation(_)));
    }

    #[test]
    fn push_day_rejects_duplicate_dates() {
        let mut timesheet = Timesheet::new();
        timesheet.push_day(day((2025, 2, 4), (8, 0), (17, 0), "")).unwrap();
        let err = timesheet
            .push_day(day((2025, 2, 4), (9, 0), (18, 0), ""))
            .unwrap_err();
        assert!(matches!(err, RegulationError::Validation(_)));
    }

    #[test]
    fn format_minutes_renders_hours_and_minutes() {
        assert_eq!(format_minutes(0), "0:00");
        assert_eq!(format_minutes(90), "1:30");
        assert_eq!(format_minutes(600), "10:00");
        assert_eq!(format_minutes(-75), "-1:15");
    }

    #[test]
    fn regularize_on_empty_timesheet_is_a_no_op() {
        let mut timesheet = Timesheet::new();
        let summary = timesheet.regularize().unwrap();
        assert_eq!(summary.day_count, 0);
        assert_eq!(summary.moved_minutes, 0);
    }
}
