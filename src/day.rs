use crate::error::RegulationError;
use crate::flags::DayFlags;
use crate::rules::WorkRules;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One day of a timesheet: the recorded session plus every column derived by
/// the regularization passes.
///
/// `from`/`till` are absolute timestamps; a session whose raw end precedes
/// its raw start crosses midnight and ends on the following calendar day.
/// All durations are whole minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub from: NaiveDateTime,
    pub till: NaiveDateTime,
    pub flags: DayFlags,
    pub max_minutes: i64,
    pub total_minutes: i64,
    pub break_minutes: Option<i64>,
    pub window_start: Option<NaiveDateTime>,
    pub window_end: Option<NaiveDateTime>,
    pub capacity_minutes: Option<i64>,
    pub excess_minutes: i64,
    pub spare_minutes: i64,
    pub adjustment_minutes: i64,
    pub new_from: Option<NaiveDateTime>,
    pub new_till: Option<NaiveDateTime>,
    pub new_total_minutes: Option<i64>,
    pub new_break_minutes: Option<i64>,
    pub compliant: Option<bool>,
    pub new_compliant: Option<bool>,
}

impl DayRecord {
    /// Build a record from raw input fields.
    ///
    /// Applies the midnight rollover, parses the flag string, and selects the
    /// duration ceiling. Unknown flag tokens are logged and kept for
    /// diagnostics. A zero-length session is rejected.
    pub fn new(
        date: NaiveDate,
        raw_from: NaiveTime,
        raw_till: NaiveTime,
        flags_input: &str,
        rules: &WorkRules,
    ) -> Result<Self, RegulationError> {
        if raw_from == raw_till {
            return Err(RegulationError::Validation(format!(
                "zero-length session on {date}: from and till are both {}",
                raw_from.format("%H:%M")
            )));
        }

        let from = date.and_time(raw_from);
        let mut till = date.and_time(raw_till);
        if till < from {
            till = till + Duration::days(1);
        }

        let flags = DayFlags::parse(flags_input);
        if !flags.unknown.is_empty() {
            log::warn!("unknown flags on {date}: {}", flags.unknown.join(", "));
        }
        let max_minutes = rules.max_minutes_for(flags.business_trip);
        let total_minutes = (till - from).num_minutes();

        Ok(Self {
            date,
            from,
            till,
            flags,
            max_minutes,
            total_minutes,
            break_minutes: None,
            window_start: None,
            window_end: None,
            capacity_minutes: None,
            excess_minutes: 0,
            spare_minutes: 0,
            adjustment_minutes: 0,
            new_from: None,
            new_till: None,
            new_total_minutes: None,
            new_break_minutes: None,
            compliant: None,
            new_compliant: None,
        })
    }

    /// Three-letter weekday label ("Mon".."Sun").
    pub fn weekday_abbr(&self) -> String {
        self.from.weekday().to_string()
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.from.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn to_dataframe_row(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(23);

        columns.push(Self::series_from_date("date", self.date)?.into_column());

        let weekday_label = self.weekday_abbr();
        let weekday: [&str; 1] = [weekday_label.as_str()];
        columns.push(Series::new(PlSmallStr::from_static("weekday"), weekday).into_column());

        columns.push(Self::series_from_datetime("from", Some(self.from))?.into_column());
        columns.push(Self::series_from_datetime("till", Some(self.till))?.into_column());

        let flag_string = self.flags.to_flag_string();
        let flags: [&str; 1] = [flag_string.as_str()];
        columns.push(Series::new(PlSmallStr::from_static("flags"), flags).into_column());

        let trip: [bool; 1] = [self.flags.business_trip];
        columns.push(Series::new(PlSmallStr::from_static("business_trip"), trip).into_column());
        let lower: [bool; 1] = [self.flags.fix_lower];
        columns.push(Series::new(PlSmallStr::from_static("fix_lower"), lower).into_column());
        let upper: [bool; 1] = [self.flags.fix_upper];
        columns.push(Series::new(PlSmallStr::from_static("fix_upper"), upper).into_column());

        let max_minutes: [i64; 1] = [self.max_minutes];
        columns.push(Series::new(PlSmallStr::from_static("max_minutes"), max_minutes).into_column());
        let total: [i64; 1] = [self.total_minutes];
        columns.push(Series::new(PlSmallStr::from_static("total_minutes"), total).into_column());

        let break_minutes: [Option<i64>; 1] = [self.break_minutes];
        columns.push(
            Series::new(PlSmallStr::from_static("break_minutes"), break_minutes).into_column(),
        );

        columns.push(Self::series_from_datetime("window_start", self.window_start)?.into_column());
        columns.push(Self::series_from_datetime("window_end", self.window_end)?.into_column());

        let capacity: [Option<i64>; 1] = [self.capacity_minutes];
        columns.push(
            Series::new(PlSmallStr::from_static("capacity_minutes"), capacity).into_column(),
        );
        let excess: [i64; 1] = [self.excess_minutes];
        columns.push(Series::new(PlSmallStr::from_static("excess_minutes"), excess).into_column());
        let spare: [i64; 1] = [self.spare_minutes];
        columns.push(Series::new(PlSmallStr::from_static("spare_minutes"), spare).into_column());
        let adjustment: [i64; 1] = [self.adjustment_minutes];
        columns.push(
            Series::new(PlSmallStr::from_static("adjustment_minutes"), adjustment).into_column(),
        );

        columns.push(Self::series_from_datetime("new_from", self.new_from)?.into_column());
        columns.push(Self::series_from_datetime("new_till", self.new_till)?.into_column());

        let new_total: [Option<i64>; 1] = [self.new_total_minutes];
        columns.push(
            Series::new(PlSmallStr::from_static("new_total_minutes"), new_total).into_column(),
        );
        let new_break: [Option<i64>; 1] = [self.new_break_minutes];
        columns.push(
            Series::new(PlSmallStr::from_static("new_break_minutes"), new_break).into_column(),
        );

        let compliant: [Option<bool>; 1] = [self.compliant];
        columns.push(Series::new(PlSmallStr::from_static("compliant"), compliant).into_column());
        let new_compliant: [Option<bool>; 1] = [self.new_compliant];
        columns.push(
            Series::new(PlSmallStr::from_static("new_compliant"), new_compliant).into_column(),
        );

        DataFrame::new(columns)
    }

    pub fn from_dataframe_row(df: &DataFrame, row_idx: usize) -> PolarsResult<Self> {
        let date = df
            .column("date")?
            .date()?
            .get(row_idx)
            .map(Self::date_from_i32)
            .ok_or_else(|| PolarsError::ComputeError("day row missing date".into()))?;

        let from = Self::datetime_from_series(df.column("from")?.datetime()?, row_idx)
            .ok_or_else(|| PolarsError::ComputeError("day row missing from".into()))?;
        let till = Self::datetime_from_series(df.column("till")?.datetime()?, row_idx)
            .ok_or_else(|| PolarsError::ComputeError("day row missing till".into()))?;

        let flags_source = df
            .column("flags")?
            .str()?
            .get(row_idx)
            .unwrap_or("")
            .to_string();

        Ok(Self {
            date,
            from,
            till,
            flags: DayFlags::parse(&flags_source),
            max_minutes: df.column("max_minutes")?.i64()?.get(row_idx).unwrap_or(0),
            total_minutes: df.column("total_minutes")?.i64()?.get(row_idx).unwrap_or(0),
            break_minutes: df.column("break_minutes")?.i64()?.get(row_idx),
            window_start: Self::datetime_from_series(
                df.column("window_start")?.datetime()?,
                row_idx,
            ),
            window_end: Self::datetime_from_series(df.column("window_end")?.datetime()?, row_idx),
            capacity_minutes: df.column("capacity_minutes")?.i64()?.get(row_idx),
            excess_minutes: df.column("excess_minutes")?.i64()?.get(row_idx).unwrap_or(0),
            spare_minutes: df.column("spare_minutes")?.i64()?.get(row_idx).unwrap_or(0),
            adjustment_minutes: df
                .column("adjustment_minutes")?
                .i64()?
                .get(row_idx)
                .unwrap_or(0),
            new_from: Self::datetime_from_series(df.column("new_from")?.datetime()?, row_idx),
            new_till: Self::datetime_from_series(df.column("new_till")?.datetime()?, row_idx),
            new_total_minutes: df.column("new_total_minutes")?.i64()?.get(row_idx),
            new_break_minutes: df.column("new_break_minutes")?.i64()?.get(row_idx),
            compliant: df.column("compliant")?.bool()?.get(row_idx),
            new_compliant: df.column("new_compliant")?.bool()?.get(row_idx),
        })
    }

    fn series_from_date(name: &str, date: NaiveDate) -> PolarsResult<Series> {
        let data: [Option<i32>; 1] = [Some(Self::date_to_i32(date))];
        Series::new(name.into(), data).cast(&DataType::Date)
    }

    fn series_from_datetime(name: &str, value: Option<NaiveDateTime>) -> PolarsResult<Series> {
        let data: [Option<i64>; 1] = [value.map(Self::datetime_to_ms)];
        Series::new(name.into(), data).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
    }

    fn datetime_from_series(chunked: &DatetimeChunked, row_idx: usize) -> Option<NaiveDateTime> {
        chunked.get(row_idx).map(Self::datetime_from_ms)
    }

    pub(crate) fn date_to_i32(date: NaiveDate) -> i32 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        (date - epoch).num_days() as i32
    }

    pub(crate) fn date_from_i32(days: i32) -> NaiveDate {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        epoch + Duration::days(days as i64)
    }

    pub(crate) fn datetime_to_ms(value: NaiveDateTime) -> i64 {
        value.and_utc().timestamp_millis()
    }

    pub(crate) fn datetime_from_ms(ms: i64) -> NaiveDateTime {
        DateTime::from_timestamp_millis(ms)
            .map(|dt| dt.naive_utc())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn midnight_crossing_session_ends_next_day() {
        let rules = WorkRules::default();
        let day = DayRecord::new(d(2025, 2, 3), t(22, 0), t(2, 30), "", &rules).unwrap();
        assert_eq!(day.from, d(2025, 2, 3).and_time(t(22, 0)));
        assert_eq!(day.till, d(2025, 2, 4).and_time(t(2, 30)));
        assert_eq!(day.total_minutes, 270);
    }

    #[test]
    fn zero_length_session_is_rejected() {
        let rules = WorkRules::default();
        let err = DayRecord::new(d(2025, 2, 3), t(0, 0), t(0, 0), "", &rules).unwrap_err();
        assert!(matches!(err, RegulationError::Validation(_)));
    }

    #[test]
    fn trip_flag_selects_trip_ceiling() {
        let rules = WorkRules::default();
        let regular = DayRecord::new(d(2025, 2, 3), t(8, 0), t(17, 0), "", &rules).unwrap();
        let trip = DayRecord::new(d(2025, 2, 4), t(8, 0), t(17, 0), "dr", &rules).unwrap();
        assert_eq!(regular.max_minutes, 600);
        assert_eq!(trip.max_minutes, 720);
    }

    #[test]
    fn weekday_label_follows_date() {
        let rules = WorkRules::default();
        // 2025-02-03 is a Monday.
        let day = DayRecord::new(d(2025, 2, 3), t(8, 0), t(17, 0), "", &rules).unwrap();
        assert_eq!(day.weekday_abbr(), "Mon");
        assert!(!day.is_weekend());
        let sat = DayRecord::new(d(2025, 2, 8), t(8, 0), t(12, 0), "", &rules).unwrap();
        assert!(sat.is_weekend());
    }
}
