use chrono::{NaiveDate, NaiveTime};
use worktime_tool::{DayRecord, Timesheet, WorkRules};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[test]
fn day_record_roundtrips_through_timesheet_dataframe() {
    let rules = WorkRules::default();
    let mut timesheet = Timesheet::new();

    let day = DayRecord::new(d(2025, 2, 3), t(8, 0), t(18, 30), "dr+lo", &rules).unwrap();
    timesheet.push_day(day.clone()).unwrap();

    assert_eq!(timesheet.dataframe().height(), 1);

    let row = DayRecord::from_dataframe_row(timesheet.dataframe(), 0).unwrap();
    assert_eq!(row.date, day.date);
    assert_eq!(row.from, day.from);
    assert_eq!(row.till, day.till);
    assert_eq!(row.flags, day.flags);
    assert_eq!(row.max_minutes, 720);
    assert_eq!(row.total_minutes, 630);
    assert_eq!(row.new_from, None);
    assert_eq!(row.compliant, None);
}

#[test]
fn unknown_flags_survive_the_dataframe_roundtrip() {
    let rules = WorkRules::default();
    let mut timesheet = Timesheet::new();

    let day = DayRecord::new(d(2025, 2, 3), t(8, 0), t(17, 0), "lo+ft", &rules).unwrap();
    timesheet.push_day(day).unwrap();

    let row = DayRecord::from_dataframe_row(timesheet.dataframe(), 0).unwrap();
    assert!(row.flags.fix_lower);
    assert_eq!(row.flags.unknown, vec!["ft".to_string()]);
}

#[test]
fn midnight_crossing_session_keeps_positive_duration() {
    let rules = WorkRules::default();
    let day = DayRecord::new(d(2025, 2, 3), t(21, 0), t(5, 0), "", &rules).unwrap();
    assert_eq!(day.till.date(), d(2025, 2, 4));
    assert_eq!(day.total_minutes, 8 * 60);
    assert!(day.till > day.from);
}

#[test]
fn derived_columns_follow_flag_modes() {
    let rules = WorkRules::default();
    let plain = DayRecord::new(d(2025, 2, 3), t(8, 0), t(17, 0), "", &rules).unwrap();
    assert!(!plain.flags.fix_lower && !plain.flags.fix_upper);
    assert_eq!(plain.max_minutes, 600);

    let pinned = DayRecord::new(d(2025, 2, 4), t(8, 0), t(17, 0), "lo+up", &rules).unwrap();
    assert!(pinned.flags.is_fully_fixed());
}
