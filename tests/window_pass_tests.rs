use chrono::{NaiveDate, NaiveTime};
use worktime_tool::calculations::window::WindowPass;
use worktime_tool::{DayRecord, RegulationError, Timesheet, WorkRules};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn sheet(days: &[(u32, (u32, u32), (u32, u32), &str)]) -> Timesheet {
    let rules = WorkRules::default();
    let mut timesheet = Timesheet::new();
    for (day, from, till, flags) in days {
        let record = DayRecord::new(
            d(2025, 2, *day),
            t(from.0, from.1),
            t(till.0, till.1),
            flags,
            &rules,
        )
        .unwrap();
        timesheet.push_day(record).unwrap();
    }
    timesheet
}

#[test]
fn lower_fixed_window_starts_at_recorded_from() {
    let timesheet = sheet(&[(3, (8, 0), (17, 0), "lo")]);
    let windows = WindowPass::new(timesheet.dataframe(), timesheet.rules())
        .execute()
        .unwrap();

    assert_eq!(windows[0].start, d(2025, 2, 3).and_time(t(8, 0)));
    assert_eq!(windows[0].end, d(2025, 2, 3).and_time(t(18, 0)));
    assert_eq!(windows[0].length_minutes(), 600);
}

#[test]
fn upper_fixed_window_ends_at_recorded_till() {
    let timesheet = sheet(&[(3, (8, 0), (17, 0), "up")]);
    let windows = WindowPass::new(timesheet.dataframe(), timesheet.rules())
        .execute()
        .unwrap();

    assert_eq!(windows[0].start, d(2025, 2, 3).and_time(t(7, 0)));
    assert_eq!(windows[0].end, d(2025, 2, 3).and_time(t(17, 0)));
}

#[test]
fn trip_day_window_uses_trip_ceiling() {
    let timesheet = sheet(&[(3, (8, 0), (17, 0), "dr+lo")]);
    let windows = WindowPass::new(timesheet.dataframe(), timesheet.rules())
        .execute()
        .unwrap();

    assert_eq!(windows[0].end, d(2025, 2, 3).and_time(t(20, 0)));
}

#[test]
fn fully_fixed_window_is_exactly_the_session() {
    let timesheet = sheet(&[(3, (9, 30), (16, 15), "lo+up")]);
    let windows = WindowPass::new(timesheet.dataframe(), timesheet.rules())
        .execute()
        .unwrap();

    assert_eq!(windows[0].start, d(2025, 2, 3).and_time(t(9, 30)));
    assert_eq!(windows[0].end, d(2025, 2, 3).and_time(t(16, 15)));
    assert_eq!(windows[0].length_minutes(), 405);
}

#[test]
fn unfixed_single_day_falls_back_to_default_bounds() {
    let timesheet = sheet(&[(3, (8, 0), (17, 0), "")]);
    let windows = WindowPass::new(timesheet.dataframe(), timesheet.rules())
        .execute()
        .unwrap();

    assert_eq!(windows[0].start, d(2025, 2, 3).and_time(t(6, 15)));
    assert_eq!(windows[0].end, d(2025, 2, 3).and_time(t(19, 45)));
}

#[test]
fn unfixed_window_is_narrowed_by_neighbor_rest() {
    // Day 4 is hemmed in on both sides: day 3 ends late, day 5 starts early.
    let timesheet = sheet(&[
        (3, (10, 0), (21, 30), ""),
        (4, (9, 0), (17, 0), ""),
        (5, (7, 0), (15, 0), ""),
    ]);
    let windows = WindowPass::new(timesheet.dataframe(), timesheet.rules())
        .execute()
        .unwrap();

    // earliest start = prev till 21:30 + 11h rest = 08:30 (later than 06:15)
    assert_eq!(windows[1].start, d(2025, 2, 4).and_time(t(8, 30)));
    // latest end = next from 07:00 - 11h rest = 20:00 the day before, so the
    // 19:45 default is the tighter bound
    assert_eq!(windows[1].end, d(2025, 2, 4).and_time(t(19, 45)));

    // The last day has no following neighbor; only the default applies.
    assert_eq!(windows[2].end, d(2025, 2, 5).and_time(t(19, 45)));
}

#[test]
fn unfixed_window_end_clipped_by_early_next_start() {
    let timesheet = sheet(&[(3, (9, 0), (17, 0), ""), (4, (6, 30), (15, 0), "")]);
    let windows = WindowPass::new(timesheet.dataframe(), timesheet.rules())
        .execute()
        .unwrap();

    // next from 06:30 - 11h rest = 19:30 on day 3, tighter than 19:45
    assert_eq!(windows[0].end, d(2025, 2, 3).and_time(t(19, 30)));
}

#[test]
fn negative_window_is_a_validation_error() {
    // Day 3 runs past midnight into day 4; 09:00 + 11h rest leaves day 4 no
    // room before the 19:45 bound.
    let timesheet = sheet(&[(3, (22, 0), (9, 0), ""), (4, (10, 0), (17, 0), "")]);
    let err = WindowPass::new(timesheet.dataframe(), timesheet.rules())
        .execute()
        .unwrap_err();

    assert!(matches!(err, RegulationError::Validation(_)));
    assert!(err.to_string().contains("negative window"));
}
