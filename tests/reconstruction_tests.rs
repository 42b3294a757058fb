use chrono::{NaiveDate, NaiveTime};
use worktime_tool::{DayRecord, Timesheet, WorkRules};

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
fn lower_fixed_day_keeps_its_start_for_any_adjustment() {
    // Day 3 is pinned at 08:00 and sheds one hour of excess onto day 4.
    let mut timesheet = sheet(&[(3, (8, 0), (19, 0), "lo"), (4, (9, 0), (17, 0), "")]);
    timesheet.regularize().unwrap();

    let days = timesheet.days().unwrap();
    assert_eq!(days[0].new_from, Some(d(2025, 2, 3).and_time(t(8, 0))));
    assert_eq!(days[0].new_till, Some(d(2025, 2, 3).and_time(t(18, 0))));
    assert_eq!(days[1].adjustment_minutes, 60);
}

#[test]
fn upper_fixed_day_keeps_its_end_for_any_adjustment() {
    let mut timesheet = sheet(&[(3, (8, 0), (19, 0), "up"), (4, (9, 0), (17, 0), "")]);
    timesheet.regularize().unwrap();

    let days = timesheet.days().unwrap();
    assert_eq!(days[0].new_till, Some(d(2025, 2, 3).and_time(t(19, 0))));
    assert_eq!(days[0].new_from, Some(d(2025, 2, 3).and_time(t(9, 0))));
}

#[test]
fn fully_fixed_day_is_reproduced_verbatim() {
    let mut timesheet = sheet(&[(3, (5, 0), (20, 0), "lo+up")]);
    timesheet.regularize().unwrap();

    let days = timesheet.days().unwrap();
    assert_eq!(days[0].new_from, Some(d(2025, 2, 3).and_time(t(5, 0))));
    assert_eq!(days[0].new_till, Some(d(2025, 2, 3).and_time(t(20, 0))));
    assert_eq!(days[0].new_total_minutes, Some(900));
    assert_eq!(days[0].new_compliant, Some(true));
}

#[test]
fn unchanged_day_keeps_its_recorded_midpoint() {
    let mut timesheet = sheet(&[(3, (9, 0), (16, 0), "")]);
    timesheet.regularize().unwrap();

    let days = timesheet.days().unwrap();
    // Nothing moved, the midpoint fits the window: times stay as recorded.
    assert_eq!(days[0].new_from, Some(d(2025, 2, 3).and_time(t(9, 0))));
    assert_eq!(days[0].new_till, Some(d(2025, 2, 3).and_time(t(16, 0))));
}

#[test]
fn late_session_is_clipped_to_the_window_edge() {
    // 16:00-22:00 has its midpoint far past the feasible range; the session
    // slides left until it ends at the 19:45 bound.
    let mut timesheet = sheet(&[(3, (16, 0), (22, 0), "")]);
    timesheet.regularize().unwrap();

    let days = timesheet.days().unwrap();
    assert_eq!(days[0].new_till, Some(d(2025, 2, 3).and_time(t(19, 45))));
    assert_eq!(days[0].new_from, Some(d(2025, 2, 3).and_time(t(13, 45))));
    assert_eq!(days[0].new_total_minutes, Some(360));
}

#[test]
fn odd_minute_totals_reconstruct_exactly() {
    let mut timesheet = sheet(&[(3, (8, 0), (16, 1), "")]);
    timesheet.regularize().unwrap();

    let days = timesheet.days().unwrap();
    let from = days[0].new_from.unwrap();
    let till = days[0].new_till.unwrap();
    assert_eq!((till - from).num_minutes(), 481);
}

#[test]
fn adjusted_times_stay_inside_the_window() {
    let mut timesheet = sheet(&[
        (3, (8, 0), (20, 0), ""),
        (4, (9, 0), (16, 0), ""),
        (5, (7, 0), (17, 30), ""),
    ]);
    timesheet.regularize().unwrap();

    for day in timesheet.days().unwrap() {
        let window_start = day.window_start.unwrap();
        let window_end = day.window_end.unwrap();
        assert!(day.new_from.unwrap() >= window_start, "day {}", day.date);
        assert!(day.new_till.unwrap() <= window_end, "day {}", day.date);
    }
}
