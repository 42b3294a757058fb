use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Regulatory limits applied to every day of a timesheet. All durations are
/// whole minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRules {
    /// Maximum presence on a regular business day.
    pub max_regular_minutes: i64,
    /// Maximum presence on a business-trip day (`dr` flag).
    pub max_trip_minutes: i64,
    /// Minimum rest between the end of one day and the start of the next.
    pub min_rest_minutes: i64,
    /// Earliest permitted start of a day without a fixed lower bound.
    pub earliest_start: NaiveTime,
    /// Latest permitted end of a day without a fixed upper bound.
    pub latest_end: NaiveTime,
}

impl Default for WorkRules {
    fn default() -> Self {
        Self {
            max_regular_minutes: 10 * 60,
            max_trip_minutes: 12 * 60,
            min_rest_minutes: 11 * 60,
            earliest_start: NaiveTime::from_hms_opt(6, 15, 0).unwrap(),
            latest_end: NaiveTime::from_hms_opt(19, 45, 0).unwrap(),
        }
    }
}

impl WorkRules {
    /// The duration ceiling for a day, selected by its business-trip flag.
    pub fn max_minutes_for(&self, business_trip: bool) -> i64 {
        if business_trip {
            self.max_trip_minutes
        } else {
            self.max_regular_minutes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_match_regulatory_constants() {
        let rules = WorkRules::default();
        assert_eq!(rules.max_regular_minutes, 600);
        assert_eq!(rules.max_trip_minutes, 720);
        assert_eq!(rules.min_rest_minutes, 660);
        assert_eq!(rules.earliest_start, NaiveTime::from_hms_opt(6, 15, 0).unwrap());
        assert_eq!(rules.latest_end, NaiveTime::from_hms_opt(19, 45, 0).unwrap());
    }

    #[test]
    fn trip_flag_selects_trip_ceiling() {
        let rules = WorkRules::default();
        assert_eq!(rules.max_minutes_for(false), 600);
        assert_eq!(rules.max_minutes_for(true), 720);
    }
}
