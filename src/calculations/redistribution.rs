use crate::error::RegulationError;
use polars::prelude::*;

#[derive(Debug, Clone)]
pub struct RedistributionOutcome {
    pub adjustment_minutes: Vec<i64>,
    pub new_total_minutes: Vec<i64>,
    /// Aggregate excess that was moved between days.
    pub moved_minutes: i64,
}

/// Moves the aggregate excess onto days with spare capacity.
///
/// Greedy and deterministic: spare capacity is consumed in table (date)
/// order, so earlier days absorb excess first. The grand total over all days
/// is preserved exactly. A sweep that places nothing while excess remains
/// means the feasibility check and this policy disagree, which is an internal
/// invariant violation, not a user error.
pub struct RedistributionPass<'a> {
    df: &'a DataFrame,
}

impl<'a> RedistributionPass<'a> {
    pub fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    pub fn execute(&self) -> Result<RedistributionOutcome, RegulationError> {
        let height = self.df.height();

        let total_ca = self.df.column("total_minutes")?.i64()?;
        let excess_ca = self.df.column("excess_minutes")?.i64()?;
        let spare_ca = self.df.column("spare_minutes")?.i64()?;

        let mut totals = Vec::with_capacity(height);
        let mut excess = Vec::with_capacity(height);
        let mut spare = Vec::with_capacity(height);
        for idx in 0..height {
            totals.push(total_ca.get(idx).unwrap_or(0));
            excess.push(excess_ca.get(idx).unwrap_or(0));
            spare.push(spare_ca.get(idx).unwrap_or(0));
        }

        let mut adjustment_minutes = vec![0i64; height];
        let mut remaining: i64 = excess.iter().sum();
        let moved_minutes = remaining;

        while remaining > 0 {
            let before = remaining;
            for idx in 0..height {
                if spare[idx] <= 0 {
                    continue;
                }
                let take = spare[idx].min(remaining);
                adjustment_minutes[idx] += take;
                spare[idx] -= take;
                remaining -= take;
                if remaining == 0 {
                    break;
                }
            }
            if remaining == before {
                return Err(RegulationError::NoProgress {
                    remaining_minutes: remaining,
                });
            }
        }

        let new_total_minutes: Vec<i64> = (0..height)
            .map(|idx| totals[idx] + adjustment_minutes[idx] - excess[idx])
            .collect();

        log::debug!(
            "redistributed {moved_minutes} excess minutes across {} days",
            adjustment_minutes.iter().filter(|a| **a > 0).count()
        );

        Ok(RedistributionOutcome {
            adjustment_minutes,
            new_total_minutes,
            moved_minutes,
        })
    }
}
