use crate::day::DayRecord;
use crate::error::RegulationError;
use crate::rules::WorkRules;
use polars::prelude::*;

/// A single day's compliance verdict. A fully fixed day is exempt from both
/// rules; a missing break (first day) satisfies the rest rule.
pub fn day_is_compliant(
    total_minutes: i64,
    break_minutes: Option<i64>,
    max_minutes: i64,
    fully_fixed: bool,
    rules: &WorkRules,
) -> bool {
    if fully_fixed {
        return true;
    }
    let break_ok = break_minutes.is_none_or(|brk| brk >= rules.min_rest_minutes);
    total_minutes <= max_minutes && break_ok
}

#[derive(Debug, Clone)]
pub struct ComplianceOutcome {
    pub new_total_minutes: Vec<i64>,
    pub new_break_minutes: Vec<Option<i64>>,
    pub compliant: Vec<bool>,
}

/// Re-derives totals and rest times from the adjusted timestamps and confirms
/// every day now satisfies the regulations.
///
/// Any residual violation, and any drift of the grand total, is a fatal
/// internal-consistency failure: both mean the redistribution policy and the
/// feasibility check disagreed.
pub struct CompliancePass<'a> {
    df: &'a DataFrame,
    rules: &'a WorkRules,
}

impl<'a> CompliancePass<'a> {
    pub fn new(df: &'a DataFrame, rules: &'a WorkRules) -> Self {
        Self { df, rules }
    }

    pub fn execute(&self) -> Result<ComplianceOutcome, RegulationError> {
        let height = self.df.height();

        let date_ca = self.df.column("date")?.date()?;
        let new_from_ca = self.df.column("new_from")?.datetime()?;
        let new_till_ca = self.df.column("new_till")?.datetime()?;
        let total_ca = self.df.column("total_minutes")?.i64()?;
        let max_ca = self.df.column("max_minutes")?.i64()?;
        let lower_ca = self.df.column("fix_lower")?.bool()?;
        let upper_ca = self.df.column("fix_upper")?.bool()?;

        let mut froms = Vec::with_capacity(height);
        let mut tills = Vec::with_capacity(height);
        for idx in 0..height {
            let from = new_from_ca
                .get(idx)
                .ok_or_else(|| PolarsError::ComputeError("day row missing new_from".into()))?;
            let till = new_till_ca
                .get(idx)
                .ok_or_else(|| PolarsError::ComputeError("day row missing new_till".into()))?;
            froms.push(from);
            tills.push(till);
        }

        let mut new_total_minutes = Vec::with_capacity(height);
        let mut new_break_minutes = Vec::with_capacity(height);
        let mut compliant = Vec::with_capacity(height);
        let mut old_sum = 0;
        let mut new_sum = 0;

        for idx in 0..height {
            let total = (tills[idx] - froms[idx]) / 60_000;
            let brk = if idx > 0 {
                Some((froms[idx] - tills[idx - 1]) / 60_000)
            } else {
                None
            };
            let fully_fixed =
                lower_ca.get(idx).unwrap_or(false) && upper_ca.get(idx).unwrap_or(false);
            let max = max_ca.get(idx).unwrap_or(0);

            old_sum += total_ca.get(idx).unwrap_or(0);
            new_sum += total;

            let ok = day_is_compliant(total, brk, max, fully_fixed, self.rules);
            if !ok {
                let date = date_ca
                    .get(idx)
                    .map(DayRecord::date_from_i32)
                    .unwrap_or_default();
                return Err(RegulationError::ResidualNonCompliance {
                    date,
                    total_minutes: total,
                    break_minutes: brk,
                });
            }

            new_total_minutes.push(total);
            new_break_minutes.push(brk);
            compliant.push(ok);
        }

        if old_sum != new_sum {
            return Err(RegulationError::TotalMismatch {
                old_minutes: old_sum,
                new_minutes: new_sum,
            });
        }

        Ok(ComplianceOutcome {
            new_total_minutes,
            new_break_minutes,
            compliant,
        })
    }
}
