//! Two-phase retirement projection: accumulate, then draw down.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{non_negative, whole_count, year_count, MAX_YEARS};
use crate::savings::growth::project_growth;
use crate::time_value::{level_payment, periodic_rate};
use crate::types::{
    percent_to_rate, round_money, with_metadata, CompoundFrequency, ComputationOutput, Money,
    Percent, Rate, MONTHS_PER_YEAR, OUT_OF_RANGE_WARNING,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Accumulation,
    Retirement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementInput {
    pub current_savings: Money,
    pub monthly_contribution: Money,
    pub years_to_retirement: Decimal,
    pub annual_return_percent: Percent,
    pub annual_income_needed: Money,
    pub years_in_retirement: Decimal,
    pub retirement_return_percent: Percent,
    /// Grow the withdrawal by this percentage every retirement year after
    /// the first. Zero keeps it flat.
    #[serde(default)]
    pub withdrawal_inflation_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementYear {
    /// Continuous across both phases.
    pub year: u32,
    pub phase: Phase,
    pub contributions: Money,
    pub withdrawals: Money,
    pub growth: Money,
    /// Income wanted this year that the balance could not cover.
    pub shortfall: Money,
    pub balance: Money,
}

impl RetirementYear {
    fn rounded(&self) -> RetirementYear {
        RetirementYear {
            year: self.year,
            phase: self.phase,
            contributions: round_money(self.contributions),
            withdrawals: round_money(self.withdrawals),
            growth: round_money(self.growth),
            shortfall: round_money(self.shortfall),
            balance: round_money(self.balance),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementProjection {
    pub balance_at_retirement: Money,
    pub total_contributions: Money,
    pub accumulation_growth: Money,
    pub total_withdrawn: Money,
    pub retirement_growth: Money,
    pub final_balance: Money,
    /// False as soon as any withdrawal could not be fully covered.
    pub can_meet_income: bool,
    /// Year (on the continuous scale of `yearly_breakdown`) in which the
    /// balance first failed to cover a withdrawal.
    pub depletion_year: Option<u32>,
    /// Flat annual income the retirement balance could sustain for the whole
    /// horizon at the retirement return.
    pub sustainable_annual_income: Money,
    pub yearly_breakdown: Vec<RetirementYear>,
    /// A balance left the range of `Decimal` and the projection stopped at
    /// the last whole year that fit.
    pub overflowed: bool,
}

impl RetirementProjection {
    pub fn rounded(&self) -> RetirementProjection {
        RetirementProjection {
            balance_at_retirement: round_money(self.balance_at_retirement),
            total_contributions: round_money(self.total_contributions),
            accumulation_growth: round_money(self.accumulation_growth),
            total_withdrawn: round_money(self.total_withdrawn),
            retirement_growth: round_money(self.retirement_growth),
            final_balance: round_money(self.final_balance),
            can_meet_income: self.can_meet_income,
            depletion_year: self.depletion_year,
            sustainable_annual_income: round_money(self.sustainable_annual_income),
            yearly_breakdown: self.yearly_breakdown.iter().map(RetirementYear::rounded).collect(),
            overflowed: self.overflowed,
        }
    }
}

/// Twelve withdraw-then-grow months starting from `opening`.
fn drawdown_year(year: u32, opening: Money, withdrawal: Money, monthly_rate: Rate) -> Option<RetirementYear> {
    let mut row = RetirementYear {
        year,
        phase: Phase::Retirement,
        contributions: Decimal::ZERO,
        withdrawals: Decimal::ZERO,
        growth: Decimal::ZERO,
        shortfall: Decimal::ZERO,
        balance: opening,
    };
    for _ in 0..MONTHS_PER_YEAR {
        let taken = withdrawal.min(row.balance);
        row.balance -= taken;
        row.withdrawals = row.withdrawals.checked_add(taken)?;
        row.shortfall = row.shortfall.checked_add(withdrawal - taken)?;
        if row.balance > Decimal::ZERO {
            let growth = row.balance.checked_mul(monthly_rate)?;
            row.balance = row.balance.checked_add(growth)?;
            row.growth = row.growth.checked_add(growth)?;
        }
    }
    Some(row)
}

/// Run both phases month by month and return unrounded results.
///
/// Each phase is capped at [`MAX_YEARS`]. A balance that leaves the range of
/// `Decimal` ends the projection early with `overflowed` set.
pub fn simulate_retirement(input: &RetirementInput) -> RetirementProjection {
    let accumulation_years = year_count(input.years_to_retirement);
    let retirement_years = year_count(input.years_in_retirement);

    let accumulation = project_growth(
        input.current_savings,
        input.monthly_contribution,
        input.annual_return_percent,
        accumulation_years,
        CompoundFrequency::Monthly,
    );
    let mut yearly_breakdown: Vec<RetirementYear> = accumulation
        .yearly_breakdown
        .iter()
        .map(|y| RetirementYear {
            year: y.year,
            phase: Phase::Accumulation,
            contributions: y.contributions,
            withdrawals: Decimal::ZERO,
            growth: y.interest,
            shortfall: Decimal::ZERO,
            balance: y.balance,
        })
        .collect();

    let monthly_rate = periodic_rate(non_negative(input.retirement_return_percent), MONTHS_PER_YEAR);
    let inflation = Decimal::ONE + percent_to_rate(non_negative(input.withdrawal_inflation_percent));
    let mut withdrawal = non_negative(input.annual_income_needed) / Decimal::from(MONTHS_PER_YEAR);

    let mut balance = accumulation.final_balance;
    let mut total_withdrawn = Decimal::ZERO;
    let mut retirement_growth = Decimal::ZERO;
    let mut depletion_year = None;
    let mut overflowed = accumulation.overflowed;

    for offset in 1..=retirement_years {
        if overflowed {
            break;
        }
        let year = accumulation_years + offset;
        if offset > 1 {
            match withdrawal.checked_mul(inflation) {
                Some(next) => withdrawal = next,
                None => {
                    overflowed = true;
                    break;
                }
            }
        }
        let row = drawdown_year(year, balance, withdrawal, monthly_rate);
        let totals = row.as_ref().and_then(|r| {
            Some((
                total_withdrawn.checked_add(r.withdrawals)?,
                retirement_growth.checked_add(r.growth)?,
            ))
        });
        match (row, totals) {
            (Some(row), Some((withdrawn, growth))) => {
                if row.shortfall > Decimal::ZERO {
                    depletion_year.get_or_insert(year);
                }
                balance = row.balance;
                total_withdrawn = withdrawn;
                retirement_growth = growth;
                yearly_breakdown.push(row);
            }
            _ => {
                tracing::warn!(year, "retirement drawdown left the decimal range");
                overflowed = true;
            }
        }
    }

    let horizon = retirement_years * MONTHS_PER_YEAR;
    // Withdrawals come before growth each month: an annuity due.
    let sustainable_monthly =
        level_payment(accumulation.final_balance, monthly_rate, horizon) / (Decimal::ONE + monthly_rate);

    RetirementProjection {
        balance_at_retirement: accumulation.final_balance,
        total_contributions: accumulation.total_contributions,
        accumulation_growth: accumulation.total_interest,
        total_withdrawn,
        retirement_growth,
        final_balance: balance,
        can_meet_income: depletion_year.is_none(),
        depletion_year,
        sustainable_annual_income: sustainable_monthly.saturating_mul(Decimal::from(MONTHS_PER_YEAR)),
        yearly_breakdown,
        overflowed,
    }
}

/// Retirement projection wrapped in the standard envelope.
pub fn calculate_retirement(input: &RetirementInput) -> ComputationOutput<RetirementProjection> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let projection = simulate_retirement(input);
    if let Some(year) = projection.depletion_year {
        warnings.push(format!(
            "Savings are exhausted in year {year}; later withdrawals are only partly covered"
        ));
    }
    if whole_count(input.years_in_retirement) == 0 {
        warnings.push("No retirement years requested; only accumulation was projected".into());
    }
    if whole_count(input.years_to_retirement) > MAX_YEARS || whole_count(input.years_in_retirement) > MAX_YEARS {
        warnings.push(format!("Each phase is limited to {MAX_YEARS} years; longer horizons were shortened"));
    }
    if projection.overflowed {
        warnings.push(OUT_OF_RANGE_WARNING.into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Two-phase retirement: contribute-then-grow accumulation, withdraw-then-grow drawdown",
        &serde_json::json!({
            "compounding": "monthly",
            "withdrawal_timing": "start of month",
            "withdrawal_inflation_percent": input.withdrawal_inflation_percent.to_string(),
        }),
        warnings,
        elapsed,
        projection.rounded(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_input() -> RetirementInput {
        RetirementInput {
            current_savings: dec!(100_000),
            monthly_contribution: dec!(1_000),
            years_to_retirement: dec!(25),
            annual_return_percent: dec!(7),
            annual_income_needed: dec!(60_000),
            years_in_retirement: dec!(30),
            retirement_return_percent: dec!(4),
            withdrawal_inflation_percent: Decimal::ZERO,
        }
    }

    #[test]
    fn test_reference_scenario_is_deterministic() {
        let a = simulate_retirement(&default_input());
        let b = simulate_retirement(&default_input());
        assert_eq!(a, b);
        // ~1.39M at retirement comfortably funds 60k/yr at 4% for 30 years
        assert!(a.balance_at_retirement > dec!(1_350_000));
        assert!(a.balance_at_retirement < dec!(1_420_000));
        assert!(a.can_meet_income);
        assert_eq!(a.depletion_year, None);
        assert_eq!(a.total_withdrawn, dec!(1_800_000));
    }

    #[test]
    fn test_breakdown_spans_both_phases() {
        let p = simulate_retirement(&default_input());
        assert_eq!(p.yearly_breakdown.len(), 55);
        assert_eq!(p.yearly_breakdown[24].phase, Phase::Accumulation);
        assert_eq!(p.yearly_breakdown[25].phase, Phase::Retirement);
        assert_eq!(p.yearly_breakdown[25].year, 26);
        assert_eq!(p.yearly_breakdown[24].balance, p.balance_at_retirement);
    }

    #[test]
    fn test_depletion_is_reported_not_negative() {
        let mut input = default_input();
        input.annual_income_needed = dec!(150_000);
        let p = simulate_retirement(&input);
        assert!(!p.can_meet_income);
        let year = p.depletion_year.unwrap();
        assert!(year > 25 && year <= 55);
        assert_eq!(p.final_balance, Decimal::ZERO);
        assert!(p.yearly_breakdown.iter().all(|y| y.balance >= Decimal::ZERO));
        let last = p.yearly_breakdown.last().unwrap();
        assert_eq!(last.withdrawals, Decimal::ZERO);
        assert_eq!(last.shortfall, dec!(150_000));
    }

    #[test]
    fn test_inflated_withdrawals_drain_faster() {
        let flat = simulate_retirement(&default_input());
        let mut input = default_input();
        input.withdrawal_inflation_percent = dec!(3);
        let inflated = simulate_retirement(&input);
        assert!(inflated.final_balance < flat.final_balance);
    }

    #[test]
    fn test_sustainable_income_exactly_depletes() {
        let mut input = default_input();
        let baseline = simulate_retirement(&input);
        input.annual_income_needed = baseline.sustainable_annual_income;
        let p = simulate_retirement(&input);
        assert!(p.final_balance.abs() < dec!(1));
    }

    #[test]
    fn test_envelope_warns_on_depletion() {
        let mut input = default_input();
        input.annual_income_needed = dec!(200_000);
        let out = calculate_retirement(&input);
        assert!(!out.result.can_meet_income);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_millennium_horizon_is_capped() {
        let mut input = default_input();
        input.years_to_retirement = dec!(1000);
        let p = simulate_retirement(&input);
        assert!(!p.overflowed);
        assert_eq!(p.yearly_breakdown.len() as u32, MAX_YEARS + 30);
        assert_eq!(p.yearly_breakdown[99].phase, Phase::Accumulation);
        assert_eq!(p.yearly_breakdown[100].year, 101);

        let out = calculate_retirement(&input);
        assert!(out.warnings.iter().any(|w| w.contains("limited to 100 years")));
    }

    #[test]
    fn test_runaway_return_stops_early() {
        let mut input = default_input();
        input.annual_return_percent = dec!(100_000);
        let out = calculate_retirement(&input);
        assert!(out.result.overflowed);
        assert!(out.result.yearly_breakdown.len() < 25);
        assert!(out.warnings.iter().any(|w| w.contains("supported range")));
    }
}
