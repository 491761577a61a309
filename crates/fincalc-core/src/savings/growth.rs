//! Compounding growth with periodic contributions.
//!
//! The projection always ticks monthly so contribution timing is the same
//! across calculators. Each month the contribution is added first and growth
//! is applied after. With yearly compounding the annual rate is applied once
//! at the end of each 12-month block instead of monthly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::non_negative;
use crate::time_value::periodic_rate;
use crate::types::{
    percent_to_rate, round_money, CompoundFrequency, Money, Percent, Rate, MONTHS_PER_YEAR,
};

/// Inputs to a growth projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthParams {
    pub initial_balance: Money,
    pub monthly_contribution: Money,
    pub annual_rate_percent: Percent,
    pub years: u32,
    #[serde(default)]
    pub frequency: CompoundFrequency,
    /// Raise the monthly contribution by this percentage at the start of
    /// every year after the first.
    #[serde(default)]
    pub contribution_increase_percent: Percent,
}

/// One year of a projection. `balance` is the year-end balance and satisfies
/// `balance = previous + contributions + employer_contributions + interest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthYear {
    pub year: u32,
    pub balance: Money,
    pub contributions: Money,
    pub employer_contributions: Money,
    pub interest: Money,
}

impl GrowthYear {
    pub fn rounded(&self) -> GrowthYear {
        GrowthYear {
            year: self.year,
            balance: round_money(self.balance),
            contributions: round_money(self.contributions),
            employer_contributions: round_money(self.employer_contributions),
            interest: round_money(self.interest),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthProjection {
    pub initial_balance: Money,
    pub final_balance: Money,
    pub total_contributions: Money,
    pub total_employer_contributions: Money,
    pub total_interest: Money,
    pub yearly_breakdown: Vec<GrowthYear>,
    /// The balance left the range of `Decimal`; the projection ends with the
    /// last whole year that fit.
    #[serde(default)]
    pub overflowed: bool,
}

impl GrowthProjection {
    pub fn rounded(&self) -> GrowthProjection {
        GrowthProjection {
            initial_balance: round_money(self.initial_balance),
            final_balance: round_money(self.final_balance),
            total_contributions: round_money(self.total_contributions),
            total_employer_contributions: round_money(self.total_employer_contributions),
            total_interest: round_money(self.total_interest),
            yearly_breakdown: self.yearly_breakdown.iter().map(GrowthYear::rounded).collect(),
            overflowed: self.overflowed,
        }
    }
}

/// Project a balance with a fixed monthly contribution.
pub fn project_growth(
    initial_balance: Money,
    monthly_contribution: Money,
    annual_rate_percent: Percent,
    years: u32,
    frequency: CompoundFrequency,
) -> GrowthProjection {
    let params = GrowthParams {
        initial_balance,
        monthly_contribution,
        annual_rate_percent,
        years,
        frequency,
        contribution_increase_percent: Decimal::ZERO,
    };
    project_growth_with(&params, |_| Decimal::ZERO)
}

/// Project a balance where `employer_match` maps each employee contribution
/// to an additional employer contribution deposited the same month.
pub fn project_growth_with<F>(params: &GrowthParams, employer_match: F) -> GrowthProjection
where
    F: Fn(Money) -> Money,
{
    let initial = non_negative(params.initial_balance);
    let rate = non_negative(params.annual_rate_percent);
    let monthly_rate = periodic_rate(rate, MONTHS_PER_YEAR);
    let annual_rate = percent_to_rate(rate);
    let step_up = Decimal::ONE + percent_to_rate(non_negative(params.contribution_increase_percent));

    let mut balance = initial;
    let mut contribution = non_negative(params.monthly_contribution);
    let mut projection = GrowthProjection {
        initial_balance: initial,
        ..GrowthProjection::default()
    };

    'years: for year in 1..=params.years {
        let opening = balance;
        if year > 1 {
            contribution = match contribution.checked_mul(step_up) {
                Some(next) => next,
                None => {
                    projection.overflowed = true;
                    break;
                }
            };
        }
        let mut row = GrowthYear {
            year,
            ..GrowthYear::default()
        };
        for month in 1..=MONTHS_PER_YEAR {
            let employer = non_negative(employer_match(contribution));
            let rate = match params.frequency {
                CompoundFrequency::Monthly => monthly_rate,
                CompoundFrequency::Yearly if month == MONTHS_PER_YEAR => annual_rate,
                CompoundFrequency::Yearly => Decimal::ZERO,
            };
            let (next, growth) = match deposit_and_grow(balance, contribution, employer, rate) {
                Some(step) => step,
                None => {
                    tracing::warn!(year, "growth projection left the decimal range");
                    projection.overflowed = true;
                    balance = opening;
                    break 'years;
                }
            };
            balance = next;
            row.contributions += contribution;
            row.employer_contributions += employer;
            row.interest += growth;
        }
        row.balance = balance;

        projection.total_contributions += row.contributions;
        projection.total_employer_contributions += row.employer_contributions;
        projection.total_interest += row.interest;
        projection.yearly_breakdown.push(row);
    }

    projection.final_balance = balance;
    projection
}

/// Deposit then grow for one month, returning the new balance and the growth.
/// Every running total is bounded by the balance, so checking the balance is
/// enough.
fn deposit_and_grow(balance: Money, contribution: Money, employer: Money, rate: Rate) -> Option<(Money, Money)> {
    let funded = balance.checked_add(contribution)?.checked_add(employer)?;
    let growth = funded.checked_mul(rate)?;
    Some((funded.checked_add(growth)?, growth))
}

/// Employer match of `match_percent` of each contribution, limited to
/// `limit_percent` of the monthly salary.
pub fn capped_match(
    match_percent: Percent,
    limit_percent: Percent,
    monthly_salary: Money,
) -> impl Fn(Money) -> Money {
    let ratio = percent_to_rate(non_negative(match_percent));
    let cap = monthly_salary * percent_to_rate(non_negative(limit_percent));
    move |contribution| contribution.min(cap) * ratio
}
