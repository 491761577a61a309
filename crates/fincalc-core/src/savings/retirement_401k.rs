use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{clamp_percent, non_negative, year_count};
use crate::savings::growth::{capped_match, project_growth_with, GrowthParams, GrowthYear};
use crate::types::{
    percent_to_rate, round_money, with_metadata, CompoundFrequency, ComputationOutput, Money,
    Percent, MONTHS_PER_YEAR, OUT_OF_RANGE_WARNING,
};

/// Employee elective deferral limit (2024).
pub const DEFERRAL_LIMIT: Money = dec!(23_000);
/// Additional deferral allowed from age 50.
pub const CATCH_UP_LIMIT: Money = dec!(7_500);
pub const CATCH_UP_AGE: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retirement401kInput {
    pub annual_salary: Money,
    pub contribution_percent: Percent,
    /// Employer pays this percentage of each matched dollar.
    #[serde(default)]
    pub employer_match_percent: Percent,
    /// Only employee contributions up to this share of salary are matched.
    #[serde(default)]
    pub employer_match_limit_percent: Percent,
    #[serde(default)]
    pub current_balance: Money,
    pub annual_return_percent: Percent,
    pub years_to_retirement: Decimal,
    #[serde(default)]
    pub salary_growth_percent: Percent,
    /// Enables the catch-up allowance once this age reaches 50.
    #[serde(default)]
    pub current_age: Option<u32>,
    /// Marginal income tax rate used to value the pre-tax deduction.
    #[serde(default)]
    pub marginal_tax_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retirement401kOutput {
    pub final_balance: Money,
    pub total_employee_contributions: Money,
    pub total_employer_contributions: Money,
    pub total_growth: Money,
    pub first_year_employee_contribution: Money,
    pub first_year_employer_match: Money,
    pub first_year_tax_savings: Money,
    /// Years in which the deferral limit reduced the requested contribution.
    pub years_at_limit: u32,
    /// Additional match available in year one by contributing up to the
    /// match limit.
    pub unclaimed_match: Money,
    pub yearly_breakdown: Vec<GrowthYear>,
}

fn deferral_limit(age: Option<u32>) -> Money {
    match age {
        Some(age) if age >= CATCH_UP_AGE => DEFERRAL_LIMIT + CATCH_UP_LIMIT,
        _ => DEFERRAL_LIMIT,
    }
}

/// Project a 401(k) balance to retirement.
pub fn calculate_401k(input: &Retirement401kInput) -> ComputationOutput<Retirement401kOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let years = year_count(input.years_to_retirement);
    let contribution_rate = percent_to_rate(clamp_percent(input.contribution_percent));
    let salary_step = Decimal::ONE + percent_to_rate(non_negative(input.salary_growth_percent));
    let months = Decimal::from(MONTHS_PER_YEAR);

    let mut salary = non_negative(input.annual_salary);
    let mut balance = non_negative(input.current_balance);
    let mut yearly_breakdown: Vec<GrowthYear> = Vec::with_capacity(years as usize);
    let mut years_at_limit = 0u32;

    for year in 1..=years {
        if year > 1 {
            salary = match salary.checked_mul(salary_step) {
                Some(next) => next,
                None => {
                    warnings.push(OUT_OF_RANGE_WARNING.into());
                    break;
                }
            };
        }
        let age = input.current_age.map(|a| a.saturating_add(year - 1));
        let limit = deferral_limit(age);
        let requested = salary * contribution_rate;
        if requested > limit {
            years_at_limit += 1;
        }
        let params = GrowthParams {
            initial_balance: balance,
            monthly_contribution: requested.min(limit) / months,
            annual_rate_percent: input.annual_return_percent,
            years: 1,
            frequency: CompoundFrequency::Monthly,
            contribution_increase_percent: Decimal::ZERO,
        };
        let hook = capped_match(
            input.employer_match_percent,
            input.employer_match_limit_percent,
            salary / months,
        );
        let projection = project_growth_with(&params, hook);
        if projection.overflowed {
            warnings.push(OUT_OF_RANGE_WARNING.into());
            break;
        }
        balance = projection.final_balance;
        if let Some(row) = projection.yearly_breakdown.into_iter().next() {
            yearly_breakdown.push(GrowthYear { year, ..row });
        }
    }

    if years_at_limit > 0 {
        warnings.push(format!(
            "Contributions were limited by the annual deferral limit in {years_at_limit} year(s)"
        ));
    }

    let first = yearly_breakdown.first().cloned().unwrap_or_default();
    let starting_salary = non_negative(input.annual_salary);
    let match_ratio = percent_to_rate(non_negative(input.employer_match_percent));
    let full_match =
        starting_salary * percent_to_rate(non_negative(input.employer_match_limit_percent)) * match_ratio;
    let unclaimed_match = if years > 0 {
        round_money((full_match - first.employer_contributions).max(Decimal::ZERO))
    } else {
        Decimal::ZERO
    };
    if unclaimed_match > Decimal::ZERO {
        warnings.push("Contribution is below the match limit; employer match is left unclaimed".into());
    }

    let total_employee: Money = yearly_breakdown.iter().map(|y| y.contributions).sum();
    let total_employer: Money = yearly_breakdown.iter().map(|y| y.employer_contributions).sum();
    let total_growth: Money = yearly_breakdown.iter().map(|y| y.interest).sum();

    let output = Retirement401kOutput {
        final_balance: round_money(balance),
        total_employee_contributions: round_money(total_employee),
        total_employer_contributions: round_money(total_employer),
        total_growth: round_money(total_growth),
        first_year_employee_contribution: round_money(first.contributions),
        first_year_employer_match: round_money(first.employer_contributions),
        first_year_tax_savings: round_money(
            first.contributions * percent_to_rate(clamp_percent(input.marginal_tax_percent)),
        ),
        years_at_limit,
        unclaimed_match,
        yearly_breakdown: yearly_breakdown.iter().map(GrowthYear::rounded).collect(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "401(k): yearly salary-based deferrals within the limit, capped employer match, monthly compounding",
        &serde_json::json!({
            "deferral_limit": DEFERRAL_LIMIT.to_string(),
            "catch_up_limit": CATCH_UP_LIMIT.to_string(),
            "catch_up_age": CATCH_UP_AGE,
        }),
        warnings,
        elapsed,
        output,
    )
}
