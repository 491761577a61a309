use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{clamp_percent, non_negative, year_count};
use crate::savings::growth::{project_growth_with, GrowthParams, GrowthYear};
use crate::types::{
    percent_to_rate, round_money, with_metadata, CompoundFrequency, ComputationOutput, Money,
    Percent, MONTHS_PER_YEAR, OUT_OF_RANGE_WARNING,
};

/// 2024 contribution limits; employer money counts toward the limit.
pub const SELF_ONLY_LIMIT: Money = dec!(4_150);
pub const FAMILY_LIMIT: Money = dec!(8_300);
pub const HSA_CATCH_UP: Money = dec!(1_000);
pub const HSA_CATCH_UP_AGE: u32 = 55;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    #[default]
    SelfOnly,
    Family,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsaInput {
    #[serde(default)]
    pub coverage: Coverage,
    pub age: u32,
    pub annual_contribution: Money,
    #[serde(default)]
    pub employer_contribution: Money,
    #[serde(default)]
    pub current_balance: Money,
    pub annual_return_percent: Percent,
    pub years: Decimal,
    /// Combined marginal rate avoided on employee contributions.
    pub tax_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsaOutput {
    pub annual_limit: Money,
    pub employee_contribution: Money,
    pub employer_contribution: Money,
    /// Headroom left under the limit in the first year.
    pub remaining_room: Money,
    pub annual_tax_savings: Money,
    pub total_tax_savings: Money,
    pub final_balance: Money,
    pub total_contributions: Money,
    pub total_employer_contributions: Money,
    pub total_growth: Money,
    pub yearly_breakdown: Vec<GrowthYear>,
}

fn annual_limit(coverage: Coverage, age: u32) -> Money {
    let base = match coverage {
        Coverage::SelfOnly => SELF_ONLY_LIMIT,
        Coverage::Family => FAMILY_LIMIT,
    };
    if age >= HSA_CATCH_UP_AGE {
        base + HSA_CATCH_UP
    } else {
        base
    }
}

/// Project an HSA balance and the tax saved by contributing.
pub fn calculate_hsa(input: &HsaInput) -> ComputationOutput<HsaOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let years = year_count(input.years);
    let months = Decimal::from(MONTHS_PER_YEAR);
    let tax_rate = percent_to_rate(clamp_percent(input.tax_percent));
    let requested = non_negative(input.annual_contribution);

    let mut balance = non_negative(input.current_balance);
    let mut yearly_breakdown: Vec<GrowthYear> = Vec::with_capacity(years as usize);
    let mut first_year: Option<(Money, Money, Money)> = None;
    let mut total_tax_savings = Decimal::ZERO;
    let mut limited = false;

    for year in 1..=years.max(1) {
        let limit = annual_limit(input.coverage, input.age.saturating_add(year - 1));
        let employer = non_negative(input.employer_contribution).min(limit);
        let employee = requested.min(limit - employer);
        limited |= requested > employee;
        if first_year.is_none() {
            first_year = Some((limit, employee, employer));
        }
        if year > years {
            break;
        }
        total_tax_savings += employee * tax_rate;

        let params = GrowthParams {
            initial_balance: balance,
            monthly_contribution: employee / months,
            annual_rate_percent: input.annual_return_percent,
            years: 1,
            frequency: CompoundFrequency::Monthly,
            contribution_increase_percent: Decimal::ZERO,
        };
        let employer_monthly = employer / months;
        let projection = project_growth_with(&params, |_| employer_monthly);
        if projection.overflowed {
            warnings.push(OUT_OF_RANGE_WARNING.into());
            break;
        }
        balance = projection.final_balance;
        if let Some(row) = projection.yearly_breakdown.into_iter().next() {
            yearly_breakdown.push(GrowthYear { year, ..row });
        }
    }
    if limited {
        warnings.push("Employee contribution reduced to stay within the HSA limit".into());
    }

    let (limit, employee, employer) = first_year.unwrap_or_default();
    let output = HsaOutput {
        annual_limit: limit,
        employee_contribution: round_money(employee),
        employer_contribution: round_money(employer),
        remaining_room: round_money(limit - employee - employer),
        annual_tax_savings: round_money(employee * tax_rate),
        total_tax_savings: round_money(total_tax_savings),
        final_balance: round_money(balance),
        total_contributions: round_money(yearly_breakdown.iter().map(|y| y.contributions).sum()),
        total_employer_contributions: round_money(
            yearly_breakdown.iter().map(|y| y.employer_contributions).sum(),
        ),
        total_growth: round_money(yearly_breakdown.iter().map(|y| y.interest).sum()),
        yearly_breakdown: yearly_breakdown.iter().map(GrowthYear::rounded).collect(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "HSA: employer-first limit allocation, tax-free contributions and growth",
        &serde_json::json!({
            "self_only_limit": SELF_ONLY_LIMIT.to_string(),
            "family_limit": FAMILY_LIMIT.to_string(),
            "catch_up_age": HSA_CATCH_UP_AGE,
        }),
        warnings,
        elapsed,
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_input() -> HsaInput {
        HsaInput {
            coverage: Coverage::Family,
            age: 40,
            annual_contribution: dec!(6_000),
            employer_contribution: dec!(1_000),
            current_balance: Decimal::ZERO,
            annual_return_percent: Decimal::ZERO,
            years: dec!(10),
            tax_percent: dec!(30),
        }
    }

    #[test]
    fn test_family_limit_and_tax_savings() {
        let out = calculate_hsa(&default_input());
        let r = &out.result;
        assert_eq!(r.annual_limit, FAMILY_LIMIT);
        assert_eq!(r.employee_contribution, dec!(6_000));
        assert_eq!(r.remaining_room, dec!(1_300));
        assert_eq!(r.annual_tax_savings, dec!(1_800));
        assert_eq!(r.total_tax_savings, dec!(18_000));
        assert_eq!(r.final_balance, dec!(70_000));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_employer_money_counts_toward_limit() {
        let mut input = default_input();
        input.coverage = Coverage::SelfOnly;
        let out = calculate_hsa(&input);
        assert_eq!(out.result.employee_contribution, dec!(3_150));
        assert_eq!(out.result.remaining_room, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_catch_up_at_fifty_five() {
        let mut input = default_input();
        input.age = 55;
        input.annual_contribution = dec!(20_000);
        let out = calculate_hsa(&input);
        assert_eq!(out.result.annual_limit, FAMILY_LIMIT + HSA_CATCH_UP);
        assert_eq!(out.result.employee_contribution, dec!(8_300));
    }

    #[test]
    fn test_zero_years_still_reports_limits() {
        let mut input = default_input();
        input.years = Decimal::ZERO;
        let out = calculate_hsa(&input);
        assert_eq!(out.result.annual_limit, FAMILY_LIMIT);
        assert!(out.result.yearly_breakdown.is_empty());
        assert_eq!(out.result.total_tax_savings, Decimal::ZERO);
    }
}
