use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{clamp_percent, non_negative, MAX_YEARS};
use crate::savings::growth::{project_growth, GrowthYear};
use crate::types::{
    percent_to_rate, round_money, with_metadata, CompoundFrequency, ComputationOutput, Money,
    Percent, MONTHS_PER_YEAR, OUT_OF_RANGE_WARNING,
};

/// Annual IRA contribution limit (2024).
pub const IRA_LIMIT: Money = dec!(7_000);
pub const IRA_CATCH_UP: Money = dec!(1_000);
pub const IRA_CATCH_UP_AGE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Traditional,
    Roth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IraInput {
    pub current_age: u32,
    pub retirement_age: u32,
    #[serde(default)]
    pub current_balance: Money,
    pub annual_contribution: Money,
    pub annual_return_percent: Percent,
    pub current_tax_percent: Percent,
    pub retirement_tax_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountOutcome {
    pub account_type: AccountType,
    pub balance_at_retirement: Money,
    /// Value of the tax deduction taken while contributing.
    pub tax_savings_now: Money,
    /// Tax owed on withdrawal of the whole balance.
    pub tax_at_withdrawal: Money,
    pub after_tax_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IraOutput {
    pub years_to_retirement: u32,
    pub total_contributions: Money,
    pub total_growth: Money,
    pub traditional: AccountOutcome,
    pub roth: AccountOutcome,
    /// `None` when current and retirement tax rates are equal.
    pub better_account: Option<AccountType>,
    pub yearly_breakdown: Vec<GrowthYear>,
}

fn contribution_limit(age: u32) -> Money {
    if age >= IRA_CATCH_UP_AGE {
        IRA_LIMIT + IRA_CATCH_UP
    } else {
        IRA_LIMIT
    }
}

/// Compare traditional and Roth IRA outcomes at retirement.
pub fn calculate_ira(input: &IraInput) -> ComputationOutput<IraOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut years = input.retirement_age.saturating_sub(input.current_age);
    if years == 0 {
        warnings.push("Retirement age is not after current age; no contributions projected".into());
    }
    if years > MAX_YEARS {
        warnings.push(format!("Projection limited to {MAX_YEARS} years"));
        years = MAX_YEARS;
    }
    let requested = non_negative(input.annual_contribution);

    let mut balance = non_negative(input.current_balance);
    let mut yearly_breakdown: Vec<GrowthYear> = Vec::with_capacity(years as usize);
    let mut limited = false;
    for year in 1..=years {
        let limit = contribution_limit(input.current_age.saturating_add(year - 1));
        limited |= requested > limit;
        let contribution = requested.min(limit);
        let projection = project_growth(
            balance,
            contribution / Decimal::from(MONTHS_PER_YEAR),
            input.annual_return_percent,
            1,
            CompoundFrequency::Monthly,
        );
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
        warnings.push(format!(
            "Contribution limited to the IRA limit of {IRA_LIMIT} (plus {IRA_CATCH_UP} from age {IRA_CATCH_UP_AGE})"
        ));
    }

    let total_contributions: Money = yearly_breakdown.iter().map(|y| y.contributions).sum();
    let total_growth: Money = yearly_breakdown.iter().map(|y| y.interest).sum();
    let current_tax = percent_to_rate(clamp_percent(input.current_tax_percent));
    let retirement_tax = percent_to_rate(clamp_percent(input.retirement_tax_percent));

    let traditional_tax = balance * retirement_tax;
    let traditional = AccountOutcome {
        account_type: AccountType::Traditional,
        balance_at_retirement: round_money(balance),
        tax_savings_now: round_money(total_contributions * current_tax),
        tax_at_withdrawal: round_money(traditional_tax),
        after_tax_value: round_money(balance - traditional_tax),
    };
    let roth = AccountOutcome {
        account_type: AccountType::Roth,
        balance_at_retirement: round_money(balance),
        tax_savings_now: Decimal::ZERO,
        tax_at_withdrawal: Decimal::ZERO,
        after_tax_value: round_money(balance),
    };
    let better_account = match current_tax.cmp(&retirement_tax) {
        std::cmp::Ordering::Greater => Some(AccountType::Traditional),
        std::cmp::Ordering::Less => Some(AccountType::Roth),
        std::cmp::Ordering::Equal => None,
    };

    let output = IraOutput {
        years_to_retirement: years,
        total_contributions: round_money(total_contributions),
        total_growth: round_money(total_growth),
        traditional,
        roth,
        better_account,
        yearly_breakdown: yearly_breakdown.iter().map(GrowthYear::rounded).collect(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "IRA: identical growth, traditional taxed at withdrawal vs Roth taxed at contribution",
        &serde_json::json!({
            "contribution_limit": IRA_LIMIT.to_string(),
            "catch_up": IRA_CATCH_UP.to_string(),
            "catch_up_age": IRA_CATCH_UP_AGE,
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

    fn default_input() -> IraInput {
        IraInput {
            current_age: 30,
            retirement_age: 65,
            current_balance: Decimal::ZERO,
            annual_contribution: dec!(6_000),
            annual_return_percent: dec!(7),
            current_tax_percent: dec!(22),
            retirement_tax_percent: dec!(12),
        }
    }

    #[test]
    fn test_lower_retirement_tax_favors_traditional() {
        let out = calculate_ira(&default_input());
        let r = &out.result;
        assert_eq!(r.years_to_retirement, 35);
        assert_eq!(r.better_account, Some(AccountType::Traditional));
        assert!(r.roth.after_tax_value > r.traditional.after_tax_value);
        assert_eq!(r.traditional.balance_at_retirement, r.roth.balance_at_retirement);
        assert_eq!(r.traditional.tax_savings_now, dec!(46_200));
    }

    #[test]
    fn test_higher_retirement_tax_favors_roth() {
        let mut input = default_input();
        input.retirement_tax_percent = dec!(32);
        let out = calculate_ira(&input);
        assert_eq!(out.result.better_account, Some(AccountType::Roth));
    }

    #[test]
    fn test_catch_up_from_fifty() {
        let mut input = default_input();
        input.current_age = 48;
        input.annual_contribution = dec!(10_000);
        input.annual_return_percent = Decimal::ZERO;
        let out = calculate_ira(&input);
        let rows = &out.result.yearly_breakdown;
        assert_eq!(rows[0].contributions, dec!(7_000));
        assert_eq!(rows[2].contributions, dec!(8_000));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_already_retired() {
        let mut input = default_input();
        input.current_age = 70;
        input.current_balance = dec!(50_000);
        let out = calculate_ira(&input);
        assert_eq!(out.result.years_to_retirement, 0);
        assert_eq!(out.result.roth.balance_at_retirement, dec!(50_000));
    }

    #[test]
    fn test_distant_retirement_age_is_capped() {
        let mut input = default_input();
        input.retirement_age = u32::MAX;
        let out = calculate_ira(&input);
        assert_eq!(out.result.years_to_retirement, MAX_YEARS);
        assert_eq!(out.result.yearly_breakdown.len() as u32, MAX_YEARS);
        assert!(out.warnings.iter().any(|w| w.contains("limited to 100 years")));
    }
}
