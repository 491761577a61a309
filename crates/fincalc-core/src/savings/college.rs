use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{non_negative, year_count};
use crate::savings::growth::project_growth;
use crate::time_value::{compound, payment_for_future_value, periodic_rate};
use crate::types::{
    percent_to_rate, ratio_percent, round_money, round_percent, with_metadata, CompoundFrequency,
    ComputationOutput, Money, Percent, MONTHS_PER_YEAR, OUT_OF_RANGE_WARNING,
};

fn default_start_age() -> Decimal {
    dec!(18)
}

fn default_years_of_college() -> Decimal {
    dec!(4)
}

fn default_education_inflation() -> Percent {
    dec!(5)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollegeInput {
    pub child_age: Decimal,
    #[serde(default = "default_start_age")]
    pub college_start_age: Decimal,
    /// Today's annual cost of tuition, fees, room and board.
    pub current_annual_cost: Money,
    #[serde(default = "default_years_of_college")]
    pub years_of_college: Decimal,
    #[serde(default = "default_education_inflation")]
    pub education_inflation_percent: Percent,
    #[serde(default)]
    pub current_savings: Money,
    #[serde(default)]
    pub monthly_contribution: Money,
    pub annual_return_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollegeYearCost {
    pub college_year: u32,
    pub cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollegeOutput {
    pub years_until_college: u32,
    pub projected_total_cost: Money,
    pub cost_by_year: Vec<CollegeYearCost>,
    pub projected_savings: Money,
    pub total_contributions: Money,
    pub investment_growth: Money,
    pub shortfall: Money,
    pub percent_funded: Percent,
    /// Monthly contribution from today that fully funds the projected cost.
    pub required_monthly_contribution: Money,
}

/// Project college costs and savings at enrollment.
pub fn calculate_college(input: &CollegeInput) -> ComputationOutput<CollegeOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let years_until = year_count(non_negative(input.college_start_age) - non_negative(input.child_age));
    let years_of_college = year_count(input.years_of_college);
    let inflation = percent_to_rate(non_negative(input.education_inflation_percent));
    let annual_cost = non_negative(input.current_annual_cost);

    // Each year of college is billed at the inflated cost for that year.
    let cost_by_year: Vec<(u32, Money)> = (0..years_of_college)
        .map(|k| (k + 1, annual_cost.saturating_mul(compound(inflation, years_until + k))))
        .collect();
    let projected_total_cost = cost_by_year
        .iter()
        .fold(Decimal::ZERO, |total, (_, cost)| total.saturating_add(*cost));

    let rate = non_negative(input.annual_return_percent);
    let projection = project_growth(
        input.current_savings,
        input.monthly_contribution,
        rate,
        years_until,
        CompoundFrequency::Monthly,
    );
    if projection.overflowed {
        warnings.push(OUT_OF_RANGE_WARNING.into());
    }
    let shortfall = (projected_total_cost - projection.final_balance).max(Decimal::ZERO);

    let months = years_until * MONTHS_PER_YEAR;
    let monthly_rate = periodic_rate(rate, MONTHS_PER_YEAR);
    let savings_alone = non_negative(input.current_savings).saturating_mul(compound(monthly_rate, months));
    let required_monthly_contribution =
        payment_for_future_value(projected_total_cost - savings_alone, monthly_rate, months, true);
    if months == 0 && shortfall > Decimal::ZERO {
        warnings.push("College starts now; the shortfall cannot be covered by monthly saving".into());
    }

    let output = CollegeOutput {
        years_until_college: years_until,
        projected_total_cost: round_money(projected_total_cost),
        cost_by_year: cost_by_year
            .into_iter()
            .map(|(college_year, cost)| CollegeYearCost {
                college_year,
                cost: round_money(cost),
            })
            .collect(),
        projected_savings: round_money(projection.final_balance),
        total_contributions: round_money(projection.total_contributions),
        investment_growth: round_money(projection.total_interest),
        shortfall: round_money(shortfall),
        percent_funded: round_percent(
            ratio_percent(projection.final_balance, projected_total_cost).min(dec!(100)),
        ),
        required_monthly_contribution: round_money(required_monthly_contribution),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "College savings: inflated annual cost per college year vs monthly-compounded savings",
        &serde_json::json!({
            "education_inflation_percent": input.education_inflation_percent.to_string(),
            "years_of_college": years_of_college,
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

    fn default_input() -> CollegeInput {
        CollegeInput {
            child_age: dec!(5),
            college_start_age: dec!(18),
            current_annual_cost: dec!(25_000),
            years_of_college: dec!(4),
            education_inflation_percent: dec!(5),
            current_savings: dec!(10_000),
            monthly_contribution: dec!(200),
            annual_return_percent: dec!(6),
        }
    }

    #[test]
    fn test_cost_inflates_each_year() {
        let out = calculate_college(&default_input());
        let r = &out.result;
        assert_eq!(r.years_until_college, 13);
        assert_eq!(r.cost_by_year.len(), 4);
        assert!(r.cost_by_year[3].cost > r.cost_by_year[0].cost);
        // 25k * 1.05^13 ≈ 47,141
        assert!((r.cost_by_year[0].cost - dec!(47_141)).abs() < dec!(5));
    }

    #[test]
    fn test_required_contribution_closes_gap() {
        let out = calculate_college(&default_input());
        let r = &out.result;
        assert!(r.shortfall > Decimal::ZERO);
        let funded = project_growth(
            dec!(10_000),
            r.required_monthly_contribution,
            dec!(6),
            13,
            CompoundFrequency::Monthly,
        );
        assert!((funded.final_balance - r.projected_total_cost).abs() < dec!(2));
    }

    #[test]
    fn test_fully_funded() {
        let mut input = default_input();
        input.current_savings = dec!(250_000);
        let out = calculate_college(&input);
        assert_eq!(out.result.shortfall, Decimal::ZERO);
        assert_eq!(out.result.percent_funded, dec!(100));
        assert_eq!(out.result.required_monthly_contribution, Decimal::ZERO);
    }

    #[test]
    fn test_child_already_college_age() {
        let mut input = default_input();
        input.child_age = dec!(19);
        let out = calculate_college(&input);
        assert_eq!(out.result.years_until_college, 0);
        assert_eq!(out.result.projected_savings, dec!(10_000));
        assert_eq!(out.warnings.len(), 1);
    }
}
