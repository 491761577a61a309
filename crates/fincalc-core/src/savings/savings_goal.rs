use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{non_negative, year_count};
use crate::savings::growth::{project_growth, GrowthProjection};
use crate::time_value::compound;
use crate::types::{
    percent_to_rate, round_money, with_metadata, CompoundFrequency, ComputationOutput, Money,
    Percent, OUT_OF_RANGE_WARNING,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoalInput {
    #[serde(default)]
    pub initial_balance: Money,
    #[serde(default)]
    pub monthly_contribution: Money,
    pub annual_rate_percent: Percent,
    pub years: Decimal,
    #[serde(default)]
    pub compound_frequency: CompoundFrequency,
    #[serde(default)]
    pub goal_amount: Option<Money>,
    /// Used only to restate the final balance in today's dollars.
    #[serde(default)]
    pub inflation_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoalOutput {
    pub projection: GrowthProjection,
    pub inflation_adjusted_balance: Money,
    pub goal_amount: Option<Money>,
    pub goal_reached: Option<bool>,
    /// First projection year whose closing balance meets the goal.
    pub goal_reached_year: Option<u32>,
    /// Level monthly contribution that lands exactly on the goal.
    pub required_monthly_contribution: Option<Money>,
}

/// Project savings growth and, when a goal is given, the contribution
/// needed to reach it.
pub fn calculate_savings_goal(input: &SavingsGoalInput) -> ComputationOutput<SavingsGoalOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let years = year_count(input.years);
    let rate = non_negative(input.annual_rate_percent);
    let frequency = input.compound_frequency;
    let projection = project_growth(
        input.initial_balance,
        input.monthly_contribution,
        rate,
        years,
        frequency,
    );

    if projection.overflowed {
        warnings.push(OUT_OF_RANGE_WARNING.into());
    }

    let deflator = compound(percent_to_rate(non_negative(input.inflation_percent)), years);
    let inflation_adjusted_balance = projection.final_balance / deflator;

    let goal = input.goal_amount.map(non_negative);
    let mut required_monthly_contribution = None;
    let mut goal_reached_year = None;
    if let Some(goal) = goal {
        goal_reached_year = projection
            .yearly_breakdown
            .iter()
            .find(|y| y.balance >= goal)
            .map(|y| y.year);

        // The projection is linear in the contribution, so solve with one
        // unit-contribution run and one initial-balance-only run.
        let from_initial = project_growth(input.initial_balance, Decimal::ZERO, rate, years, frequency);
        let per_unit = project_growth(Decimal::ZERO, Decimal::ONE, rate, years, frequency);
        let remaining = goal - from_initial.final_balance;
        required_monthly_contribution = Some(if remaining <= Decimal::ZERO {
            Decimal::ZERO
        } else if per_unit.final_balance.is_zero() {
            warnings.push("Zero-year horizon; the goal cannot be funded by contributions".into());
            Decimal::ZERO
        } else {
            remaining / per_unit.final_balance
        });
    }

    let output = SavingsGoalOutput {
        goal_reached: goal.map(|g| projection.final_balance >= g),
        projection: projection.rounded(),
        inflation_adjusted_balance: round_money(inflation_adjusted_balance),
        goal_amount: goal.map(round_money),
        goal_reached_year,
        required_monthly_contribution: required_monthly_contribution.map(round_money),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Savings goal: contribute-then-grow projection with linear contribution solve",
        &serde_json::json!({
            "years": years,
            "compound_frequency": frequency,
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

    fn default_input() -> SavingsGoalInput {
        SavingsGoalInput {
            initial_balance: dec!(5_000),
            monthly_contribution: dec!(300),
            annual_rate_percent: dec!(5),
            years: dec!(10),
            compound_frequency: CompoundFrequency::Monthly,
            goal_amount: Some(dec!(60_000)),
            inflation_percent: Decimal::ZERO,
        }
    }

    #[test]
    fn test_required_contribution_hits_goal() {
        let out = calculate_savings_goal(&default_input());
        let required = out.result.required_monthly_contribution.unwrap();
        let check = project_growth(dec!(5_000), required, dec!(5), 10, CompoundFrequency::Monthly);
        // Contribution is rounded to cents; 120 deposits stay within a few dollars.
        assert!((check.final_balance - dec!(60_000)).abs() < dec!(1));
    }

    #[test]
    fn test_goal_already_met_needs_nothing() {
        let mut input = default_input();
        input.initial_balance = dec!(100_000);
        let out = calculate_savings_goal(&input);
        assert_eq!(out.result.required_monthly_contribution, Some(Decimal::ZERO));
        assert_eq!(out.result.goal_reached, Some(true));
        assert_eq!(out.result.goal_reached_year, Some(1));
    }

    #[test]
    fn test_yearly_compounding_solve() {
        let mut input = default_input();
        input.compound_frequency = CompoundFrequency::Yearly;
        let out = calculate_savings_goal(&input);
        let required = out.result.required_monthly_contribution.unwrap();
        let check = project_growth(dec!(5_000), required, dec!(5), 10, CompoundFrequency::Yearly);
        assert!((check.final_balance - dec!(60_000)).abs() < dec!(1));
    }

    #[test]
    fn test_inflation_adjustment() {
        let mut input = default_input();
        input.inflation_percent = dec!(3);
        let out = calculate_savings_goal(&input);
        assert!(out.result.inflation_adjusted_balance < out.result.projection.final_balance);
    }

    #[test]
    fn test_no_goal() {
        let mut input = default_input();
        input.goal_amount = None;
        let out = calculate_savings_goal(&input);
        assert!(out.result.goal_reached.is_none());
        assert!(out.result.required_monthly_contribution.is_none());
    }

    #[test]
    fn test_runaway_rate_warns_instead_of_failing() {
        let mut input = default_input();
        input.annual_rate_percent = dec!(100_000);
        input.years = dec!(1_000);
        let out = calculate_savings_goal(&input);
        assert!(out.result.projection.overflowed);
        assert!(out.result.projection.yearly_breakdown.len() < 10);
        assert!(out.warnings.iter().any(|w| w == OUT_OF_RANGE_WARNING));
    }
}
