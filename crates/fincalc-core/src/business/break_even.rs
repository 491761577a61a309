use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::non_negative;
use crate::types::{
    ratio_percent, round_money, round_percent, with_metadata, ComputationOutput, Money, Percent,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenInput {
    pub fixed_costs: Money,
    pub price_per_unit: Money,
    pub variable_cost_per_unit: Money,
    #[serde(default)]
    pub target_profit: Money,
    /// Planned sales volume, for profit and margin of safety.
    #[serde(default)]
    pub expected_units: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenOutput {
    pub contribution_margin_per_unit: Money,
    pub contribution_margin_ratio_percent: Percent,
    /// `None` when each unit sells at or below its variable cost.
    pub break_even_units: Option<Decimal>,
    pub break_even_revenue: Option<Money>,
    pub units_for_target_profit: Option<Decimal>,
    pub revenue_for_target_profit: Option<Money>,
    pub expected_profit: Option<Money>,
    pub margin_of_safety_percent: Option<Percent>,
}

/// Whole units needed to cover `costs` at `margin` per unit.
fn units_to_cover(costs: Money, margin: Money) -> Decimal {
    (costs / margin).ceil()
}

/// Units and revenue needed to break even or hit a profit target.
pub fn calculate_break_even(input: &BreakEvenInput) -> ComputationOutput<BreakEvenOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let fixed = non_negative(input.fixed_costs);
    let price = non_negative(input.price_per_unit);
    let variable = non_negative(input.variable_cost_per_unit);
    let margin = price - variable;
    let viable = margin > Decimal::ZERO;
    if !viable {
        warnings.push("Price does not exceed variable cost; break-even is unreachable".into());
    }

    let break_even_units = viable.then(|| units_to_cover(fixed, margin));
    let units_for_target = viable.then(|| units_to_cover(fixed + non_negative(input.target_profit), margin));

    let expected_units = input.expected_units.map(non_negative);
    let expected_profit = expected_units.map(|u| u * margin - fixed);
    let margin_of_safety = match (expected_units, break_even_units) {
        (Some(expected), Some(be)) if expected > Decimal::ZERO => {
            Some(round_percent(ratio_percent(expected - be, expected)))
        }
        _ => None,
    };
    if matches!(expected_profit, Some(p) if p < Decimal::ZERO) {
        warnings.push("Expected volume is below break-even; the plan runs at a loss".into());
    }

    let output = BreakEvenOutput {
        contribution_margin_per_unit: round_money(margin),
        contribution_margin_ratio_percent: round_percent(ratio_percent(margin, price)),
        break_even_units,
        break_even_revenue: break_even_units.map(|u| round_money(u * price)),
        units_for_target_profit: units_for_target,
        revenue_for_target_profit: units_for_target.map(|u| round_money(u * price)),
        expected_profit: expected_profit.map(round_money),
        margin_of_safety_percent: margin_of_safety,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Break-even: fixed costs over unit contribution margin, rounded up to whole units",
        &serde_json::json!({ "unit_rounding": "ceiling" }),
        warnings,
        elapsed,
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_input() -> BreakEvenInput {
        BreakEvenInput {
            fixed_costs: dec!(50_000),
            price_per_unit: dec!(25),
            variable_cost_per_unit: dec!(15),
            target_profit: dec!(20_000),
            expected_units: Some(dec!(8_000)),
        }
    }

    #[test]
    fn test_break_even_units_and_revenue() {
        let out = calculate_break_even(&default_input());
        let r = &out.result;
        assert_eq!(r.contribution_margin_per_unit, dec!(10));
        assert_eq!(r.contribution_margin_ratio_percent, dec!(40));
        assert_eq!(r.break_even_units, Some(dec!(5_000)));
        assert_eq!(r.break_even_revenue, Some(dec!(125_000)));
        assert_eq!(r.units_for_target_profit, Some(dec!(7_000)));
        assert_eq!(r.expected_profit, Some(dec!(30_000)));
        assert_eq!(r.margin_of_safety_percent, Some(dec!(37.5)));
    }

    #[test]
    fn test_partial_units_round_up() {
        let mut input = default_input();
        input.fixed_costs = dec!(50_001);
        let out = calculate_break_even(&input);
        assert_eq!(out.result.break_even_units, Some(dec!(5_001)));
    }

    #[test]
    fn test_negative_margin_is_unreachable() {
        let mut input = default_input();
        input.variable_cost_per_unit = dec!(30);
        let out = calculate_break_even(&input);
        assert_eq!(out.result.break_even_units, None);
        assert_eq!(out.result.margin_of_safety_percent, None);
        // The expected-volume loss also warns.
        assert_eq!(out.warnings.len(), 2);
    }
}
