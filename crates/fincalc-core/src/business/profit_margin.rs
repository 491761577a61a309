use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::non_negative;
use crate::types::{
    percent_to_rate, ratio_percent, round_money, round_percent, with_metadata, ComputationOutput,
    Money, Percent,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitMarginInput {
    pub revenue: Money,
    pub cost_of_goods_sold: Money,
    #[serde(default)]
    pub operating_expenses: Money,
    #[serde(default)]
    pub interest_expense: Money,
    #[serde(default)]
    pub tax_rate_percent: Percent,
    /// Solve for the price that yields this gross margin on the unit cost.
    #[serde(default)]
    pub target_margin_percent: Option<Percent>,
    #[serde(default)]
    pub unit_cost: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitMarginOutput {
    pub gross_profit: Money,
    pub operating_profit: Money,
    pub pre_tax_profit: Money,
    pub taxes: Money,
    pub net_profit: Money,
    pub gross_margin_percent: Percent,
    pub operating_margin_percent: Percent,
    pub net_margin_percent: Percent,
    /// Gross profit over cost of goods sold.
    pub markup_percent: Percent,
    pub price_for_target_margin: Option<Money>,
}

/// Margin ladder from revenue down to net profit.
pub fn calculate_profit_margin(input: &ProfitMarginInput) -> ComputationOutput<ProfitMarginOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let revenue = non_negative(input.revenue);
    let cogs = non_negative(input.cost_of_goods_sold);
    let gross = revenue - cogs;
    let operating = gross - non_negative(input.operating_expenses);
    let pre_tax = operating - non_negative(input.interest_expense);
    // Losses are not taxed.
    let taxes = pre_tax.max(Decimal::ZERO) * percent_to_rate(non_negative(input.tax_rate_percent));
    let net = pre_tax - taxes;

    if revenue.is_zero() {
        warnings.push("Revenue is zero; margins are reported as zero".into());
    }

    let price_for_target_margin = match (input.target_margin_percent, input.unit_cost) {
        (Some(target), Some(cost)) => {
            let target = non_negative(target);
            if target >= dec!(100) {
                warnings.push("Target margin must be below 100%".into());
                None
            } else {
                Some(round_money(non_negative(cost) / (Decimal::ONE - percent_to_rate(target))))
            }
        }
        _ => None,
    };

    let output = ProfitMarginOutput {
        gross_profit: round_money(gross),
        operating_profit: round_money(operating),
        pre_tax_profit: round_money(pre_tax),
        taxes: round_money(taxes),
        net_profit: round_money(net),
        gross_margin_percent: round_percent(ratio_percent(gross, revenue)),
        operating_margin_percent: round_percent(ratio_percent(operating, revenue)),
        net_margin_percent: round_percent(ratio_percent(net, revenue)),
        markup_percent: round_percent(ratio_percent(gross, cogs)),
        price_for_target_margin,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Profit margins: gross, operating and net as a share of revenue",
        &serde_json::json!({ "tax_on_losses": false }),
        warnings,
        elapsed,
        output,
    )
}
