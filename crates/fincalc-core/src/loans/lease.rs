use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{clamp_percent, non_negative, period_count};
use crate::types::{round_money, round_percent, with_metadata, ComputationOutput, Money, Percent};

/// APR percent = money factor * 2400.
const MONEY_FACTOR_TO_APR: Decimal = dec!(2400);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseInput {
    pub msrp: Money,
    /// Negotiated selling price; defaults to MSRP when zero.
    #[serde(default)]
    pub negotiated_price: Money,
    #[serde(default)]
    pub down_payment: Money,
    #[serde(default)]
    pub trade_in_value: Money,
    #[serde(default)]
    pub acquisition_fee: Money,
    /// Residual value as a percentage of MSRP.
    pub residual_percent: Percent,
    pub term_months: Decimal,
    /// Quoted money factor, e.g. 0.00125. Takes precedence over the rate.
    #[serde(default)]
    pub money_factor: Option<Decimal>,
    #[serde(default)]
    pub annual_rate_percent: Percent,
    #[serde(default)]
    pub sales_tax_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseOutput {
    pub gross_cap_cost: Money,
    pub cap_cost_reduction: Money,
    pub adjusted_cap_cost: Money,
    pub residual_value: Money,
    pub money_factor: Decimal,
    pub equivalent_apr_percent: Percent,
    pub monthly_depreciation: Money,
    pub monthly_finance_fee: Money,
    pub base_monthly_payment: Money,
    pub monthly_tax: Money,
    pub total_monthly_payment: Money,
    pub total_depreciation: Money,
    pub total_finance_charges: Money,
    pub total_tax: Money,
    /// Every payment plus the amount paid at signing.
    pub total_lease_cost: Money,
}

/// Monthly lease payment and total cost of the lease.
pub fn calculate_lease(input: &LeaseInput) -> ComputationOutput<LeaseOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let msrp = non_negative(input.msrp);
    let price = if input.negotiated_price > Decimal::ZERO {
        input.negotiated_price
    } else {
        msrp
    };
    let term = period_count(input.term_months);
    let term_dec = Decimal::from(term);

    let gross_cap_cost = price + non_negative(input.acquisition_fee);
    let cap_cost_reduction = non_negative(input.down_payment) + non_negative(input.trade_in_value);
    let mut adjusted_cap_cost = gross_cap_cost - cap_cost_reduction;
    if adjusted_cap_cost < Decimal::ZERO {
        warnings.push("Down payment and trade-in exceed the capitalized cost".into());
        adjusted_cap_cost = Decimal::ZERO;
    }

    let residual_value = msrp * clamp_percent(input.residual_percent) / dec!(100);
    let depreciation = adjusted_cap_cost - residual_value;
    if depreciation < Decimal::ZERO {
        warnings.push("Residual value exceeds the adjusted cap cost; depreciation fee is zero".into());
    }
    let monthly_depreciation = depreciation.max(Decimal::ZERO) / term_dec;

    let money_factor = match input.money_factor {
        Some(mf) => non_negative(mf),
        None => non_negative(input.annual_rate_percent) / MONEY_FACTOR_TO_APR,
    };
    let monthly_finance_fee = (adjusted_cap_cost + residual_value) * money_factor;

    let base_monthly_payment = monthly_depreciation + monthly_finance_fee;
    let monthly_tax = base_monthly_payment * non_negative(input.sales_tax_percent) / dec!(100);
    let total_monthly_payment = base_monthly_payment + monthly_tax;

    let output = LeaseOutput {
        gross_cap_cost: round_money(gross_cap_cost),
        cap_cost_reduction: round_money(cap_cost_reduction),
        adjusted_cap_cost: round_money(adjusted_cap_cost),
        residual_value: round_money(residual_value),
        money_factor,
        equivalent_apr_percent: round_percent(money_factor * MONEY_FACTOR_TO_APR),
        monthly_depreciation: round_money(monthly_depreciation),
        monthly_finance_fee: round_money(monthly_finance_fee),
        base_monthly_payment: round_money(base_monthly_payment),
        monthly_tax: round_money(monthly_tax),
        total_monthly_payment: round_money(total_monthly_payment),
        total_depreciation: round_money(monthly_depreciation * term_dec),
        total_finance_charges: round_money(monthly_finance_fee * term_dec),
        total_tax: round_money(monthly_tax * term_dec),
        total_lease_cost: round_money(total_monthly_payment * term_dec + cap_cost_reduction),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Lease: depreciation fee plus money-factor finance fee, taxed monthly",
        &serde_json::json!({
            "term_months": term,
            "money_factor_source": if input.money_factor.is_some() { "quoted" } else { "apr" },
        }),
        warnings,
        elapsed,
        output,
    )
}
