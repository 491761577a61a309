use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{clamp_percent, non_negative, years_to_months};
use crate::time_value::{level_payment, periodic_rate};
use crate::types::{
    ratio_percent, round_money, round_percent, with_metadata, ComputationOutput, Money, Percent,
    MONTHS_PER_YEAR,
};

fn default_front_end() -> Percent {
    dec!(28)
}

fn default_back_end() -> Percent {
    dec!(36)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityInput {
    pub annual_income: Money,
    /// Car loans, student loans, card minimums and other recurring debts.
    #[serde(default)]
    pub monthly_debts: Money,
    #[serde(default)]
    pub down_payment: Money,
    pub annual_rate_percent: Percent,
    pub term_years: Decimal,
    /// Annual property tax as a percentage of the home price.
    #[serde(default)]
    pub property_tax_rate_percent: Percent,
    #[serde(default)]
    pub home_insurance_annual: Money,
    #[serde(default)]
    pub hoa_monthly: Money,
    #[serde(default = "default_front_end")]
    pub front_end_dti_percent: Percent,
    #[serde(default = "default_back_end")]
    pub back_end_dti_percent: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitingRatio {
    FrontEnd,
    BackEnd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityOutput {
    pub max_home_price: Money,
    pub max_loan_amount: Money,
    pub max_housing_payment: Money,
    pub monthly_principal_interest: Money,
    pub monthly_property_tax: Money,
    pub monthly_insurance: Money,
    pub monthly_hoa: Money,
    pub front_end_ratio_percent: Percent,
    pub back_end_ratio_percent: Percent,
    pub limiting_ratio: LimitingRatio,
}

/// Maximum affordable home price for an income and debt load.
pub fn calculate_affordability(input: &AffordabilityInput) -> ComputationOutput<AffordabilityOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let months_per_year = Decimal::from(MONTHS_PER_YEAR);
    let monthly_income = non_negative(input.annual_income) / months_per_year;
    let monthly_debts = non_negative(input.monthly_debts);
    let down_payment = non_negative(input.down_payment);

    let front_limit = monthly_income * clamp_percent(input.front_end_dti_percent) / dec!(100);
    let back_limit = (monthly_income * clamp_percent(input.back_end_dti_percent) / dec!(100)
        - monthly_debts)
        .max(Decimal::ZERO);
    let (budget, limiting_ratio) = if back_limit < front_limit {
        (back_limit, LimitingRatio::BackEnd)
    } else {
        (front_limit, LimitingRatio::FrontEnd)
    };

    let monthly_insurance = non_negative(input.home_insurance_annual) / months_per_year;
    let monthly_hoa = non_negative(input.hoa_monthly);
    let tax_per_dollar = non_negative(input.property_tax_rate_percent) / dec!(100) / months_per_year;
    let pi_per_dollar = level_payment(
        Decimal::ONE,
        periodic_rate(non_negative(input.annual_rate_percent), MONTHS_PER_YEAR),
        years_to_months(input.term_years),
    );

    // budget - fixed = pi * (price - down) + tax * price
    let available = budget - monthly_insurance - monthly_hoa;
    let denom = pi_per_dollar + tax_per_dollar;
    let max_home_price = if available <= Decimal::ZERO || denom.is_zero() {
        warnings.push("Income does not cover insurance and dues; no mortgage is affordable".into());
        down_payment
    } else {
        ((available + pi_per_dollar * down_payment) / denom).max(down_payment)
    };
    let max_loan_amount = (max_home_price - down_payment).max(Decimal::ZERO);

    let monthly_principal_interest = pi_per_dollar * max_loan_amount;
    let monthly_property_tax = tax_per_dollar * max_home_price;
    let housing = monthly_principal_interest + monthly_property_tax + monthly_insurance + monthly_hoa;

    let output = AffordabilityOutput {
        max_home_price: round_money(max_home_price),
        max_loan_amount: round_money(max_loan_amount),
        max_housing_payment: round_money(budget),
        monthly_principal_interest: round_money(monthly_principal_interest),
        monthly_property_tax: round_money(monthly_property_tax),
        monthly_insurance: round_money(monthly_insurance),
        monthly_hoa: round_money(monthly_hoa),
        front_end_ratio_percent: round_percent(ratio_percent(housing, monthly_income)),
        back_end_ratio_percent: round_percent(ratio_percent(housing + monthly_debts, monthly_income)),
        limiting_ratio,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Home affordability: min of front-end and back-end DTI budgets solved for price",
        &serde_json::json!({
            "front_end_dti_percent": input.front_end_dti_percent.to_string(),
            "back_end_dti_percent": input.back_end_dti_percent.to_string(),
        }),
        warnings,
        elapsed,
        output,
    )
}
