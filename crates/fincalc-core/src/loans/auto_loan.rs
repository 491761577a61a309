use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loans::amortization::{amortize_terms, ScheduleRow};
use crate::normalize::{non_negative, LoanTerms};
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Percent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoLoanInput {
    pub vehicle_price: Money,
    #[serde(default)]
    pub down_payment: Money,
    #[serde(default)]
    pub trade_in_value: Money,
    /// Payoff still owed on the trade-in; rolled into the new loan.
    #[serde(default)]
    pub trade_in_payoff: Money,
    #[serde(default)]
    pub sales_tax_percent: Percent,
    /// Title, registration and documentation fees financed with the car.
    #[serde(default)]
    pub fees: Money,
    pub annual_rate_percent: Percent,
    pub term_months: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoLoanOutput {
    pub sales_tax: Money,
    pub negative_equity: Money,
    pub amount_financed: Money,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_of_payments: Money,
    /// Down payment, trade-in equity and every loan payment.
    pub total_cost: Money,
    pub schedule: Vec<ScheduleRow>,
}

/// Auto loan payment with taxes, fees and trade-in equity.
pub fn calculate_auto_loan(input: &AutoLoanInput) -> ComputationOutput<AutoLoanOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let price = non_negative(input.vehicle_price);
    let trade_in = non_negative(input.trade_in_value);
    let trade_in_payoff = non_negative(input.trade_in_payoff);
    let down_payment = non_negative(input.down_payment);

    // Most states tax the price net of the trade-in allowance
    let taxable = (price - trade_in).max(Decimal::ZERO);
    let sales_tax = taxable * non_negative(input.sales_tax_percent) / dec!(100);
    let negative_equity = (trade_in_payoff - trade_in).max(Decimal::ZERO);
    let trade_equity = (trade_in - trade_in_payoff).max(Decimal::ZERO);

    let gross = price + sales_tax + non_negative(input.fees) + negative_equity;
    let credits = down_payment + trade_equity;
    if credits > gross {
        warnings.push("Down payment and trade-in cover the full purchase; nothing financed".into());
    }
    let amount_financed = (gross - credits).max(Decimal::ZERO);
    if negative_equity > Decimal::ZERO {
        warnings.push(format!(
            "Trade-in is underwater by {}; the shortfall is financed",
            round_money(negative_equity)
        ));
    }

    let terms = LoanTerms::new(amount_financed, input.annual_rate_percent, input.term_months);
    let loan = amortize_terms(&terms, Decimal::ZERO);

    let output = AutoLoanOutput {
        sales_tax: round_money(sales_tax),
        negative_equity: round_money(negative_equity),
        amount_financed: round_money(amount_financed),
        monthly_payment: round_money(loan.payment),
        total_interest: round_money(loan.total_interest),
        total_of_payments: round_money(loan.total_payment),
        total_cost: round_money(down_payment + trade_equity.min(gross) + loan.total_payment),
        schedule: loan.schedule.iter().map(ScheduleRow::rounded).collect(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Auto loan: sales tax on price net of trade-in, fees and negative equity financed",
        &serde_json::json!({
            "term_months": terms.term_periods,
            "annual_rate_percent": terms.annual_rate_percent.to_string(),
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

    fn default_input() -> AutoLoanInput {
        AutoLoanInput {
            vehicle_price: dec!(35_000),
            down_payment: dec!(5_000),
            trade_in_value: dec!(8_000),
            trade_in_payoff: Decimal::ZERO,
            sales_tax_percent: dec!(7),
            fees: dec!(500),
            annual_rate_percent: dec!(6.9),
            term_months: dec!(60),
        }
    }

    #[test]
    fn test_amount_financed() {
        let out = calculate_auto_loan(&default_input());
        let r = &out.result;
        // tax = 7% of (35k - 8k) = 1890
        assert_eq!(r.sales_tax, dec!(1890));
        // 35000 + 1890 + 500 - 5000 - 8000
        assert_eq!(r.amount_financed, dec!(24_390));
        assert_eq!(r.schedule.len(), 60);
        assert!(r.monthly_payment > dec!(480) && r.monthly_payment < dec!(483));
    }

    #[test]
    fn test_underwater_trade_in_is_financed() {
        let mut input = default_input();
        input.trade_in_payoff = dec!(10_000);
        let out = calculate_auto_loan(&input);
        assert_eq!(out.result.negative_equity, dec!(2_000));
        // 35000 + 1890 + 500 + 2000 - 5000
        assert_eq!(out.result.amount_financed, dec!(34_390));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_cash_purchase_finances_nothing() {
        let mut input = default_input();
        input.down_payment = dec!(50_000);
        let out = calculate_auto_loan(&input);
        assert_eq!(out.result.amount_financed, Decimal::ZERO);
        assert_eq!(out.result.monthly_payment, Decimal::ZERO);
        assert!(out.result.schedule.is_empty());
    }
}
