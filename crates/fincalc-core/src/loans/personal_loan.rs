use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loans::amortization::{amortize, ScheduleRow};
use crate::loans::apr::solve_apr;
use crate::normalize::{clamp_percent, non_negative, period_count};
use crate::types::{round_money, round_percent, with_metadata, ComputationOutput, Money, Percent};

/// How the origination fee is collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeTreatment {
    /// Withheld from the disbursement; the borrower receives less cash.
    #[default]
    Deducted,
    /// Added on top of the requested amount and financed.
    Financed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalLoanInput {
    pub loan_amount: Money,
    pub annual_rate_percent: Percent,
    pub term_months: Decimal,
    #[serde(default)]
    pub origination_fee_percent: Percent,
    #[serde(default)]
    pub fee_treatment: FeeTreatment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalLoanOutput {
    pub origination_fee: Money,
    pub principal: Money,
    pub cash_received: Money,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_of_payments: Money,
    /// Interest plus the origination fee.
    pub total_cost_of_borrowing: Money,
    pub apr_percent: Percent,
    pub schedule: Vec<ScheduleRow>,
}

/// Personal loan payment and APR including the origination fee.
pub fn calculate_personal_loan(input: &PersonalLoanInput) -> ComputationOutput<PersonalLoanOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let requested = non_negative(input.loan_amount);
    let rate = non_negative(input.annual_rate_percent);
    let months = period_count(input.term_months);
    let fee = requested * clamp_percent(input.origination_fee_percent) / dec!(100);

    let (principal, cash_received) = match input.fee_treatment {
        FeeTreatment::Deducted => (requested, requested - fee),
        FeeTreatment::Financed => (requested + fee, requested),
    };

    let loan = amortize(principal, rate, months);
    let apr = solve_apr(principal, rate, months, principal - cash_received);
    if !apr.converged {
        warnings.push("APR search did not converge; APR is approximate".into());
    }

    let output = PersonalLoanOutput {
        origination_fee: round_money(fee),
        principal: round_money(principal),
        cash_received: round_money(cash_received),
        monthly_payment: round_money(loan.payment),
        total_interest: round_money(loan.total_interest),
        total_of_payments: round_money(loan.total_payment),
        total_cost_of_borrowing: round_money(loan.total_payment - cash_received.max(Decimal::ZERO)),
        apr_percent: round_percent(apr.apr_percent),
        schedule: loan.schedule.iter().map(ScheduleRow::rounded).collect(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Personal loan: level-payment amortization, APR solved against cash received",
        &serde_json::json!({
            "term_months": months,
            "fee_treatment": format!("{:?}", input.fee_treatment),
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

    fn default_input() -> PersonalLoanInput {
        PersonalLoanInput {
            loan_amount: dec!(10_000),
            annual_rate_percent: dec!(12),
            term_months: dec!(36),
            origination_fee_percent: dec!(5),
            fee_treatment: FeeTreatment::Deducted,
        }
    }

    #[test]
    fn test_deducted_fee_reduces_cash() {
        let out = calculate_personal_loan(&default_input());
        let r = &out.result;
        assert_eq!(r.origination_fee, dec!(500));
        assert_eq!(r.cash_received, dec!(9_500));
        assert_eq!(r.principal, dec!(10_000));
        assert!(r.apr_percent > dec!(15) && r.apr_percent < dec!(16.5));
    }

    #[test]
    fn test_financed_fee_increases_principal() {
        let mut input = default_input();
        input.fee_treatment = FeeTreatment::Financed;
        let out = calculate_personal_loan(&input);
        let r = &out.result;
        assert_eq!(r.principal, dec!(10_500));
        assert_eq!(r.cash_received, dec!(10_000));
        assert!(r.apr_percent > dec!(12));
    }

    #[test]
    fn test_no_fee_apr_matches_rate() {
        let mut input = default_input();
        input.origination_fee_percent = Decimal::ZERO;
        let out = calculate_personal_loan(&input);
        assert!((out.result.apr_percent - dec!(12)).abs() < dec!(0.02));
        assert_eq!(
            out.result.total_cost_of_borrowing,
            out.result.total_interest
        );
    }
}
