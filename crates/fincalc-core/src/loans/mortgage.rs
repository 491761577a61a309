use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loans::amortization::{amortize_terms, yearly_summary, AmortizationYear, ScheduleRow};
use crate::normalize::{non_negative, LoanTerms};
use crate::types::{
    ratio_percent, round_money, round_percent, with_metadata, ComputationOutput, Money, Percent,
    MONTHS_PER_YEAR,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// PMI is charged while the balance exceeds this share of the purchase price.
const PMI_LTV_THRESHOLD: Decimal = dec!(0.80);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    pub home_price: Money,
    pub down_payment: Money,
    pub annual_rate_percent: Percent,
    pub term_years: Decimal,
    #[serde(default)]
    pub property_tax_annual: Money,
    #[serde(default)]
    pub home_insurance_annual: Money,
    /// Annual PMI premium as a percentage of the original loan amount.
    #[serde(default)]
    pub pmi_rate_percent: Percent,
    #[serde(default)]
    pub hoa_monthly: Money,
    #[serde(default)]
    pub extra_monthly_payment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageOutput {
    pub loan_amount: Money,
    pub down_payment_percent: Percent,
    pub loan_to_value_percent: Percent,
    pub monthly_principal_interest: Money,
    pub monthly_property_tax: Money,
    pub monthly_insurance: Money,
    pub monthly_pmi: Money,
    pub monthly_hoa: Money,
    pub total_monthly_payment: Money,
    pub payoff_months: u32,
    pub pmi_months: u32,
    pub total_pmi: Money,
    pub total_interest: Money,
    pub total_principal_interest_paid: Money,
    /// Down payment plus every payment (P&I, tax, insurance, PMI, HOA) until payoff.
    pub total_cost_of_home: Money,
    pub interest_saved: Money,
    pub months_saved: u32,
    pub schedule: Vec<ScheduleRow>,
    pub yearly_summary: Vec<AmortizationYear>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Full monthly housing cost and amortization for a fixed-rate mortgage.
pub fn calculate_mortgage(input: &MortgageInput) -> ComputationOutput<MortgageOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let home_price = non_negative(input.home_price);
    let mut down_payment = non_negative(input.down_payment);
    if down_payment > home_price {
        warnings.push("Down payment exceeds home price; capped at the price".into());
        down_payment = home_price;
    }
    let loan_amount = home_price - down_payment;
    let terms = LoanTerms::from_years(loan_amount, input.annual_rate_percent, input.term_years);
    let extra = non_negative(input.extra_monthly_payment);

    let baseline = amortize_terms(&terms, Decimal::ZERO);
    let actual = if extra > Decimal::ZERO {
        amortize_terms(&terms, extra)
    } else {
        baseline.clone()
    };

    // --- Escrow and fees ---
    let months_per_year = Decimal::from(MONTHS_PER_YEAR);
    let monthly_property_tax = non_negative(input.property_tax_annual) / months_per_year;
    let monthly_insurance = non_negative(input.home_insurance_annual) / months_per_year;
    let monthly_hoa = non_negative(input.hoa_monthly);

    let pmi_cutoff = home_price * PMI_LTV_THRESHOLD;
    let pmi_required = loan_amount > pmi_cutoff && home_price > Decimal::ZERO;
    let monthly_pmi = if pmi_required {
        loan_amount * non_negative(input.pmi_rate_percent) / dec!(100) / months_per_year
    } else {
        Decimal::ZERO
    };
    let pmi_months = if monthly_pmi > Decimal::ZERO {
        actual
            .schedule
            .iter()
            .filter(|row| row.balance + row.principal > pmi_cutoff)
            .count() as u32
    } else {
        0
    };
    if pmi_required && input.pmi_rate_percent.is_zero() {
        warnings.push("Down payment is under 20% but no PMI rate was supplied".into());
    }

    let total_pmi = monthly_pmi * Decimal::from(pmi_months);
    let payoff_months = actual.periods();
    let escrow_total =
        (monthly_property_tax + monthly_insurance + monthly_hoa) * Decimal::from(payoff_months);
    let total_cost_of_home = down_payment + actual.total_payment + total_pmi + escrow_total;

    let monthly_principal_interest = actual.payment + extra.min(loan_amount);
    let total_monthly_payment =
        monthly_principal_interest + monthly_property_tax + monthly_insurance + monthly_pmi + monthly_hoa;

    let interest_saved = (baseline.total_interest - actual.total_interest).max(Decimal::ZERO);
    let months_saved = baseline.periods().saturating_sub(payoff_months);

    let yearly = yearly_summary(&actual.schedule, MONTHS_PER_YEAR);

    let output = MortgageOutput {
        loan_amount: round_money(loan_amount),
        down_payment_percent: round_percent(ratio_percent(down_payment, home_price)),
        loan_to_value_percent: round_percent(ratio_percent(loan_amount, home_price)),
        monthly_principal_interest: round_money(monthly_principal_interest),
        monthly_property_tax: round_money(monthly_property_tax),
        monthly_insurance: round_money(monthly_insurance),
        monthly_pmi: round_money(monthly_pmi),
        monthly_hoa: round_money(monthly_hoa),
        total_monthly_payment: round_money(total_monthly_payment),
        payoff_months,
        pmi_months,
        total_pmi: round_money(total_pmi),
        total_interest: round_money(actual.total_interest),
        total_principal_interest_paid: round_money(actual.total_payment),
        total_cost_of_home: round_money(total_cost_of_home),
        interest_saved: round_money(interest_saved),
        months_saved,
        schedule: actual.schedule.iter().map(ScheduleRow::rounded).collect(),
        yearly_summary: yearly.iter().map(AmortizationYear::rounded).collect(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Fixed-rate mortgage: level-payment amortization with escrow, PMI and extra principal",
        &serde_json::json!({
            "term_months": terms.term_periods,
            "pmi_ltv_threshold": PMI_LTV_THRESHOLD.to_string(),
            "extra_monthly_payment": extra.to_string(),
        }),
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_input() -> MortgageInput {
        MortgageInput {
            home_price: dec!(375_000),
            down_payment: dec!(75_000),
            annual_rate_percent: dec!(6.5),
            term_years: dec!(30),
            property_tax_annual: dec!(4_800),
            home_insurance_annual: dec!(1_800),
            pmi_rate_percent: dec!(0.5),
            hoa_monthly: Decimal::ZERO,
            extra_monthly_payment: Decimal::ZERO,
        }
    }

    #[test]
    fn test_twenty_percent_down_has_no_pmi() {
        let out = calculate_mortgage(&default_input());
        let r = &out.result;
        assert_eq!(r.loan_amount, dec!(300_000));
        assert_eq!(r.monthly_principal_interest, dec!(1896.20));
        assert_eq!(r.monthly_pmi, Decimal::ZERO);
        assert_eq!(r.monthly_property_tax, dec!(400));
        assert_eq!(r.monthly_insurance, dec!(150));
        assert_eq!(r.total_monthly_payment, dec!(2446.20));
        assert_eq!(r.payoff_months, 360);
        assert_eq!(r.down_payment_percent, dec!(20));
    }

    #[test]
    fn test_low_down_payment_charges_pmi_until_eighty_percent() {
        let mut input = default_input();
        input.down_payment = dec!(18_750); // 5% down
        let out = calculate_mortgage(&input);
        let r = &out.result;
        assert!(r.monthly_pmi > Decimal::ZERO);
        assert!(r.pmi_months > 0 && r.pmi_months < r.payoff_months);
        assert_eq!(r.total_pmi, round_money(r.monthly_pmi * Decimal::from(r.pmi_months)));
    }

    #[test]
    fn test_extra_payment_saves_interest() {
        let mut input = default_input();
        input.extra_monthly_payment = dec!(250);
        let out = calculate_mortgage(&input);
        let r = &out.result;
        assert!(r.payoff_months < 360);
        assert!(r.months_saved > 0);
        assert!(r.interest_saved > dec!(50_000));
        assert_eq!(r.schedule.last().unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_down_payment_above_price_is_capped() {
        let mut input = default_input();
        input.down_payment = dec!(500_000);
        let out = calculate_mortgage(&input);
        assert_eq!(out.result.loan_amount, Decimal::ZERO);
        assert!(out.result.schedule.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_yearly_summary_covers_term() {
        let out = calculate_mortgage(&default_input());
        assert_eq!(out.result.yearly_summary.len(), 30);
        assert_eq!(out.result.yearly_summary[29].ending_balance, Decimal::ZERO);
    }
}
