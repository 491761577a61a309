use fincalc_core::loans::amortization::{amortize, amortize_terms, yearly_summary};
use fincalc_core::loans::apr::{calculate_apr, solve_apr, AprInput};
use fincalc_core::loans::mortgage::{calculate_mortgage, MortgageInput};
use fincalc_core::normalize::LoanTerms;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Amortization tests
// ===========================================================================

#[test]
fn test_thirty_year_fixed_payment_and_interest() {
    let result = amortize(dec!(300_000), dec!(6.5), 360);

    // Standard 30-year table: 1,896.20 per month
    assert!((result.payment - dec!(1896.20)).abs() < dec!(0.01), "payment={}", result.payment);
    assert!(
        (result.total_interest - dec!(382_633)).abs() < dec!(1),
        "interest={}",
        result.total_interest
    );
    assert_eq!(result.periods(), 360);
}

#[test]
fn test_schedule_sums_reconcile() {
    let result = amortize(dec!(300_000), dec!(6.5), 360);

    let principal: Decimal = result.schedule.iter().map(|r| r.principal).sum();
    assert!((principal - dec!(300_000)).abs() < dec!(0.000001));

    let last = result.schedule.last().unwrap();
    assert_eq!(last.balance, Decimal::ZERO);

    let diff = result.total_payment - (dec!(300_000) + result.total_interest);
    assert!(diff.abs() < dec!(0.000001));
}

#[test]
fn test_balance_never_increases() {
    let result = amortize(dec!(25_000), dec!(9.9), 60);
    for pair in result.schedule.windows(2) {
        assert!(pair[1].balance <= pair[0].balance);
    }
}

#[test]
fn test_zero_principal_yields_empty_schedule() {
    let result = amortize(Decimal::ZERO, dec!(6.5), 360);
    assert_eq!(result.payment, Decimal::ZERO);
    assert!(result.schedule.is_empty());
    assert_eq!(result.total_interest, Decimal::ZERO);
}

#[test]
fn test_extreme_rate_schedule_completes() {
    let result = amortize(dec!(1000), dec!(300), 360);
    assert_eq!(result.payment, dec!(250));
    assert_eq!(result.schedule.len(), 360);
    assert_eq!(result.schedule.last().unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_loan_terms_document_is_normalized() {
    let json = r#"{"principal":"-5000","annual_rate_percent":"-3","term_periods":0,"periods_per_year":0}"#;
    let terms: LoanTerms = serde_json::from_str(json).unwrap();
    assert_eq!(terms.principal, Decimal::ZERO);
    assert_eq!(terms.annual_rate_percent, Decimal::ZERO);
    assert_eq!(terms.term_periods, 1);
    assert_eq!(terms.periods_per_year, 1);
    assert!(amortize_terms(&terms, Decimal::ZERO).schedule.is_empty());

    let huge = r#"{"principal":"1000","annual_rate_percent":"5","term_periods":4294967295}"#;
    let terms: LoanTerms = serde_json::from_str(huge).unwrap();
    let result = amortize_terms(&terms, Decimal::ZERO);
    assert_eq!(result.periods(), terms.term_periods);
    assert_eq!(result.schedule.last().unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_zero_rate_spreads_principal_evenly() {
    let result = amortize(dec!(12_000), Decimal::ZERO, 12);
    assert_eq!(result.payment, dec!(1_000));
    assert_eq!(result.total_interest, Decimal::ZERO);
}

#[test]
fn test_amortization_is_deterministic() {
    let a = amortize(dec!(180_000), dec!(5.25), 180).rounded();
    let b = amortize(dec!(180_000), dec!(5.25), 180).rounded();
    assert_eq!(a, b);
}

#[test]
fn test_higher_rate_costs_more_interest() {
    let low = amortize(dec!(200_000), dec!(5), 360);
    let high = amortize(dec!(200_000), dec!(7), 360);
    assert!(high.payment > low.payment);
    assert!(high.total_interest > low.total_interest);
}

#[test]
fn test_extra_payment_shortens_term() {
    let terms = LoanTerms::new(dec!(200_000), dec!(6), dec!(360));
    let base = amortize_terms(&terms, Decimal::ZERO);
    let extra = amortize_terms(&terms, dec!(200));

    assert!(extra.periods() < base.periods());
    assert!(extra.total_interest < base.total_interest);
    // The level payment itself does not change
    assert_eq!(extra.payment, base.payment);
}

#[test]
fn test_yearly_summary_matches_schedule() {
    let result = amortize(dec!(50_000), dec!(4.5), 60);
    let years = yearly_summary(&result.schedule, 12);
    assert_eq!(years.len(), 5);

    let interest: Decimal = years.iter().map(|y| y.interest).sum();
    assert!((interest - result.total_interest).abs() < dec!(0.000001));
    assert_eq!(years.last().unwrap().ending_balance, Decimal::ZERO);
}

// ===========================================================================
// APR tests
// ===========================================================================

#[test]
fn test_apr_equals_stated_rate_without_costs() {
    let solution = solve_apr(dec!(250_000), dec!(6), 360, Decimal::ZERO);
    assert!(solution.converged);
    assert!((solution.apr_percent - dec!(6)).abs() < dec!(0.001), "apr={}", solution.apr_percent);
}

#[test]
fn test_closing_costs_raise_apr() {
    let input = AprInput {
        loan_amount: dec!(250_000),
        annual_rate_percent: dec!(6),
        term_years: dec!(30),
        closing_costs: dec!(5_000),
        points_percent: dec!(1),
    };
    let result = calculate_apr(&input);
    let r = &result.result;

    assert!(r.apr_percent > dec!(6));
    assert!(r.apr_spread_percent > Decimal::ZERO);
    // 5,000 costs plus one point on 250k
    assert_eq!(r.total_fees, dec!(7_500));
    assert_eq!(r.amount_financed, dec!(242_500));
}

#[test]
fn test_more_fees_means_higher_apr() {
    let some = solve_apr(dec!(100_000), dec!(7), 180, dec!(1_000));
    let more = solve_apr(dec!(100_000), dec!(7), 180, dec!(4_000));
    assert!(more.apr_percent > some.apr_percent);
}

// ===========================================================================
// Mortgage tests
// ===========================================================================

fn sample_mortgage() -> MortgageInput {
    MortgageInput {
        home_price: dec!(400_000),
        down_payment: dec!(40_000),
        annual_rate_percent: dec!(6.5),
        term_years: dec!(30),
        property_tax_annual: dec!(4_800),
        home_insurance_annual: dec!(1_200),
        pmi_rate_percent: dec!(0.5),
        hoa_monthly: Decimal::ZERO,
        extra_monthly_payment: Decimal::ZERO,
    }
}

#[test]
fn test_mortgage_payment_components() {
    let result = calculate_mortgage(&sample_mortgage());
    let m = &result.result;

    assert_eq!(m.loan_amount, dec!(360_000));
    assert_eq!(m.down_payment_percent, dec!(10));
    assert_eq!(m.monthly_property_tax, dec!(400));
    assert_eq!(m.monthly_insurance, dec!(100));
    assert!(m.monthly_pmi > Decimal::ZERO);
    assert!(m.pmi_months > 0 && m.pmi_months < 360);
    assert_eq!(m.payoff_months, 360);
}

#[test]
fn test_twenty_percent_down_avoids_pmi() {
    let mut input = sample_mortgage();
    input.down_payment = dec!(80_000);
    let result = calculate_mortgage(&input);
    assert_eq!(result.result.monthly_pmi, Decimal::ZERO);
    assert_eq!(result.result.total_pmi, Decimal::ZERO);
}

#[test]
fn test_mortgage_extra_payment_saves_interest() {
    let mut input = sample_mortgage();
    input.extra_monthly_payment = dec!(300);
    let result = calculate_mortgage(&input);
    assert!(result.result.interest_saved > Decimal::ZERO);
    assert!(result.result.months_saved > 0);
    assert!(result.result.payoff_months < 360);
}
