use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{non_negative, years_to_months};
use crate::time_value::{level_payment, periodic_rate, pv_annuity};
use crate::types::{
    round_money, round_percent, with_metadata, ComputationOutput, Money, Percent, Rate,
    MONTHS_PER_YEAR,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum bisection iterations.
const BISECTION_MAX_ITER: u32 = 100;

/// Convergence tolerance on present value, in dollars.
const PV_TOLERANCE: Money = dec!(1);

/// Upper end of the search bracket as an annual rate (50%).
const MAX_ANNUAL_RATE: Rate = dec!(0.5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of the rate solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AprSolution {
    pub apr_percent: Percent,
    pub monthly_payment: Money,
    pub net_proceeds: Money,
    pub iterations: u32,
    pub converged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprInput {
    pub loan_amount: Money,
    /// Stated (note) rate, e.g. 6.5 for 6.5%.
    pub annual_rate_percent: Percent,
    pub term_years: Decimal,
    /// Lender fees and other prepaid finance charges.
    pub closing_costs: Money,
    /// Discount points as a percentage of the loan amount.
    #[serde(default)]
    pub points_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprOutput {
    pub apr_percent: Percent,
    pub stated_rate_percent: Percent,
    pub apr_spread_percent: Percent,
    pub monthly_payment: Money,
    pub total_fees: Money,
    pub amount_financed: Money,
    pub total_payments: Money,
    pub total_interest: Money,
    /// Interest plus fees: the total cost of credit.
    pub finance_charge: Money,
    pub iterations: u32,
    pub converged: bool,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Solve for the APR of a monthly-pay loan of `loan_amount` at
/// `stated_rate_percent` over `term_periods` months when `closing_costs` are
/// withheld from the proceeds.
///
/// With nothing to solve for (non-positive proceeds or payment) the stated
/// rate is returned unchanged.
pub fn solve_apr(
    loan_amount: Money,
    stated_rate_percent: Percent,
    term_periods: u32,
    closing_costs: Money,
) -> AprSolution {
    let net_proceeds = loan_amount - closing_costs;
    let payment = level_payment(
        loan_amount,
        periodic_rate(stated_rate_percent, MONTHS_PER_YEAR),
        term_periods,
    );

    if net_proceeds <= Decimal::ZERO || payment <= Decimal::ZERO {
        return AprSolution {
            apr_percent: stated_rate_percent,
            monthly_payment: payment,
            net_proceeds,
            iterations: 0,
            converged: true,
        };
    }

    let months = Decimal::from(MONTHS_PER_YEAR);
    let mut lo = Decimal::ZERO;
    let mut hi = MAX_ANNUAL_RATE / months;
    let mut mid = (lo + hi) / dec!(2);
    let mut iterations = 0;
    let mut converged = false;

    for i in 0..BISECTION_MAX_ITER {
        iterations = i + 1;
        mid = (lo + hi) / dec!(2);
        let error = pv_annuity(payment, mid, term_periods) - net_proceeds;

        if error.abs() < PV_TOLERANCE {
            converged = true;
            break;
        }

        // PV falls as the rate rises: overshooting the target means the rate
        // is still too low.
        if error > Decimal::ZERO {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    if !converged {
        tracing::warn!(
            iterations,
            rate = %mid,
            "APR bisection did not converge; returning best midpoint"
        );
    }

    AprSolution {
        apr_percent: mid * months * dec!(100),
        monthly_payment: payment,
        net_proceeds,
        iterations,
        converged,
    }
}

/// APR calculator: fees and points folded into the effective rate.
pub fn calculate_apr(input: &AprInput) -> ComputationOutput<AprOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let loan_amount = non_negative(input.loan_amount);
    let stated = non_negative(input.annual_rate_percent);
    let months = years_to_months(input.term_years);
    let total_fees =
        non_negative(input.closing_costs) + loan_amount * non_negative(input.points_percent) / dec!(100);

    let solution = solve_apr(loan_amount, stated, months, total_fees);
    if !solution.converged {
        warnings.push(format!(
            "APR search did not converge within {} iterations; result is approximate",
            BISECTION_MAX_ITER
        ));
    }
    if solution.net_proceeds <= Decimal::ZERO && loan_amount > Decimal::ZERO {
        warnings.push("Fees consume the entire loan amount; APR reported at the stated rate".into());
    }

    let total_payments = solution.monthly_payment * Decimal::from(months);
    let total_interest = (total_payments - loan_amount).max(Decimal::ZERO);

    let output = AprOutput {
        apr_percent: round_percent(solution.apr_percent),
        stated_rate_percent: stated,
        apr_spread_percent: round_percent(solution.apr_percent - stated),
        monthly_payment: round_money(solution.monthly_payment),
        total_fees: round_money(total_fees),
        amount_financed: round_money(solution.net_proceeds.max(Decimal::ZERO)),
        total_payments: round_money(total_payments),
        total_interest: round_money(total_interest),
        finance_charge: round_money(total_interest + total_fees),
        iterations: solution.iterations,
        converged: solution.converged,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "APR via bisection on present value of the stated-rate payment against net proceeds",
        &serde_json::json!({
            "term_months": months,
            "bracket_annual_rate": MAX_ANNUAL_RATE.to_string(),
            "pv_tolerance": PV_TOLERANCE.to_string(),
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

    #[test]
    fn test_no_fees_apr_equals_stated_rate() {
        let solution = solve_apr(dec!(300_000), dec!(6.5), 360, Decimal::ZERO);
        assert!(solution.converged);
        assert!(
            (solution.apr_percent - dec!(6.5)).abs() < dec!(0.001),
            "apr={}",
            solution.apr_percent
        );
    }

    #[test]
    fn test_fees_raise_apr() {
        let solution = solve_apr(dec!(200_000), dec!(6), 360, dec!(4_000));
        assert!(solution.converged);
        assert!(solution.apr_percent > dec!(6));
        // 2% of fees on a 30-year loan adds roughly 0.15-0.25 points
        assert!(solution.apr_percent < dec!(6.3));
    }

    #[test]
    fn test_payment_uses_stated_rate() {
        let with_fees = solve_apr(dec!(200_000), dec!(6), 360, dec!(4_000));
        let without = solve_apr(dec!(200_000), dec!(6), 360, Decimal::ZERO);
        assert_eq!(with_fees.monthly_payment, without.monthly_payment);
        assert_eq!(with_fees.net_proceeds, dec!(196_000));
    }

    #[test]
    fn test_fees_exceeding_loan_short_circuit() {
        let solution = solve_apr(dec!(1_000), dec!(9), 12, dec!(1_500));
        assert_eq!(solution.apr_percent, dec!(9));
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    fn test_zero_loan_short_circuit() {
        let solution = solve_apr(Decimal::ZERO, dec!(5), 60, Decimal::ZERO);
        assert_eq!(solution.apr_percent, dec!(5));
        assert_eq!(solution.monthly_payment, Decimal::ZERO);
    }

    #[test]
    fn test_rate_beyond_bracket_does_not_converge() {
        // 80% stated rate is outside the 0-50% bracket
        let solution = solve_apr(dec!(10_000), dec!(80), 24, Decimal::ZERO);
        assert!(!solution.converged);
        assert_eq!(solution.iterations, BISECTION_MAX_ITER);
        assert!(solution.apr_percent > dec!(49.9));
    }

    #[test]
    fn test_calculate_apr_with_points() {
        let input = AprInput {
            loan_amount: dec!(250_000),
            annual_rate_percent: dec!(7),
            term_years: dec!(30),
            closing_costs: dec!(3_000),
            points_percent: dec!(1),
        };
        let out = calculate_apr(&input);
        let r = &out.result;
        assert_eq!(r.total_fees, dec!(5_500));
        assert_eq!(r.amount_financed, dec!(244_500));
        assert!(r.apr_percent > dec!(7));
        assert!(r.apr_spread_percent > Decimal::ZERO);
        assert_eq!(r.finance_charge, r.total_interest + r.total_fees);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_zero_rate_no_fees() {
        let solution = solve_apr(dec!(12_000), Decimal::ZERO, 12, Decimal::ZERO);
        assert!(solution.converged);
        assert!(solution.apr_percent < dec!(0.05));
    }
}
