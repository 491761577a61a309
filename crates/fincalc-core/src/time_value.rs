use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Money, Percent, Rate};

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
/// `None` once the product leaves the range of `Decimal`.
pub fn checked_compound(rate: Rate, n: u32) -> Option<Decimal> {
    let factor = Decimal::ONE.checked_add(rate)?;
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result.checked_mul(factor)?;
    }
    Some(result)
}

/// [`checked_compound`] saturating at `Decimal::MAX`.
pub fn compound(rate: Rate, n: u32) -> Decimal {
    checked_compound(rate, n).unwrap_or(Decimal::MAX)
}

/// Periodic decimal rate from an annual percentage, e.g. 6.5% / 12.
pub fn periodic_rate(annual_rate_percent: Percent, periods_per_year: u32) -> Rate {
    if periods_per_year == 0 {
        return Decimal::ZERO;
    }
    annual_rate_percent / dec!(100) / Decimal::from(periods_per_year)
}

/// Level payment that retires `principal` over `n` periods at `rate`.
///
/// Zero principal or zero periods pays nothing; a zero rate spreads the
/// principal evenly.
pub fn level_payment(principal: Money, rate: Rate, n: u32) -> Money {
    if principal <= Decimal::ZERO || n == 0 {
        return Decimal::ZERO;
    }
    if rate.is_zero() {
        return principal / Decimal::from(n);
    }

    // factor / (factor - 1) tends to 1, so an unrepresentable factor leaves
    // interest-only.
    let scale = match checked_compound(rate, n) {
        Some(factor) => {
            let denom = factor - Decimal::ONE;
            if denom.is_zero() {
                return principal / Decimal::from(n);
            }
            factor / denom
        }
        None => Decimal::ONE,
    };
    principal.saturating_mul(rate).saturating_mul(scale)
}

/// Present value of a level annuity: PV = pmt * [(1 - (1+r)^-n) / r]
pub fn pv_annuity(payment: Money, rate: Rate, n: u32) -> Money {
    if rate.is_zero() || n == 0 {
        return payment * Decimal::from(n);
    }
    let discount = checked_compound(rate, n).map_or(Decimal::ZERO, |factor| Decimal::ONE / factor);
    payment * (Decimal::ONE - discount) / rate
}

/// Future value of `n` level payments. With `due` set each payment is made at
/// the start of its period and earns a full period of growth.
pub fn fv_annuity(payment: Money, rate: Rate, n: u32, due: bool) -> Money {
    if n == 0 {
        return Decimal::ZERO;
    }
    if rate.is_zero() {
        return payment * Decimal::from(n);
    }
    let growth = checked_compound(rate, n)
        .and_then(|factor| (factor - Decimal::ONE).checked_div(rate))
        .unwrap_or(Decimal::MAX);
    let ordinary = payment.saturating_mul(growth);
    if due {
        ordinary.saturating_mul(Decimal::ONE + rate)
    } else {
        ordinary
    }
}

/// Level payment required to accumulate `target` over `n` periods:
/// inverse of [`fv_annuity`].
pub fn payment_for_future_value(target: Money, rate: Rate, n: u32, due: bool) -> Money {
    if n == 0 || target <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let per_unit = fv_annuity(Decimal::ONE, rate, n, due);
    if per_unit.is_zero() {
        return Decimal::ZERO;
    }
    target / per_unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_compound_basic() {
        assert_eq!(compound(dec!(0.10), 2), dec!(1.21));
        assert_eq!(compound(dec!(0.05), 0), Decimal::ONE);
    }

    #[test]
    fn test_compound_out_of_range() {
        assert_eq!(checked_compound(dec!(0.25), 360), None);
        assert_eq!(compound(dec!(0.25), 360), Decimal::MAX);
        assert!(checked_compound(dec!(0.25), 100).is_some());
    }

    #[test]
    fn test_level_payment_mortgage() {
        let pmt = level_payment(dec!(300_000), periodic_rate(dec!(6.5), 12), 360);
        // Standard 30y fixed at 6.5% on 300k ≈ 1896.20
        assert!((pmt - dec!(1896.20)).abs() < dec!(0.01), "pmt={pmt}");
    }

    #[test]
    fn test_level_payment_zero_rate() {
        assert_eq!(level_payment(dec!(1200), Decimal::ZERO, 12), dec!(100));
    }

    #[test]
    fn test_level_payment_degenerate() {
        assert_eq!(level_payment(Decimal::ZERO, dec!(0.01), 12), Decimal::ZERO);
        assert_eq!(level_payment(dec!(1000), dec!(0.01), 0), Decimal::ZERO);
    }

    #[test]
    fn test_level_payment_tends_to_interest_only() {
        // 300% a year is 25% a month; 1.25^360 does not fit in a Decimal
        let pmt = level_payment(dec!(1_000), dec!(0.25), 360);
        assert_eq!(pmt, dec!(250));
        assert!(pv_annuity(dec!(250), dec!(0.25), 360) <= dec!(1_000));
        assert_eq!(fv_annuity(dec!(1), dec!(0.25), 360, true), Decimal::MAX);
    }

    #[test]
    fn test_pv_annuity_inverts_payment() {
        let rate = dec!(0.005);
        let pmt = level_payment(dec!(20_000), rate, 60);
        let pv = pv_annuity(pmt, rate, 60);
        assert!((pv - dec!(20_000)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_pv_basic() {
        // PV of annuity: 100 * (1 - 1/1.08^10) / 0.08 = ~671
        let result = pv_annuity(dec!(100), dec!(0.08), 10);
        assert!((result - dec!(671)).abs() < dec!(2.0));
    }

    #[test]
    fn test_fv_annuity_due_earns_extra_period() {
        let ordinary = fv_annuity(dec!(100), dec!(0.01), 12, false);
        let due = fv_annuity(dec!(100), dec!(0.01), 12, true);
        assert_eq!(due, ordinary * dec!(1.01));
    }

    #[test]
    fn test_payment_for_future_value_round_trip() {
        let pmt = payment_for_future_value(dec!(50_000), dec!(0.004), 120, true);
        let fv = fv_annuity(pmt, dec!(0.004), 120, true);
        assert!((fv - dec!(50_000)).abs() < dec!(0.0001));
    }
}
