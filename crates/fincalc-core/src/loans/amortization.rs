//! Level-payment amortization.
//!
//! The shared primitive behind every installment-loan calculator: a level
//! annuity payment expanded into a period-by-period schedule of interest,
//! principal and remaining balance. Arithmetic is unrounded; callers round
//! when they build their output.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::{non_negative, LoanTerms, MAX_TERM_PERIODS};
use crate::time_value::level_payment;
use crate::types::{round_money, Money, Percent, Rate, MONTHS_PER_YEAR};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One period of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// 1-based period index.
    pub period: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    /// Balance after this period's payment; never negative.
    pub balance: Money,
}

impl ScheduleRow {
    pub fn rounded(&self) -> Self {
        ScheduleRow {
            period: self.period,
            payment: round_money(self.payment),
            principal: round_money(self.principal),
            interest: round_money(self.interest),
            balance: round_money(self.balance),
        }
    }
}

/// Result of amortizing a loan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amortization {
    /// Scheduled level payment (excluding any extra principal).
    pub payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub schedule: Vec<ScheduleRow>,
}

impl Amortization {
    /// Number of periods actually needed to retire the balance.
    pub fn periods(&self) -> u32 {
        self.schedule.len() as u32
    }

    pub fn rounded(&self) -> Self {
        Amortization {
            payment: round_money(self.payment),
            total_payment: round_money(self.total_payment),
            total_interest: round_money(self.total_interest),
            schedule: self.schedule.iter().map(ScheduleRow::rounded).collect(),
        }
    }
}

/// Schedule rows aggregated by year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub payments: Money,
    pub principal: Money,
    pub interest: Money,
    pub ending_balance: Money,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Amortize `principal` over `num_periods` monthly payments.
///
/// Principal ≤ 0 or zero periods yields a zero payment and an empty schedule.
/// Terms past [`MAX_TERM_PERIODS`] are cut to it.
pub fn amortize(principal: Money, annual_rate_percent: Percent, num_periods: u32) -> Amortization {
    let terms = LoanTerms {
        principal,
        annual_rate_percent: non_negative(annual_rate_percent),
        term_periods: num_periods.min(MAX_TERM_PERIODS),
        periods_per_year: MONTHS_PER_YEAR,
    };
    amortize_terms(&terms, Decimal::ZERO)
}

/// Amortize with an arbitrary payment frequency and an extra principal
/// payment every period. The extra payment shortens the schedule; the level
/// payment itself is always computed over the full term.
pub fn amortize_terms(terms: &LoanTerms, extra_payment: Money) -> Amortization {
    if terms.principal <= Decimal::ZERO || terms.term_periods < 1 {
        return Amortization::default();
    }

    let rate = terms.periodic_rate();
    let payment = level_payment(terms.principal, rate, terms.term_periods);
    let schedule = build_schedule(
        terms.principal,
        rate,
        payment,
        extra_payment.max(Decimal::ZERO),
        terms.term_periods,
        1,
    );
    summarize(payment, schedule)
}

/// Expand a balance into schedule rows paying `payment + extra` each period.
///
/// Stops as soon as the balance reaches zero. The final permitted period
/// settles any residual balance left by arithmetic drift. Periods are
/// numbered from `first_period`.
pub(crate) fn build_schedule(
    principal: Money,
    rate: Rate,
    payment: Money,
    extra: Money,
    max_periods: u32,
    first_period: u32,
) -> Vec<ScheduleRow> {
    let mut rows = Vec::with_capacity(max_periods.min(MAX_TERM_PERIODS) as usize);
    let mut balance = principal;
    let installment = payment.saturating_add(extra);

    for i in 0..max_periods {
        if balance <= Decimal::ZERO {
            break;
        }
        let interest = balance.saturating_mul(rate);
        let mut principal_paid = (installment - interest).min(balance).max(Decimal::ZERO);
        if i + 1 == max_periods {
            principal_paid = balance;
        }
        balance -= principal_paid;

        rows.push(ScheduleRow {
            period: first_period + i,
            payment: principal_paid + interest,
            principal: principal_paid,
            interest,
            balance,
        });
    }

    rows
}

pub(crate) fn summarize(payment: Money, schedule: Vec<ScheduleRow>) -> Amortization {
    let total_payment: Money = schedule.iter().map(|r| r.payment).sum();
    let total_interest: Money = schedule.iter().map(|r| r.interest).sum();
    Amortization {
        payment,
        total_payment,
        total_interest,
        schedule,
    }
}

/// Aggregate schedule rows into years of `periods_per_year` rows each.
pub fn yearly_summary(schedule: &[ScheduleRow], periods_per_year: u32) -> Vec<AmortizationYear> {
    let per_year = periods_per_year.max(1) as usize;
    schedule
        .chunks(per_year)
        .enumerate()
        .map(|(i, rows)| AmortizationYear {
            year: i as u32 + 1,
            payments: rows.iter().map(|r| r.payment).sum(),
            principal: rows.iter().map(|r| r.principal).sum(),
            interest: rows.iter().map(|r| r.interest).sum(),
            ending_balance: rows.last().map(|r| r.balance).unwrap_or(Decimal::ZERO),
        })
        .collect()
}

impl AmortizationYear {
    pub fn rounded(&self) -> Self {
        AmortizationYear {
            year: self.year,
            payments: round_money(self.payments),
            principal: round_money(self.principal),
            interest: round_money(self.interest),
            ending_balance: round_money(self.ending_balance),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_thirty_year_mortgage_scenario() {
        let result = amortize(dec!(300_000), dec!(6.5), 360);
        assert!((result.payment - dec!(1896.20)).abs() < dec!(0.01));
        assert!(
            (result.total_interest - dec!(382_633)).abs() < dec!(5),
            "total_interest={}",
            result.total_interest
        );
        assert_eq!(result.schedule.len(), 360);
    }

    #[test]
    fn test_schedule_retires_principal() {
        let result = amortize(dec!(25_000), dec!(7.25), 60);
        let last = result.schedule.last().unwrap();
        assert_eq!(last.balance, Decimal::ZERO);

        let principal_sum: Decimal = result.schedule.iter().map(|r| r.principal).sum();
        assert!((principal_sum - dec!(25_000)).abs() < dec!(0.01));
        assert!(result.schedule.len() <= 60);
    }

    #[test]
    fn test_payment_splits_into_principal_and_interest() {
        let result = amortize(dec!(10_000), dec!(5), 24);
        for row in &result.schedule {
            assert_eq!(row.payment, row.principal + row.interest);
        }
    }

    #[test]
    fn test_balance_never_increases() {
        let result = amortize(dec!(80_000), dec!(9), 120);
        let mut previous = dec!(80_000);
        for row in &result.schedule {
            assert!(row.balance <= previous);
            assert!(row.balance >= Decimal::ZERO);
            previous = row.balance;
        }
    }

    #[test]
    fn test_zero_principal_is_empty() {
        let result = amortize(Decimal::ZERO, dec!(6.5), 360);
        assert_eq!(result.payment, Decimal::ZERO);
        assert!(result.schedule.is_empty());
        assert_eq!(result.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_zero_periods_is_empty() {
        let result = amortize(dec!(1000), dec!(6.5), 0);
        assert_eq!(result.payment, Decimal::ZERO);
        assert!(result.schedule.is_empty());
    }

    #[test]
    fn test_extreme_rate_amortizes_interest_only() {
        // 25% a month over 30 years; the annuity factor is out of range
        let result = amortize(dec!(1000), dec!(300), 360);
        assert_eq!(result.payment, dec!(250));
        assert_eq!(result.schedule.len(), 360);
        assert_eq!(result.schedule[0].principal, Decimal::ZERO);
        assert_eq!(result.schedule.last().unwrap().balance, Decimal::ZERO);
        assert_eq!(result.total_interest, dec!(90_000));
    }

    #[test]
    fn test_term_is_capped() {
        let result = amortize(dec!(1000), dec!(6), u32::MAX);
        assert_eq!(result.schedule.len() as u32, MAX_TERM_PERIODS);
    }

    #[test]
    fn test_zero_rate_splits_evenly() {
        let result = amortize(dec!(1200), Decimal::ZERO, 12);
        assert_eq!(result.payment, dec!(100));
        assert_eq!(result.total_interest, Decimal::ZERO);
        assert_eq!(result.total_payment, dec!(1200));
    }

    #[test]
    fn test_interest_increases_with_rate() {
        let low = amortize(dec!(200_000), dec!(4), 360);
        let mid = amortize(dec!(200_000), dec!(5), 360);
        let high = amortize(dec!(200_000), dec!(6), 360);
        assert!(low.total_interest < mid.total_interest);
        assert!(mid.total_interest < high.total_interest);
    }

    #[test]
    fn test_extra_payment_shortens_schedule() {
        let terms = LoanTerms::from_years(dec!(300_000), dec!(6.5), dec!(30));
        let base = amortize_terms(&terms, Decimal::ZERO);
        let extra = amortize_terms(&terms, dec!(200));
        assert!(extra.periods() < base.periods());
        assert!(extra.total_interest < base.total_interest);
        assert_eq!(extra.schedule.last().unwrap().balance, Decimal::ZERO);
        // The scheduled payment is unchanged by the extra principal
        assert_eq!(extra.payment, base.payment);
    }

    #[test]
    fn test_biweekly_frequency() {
        let terms = LoanTerms::new(dec!(10_000), dec!(6), dec!(52)).with_periods_per_year(26);
        let result = amortize_terms(&terms, Decimal::ZERO);
        assert_eq!(result.schedule.len(), 52);
        // 6% / 26 per period
        let first = &result.schedule[0];
        assert_eq!(first.interest, dec!(10_000) * (dec!(0.06) / dec!(26)));
    }

    #[test]
    fn test_yearly_summary_aggregates() {
        let result = amortize(dec!(12_000), dec!(6), 30);
        let years = yearly_summary(&result.schedule, 12);
        assert_eq!(years.len(), 3);
        assert_eq!(years[2].ending_balance, Decimal::ZERO);
        let total: Decimal = years.iter().map(|y| y.interest).sum();
        assert_eq!(total, result.total_interest);
    }

    #[test]
    fn test_amortize_is_idempotent() {
        let a = amortize(dec!(150_000), dec!(5.75), 180);
        let b = amortize(dec!(150_000), dec!(5.75), 180);
        assert_eq!(a, b);
    }
}
