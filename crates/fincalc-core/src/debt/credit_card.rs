use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::debt::payoff::MAX_MONTHS;
use crate::loans::amortization::{build_schedule, ScheduleRow};
use crate::normalize::{non_negative, period_count};
use crate::time_value::{level_payment, periodic_rate};
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Percent, MONTHS_PER_YEAR};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCardInput {
    pub balance: Money,
    pub apr_percent: Percent,
    pub monthly_payment: Money,
    /// Also solve for the payment that clears the card in this many months.
    #[serde(default)]
    pub target_months: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCardOutput {
    pub will_never_pay_off: bool,
    pub hit_month_cap: bool,
    pub months_to_payoff: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    /// Interest charged in the first month at today's balance.
    pub first_month_interest: Money,
    pub payment_for_target: Option<Money>,
    pub schedule: Vec<ScheduleRow>,
}

/// Payoff timeline for a card paid down at a fixed amount each month.
///
/// A payment that does not exceed the first month's interest is reported as
/// never paying off, with an empty schedule. This compares against the
/// first period only and is a heuristic, not a proof of divergence.
pub fn calculate_credit_card(input: &CreditCardInput) -> ComputationOutput<CreditCardOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let balance = non_negative(input.balance);
    let payment = non_negative(input.monthly_payment);
    let rate = periodic_rate(non_negative(input.apr_percent), MONTHS_PER_YEAR);
    let first_month_interest = balance * rate;

    let payment_for_target = input
        .target_months
        .map(|m| level_payment(balance, rate, period_count(m)));

    let will_never_pay_off = balance > Decimal::ZERO && payment <= first_month_interest;
    let mut hit_month_cap = false;
    let mut schedule = Vec::new();
    if will_never_pay_off {
        tracing::debug!(%payment, %first_month_interest, "card payment does not cover interest");
        warnings.push(format!(
            "Payment of {} does not cover monthly interest of {}; the balance will never be paid off",
            round_money(payment),
            round_money(first_month_interest)
        ));
    } else {
        // One period beyond the cap tells a capped run from a finished one.
        schedule = build_schedule(balance, rate, payment, Decimal::ZERO, MAX_MONTHS + 1, 1);
        if schedule.len() as u32 > MAX_MONTHS {
            schedule.truncate(MAX_MONTHS as usize);
            hit_month_cap = true;
            tracing::warn!(months = MAX_MONTHS, "credit card payoff hit the month cap");
            warnings.push(format!(
                "Balance remains after {MAX_MONTHS} months; totals cover the first {MAX_MONTHS} months only"
            ));
        }
    }

    let total_interest: Money = schedule.iter().map(|r| r.interest).sum();
    let total_paid: Money = schedule.iter().map(|r| r.payment).sum();

    let output = CreditCardOutput {
        will_never_pay_off,
        hit_month_cap,
        months_to_payoff: schedule.len() as u32,
        total_interest: round_money(total_interest),
        total_paid: round_money(total_paid),
        first_month_interest: round_money(first_month_interest),
        payment_for_target: payment_for_target.map(round_money),
        schedule: schedule.iter().map(ScheduleRow::rounded).collect(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Credit card payoff: fixed payment, monthly interest on the running balance",
        &serde_json::json!({
            "month_cap": MAX_MONTHS,
            "never_pays_off_check": "payment vs first-month interest",
        }),
        warnings,
        elapsed,
        output,
    )
}
