use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loans::amortization::{build_schedule, ScheduleRow};
use crate::normalize::{clamp_percent, non_negative, whole_count, years_to_months};
use crate::time_value::{level_payment, periodic_rate};
use crate::types::{
    ratio_percent, round_money, round_percent, with_metadata, ComputationOutput, Money, Percent,
    MONTHS_PER_YEAR,
};

fn default_max_cltv() -> Percent {
    dec!(85)
}

fn default_draw_years() -> Decimal {
    dec!(10)
}

fn default_repayment_years() -> Decimal {
    dec!(20)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelocInput {
    pub home_value: Money,
    #[serde(default)]
    pub mortgage_balance: Money,
    #[serde(default = "default_max_cltv")]
    pub max_cltv_percent: Percent,
    pub draw_amount: Money,
    pub annual_rate_percent: Percent,
    #[serde(default = "default_draw_years")]
    pub draw_period_years: Decimal,
    #[serde(default = "default_repayment_years")]
    pub repayment_period_years: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelocOutput {
    pub available_credit: Money,
    pub amount_drawn: Money,
    pub combined_ltv_percent: Percent,
    pub interest_only_payment: Money,
    pub repayment_payment: Money,
    /// Jump in the monthly payment when the draw period ends.
    pub payment_increase: Money,
    pub draw_period_interest: Money,
    pub repayment_period_interest: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    pub schedule: Vec<ScheduleRow>,
}

/// HELOC credit limit and two-phase payment schedule.
pub fn calculate_heloc(input: &HelocInput) -> ComputationOutput<HelocOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let home_value = non_negative(input.home_value);
    let mortgage_balance = non_negative(input.mortgage_balance);
    let max_cltv = clamp_percent(input.max_cltv_percent);
    let available_credit =
        (home_value * max_cltv / dec!(100) - mortgage_balance).max(Decimal::ZERO);

    let requested = non_negative(input.draw_amount);
    let drawn = requested.min(available_credit);
    if requested > available_credit {
        warnings.push(format!(
            "Requested draw exceeds available credit; limited to {}",
            round_money(available_credit)
        ));
    }

    let rate = periodic_rate(non_negative(input.annual_rate_percent), MONTHS_PER_YEAR);
    let draw_months = whole_count(non_negative(input.draw_period_years) * Decimal::from(MONTHS_PER_YEAR));
    let repay_months = years_to_months(input.repayment_period_years);

    let interest_only_payment = drawn * rate;
    let mut schedule: Vec<ScheduleRow> = Vec::new();
    if drawn > Decimal::ZERO {
        schedule.extend((1..=draw_months).map(|period| ScheduleRow {
            period,
            payment: interest_only_payment,
            principal: Decimal::ZERO,
            interest: interest_only_payment,
            balance: drawn,
        }));
    }

    let repayment_payment = level_payment(drawn, rate, repay_months);
    schedule.extend(build_schedule(
        drawn,
        rate,
        repayment_payment,
        Decimal::ZERO,
        repay_months,
        draw_months + 1,
    ));

    let draw_period_interest: Money = schedule
        .iter()
        .filter(|r| r.period <= draw_months)
        .map(|r| r.interest)
        .sum();
    let total_interest: Money = schedule.iter().map(|r| r.interest).sum();
    let total_paid: Money = schedule.iter().map(|r| r.payment).sum();

    let output = HelocOutput {
        available_credit: round_money(available_credit),
        amount_drawn: round_money(drawn),
        combined_ltv_percent: round_percent(ratio_percent(mortgage_balance + drawn, home_value)),
        interest_only_payment: round_money(interest_only_payment),
        repayment_payment: round_money(repayment_payment),
        payment_increase: round_money((repayment_payment - interest_only_payment).max(Decimal::ZERO)),
        draw_period_interest: round_money(draw_period_interest),
        repayment_period_interest: round_money(total_interest - draw_period_interest),
        total_interest: round_money(total_interest),
        total_paid: round_money(total_paid),
        schedule: schedule.iter().map(ScheduleRow::rounded).collect(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "HELOC: CLTV-limited credit, interest-only draw period then level amortization",
        &serde_json::json!({
            "max_cltv_percent": max_cltv.to_string(),
            "draw_months": draw_months,
            "repayment_months": repay_months,
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

    fn default_input() -> HelocInput {
        HelocInput {
            home_value: dec!(500_000),
            mortgage_balance: dec!(300_000),
            max_cltv_percent: dec!(85),
            draw_amount: dec!(50_000),
            annual_rate_percent: dec!(9),
            draw_period_years: dec!(10),
            repayment_period_years: dec!(20),
        }
    }

    #[test]
    fn test_available_credit_from_cltv() {
        let out = calculate_heloc(&default_input());
        // 85% of 500k = 425k, less 300k mortgage
        assert_eq!(out.result.available_credit, dec!(125_000));
        assert_eq!(out.result.amount_drawn, dec!(50_000));
        assert_eq!(out.result.combined_ltv_percent, dec!(70));
    }

    #[test]
    fn test_interest_only_then_amortizing() {
        let out = calculate_heloc(&default_input());
        let r = &out.result;
        assert_eq!(r.interest_only_payment, dec!(375));
        assert_eq!(r.schedule.len(), 120 + 240);
        assert_eq!(r.schedule[0].principal, Decimal::ZERO);
        assert_eq!(r.schedule[119].balance, dec!(50_000));
        assert_eq!(r.schedule[120].period, 121);
        assert!(r.schedule[120].principal > Decimal::ZERO);
        assert_eq!(r.schedule.last().unwrap().balance, Decimal::ZERO);
        assert!(r.payment_increase > Decimal::ZERO);
        assert_eq!(r.draw_period_interest, dec!(45_000));
    }

    #[test]
    fn test_draw_capped_at_available_credit() {
        let mut input = default_input();
        input.draw_amount = dec!(200_000);
        let out = calculate_heloc(&input);
        assert_eq!(out.result.amount_drawn, dec!(125_000));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_no_equity_no_schedule() {
        let mut input = default_input();
        input.mortgage_balance = dec!(450_000);
        let out = calculate_heloc(&input);
        assert_eq!(out.result.available_credit, Decimal::ZERO);
        assert!(out.result.schedule.is_empty());
        assert_eq!(out.result.total_paid, Decimal::ZERO);
    }
}
