use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loans::amortization::amortize;
use crate::normalize::{non_negative, period_count};
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Percent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    pub current_balance: Money,
    pub current_rate_percent: Percent,
    pub remaining_months: Decimal,
    pub new_rate_percent: Percent,
    pub new_term_months: Decimal,
    #[serde(default)]
    pub closing_costs: Money,
    /// Finance the closing costs instead of paying them at closing.
    #[serde(default)]
    pub roll_costs_into_loan: bool,
    /// Cash taken out (positive) or paid down (negative) at closing.
    #[serde(default)]
    pub cash_out: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub principal: Money,
    pub monthly_payment: Money,
    pub months: u32,
    pub total_interest: Money,
    pub total_payments: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceOutput {
    pub current_loan: LoanSnapshot,
    pub new_loan: LoanSnapshot,
    pub monthly_savings: Money,
    /// Months until cumulative savings repay up-front costs; `None` if never.
    pub break_even_month: Option<u32>,
    pub upfront_costs: Money,
    /// Remaining payments on the current loan minus new payments and
    /// up-front costs. Negative means refinancing costs more overall.
    pub lifetime_savings: Money,
    pub interest_difference: Money,
    pub worth_refinancing: bool,
}

/// Compare the remaining cost of a current loan with a refinance.
pub fn calculate_refinance(input: &RefinanceInput) -> ComputationOutput<RefinanceOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let balance = non_negative(input.current_balance);
    let closing_costs = non_negative(input.closing_costs);
    let current_months = period_count(input.remaining_months);
    let new_months = period_count(input.new_term_months);

    let current = amortize(balance, non_negative(input.current_rate_percent), current_months);

    let mut new_principal = (balance + input.cash_out).max(Decimal::ZERO);
    let upfront_costs = if input.roll_costs_into_loan {
        new_principal += closing_costs;
        Decimal::ZERO
    } else {
        closing_costs
    };
    let new = amortize(new_principal, non_negative(input.new_rate_percent), new_months);

    let monthly_savings = current.payment - new.payment;
    let break_even_month = if upfront_costs.is_zero() && monthly_savings >= Decimal::ZERO {
        Some(0)
    } else {
        // Walk both schedules; the new loan may end earlier or later.
        let horizon = current.periods().max(new.periods());
        let mut cumulative = -upfront_costs;
        let mut found = None;
        for month in 0..horizon as usize {
            let old_pay = current.schedule.get(month).map(|r| r.payment).unwrap_or(Decimal::ZERO);
            let new_pay = new.schedule.get(month).map(|r| r.payment).unwrap_or(Decimal::ZERO);
            cumulative += old_pay - new_pay;
            if cumulative >= Decimal::ZERO {
                found = Some(month as u32 + 1);
                break;
            }
        }
        found
    };

    let lifetime_savings = current.total_payment - new.total_payment - upfront_costs;
    if new_months > current_months {
        warnings.push(
            "New term is longer than the remaining term; lower payments may still cost more overall"
                .into(),
        );
    }
    if !input.cash_out.is_zero() {
        warnings.push("Cash-out changes the principal; savings are not like-for-like".into());
    }

    let output = RefinanceOutput {
        current_loan: LoanSnapshot {
            principal: round_money(balance),
            monthly_payment: round_money(current.payment),
            months: current.periods(),
            total_interest: round_money(current.total_interest),
            total_payments: round_money(current.total_payment),
        },
        new_loan: LoanSnapshot {
            principal: round_money(new_principal),
            monthly_payment: round_money(new.payment),
            months: new.periods(),
            total_interest: round_money(new.total_interest),
            total_payments: round_money(new.total_payment),
        },
        monthly_savings: round_money(monthly_savings),
        break_even_month,
        upfront_costs: round_money(upfront_costs),
        lifetime_savings: round_money(lifetime_savings),
        interest_difference: round_money(current.total_interest - new.total_interest),
        worth_refinancing: lifetime_savings > Decimal::ZERO && break_even_month.is_some(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Refinance comparison: remaining schedule vs new schedule with closing-cost break-even",
        &serde_json::json!({
            "current_months": current_months,
            "new_months": new_months,
            "roll_costs_into_loan": input.roll_costs_into_loan,
        }),
        warnings,
        elapsed,
        output,
    )
}
