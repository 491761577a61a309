//! Multi-debt payoff simulation (snowball and avalanche).
//!
//! Months are the tick. Every open debt accrues a month of interest and then
//! receives its minimum payment. One target debt, chosen each month as the
//! first open debt under the ordering policy, additionally receives the extra
//! pool: the caller's extra payment plus the minimums of every debt already
//! paid off in an earlier month.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::FinCalcError;
use crate::normalize::non_negative;
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Percent};

/// Hard stop for the monthly loop (50 years).
pub const MAX_MONTHS: u32 = 600;

/// Balances at or below this are treated as settled.
const SETTLED: Money = dec!(0.000001);

const MONTHLY_APR_DIVISOR: Decimal = dec!(1200);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub name: String,
    pub balance: Money,
    pub apr_percent: Percent,
    pub min_payment: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoffStrategy {
    /// Smallest balance first.
    Snowball,
    /// Highest APR first.
    #[default]
    Avalanche,
}

impl PayoffStrategy {
    /// Ordering used to pick the target debt. Ties that the policy does not
    /// break keep input order because the sort is stable.
    pub fn compare(self, a: &Debt, b: &Debt) -> Ordering {
        match self {
            PayoffStrategy::Snowball => a
                .balance
                .cmp(&b.balance)
                .then_with(|| b.apr_percent.cmp(&a.apr_percent)),
            PayoffStrategy::Avalanche => b
                .apr_percent
                .cmp(&a.apr_percent)
                .then_with(|| a.balance.cmp(&b.balance)),
        }
    }
}

impl fmt::Display for PayoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayoffStrategy::Snowball => write!(f, "snowball"),
            PayoffStrategy::Avalanche => write!(f, "avalanche"),
        }
    }
}

impl FromStr for PayoffStrategy {
    type Err = FinCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "snowball" => Ok(PayoffStrategy::Snowball),
            "avalanche" => Ok(PayoffStrategy::Avalanche),
            other => Err(FinCalcError::InvalidInput {
                field: "strategy".into(),
                reason: format!("unknown strategy '{other}', expected snowball or avalanche"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffOrderItem {
    pub debt_name: String,
    pub payoff_month: u32,
    pub total_paid: Money,
    pub total_interest: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub remaining_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtRow {
    pub month: u32,
    pub debt_name: String,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
    pub is_target: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Chronological: the first debt extinguished comes first.
    pub payoff_order: Vec<PayoffOrderItem>,
    pub months_to_debt_free: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    pub monthly_schedule: Vec<MonthSummary>,
    pub per_debt_rows: Vec<DebtRow>,
    /// Payments cannot cover the first month's interest.
    pub will_never_pay_off: bool,
    /// The loop stopped at [`MAX_MONTHS`] with debt remaining.
    pub hit_month_cap: bool,
    /// A balance grew past the range of `Decimal`; results cover the months
    /// before that.
    #[serde(default)]
    pub overflowed: bool,
}

impl SimulationResult {
    pub fn rounded(&self) -> SimulationResult {
        SimulationResult {
            payoff_order: self
                .payoff_order
                .iter()
                .map(|p| PayoffOrderItem {
                    debt_name: p.debt_name.clone(),
                    payoff_month: p.payoff_month,
                    total_paid: round_money(p.total_paid),
                    total_interest: round_money(p.total_interest),
                })
                .collect(),
            months_to_debt_free: self.months_to_debt_free,
            total_interest: round_money(self.total_interest),
            total_paid: round_money(self.total_paid),
            monthly_schedule: self
                .monthly_schedule
                .iter()
                .map(|m| MonthSummary {
                    month: m.month,
                    payment: round_money(m.payment),
                    interest: round_money(m.interest),
                    principal: round_money(m.principal),
                    remaining_balance: round_money(m.remaining_balance),
                })
                .collect(),
            per_debt_rows: self
                .per_debt_rows
                .iter()
                .map(|r| DebtRow {
                    month: r.month,
                    debt_name: r.debt_name.clone(),
                    payment: round_money(r.payment),
                    interest: round_money(r.interest),
                    principal: round_money(r.principal),
                    balance: round_money(r.balance),
                    is_target: r.is_target,
                })
                .collect(),
            will_never_pay_off: self.will_never_pay_off,
            hit_month_cap: self.hit_month_cap,
            overflowed: self.overflowed,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Per-debt mutable state, addressed by index for the length of one run.
struct Slot {
    current: Debt,
    paid: Money,
    interest: Money,
    open: bool,
}

fn monthly_interest(debt: &Debt) -> Option<Money> {
    debt.balance.checked_mul(debt.apr_percent).map(|x| x / MONTHLY_APR_DIVISOR)
}

/// One debt's month: the row it produces and its running totals afterwards.
struct Posting {
    slot: usize,
    row: DebtRow,
    paid: Money,
    interest: Money,
}

/// Accrue, pay and settle every open debt for one month without touching
/// the slots. `None` when any figure leaves the range of `Decimal`.
fn post_month(slots: &[Slot], month: u32, target: usize, pool: Money) -> Option<(Vec<Posting>, MonthSummary)> {
    let mut postings = Vec::new();
    let mut summary = MonthSummary {
        month,
        payment: Decimal::ZERO,
        interest: Decimal::ZERO,
        principal: Decimal::ZERO,
        remaining_balance: Decimal::ZERO,
    };

    for (i, slot) in slots.iter().enumerate() {
        if !slot.open {
            continue;
        }
        let interest = monthly_interest(&slot.current)?;
        let due = slot.current.balance.checked_add(interest)?;
        let offered = if i == target {
            slot.current.min_payment.saturating_add(pool)
        } else {
            slot.current.min_payment
        };
        let mut payment = offered.min(due);
        let mut balance = due - payment;
        if balance <= SETTLED {
            payment += balance;
            balance = Decimal::ZERO;
        }

        summary.payment = summary.payment.checked_add(payment)?;
        summary.interest = summary.interest.checked_add(interest)?;
        postings.push(Posting {
            slot: i,
            row: DebtRow {
                month,
                debt_name: slot.current.name.clone(),
                payment,
                interest,
                principal: payment - interest,
                balance,
                is_target: i == target,
            },
            paid: slot.paid.checked_add(payment)?,
            interest: slot.interest.checked_add(interest)?,
        });
    }

    summary.principal = summary.payment - summary.interest;
    summary.remaining_balance = postings
        .iter()
        .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.row.balance))?;
    Some((postings, summary))
}

/// Simulate paying off `debts` with a named strategy.
pub fn simulate_debt_payoff(
    debts: &[Debt],
    extra_monthly_payment: Money,
    strategy: PayoffStrategy,
) -> SimulationResult {
    simulate_with_order(debts, extra_monthly_payment, |a, b| strategy.compare(a, b))
}

/// Simulate paying off `debts` with a caller-supplied ordering. The
/// comparator sees each debt with its current balance.
pub fn simulate_with_order<F>(debts: &[Debt], extra_monthly_payment: Money, compare: F) -> SimulationResult
where
    F: Fn(&Debt, &Debt) -> Ordering,
{
    let mut slots: Vec<Slot> = debts
        .iter()
        .filter(|d| d.balance > Decimal::ZERO)
        .map(|d| Slot {
            current: Debt {
                name: d.name.clone(),
                balance: d.balance,
                apr_percent: non_negative(d.apr_percent),
                min_payment: non_negative(d.min_payment),
            },
            paid: Decimal::ZERO,
            interest: Decimal::ZERO,
            open: true,
        })
        .collect();
    if slots.is_empty() {
        return SimulationResult::default();
    }

    let extra = non_negative(extra_monthly_payment);
    let first_interest = slots
        .iter()
        .try_fold(Decimal::ZERO, |total, s| total.checked_add(monthly_interest(&s.current)?));
    let total_payment = slots
        .iter()
        .fold(extra, |total, s| total.saturating_add(s.current.min_payment));
    if first_interest.map_or(true, |interest| total_payment <= interest) {
        tracing::debug!(%total_payment, ?first_interest, "payments do not cover interest");
        return SimulationResult {
            will_never_pay_off: true,
            ..SimulationResult::default()
        };
    }

    let mut result = SimulationResult::default();
    let mut freed = Decimal::ZERO;
    let mut month = 0u32;

    while slots.iter().any(|s| s.open) {
        if month == MAX_MONTHS {
            tracing::warn!(months = MAX_MONTHS, "debt payoff simulation hit the month cap");
            result.hit_month_cap = true;
            break;
        }

        let mut open: Vec<usize> = (0..slots.len()).filter(|&i| slots[i].open).collect();
        open.sort_by(|&a, &b| compare(&slots[a].current, &slots[b].current));
        let target = open[0];
        let pool = extra.saturating_add(freed);

        let posted = post_month(&slots, month + 1, target, pool).and_then(|(postings, summary)| {
            let total_interest = result.total_interest.checked_add(summary.interest)?;
            let total_paid = result.total_paid.checked_add(summary.payment)?;
            Some((postings, summary, total_interest, total_paid))
        });
        let (postings, summary, total_interest, total_paid) = match posted {
            Some(month_totals) => month_totals,
            None => {
                tracing::warn!(month = month + 1, "debt balance left the decimal range");
                result.overflowed = true;
                break;
            }
        };
        month += 1;

        let mut freed_this_month = Decimal::ZERO;
        for posting in postings {
            let slot = &mut slots[posting.slot];
            slot.current.balance = posting.row.balance;
            slot.paid = posting.paid;
            slot.interest = posting.interest;
            if posting.row.balance.is_zero() {
                slot.open = false;
                freed_this_month = freed_this_month.saturating_add(slot.current.min_payment);
                result.payoff_order.push(PayoffOrderItem {
                    debt_name: slot.current.name.clone(),
                    payoff_month: month,
                    total_paid: slot.paid,
                    total_interest: slot.interest,
                });
            }
            result.per_debt_rows.push(posting.row);
        }

        // Minimums of debts closed this month join the pool next month.
        freed = freed.saturating_add(freed_this_month);
        result.total_interest = total_interest;
        result.total_paid = total_paid;
        result.monthly_schedule.push(summary);
    }

    result.months_to_debt_free = month;
    result
}

// ---------------------------------------------------------------------------
// Composites
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtPayoffInput {
    pub debts: Vec<Debt>,
    #[serde(default)]
    pub extra_monthly_payment: Money,
    #[serde(default)]
    pub strategy: PayoffStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub snowball: SimulationResult,
    pub avalanche: SimulationResult,
    /// Extra payment of zero under the avalanche order.
    pub minimum_only_interest: Money,
    pub minimum_only_months: u32,
    pub interest_saved_by_avalanche: Money,
    pub months_saved_by_avalanche: i64,
    pub recommended: PayoffStrategy,
}

fn simulation_warnings(result: &SimulationResult, label: &str, warnings: &mut Vec<String>) {
    if result.will_never_pay_off {
        warnings.push(format!(
            "{label}: payments do not cover the first month's interest; the debt will never be paid off"
        ));
    }
    if result.hit_month_cap {
        warnings.push(format!(
            "{label}: stopped after {MAX_MONTHS} months with debt remaining; results are partial"
        ));
    }
    if result.overflowed {
        warnings.push(format!(
            "{label}: a balance grew past the supported range after {} months; results are partial",
            result.months_to_debt_free
        ));
    }
}

/// Run one payoff strategy.
pub fn calculate_debt_payoff(input: &DebtPayoffInput) -> ComputationOutput<SimulationResult> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = simulate_debt_payoff(&input.debts, input.extra_monthly_payment, input.strategy);
    simulation_warnings(&result, &input.strategy.to_string(), &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Debt payoff: monthly accrual, minimums on every debt, extra pool on one target with rollover",
        &serde_json::json!({
            "strategy": input.strategy.to_string(),
            "month_cap": MAX_MONTHS,
            "debts": input.debts.len(),
        }),
        warnings,
        elapsed,
        result.rounded(),
    )
}

/// Run snowball, avalanche and a minimum-payments baseline side by side.
pub fn compare_strategies(input: &DebtPayoffInput) -> ComputationOutput<StrategyComparison> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let extra = input.extra_monthly_payment;
    let snowball = simulate_debt_payoff(&input.debts, extra, PayoffStrategy::Snowball);
    let avalanche = simulate_debt_payoff(&input.debts, extra, PayoffStrategy::Avalanche);
    let baseline = simulate_debt_payoff(&input.debts, Decimal::ZERO, PayoffStrategy::Avalanche);
    simulation_warnings(&snowball, "snowball", &mut warnings);
    simulation_warnings(&avalanche, "avalanche", &mut warnings);

    let interest_saved = snowball.total_interest - avalanche.total_interest;
    let months_saved = snowball.months_to_debt_free as i64 - avalanche.months_to_debt_free as i64;
    // Snowball only wins on motivation; recommend it when it costs nothing extra.
    let recommended = if interest_saved > dec!(0.005) {
        PayoffStrategy::Avalanche
    } else {
        PayoffStrategy::Snowball
    };

    let output = StrategyComparison {
        minimum_only_interest: round_money(baseline.total_interest),
        minimum_only_months: baseline.months_to_debt_free,
        interest_saved_by_avalanche: round_money(interest_saved),
        months_saved_by_avalanche: months_saved,
        recommended,
        snowball: snowball.rounded(),
        avalanche: avalanche.rounded(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Debt payoff comparison: snowball vs avalanche vs minimum payments only",
        &serde_json::json!({
            "month_cap": MAX_MONTHS,
            "extra_monthly_payment": extra.to_string(),
        }),
        warnings,
        elapsed,
        output,
    )
}
