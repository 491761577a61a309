//! Dividend reinvestment (DRIP) projection.
//!
//! Each payout is `shares * annual dividend per share / payouts per year`.
//! With reinvestment on, the payout buys shares at that month's price;
//! otherwise it accumulates as cash. The state is a share count and a share
//! price rather than one balance, so this runs its own monthly loop instead of
//! [`project_growth_with`](crate::savings::growth::project_growth_with).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{non_negative, year_count};
use crate::time_value::periodic_rate;
use crate::types::{
    percent_to_rate, ratio_percent, round_money, round_percent, with_metadata, ComputationOutput,
    Money, Percent, MONTHS_PER_YEAR, OUT_OF_RANGE_WARNING,
};

fn default_payouts() -> u32 {
    4
}

fn default_reinvest() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendInput {
    pub initial_investment: Money,
    pub share_price: Money,
    pub dividend_yield_percent: Percent,
    #[serde(default)]
    pub dividend_growth_percent: Percent,
    #[serde(default)]
    pub price_growth_percent: Percent,
    /// Must divide 12: 1, 2, 3, 4, 6 or 12.
    #[serde(default = "default_payouts")]
    pub payouts_per_year: u32,
    pub years: Decimal,
    #[serde(default = "default_reinvest")]
    pub reinvest: bool,
}

/// Shares held, the current share price and dividends taken as cash.
#[derive(Debug, Clone, Copy)]
struct Holding {
    shares: Decimal,
    price: Money,
    cash: Money,
}

impl Holding {
    /// Twelve months of price growth with a payout every `months_between`
    /// months. Returns the holding at year end and the year's dividends.
    fn advance_year(
        mut self,
        dividend_per_share: Money,
        price_step: Decimal,
        payouts: u32,
        reinvest: bool,
    ) -> Option<(Holding, Money)> {
        let months_between = MONTHS_PER_YEAR / payouts;
        let mut dividends = Decimal::ZERO;
        for month in 1..=MONTHS_PER_YEAR {
            self.price = self.price.checked_mul(price_step)?;
            if month % months_between != 0 {
                continue;
            }
            let payout = self.shares.checked_mul(dividend_per_share)? / Decimal::from(payouts);
            dividends = dividends.checked_add(payout)?;
            if reinvest && self.price > Decimal::ZERO {
                self.shares = self.shares.checked_add(payout.checked_div(self.price)?)?;
            } else {
                self.cash = self.cash.checked_add(payout)?;
            }
        }
        Some((self, dividends))
    }

    fn value(&self) -> Option<Money> {
        self.shares.checked_mul(self.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendYear {
    pub year: u32,
    pub shares: Decimal,
    pub share_price: Money,
    pub dividends: Money,
    pub portfolio_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendOutput {
    pub initial_shares: Decimal,
    pub final_shares: Decimal,
    pub final_share_price: Money,
    pub final_portfolio_value: Money,
    pub total_dividends: Money,
    pub cash_dividends: Money,
    /// Portfolio value plus dividends taken as cash.
    pub total_return: Money,
    pub final_annual_income: Money,
    pub yield_on_cost_percent: Percent,
    pub yearly_breakdown: Vec<DividendYear>,
}

/// Project share count, value and income under dividend reinvestment.
pub fn calculate_dividend(input: &DividendInput) -> ComputationOutput<DividendOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let payouts = if input.payouts_per_year > 0 && MONTHS_PER_YEAR % input.payouts_per_year == 0 {
        input.payouts_per_year
    } else {
        warnings.push(format!(
            "payouts_per_year {} does not divide 12; using quarterly payouts",
            input.payouts_per_year
        ));
        default_payouts()
    };
    let years = year_count(input.years);

    let investment = non_negative(input.initial_investment);
    let price = non_negative(input.share_price);
    let initial_shares = if price.is_zero() {
        warnings.push("Share price is zero; no shares can be bought".into());
        Decimal::ZERO
    } else {
        investment / price
    };
    let price_step = Decimal::ONE + periodic_rate(non_negative(input.price_growth_percent), MONTHS_PER_YEAR);
    let dividend_step = Decimal::ONE + percent_to_rate(non_negative(input.dividend_growth_percent));
    let mut dividend_per_share = price * percent_to_rate(non_negative(input.dividend_yield_percent));

    let mut holding = Holding {
        shares: initial_shares,
        price,
        cash: Decimal::ZERO,
    };
    let mut total_dividends = Decimal::ZERO;
    let mut yearly_breakdown: Vec<DividendYear> = Vec::with_capacity(years as usize);

    for year in 1..=years {
        let step = if year > 1 {
            dividend_per_share.checked_mul(dividend_step)
        } else {
            Some(dividend_per_share)
        };
        let advanced = step.and_then(|dps| {
            let (next, dividends) = holding.advance_year(dps, price_step, payouts, input.reinvest)?;
            Some((dps, next, dividends, total_dividends.checked_add(dividends)?, next.value()?))
        });
        let (dps, next, year_dividends, total, value) = match advanced {
            Some(step) => step,
            None => {
                tracing::warn!(year, "dividend projection left the decimal range");
                warnings.push(OUT_OF_RANGE_WARNING.into());
                break;
            }
        };
        dividend_per_share = dps;
        holding = next;
        total_dividends = total;
        yearly_breakdown.push(DividendYear {
            year,
            shares: holding.shares.round_dp(6),
            share_price: round_money(holding.price),
            dividends: round_money(year_dividends),
            portfolio_value: round_money(value),
        });
    }

    let Holding { shares, price, cash } = holding;
    let final_value = shares.saturating_mul(price);
    let final_annual_income = shares.saturating_mul(dividend_per_share);
    let output = DividendOutput {
        initial_shares: initial_shares.round_dp(6),
        final_shares: shares.round_dp(6),
        final_share_price: round_money(price),
        final_portfolio_value: round_money(final_value),
        total_dividends: round_money(total_dividends),
        cash_dividends: round_money(cash),
        total_return: round_money(final_value.saturating_add(cash) - investment),
        final_annual_income: round_money(final_annual_income),
        yield_on_cost_percent: round_percent(ratio_percent(final_annual_income, investment)),
        yearly_breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "DRIP: periodic payouts converted to shares at the current price",
        &serde_json::json!({
            "payouts_per_year": payouts,
            "price_growth": "monthly compounding",
            "dividend_growth": "annual step",
            "reinvest": input.reinvest,
        }),
        warnings,
        elapsed,
        output,
    )
}
