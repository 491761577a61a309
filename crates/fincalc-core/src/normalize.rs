//! Boundary normalization.
//!
//! Calculator front ends hand the engine whatever the user has typed so far.
//! This module turns that into typed, range-checked values: unparseable or
//! missing amounts become zero, negatives are floored to zero and period
//! counts are rounded to whole numbers. Nothing past this module ever sees a
//! raw string.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::time_value::periodic_rate;
use crate::types::{Money, Percent, Rate, MONTHS_PER_YEAR};

/// Upper bound on any period count (100 years of monthly periods).
pub const MAX_TERM_PERIODS: u32 = 1200;

/// Upper bound on any horizon given in years.
pub const MAX_YEARS: u32 = 100;

/// Parse a user-typed amount such as `"$1,250.50"`, `"6.5%"` or `""`.
///
/// Currency symbols, thousands separators, underscores, percent signs and
/// surrounding whitespace are ignored. Anything that still fails to parse
/// (including `NaN`) yields zero.
pub fn parse_amount(raw: &str) -> Decimal {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '_' | '%' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .unwrap_or(Decimal::ZERO)
}

/// Parse and floor at zero.
pub fn parse_non_negative(raw: &str) -> Decimal {
    non_negative(parse_amount(raw))
}

/// Floor a value at zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Round to a whole count, floored at zero and capped at [`MAX_TERM_PERIODS`].
pub fn whole_count(value: Decimal) -> u32 {
    let rounded = non_negative(value).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded
        .to_u32()
        .unwrap_or(MAX_TERM_PERIODS)
        .min(MAX_TERM_PERIODS)
}

/// Whole years, floored at zero and capped at [`MAX_YEARS`].
pub fn year_count(value: Decimal) -> u32 {
    whole_count(value).min(MAX_YEARS)
}

/// Round to a whole count of periods; a term always has at least one period.
pub fn period_count(value: Decimal) -> u32 {
    whole_count(value).max(1)
}

/// Whole years expressed as monthly periods, at least one.
pub fn years_to_months(years: Decimal) -> u32 {
    period_count(non_negative(years) * Decimal::from(MONTHS_PER_YEAR))
}

/// Clamp a percentage into `[0, 100]`.
pub fn clamp_percent(value: Percent) -> Percent {
    non_negative(value).min(dec!(100))
}

// ---------------------------------------------------------------------------
// Loan terms
// ---------------------------------------------------------------------------

/// Raw loan fields exactly as typed into a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLoanTerms {
    pub principal: String,
    pub annual_rate_percent: String,
    pub term_months: String,
}

/// Loan terms as they arrive in a JSON or YAML document.
#[derive(Debug, Clone, Deserialize)]
struct LoanTermsDocument {
    principal: Money,
    annual_rate_percent: Percent,
    term_periods: Decimal,
    #[serde(default = "monthly")]
    periods_per_year: Decimal,
}

fn monthly() -> Decimal {
    Decimal::from(MONTHS_PER_YEAR)
}

impl From<LoanTermsDocument> for LoanTerms {
    fn from(doc: LoanTermsDocument) -> Self {
        LoanTerms::new(doc.principal, doc.annual_rate_percent, doc.term_periods)
            .with_periods_per_year(whole_count(doc.periods_per_year))
    }
}

/// Range-checked loan parameters. Deserializing applies the same clamps as
/// [`LoanTerms::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LoanTermsDocument")]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub term_periods: u32,
    pub periods_per_year: u32,
}

impl LoanTerms {
    /// Monthly terms; principal and rate floored at zero, term rounded to
    /// at least one period.
    pub fn new(principal: Money, annual_rate_percent: Percent, term_periods: Decimal) -> Self {
        LoanTerms {
            principal: non_negative(principal),
            annual_rate_percent: non_negative(annual_rate_percent),
            term_periods: period_count(term_periods),
            periods_per_year: MONTHS_PER_YEAR,
        }
    }

    /// Monthly terms from a term expressed in years.
    pub fn from_years(principal: Money, annual_rate_percent: Percent, term_years: Decimal) -> Self {
        let mut terms = LoanTerms::new(principal, annual_rate_percent, Decimal::ONE);
        terms.term_periods = years_to_months(term_years);
        terms
    }

    pub fn from_raw(raw: &RawLoanTerms) -> Self {
        LoanTerms::new(
            parse_amount(&raw.principal),
            parse_amount(&raw.annual_rate_percent),
            parse_amount(&raw.term_months),
        )
    }

    /// Re-express the schedule with a different payment frequency. The period
    /// count is left untouched.
    pub fn with_periods_per_year(mut self, periods_per_year: u32) -> Self {
        self.periods_per_year = periods_per_year.max(1);
        self
    }

    pub fn periodic_rate(&self) -> Rate {
        periodic_rate(self.annual_rate_percent, self.periods_per_year)
    }
}
