use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::FinCalcError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Rates expressed as percentages (6.5 = 6.5%). Calculator inputs use these.
pub type Percent = Decimal;

/// Months in a year; every calculator ticks monthly.
pub const MONTHS_PER_YEAR: u32 = 12;

/// How often growth is credited to a balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundFrequency {
    #[default]
    Monthly,
    Yearly,
}

impl FromStr for CompoundFrequency {
    type Err = FinCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(CompoundFrequency::Monthly),
            "yearly" | "annually" | "annual" => Ok(CompoundFrequency::Yearly),
            other => Err(FinCalcError::InvalidInput {
                field: "compound_frequency".into(),
                reason: format!("unknown frequency '{other}', expected monthly or yearly"),
            }),
        }
    }
}

/// Pushed by any projection that stopped because a balance left the range of
/// `Decimal`.
pub const OUT_OF_RANGE_WARNING: &str =
    "Balances exceeded the supported range; the projection stops at the last whole year that fit";

/// Convert a percentage (6.5) into a decimal rate (0.065).
pub fn percent_to_rate(percent: Percent) -> Rate {
    percent / dec!(100)
}

/// Express `part / whole` as a percentage, zero when `whole` is zero.
pub fn ratio_percent(part: Decimal, whole: Decimal) -> Percent {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    match part.checked_div(whole) {
        Some(ratio) => ratio.saturating_mul(dec!(100)),
        None if part.is_sign_negative() != whole.is_sign_negative() => Decimal::MIN,
        None => Decimal::MAX,
    }
}

/// Round a monetary amount to cents. Only applied when an output struct is built.
pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a percentage for display-facing output.
pub fn round_percent(percent: Percent) -> Percent {
    percent.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_half_cent_rounds_away() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.01));
        assert_eq!(round_money(dec!(10.004)), dec!(10.00));
        assert_eq!(round_money(dec!(-3.125)), dec!(-3.13));
    }

    #[test]
    fn test_ratio_percent_zero_whole() {
        assert_eq!(ratio_percent(dec!(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ratio_percent(dec!(5), dec!(20)), dec!(25));
    }

    #[test]
    fn test_compound_frequency_parse() {
        assert_eq!(
            "Yearly".parse::<CompoundFrequency>().unwrap(),
            CompoundFrequency::Yearly
        );
        assert!("weekly".parse::<CompoundFrequency>().is_err());
    }
}
