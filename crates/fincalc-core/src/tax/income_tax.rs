use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

use crate::error::FinCalcError;
use crate::normalize::{clamp_percent, non_negative};
use crate::types::{
    percent_to_rate, ratio_percent, round_money, round_percent, with_metadata, ComputationOutput,
    Money, Percent, MONTHS_PER_YEAR,
};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Lower bound of a bracket and the rate applied above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub threshold: Money,
    pub rate_percent: Percent,
}

const fn bracket(threshold: Decimal, rate_percent: Decimal) -> TaxBracket {
    TaxBracket {
        threshold,
        rate_percent,
    }
}

const SINGLE: [TaxBracket; 7] = [
    bracket(dec!(0), dec!(10)),
    bracket(dec!(11_600), dec!(12)),
    bracket(dec!(47_150), dec!(22)),
    bracket(dec!(100_525), dec!(24)),
    bracket(dec!(191_950), dec!(32)),
    bracket(dec!(243_725), dec!(35)),
    bracket(dec!(609_350), dec!(37)),
];

const MARRIED_JOINT: [TaxBracket; 7] = [
    bracket(dec!(0), dec!(10)),
    bracket(dec!(23_200), dec!(12)),
    bracket(dec!(94_300), dec!(22)),
    bracket(dec!(201_050), dec!(24)),
    bracket(dec!(383_900), dec!(32)),
    bracket(dec!(487_450), dec!(35)),
    bracket(dec!(731_200), dec!(37)),
];

const MARRIED_SEPARATE: [TaxBracket; 7] = [
    bracket(dec!(0), dec!(10)),
    bracket(dec!(11_600), dec!(12)),
    bracket(dec!(47_150), dec!(22)),
    bracket(dec!(100_525), dec!(24)),
    bracket(dec!(191_950), dec!(32)),
    bracket(dec!(243_725), dec!(35)),
    bracket(dec!(365_600), dec!(37)),
];

const HEAD_OF_HOUSEHOLD: [TaxBracket; 7] = [
    bracket(dec!(0), dec!(10)),
    bracket(dec!(16_550), dec!(12)),
    bracket(dec!(63_100), dec!(22)),
    bracket(dec!(100_500), dec!(24)),
    bracket(dec!(191_950), dec!(32)),
    bracket(dec!(243_700), dec!(35)),
    bracket(dec!(609_350), dec!(37)),
];

pub const SOCIAL_SECURITY_RATE: Percent = dec!(6.2);
pub const SOCIAL_SECURITY_WAGE_BASE: Money = dec!(168_600);
pub const MEDICARE_RATE: Percent = dec!(1.45);
pub const ADDITIONAL_MEDICARE_RATE: Percent = dec!(0.9);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedJoint,
    MarriedSeparate,
    HeadOfHousehold,
}

impl FilingStatus {
    pub fn brackets(self) -> &'static [TaxBracket] {
        match self {
            FilingStatus::Single => &SINGLE,
            FilingStatus::MarriedJoint => &MARRIED_JOINT,
            FilingStatus::MarriedSeparate => &MARRIED_SEPARATE,
            FilingStatus::HeadOfHousehold => &HEAD_OF_HOUSEHOLD,
        }
    }

    pub fn standard_deduction(self) -> Money {
        match self {
            FilingStatus::Single | FilingStatus::MarriedSeparate => dec!(14_600),
            FilingStatus::MarriedJoint => dec!(29_200),
            FilingStatus::HeadOfHousehold => dec!(21_900),
        }
    }

    /// Wages above this owe the additional Medicare tax.
    pub fn additional_medicare_threshold(self) -> Money {
        match self {
            FilingStatus::Single | FilingStatus::HeadOfHousehold => dec!(200_000),
            FilingStatus::MarriedJoint => dec!(250_000),
            FilingStatus::MarriedSeparate => dec!(125_000),
        }
    }
}

impl FromStr for FilingStatus {
    type Err = FinCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "single" => Ok(FilingStatus::Single),
            "married_joint" | "married_filing_jointly" | "mfj" => Ok(FilingStatus::MarriedJoint),
            "married_separate" | "married_filing_separately" | "mfs" => {
                Ok(FilingStatus::MarriedSeparate)
            }
            "head_of_household" | "hoh" => Ok(FilingStatus::HeadOfHousehold),
            other => Err(FinCalcError::InvalidInput {
                field: "filing_status".into(),
                reason: format!("unknown filing status '{other}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Bracket arithmetic
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketTax {
    pub rate_percent: Percent,
    pub lower: Money,
    /// `None` for the top bracket.
    pub upper: Option<Money>,
    pub taxable_amount: Money,
    pub tax: Money,
}

/// Progressive tax on `taxable_income`, one entry per bracket reached.
pub fn bracket_breakdown(taxable_income: Money, brackets: &[TaxBracket]) -> Vec<BracketTax> {
    let mut rows = Vec::new();
    for (i, b) in brackets.iter().enumerate() {
        if taxable_income <= b.threshold {
            break;
        }
        let upper = brackets.get(i + 1).map(|next| next.threshold);
        let top = upper.map_or(taxable_income, |u| taxable_income.min(u));
        let amount = top - b.threshold;
        rows.push(BracketTax {
            rate_percent: b.rate_percent,
            lower: b.threshold,
            upper,
            taxable_amount: amount,
            tax: amount * percent_to_rate(b.rate_percent),
        });
    }
    rows
}

/// Total progressive tax on `taxable_income`.
pub fn progressive_tax(taxable_income: Money, brackets: &[TaxBracket]) -> Money {
    bracket_breakdown(taxable_income, brackets)
        .iter()
        .map(|row| row.tax)
        .sum()
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxInput {
    /// Annual wages before any deductions.
    pub gross_income: Money,
    #[serde(default)]
    pub filing_status: FilingStatus,
    /// 401(k), HSA and similar payroll deductions; reduce income tax but not
    /// payroll tax.
    #[serde(default)]
    pub pre_tax_deductions: Money,
    /// Used instead of the standard deduction when larger.
    #[serde(default)]
    pub itemized_deductions: Option<Money>,
    #[serde(default)]
    pub tax_credits: Money,
    /// Flat state rate applied to federal taxable income.
    #[serde(default)]
    pub state_tax_rate_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxOutput {
    pub adjusted_gross_income: Money,
    pub deduction: Money,
    pub used_itemized: bool,
    pub taxable_income: Money,
    pub federal_tax_before_credits: Money,
    pub federal_tax: Money,
    pub brackets: Vec<BracketTax>,
    pub social_security_tax: Money,
    pub medicare_tax: Money,
    pub additional_medicare_tax: Money,
    pub total_fica: Money,
    pub state_tax: Money,
    pub total_tax: Money,
    pub marginal_rate_percent: Percent,
    /// Federal income tax over gross income.
    pub effective_rate_percent: Percent,
    /// All taxes over gross income.
    pub total_effective_rate_percent: Percent,
    pub take_home_pay: Money,
    pub monthly_take_home: Money,
}

/// Estimate federal, payroll and state tax and the resulting take-home pay.
pub fn calculate_income_tax(input: &IncomeTaxInput) -> ComputationOutput<IncomeTaxOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let status = input.filing_status;
    let gross = non_negative(input.gross_income);
    let mut pre_tax = non_negative(input.pre_tax_deductions);
    if pre_tax > gross {
        warnings.push("Pre-tax deductions exceed gross income; limited to gross income".into());
        pre_tax = gross;
    }
    let agi = gross - pre_tax;

    let standard = status.standard_deduction();
    let itemized = input.itemized_deductions.map(non_negative).unwrap_or(Decimal::ZERO);
    let used_itemized = itemized > standard;
    let deduction = if used_itemized { itemized } else { standard };
    let taxable = (agi - deduction).max(Decimal::ZERO);

    let brackets = bracket_breakdown(taxable, status.brackets());
    let before_credits: Money = brackets.iter().map(|b| b.tax).sum();
    let credits = non_negative(input.tax_credits);
    if credits > before_credits {
        warnings.push("Credits exceed tax owed; the excess is not refunded".into());
    }
    let federal_tax = (before_credits - credits).max(Decimal::ZERO);
    let marginal_rate = brackets
        .last()
        .map(|b| b.rate_percent)
        .unwrap_or(status.brackets()[0].rate_percent);

    let social_security = gross.min(SOCIAL_SECURITY_WAGE_BASE) * percent_to_rate(SOCIAL_SECURITY_RATE);
    let medicare = gross * percent_to_rate(MEDICARE_RATE);
    let additional_medicare = (gross - status.additional_medicare_threshold()).max(Decimal::ZERO)
        * percent_to_rate(ADDITIONAL_MEDICARE_RATE);
    let fica = social_security + medicare + additional_medicare;

    let state_tax = taxable * percent_to_rate(clamp_percent(input.state_tax_rate_percent));
    let total_tax = federal_tax + fica + state_tax;
    let take_home = gross - pre_tax - total_tax;

    let output = IncomeTaxOutput {
        adjusted_gross_income: round_money(agi),
        deduction: round_money(deduction),
        used_itemized,
        taxable_income: round_money(taxable),
        federal_tax_before_credits: round_money(before_credits),
        federal_tax: round_money(federal_tax),
        brackets: brackets
            .into_iter()
            .map(|b| BracketTax {
                taxable_amount: round_money(b.taxable_amount),
                tax: round_money(b.tax),
                ..b
            })
            .collect(),
        social_security_tax: round_money(social_security),
        medicare_tax: round_money(medicare),
        additional_medicare_tax: round_money(additional_medicare),
        total_fica: round_money(fica),
        state_tax: round_money(state_tax),
        total_tax: round_money(total_tax),
        marginal_rate_percent: marginal_rate,
        effective_rate_percent: round_percent(ratio_percent(federal_tax, gross)),
        total_effective_rate_percent: round_percent(ratio_percent(total_tax, gross)),
        take_home_pay: round_money(take_home),
        monthly_take_home: round_money(take_home / Decimal::from(MONTHS_PER_YEAR)),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Income tax: progressive federal brackets after deductions, FICA on wages, flat state rate",
        &serde_json::json!({
            "tax_year": 2024,
            "filing_status": status,
            "standard_deduction": standard.to_string(),
            "social_security_wage_base": SOCIAL_SECURITY_WAGE_BASE.to_string(),
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

    fn default_input() -> IncomeTaxInput {
        IncomeTaxInput {
            gross_income: dec!(100_000),
            filing_status: FilingStatus::Single,
            pre_tax_deductions: Decimal::ZERO,
            itemized_deductions: None,
            tax_credits: Decimal::ZERO,
            state_tax_rate_percent: Decimal::ZERO,
        }
    }

    #[test]
    fn test_progressive_tax_single() {
        // 85,400 taxable: 1,160 + 4,266 + 8,415
        let tax = progressive_tax(dec!(85_400), &SINGLE);
        assert_eq!(tax, dec!(13_841));
    }

    #[test]
    fn test_zero_income_no_tax() {
        assert_eq!(progressive_tax(Decimal::ZERO, &SINGLE), Decimal::ZERO);
        assert!(bracket_breakdown(Decimal::ZERO, &SINGLE).is_empty());
    }

    #[test]
    fn test_single_filer_summary() {
        let out = calculate_income_tax(&default_input());
        let r = &out.result;
        assert_eq!(r.taxable_income, dec!(85_400));
        assert_eq!(r.federal_tax, dec!(13_841));
        assert_eq!(r.marginal_rate_percent, dec!(22));
        assert_eq!(r.social_security_tax, dec!(6_200));
        assert_eq!(r.medicare_tax, dec!(1_450));
        assert_eq!(r.additional_medicare_tax, Decimal::ZERO);
        assert_eq!(r.take_home_pay, dec!(78_509));
        assert!(!r.used_itemized);
    }

    #[test]
    fn test_wage_base_and_additional_medicare() {
        let mut input = default_input();
        input.gross_income = dec!(300_000);
        let out = calculate_income_tax(&input);
        let r = &out.result;
        assert_eq!(r.social_security_tax, dec!(10_453.20));
        assert_eq!(r.additional_medicare_tax, dec!(900));
    }

    #[test]
    fn test_itemized_and_pre_tax() {
        let mut input = default_input();
        input.pre_tax_deductions = dec!(20_000);
        input.itemized_deductions = Some(dec!(20_000));
        let out = calculate_income_tax(&input);
        let r = &out.result;
        assert!(r.used_itemized);
        assert_eq!(r.taxable_income, dec!(60_000));
        // Payroll tax is still on full wages.
        assert_eq!(r.social_security_tax, dec!(6_200));
    }

    #[test]
    fn test_credits_floor_at_zero() {
        let mut input = default_input();
        input.gross_income = dec!(20_000);
        input.tax_credits = dec!(5_000);
        let out = calculate_income_tax(&input);
        assert_eq!(out.result.federal_tax, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_filing_status_parse() {
        assert_eq!(
            "Married Filing Jointly".parse::<FilingStatus>().unwrap(),
            FilingStatus::MarriedJoint
        );
        assert!("widow".parse::<FilingStatus>().is_err());
    }
}
