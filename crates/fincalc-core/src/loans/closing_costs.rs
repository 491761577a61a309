use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::normalize::{clamp_percent, non_negative, whole_count};
use crate::types::{
    ratio_percent, round_money, round_percent, with_metadata, ComputationOutput, Money, Percent,
    MONTHS_PER_YEAR,
};

/// Day count used for prepaid interest.
const DAYS_PER_YEAR: Decimal = dec!(365);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Lender,
    ThirdParty,
    Government,
    Prepaid,
}

/// A caller-supplied fee not covered by the standard items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeItem {
    pub name: String,
    pub category: CostCategory,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosingCostsInput {
    pub home_price: Money,
    pub loan_amount: Money,
    #[serde(default)]
    pub annual_rate_percent: Percent,
    #[serde(default)]
    pub origination_fee_percent: Percent,
    /// Each point costs 1% of the loan amount.
    #[serde(default)]
    pub discount_points: Decimal,
    #[serde(default)]
    pub appraisal_fee: Money,
    #[serde(default)]
    pub inspection_fee: Money,
    #[serde(default)]
    pub title_insurance_percent: Percent,
    #[serde(default)]
    pub recording_fees: Money,
    #[serde(default)]
    pub transfer_tax_percent: Percent,
    /// Days of interest collected from closing to the first payment period.
    #[serde(default)]
    pub prepaid_interest_days: Decimal,
    #[serde(default)]
    pub annual_property_tax: Money,
    #[serde(default)]
    pub annual_insurance: Money,
    /// Months of tax and insurance deposited into escrow at closing.
    #[serde(default)]
    pub escrow_months: Decimal,
    #[serde(default)]
    pub other_fees: Vec<FeeItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosingCostItem {
    pub name: String,
    pub category: CostCategory,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosingCostsOutput {
    pub items: Vec<ClosingCostItem>,
    pub lender_fees: Money,
    pub third_party_fees: Money,
    pub government_fees: Money,
    pub prepaids: Money,
    pub total_closing_costs: Money,
    pub percent_of_price: Percent,
    pub down_payment: Money,
    pub cash_to_close: Money,
}

fn push_item(items: &mut Vec<ClosingCostItem>, name: &str, category: CostCategory, amount: Money) {
    if amount > Decimal::ZERO {
        items.push(ClosingCostItem {
            name: name.to_string(),
            category,
            amount,
        });
    }
}

/// Estimate closing costs line by line.
pub fn calculate_closing_costs(input: &ClosingCostsInput) -> ComputationOutput<ClosingCostsOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let price = non_negative(input.home_price);
    let mut loan = non_negative(input.loan_amount);
    if loan > price {
        warnings.push("Loan amount exceeds home price; capped at the price".into());
        loan = price;
    }
    let hundred = dec!(100);
    let months_per_year = Decimal::from(MONTHS_PER_YEAR);

    let mut items: Vec<ClosingCostItem> = Vec::new();
    push_item(
        &mut items,
        "Origination fee",
        CostCategory::Lender,
        loan * clamp_percent(input.origination_fee_percent) / hundred,
    );
    push_item(
        &mut items,
        "Discount points",
        CostCategory::Lender,
        loan * non_negative(input.discount_points) / hundred,
    );
    push_item(&mut items, "Appraisal", CostCategory::ThirdParty, non_negative(input.appraisal_fee));
    push_item(&mut items, "Home inspection", CostCategory::ThirdParty, non_negative(input.inspection_fee));
    push_item(
        &mut items,
        "Title insurance",
        CostCategory::ThirdParty,
        loan * clamp_percent(input.title_insurance_percent) / hundred,
    );
    push_item(&mut items, "Recording fees", CostCategory::Government, non_negative(input.recording_fees));
    push_item(
        &mut items,
        "Transfer tax",
        CostCategory::Government,
        price * clamp_percent(input.transfer_tax_percent) / hundred,
    );
    push_item(
        &mut items,
        "Prepaid interest",
        CostCategory::Prepaid,
        loan * non_negative(input.annual_rate_percent) / hundred / DAYS_PER_YEAR
            * Decimal::from(whole_count(input.prepaid_interest_days)),
    );
    let escrow_months = Decimal::from(whole_count(input.escrow_months));
    push_item(
        &mut items,
        "Property tax escrow",
        CostCategory::Prepaid,
        non_negative(input.annual_property_tax) / months_per_year * escrow_months,
    );
    push_item(
        &mut items,
        "Insurance escrow",
        CostCategory::Prepaid,
        non_negative(input.annual_insurance) / months_per_year * escrow_months,
    );
    for fee in &input.other_fees {
        push_item(&mut items, &fee.name, fee.category, non_negative(fee.amount));
    }

    let subtotal = |category: CostCategory| -> Money {
        items
            .iter()
            .filter(|i| i.category == category)
            .map(|i| i.amount)
            .sum()
    };
    let lender_fees = subtotal(CostCategory::Lender);
    let third_party_fees = subtotal(CostCategory::ThirdParty);
    let government_fees = subtotal(CostCategory::Government);
    let prepaids = subtotal(CostCategory::Prepaid);
    let total = lender_fees + third_party_fees + government_fees + prepaids;
    let down_payment = price - loan;

    let output = ClosingCostsOutput {
        items: items
            .iter()
            .map(|i| ClosingCostItem {
                name: i.name.clone(),
                category: i.category,
                amount: round_money(i.amount),
            })
            .collect(),
        lender_fees: round_money(lender_fees),
        third_party_fees: round_money(third_party_fees),
        government_fees: round_money(government_fees),
        prepaids: round_money(prepaids),
        total_closing_costs: round_money(total),
        percent_of_price: round_percent(ratio_percent(total, price)),
        down_payment: round_money(down_payment),
        cash_to_close: round_money(down_payment + total),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Closing costs: itemized lender, third-party, government and prepaid charges",
        &serde_json::json!({
            "day_count": DAYS_PER_YEAR.to_string(),
            "escrow_months": escrow_months.to_string(),
        }),
        warnings,
        elapsed,
        output,
    )
}
