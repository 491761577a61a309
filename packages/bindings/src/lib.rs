use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use fincalc_core::ComputationOutput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse a JSON input, run a calculator, and serialise the envelope.
fn run_json<T, O>(input_json: &str, calculate: fn(&T) -> ComputationOutput<O>) -> NapiResult<String>
where
    T: DeserializeOwned,
    O: Serialize,
{
    let input: T = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calculate(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AmortizeRequest {
    #[serde(flatten)]
    terms: fincalc_core::normalize::LoanTerms,
    #[serde(default)]
    extra_payment: Decimal,
}

#[napi]
pub fn amortize(input_json: String) -> NapiResult<String> {
    let request: AmortizeRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fincalc_core::loans::amortization::amortize_terms(&request.terms, request.extra_payment)
            .rounded();
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_apr(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::apr::calculate_apr)
}

#[napi]
pub fn calculate_mortgage(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::mortgage::calculate_mortgage)
}

#[napi]
pub fn calculate_auto_loan(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::auto_loan::calculate_auto_loan)
}

#[napi]
pub fn calculate_personal_loan(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::personal_loan::calculate_personal_loan)
}

#[napi]
pub fn calculate_student_loan(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::student_loan::calculate_student_loan)
}

#[napi]
pub fn calculate_heloc(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::heloc::calculate_heloc)
}

#[napi]
pub fn calculate_refinance(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::refinance::calculate_refinance)
}

#[napi]
pub fn calculate_affordability(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::affordability::calculate_affordability)
}

#[napi]
pub fn calculate_closing_costs(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::closing_costs::calculate_closing_costs)
}

#[napi]
pub fn calculate_lease(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::loans::lease::calculate_lease)
}

// ---------------------------------------------------------------------------
// Savings and retirement
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_savings_goal(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::savings::savings_goal::calculate_savings_goal)
}

#[napi]
pub fn calculate_retirement(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::savings::retirement::calculate_retirement)
}

#[napi(js_name = "calculate401k")]
pub fn calculate_401k(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::savings::retirement_401k::calculate_401k)
}

#[napi]
pub fn calculate_ira(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::savings::ira::calculate_ira)
}

#[napi]
pub fn calculate_hsa(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::savings::hsa::calculate_hsa)
}

#[napi]
pub fn calculate_college(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::savings::college::calculate_college)
}

#[napi]
pub fn calculate_dividend(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::savings::dividend::calculate_dividend)
}

// ---------------------------------------------------------------------------
// Debt
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_debt_payoff(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::debt::payoff::calculate_debt_payoff)
}

#[napi]
pub fn compare_debt_strategies(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::debt::payoff::compare_strategies)
}

#[napi]
pub fn calculate_credit_card(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::debt::credit_card::calculate_credit_card)
}

// ---------------------------------------------------------------------------
// Business and tax
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_break_even(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::business::break_even::calculate_break_even)
}

#[napi]
pub fn calculate_profit_margin(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::business::profit_margin::calculate_profit_margin)
}

#[napi]
pub fn calculate_income_tax(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::tax::income_tax::calculate_income_tax)
}
