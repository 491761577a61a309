use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loans::amortization::{amortize_terms, Amortization, ScheduleRow};
use crate::normalize::{non_negative, LoanTerms};
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Percent};

const STANDARD_TERM_YEARS: u32 = 10;
const EXTENDED_TERM_YEARS: u32 = 25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentPlan {
    #[default]
    Standard,
    Extended,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentLoanInput {
    pub balance: Money,
    pub annual_rate_percent: Percent,
    #[serde(default)]
    pub plan: RepaymentPlan,
    /// Term for the `custom` plan; ignored otherwise.
    #[serde(default)]
    pub term_years: Option<Decimal>,
    #[serde(default)]
    pub extra_monthly_payment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub plan: RepaymentPlan,
    pub term_months: u32,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_paid: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentLoanOutput {
    pub plan: RepaymentPlan,
    pub term_months: u32,
    pub monthly_payment: Money,
    pub payoff_months: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    pub interest_saved: Money,
    pub months_saved: u32,
    pub plan_comparison: Vec<PlanSummary>,
    pub schedule: Vec<ScheduleRow>,
}

fn plan_years(plan: RepaymentPlan, custom: Option<Decimal>) -> Decimal {
    match plan {
        RepaymentPlan::Standard => Decimal::from(STANDARD_TERM_YEARS),
        RepaymentPlan::Extended => Decimal::from(EXTENDED_TERM_YEARS),
        RepaymentPlan::Custom => custom.unwrap_or(Decimal::from(STANDARD_TERM_YEARS)),
    }
}

fn summarize_plan(plan: RepaymentPlan, terms: &LoanTerms, loan: &Amortization) -> PlanSummary {
    PlanSummary {
        plan,
        term_months: terms.term_periods,
        monthly_payment: round_money(loan.payment),
        total_interest: round_money(loan.total_interest),
        total_paid: round_money(loan.total_payment),
    }
}

/// Student loan schedule for the chosen plan, with standard and extended
/// plans summarized side by side.
pub fn calculate_student_loan(input: &StudentLoanInput) -> ComputationOutput<StudentLoanOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.plan == RepaymentPlan::Custom && input.term_years.is_none() {
        warnings.push(format!(
            "Custom plan without term_years; using {STANDARD_TERM_YEARS} years"
        ));
    }

    let balance = non_negative(input.balance);
    let extra = non_negative(input.extra_monthly_payment);
    let terms = LoanTerms::from_years(
        balance,
        input.annual_rate_percent,
        plan_years(input.plan, input.term_years),
    );

    let baseline = amortize_terms(&terms, Decimal::ZERO);
    let actual = amortize_terms(&terms, extra);

    let plan_comparison = [RepaymentPlan::Standard, RepaymentPlan::Extended]
        .into_iter()
        .map(|plan| {
            let plan_terms =
                LoanTerms::from_years(balance, input.annual_rate_percent, plan_years(plan, None));
            summarize_plan(plan, &plan_terms, &amortize_terms(&plan_terms, Decimal::ZERO))
        })
        .collect();

    let output = StudentLoanOutput {
        plan: input.plan,
        term_months: terms.term_periods,
        monthly_payment: round_money(actual.payment),
        payoff_months: actual.periods(),
        total_interest: round_money(actual.total_interest),
        total_paid: round_money(actual.total_payment),
        interest_saved: round_money((baseline.total_interest - actual.total_interest).max(Decimal::ZERO)),
        months_saved: baseline.periods().saturating_sub(actual.periods()),
        plan_comparison,
        schedule: actual.schedule.iter().map(ScheduleRow::rounded).collect(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Student loan: level-payment amortization by repayment plan",
        &serde_json::json!({
            "plan": format!("{:?}", input.plan),
            "term_months": terms.term_periods,
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

    fn default_input() -> StudentLoanInput {
        StudentLoanInput {
            balance: dec!(35_000),
            annual_rate_percent: dec!(5.5),
            plan: RepaymentPlan::Standard,
            term_years: None,
            extra_monthly_payment: Decimal::ZERO,
        }
    }

    #[test]
    fn test_standard_plan_is_ten_years() {
        let out = calculate_student_loan(&default_input());
        assert_eq!(out.result.term_months, 120);
        assert_eq!(out.result.payoff_months, 120);
        assert_eq!(out.result.months_saved, 0);
    }

    #[test]
    fn test_extended_plan_costs_more_interest() {
        let out = calculate_student_loan(&default_input());
        let cmp = &out.result.plan_comparison;
        assert_eq!(cmp.len(), 2);
        assert!(cmp[1].monthly_payment < cmp[0].monthly_payment);
        assert!(cmp[1].total_interest > cmp[0].total_interest);
    }

    #[test]
    fn test_extra_payment_saves_months() {
        let mut input = default_input();
        input.extra_monthly_payment = dec!(100);
        let out = calculate_student_loan(&input);
        assert!(out.result.payoff_months < 120);
        assert!(out.result.interest_saved > Decimal::ZERO);
    }

    #[test]
    fn test_custom_without_term_warns() {
        let mut input = default_input();
        input.plan = RepaymentPlan::Custom;
        let out = calculate_student_loan(&input);
        assert_eq!(out.result.term_months, 120);
        assert_eq!(out.warnings.len(), 1);
    }
}
