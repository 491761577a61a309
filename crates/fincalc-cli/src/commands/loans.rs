use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::loans::affordability;
use fincalc_core::loans::amortization::{self, amortize_terms};
use fincalc_core::loans::apr::{self, AprInput};
use fincalc_core::loans::auto_loan;
use fincalc_core::loans::closing_costs;
use fincalc_core::loans::heloc;
use fincalc_core::loans::lease;
use fincalc_core::loans::mortgage;
use fincalc_core::loans::personal_loan;
use fincalc_core::loans::refinance;
use fincalc_core::loans::student_loan;
use fincalc_core::normalize::{LoanTerms, RawLoanTerms};

use super::{run_with, try_load, InputArgs};

/// Arguments for a plain amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to a JSON or YAML file holding loan terms (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed; currency symbols and separators are accepted
    #[arg(long)]
    pub principal: Option<String>,

    /// Annual interest rate in percent (e.g. 6.5)
    #[arg(long)]
    pub rate: Option<String>,

    /// Number of monthly payments
    #[arg(long)]
    pub months: Option<String>,

    /// Extra principal paid every period
    #[arg(long, default_value = "0")]
    pub extra: Decimal,

    /// Payments per year (12 monthly, 26 biweekly, 52 weekly)
    #[arg(long, default_value_t = 12)]
    pub periods_per_year: u32,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = match try_load(args.input.as_deref())? {
        Some(terms) => terms,
        None => {
            let raw = RawLoanTerms {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
                term_months: args.months.ok_or("--months is required (or provide --input)")?,
            };
            LoanTerms::from_raw(&raw).with_periods_per_year(args.periods_per_year)
        }
    };

    let schedule = amortize_terms(&terms, args.extra).rounded();
    let yearly = amortization::yearly_summary(&schedule.schedule, terms.periods_per_year);
    Ok(serde_json::json!({
        "terms": terms,
        "payment": schedule.payment,
        "periods": schedule.periods(),
        "total_payment": schedule.total_payment,
        "total_interest": schedule.total_interest,
        "yearly_summary": yearly,
        "schedule": schedule.schedule,
    }))
}

/// Arguments for the APR calculation
#[derive(Args)]
pub struct AprArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Stated annual rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long, default_value = "30")]
    pub term_years: Decimal,

    /// Lender fees and prepaid finance charges
    #[arg(long, default_value = "0")]
    pub closing_costs: Decimal,

    /// Discount points as a percentage of the loan amount
    #[arg(long, default_value = "0")]
    pub points: Decimal,
}

pub fn run_apr(args: AprArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let apr_input: AprInput = match try_load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => AprInput {
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.term_years,
            closing_costs: args.closing_costs,
            points_percent: args.points,
        },
    };

    let result = apr::calculate_apr(&apr_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_mortgage(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "mortgage", mortgage::calculate_mortgage)
}

pub fn run_auto_loan(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "auto-loan", auto_loan::calculate_auto_loan)
}

pub fn run_personal_loan(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "personal-loan", personal_loan::calculate_personal_loan)
}

pub fn run_student_loan(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "student-loan", student_loan::calculate_student_loan)
}

pub fn run_heloc(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "heloc", heloc::calculate_heloc)
}

pub fn run_refinance(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "refinance", refinance::calculate_refinance)
}

pub fn run_affordability(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "affordability", affordability::calculate_affordability)
}

pub fn run_closing_costs(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "closing-costs", closing_costs::calculate_closing_costs)
}

pub fn run_lease(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "lease", lease::calculate_lease)
}
