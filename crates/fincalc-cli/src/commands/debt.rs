use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::debt::credit_card;
use fincalc_core::debt::payoff::{self, DebtPayoffInput, PayoffStrategy};

use super::{load, run_with, InputArgs};

/// Arguments for the multi-debt payoff simulation
#[derive(Args)]
pub struct DebtPayoffArgs {
    #[command(flatten)]
    pub source: InputArgs,

    /// Payoff strategy: snowball or avalanche (overrides the input document)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Extra monthly payment on top of the minimums (overrides the input document)
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Run both strategies and a minimum-payments baseline side by side
    #[arg(long)]
    pub compare: bool,
}

pub fn run_debt_payoff(args: DebtPayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut payoff_input: DebtPayoffInput = load(&args.source, "debt-payoff")?;
    if let Some(ref name) = args.strategy {
        payoff_input.strategy = name.parse::<PayoffStrategy>()?;
    }
    if let Some(extra) = args.extra {
        payoff_input.extra_monthly_payment = extra;
    }

    if args.compare {
        let result = payoff::compare_strategies(&payoff_input);
        return Ok(serde_json::to_value(result)?);
    }
    let result = payoff::calculate_debt_payoff(&payoff_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_credit_card(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "credit-card", credit_card::calculate_credit_card)
}
