mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::debt::DebtPayoffArgs;
use commands::loans::{AmortizeArgs, AprArgs};
use commands::InputArgs;

/// Personal-finance projections and loan amortization
#[derive(Parser)]
#[command(
    name = "fincalc",
    version,
    about = "Personal-finance projections and loan amortization",
    long_about = "A CLI for personal-finance calculations with decimal precision. \
                  Covers loans and mortgages, savings and retirement growth, debt \
                  payoff strategies, break-even and margin analysis, and income tax."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Emit debug diagnostics on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Amortization schedule for a level-payment loan
    Amortize(AmortizeArgs),
    /// Effective APR with fees and points
    Apr(AprArgs),
    /// Fixed-rate mortgage with escrow and PMI
    Mortgage(InputArgs),
    /// Auto loan with trade-in and sales tax
    AutoLoan(InputArgs),
    /// Personal loan with origination fee
    PersonalLoan(InputArgs),
    /// Student loan with grace period and repayment plans
    StudentLoan(InputArgs),
    /// Home equity line of credit
    Heloc(InputArgs),
    /// Refinance break-even
    Refinance(InputArgs),
    /// Home affordability from income and debts
    Affordability(InputArgs),
    /// Itemized closing costs and cash to close
    ClosingCosts(InputArgs),
    /// Vehicle lease payment
    Lease(InputArgs),
    /// Savings growth toward a goal
    SavingsGoal(InputArgs),
    /// Retirement accumulation and drawdown
    Retirement(InputArgs),
    /// 401(k) with employer match and deferral limits
    Retirement401k(InputArgs),
    /// Traditional vs Roth IRA
    Ira(InputArgs),
    /// Health savings account
    Hsa(InputArgs),
    /// College savings against projected tuition
    College(InputArgs),
    /// Dividend reinvestment growth
    Dividend(InputArgs),
    /// Multi-debt payoff (snowball or avalanche)
    DebtPayoff(DebtPayoffArgs),
    /// Credit card payoff at a fixed payment
    CreditCard(InputArgs),
    /// Break-even units and revenue
    BreakEven(InputArgs),
    /// Gross, operating and net margins
    ProfitMargin(InputArgs),
    /// Federal income tax, FICA and take-home pay
    IncomeTax(InputArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "fincalc=debug,fincalc_core=debug"
    } else {
        "fincalc=warn,fincalc_core=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::loans::run_amortize(args),
        Commands::Apr(args) => commands::loans::run_apr(args),
        Commands::Mortgage(args) => commands::loans::run_mortgage(args),
        Commands::AutoLoan(args) => commands::loans::run_auto_loan(args),
        Commands::PersonalLoan(args) => commands::loans::run_personal_loan(args),
        Commands::StudentLoan(args) => commands::loans::run_student_loan(args),
        Commands::Heloc(args) => commands::loans::run_heloc(args),
        Commands::Refinance(args) => commands::loans::run_refinance(args),
        Commands::Affordability(args) => commands::loans::run_affordability(args),
        Commands::ClosingCosts(args) => commands::loans::run_closing_costs(args),
        Commands::Lease(args) => commands::loans::run_lease(args),
        Commands::SavingsGoal(args) => commands::savings::run_savings_goal(args),
        Commands::Retirement(args) => commands::savings::run_retirement(args),
        Commands::Retirement401k(args) => commands::savings::run_401k(args),
        Commands::Ira(args) => commands::savings::run_ira(args),
        Commands::Hsa(args) => commands::savings::run_hsa(args),
        Commands::College(args) => commands::savings::run_college(args),
        Commands::Dividend(args) => commands::savings::run_dividend(args),
        Commands::DebtPayoff(args) => commands::debt::run_debt_payoff(args),
        Commands::CreditCard(args) => commands::debt::run_credit_card(args),
        Commands::BreakEven(args) => commands::business::run_break_even(args),
        Commands::ProfitMargin(args) => commands::business::run_profit_margin(args),
        Commands::IncomeTax(args) => commands::tax::run_income_tax(args),
        Commands::Version => {
            println!("fincalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
