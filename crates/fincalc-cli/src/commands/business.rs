use serde_json::Value;

use fincalc_core::business::{break_even, profit_margin};

use super::{run_with, InputArgs};

pub fn run_break_even(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "break-even", break_even::calculate_break_even)
}

pub fn run_profit_margin(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "profit-margin", profit_margin::calculate_profit_margin)
}
