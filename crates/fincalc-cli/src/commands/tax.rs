use serde_json::Value;

use fincalc_core::tax::income_tax;

use super::{run_with, InputArgs};

pub fn run_income_tax(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "income-tax", income_tax::calculate_income_tax)
}
