use serde_json::Value;

use fincalc_core::savings::{college, dividend, hsa, ira, retirement, retirement_401k, savings_goal};

use super::{run_with, InputArgs};

pub fn run_savings_goal(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "savings-goal", savings_goal::calculate_savings_goal)
}

pub fn run_retirement(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "retirement", retirement::calculate_retirement)
}

pub fn run_401k(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "retirement401k", retirement_401k::calculate_401k)
}

pub fn run_ira(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "ira", ira::calculate_ira)
}

pub fn run_hsa(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "hsa", hsa::calculate_hsa)
}

pub fn run_college(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "college", college::calculate_college)
}

pub fn run_dividend(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    run_with(args, "dividend", dividend::calculate_dividend)
}
