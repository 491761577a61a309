pub mod business;
pub mod debt;
pub mod loans;
pub mod savings;
pub mod tax;

use clap::Args;
use fincalc_core::ComputationOutput;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::input;

/// Arguments shared by calculators that take a full input document.
#[derive(Args)]
pub struct InputArgs {
    /// Path to a JSON or YAML input file (reads piped JSON when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Load the input document from `--input` or stdin, if either was given.
pub fn try_load<T: DeserializeOwned>(path: Option<&str>) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(input::file::read_input(path)?));
    }
    match input::stdin::read_stdin()? {
        Some(data) => Ok(Some(serde_json::from_value(data)?)),
        None => Ok(None),
    }
}

/// Load the input document, failing when neither `--input` nor stdin is present.
pub fn load<T: DeserializeOwned>(args: &InputArgs, command: &str) -> Result<T, Box<dyn std::error::Error>> {
    try_load(args.input.as_deref())?
        .ok_or_else(|| format!("--input <file.json|file.yaml> or stdin required for {command}").into())
}

/// Load an input document and run a calculator over it.
pub fn run_with<T, O>(
    args: InputArgs,
    command: &str,
    calculate: fn(&T) -> ComputationOutput<O>,
) -> Result<Value, Box<dyn std::error::Error>>
where
    T: DeserializeOwned,
    O: Serialize,
{
    let parsed: T = load(&args, command)?;
    let result = calculate(&parsed);
    tracing::debug!(command, warnings = result.warnings.len(), "calculation complete");
    Ok(serde_json::to_value(result)?)
}
