use serde_json::Value;

/// Headline field for each calculator, checked in order.
const PRIORITY_KEYS: [&str; 18] = [
    "total_monthly_payment",
    "monthly_payment",
    "payment",
    "apr_percent",
    "max_home_price",
    "cash_to_close",
    "break_even_month",
    "balance_at_retirement",
    "final_portfolio_value",
    "better_account",
    "final_balance",
    "shortfall",
    "months_to_debt_free",
    "months_to_payoff",
    "recommended",
    "break_even_units",
    "net_margin_percent",
    "take_home_pay",
];

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
