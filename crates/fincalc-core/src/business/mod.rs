pub mod break_even;
pub mod profit_margin;
