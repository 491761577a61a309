pub mod error;
pub mod normalize;
pub mod time_value;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "savings")]
pub mod savings;

#[cfg(feature = "debt")]
pub mod debt;

#[cfg(feature = "business")]
pub mod business;

#[cfg(feature = "tax")]
pub mod tax;

pub use error::FinCalcError;
pub use types::*;

/// Standard result type for boundary operations (parsing, serialization).
pub type FinCalcResult<T> = Result<T, FinCalcError>;
