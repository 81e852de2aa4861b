//!
//! Utility module for token amounts.
//!
//! Re-exports the exact decimal helpers used by the campaign repository and the orchestrator.
/// Fixed-scale decimal amounts and their contract encoding
pub mod amount;

pub use amount::{AmountError, AmountUnit, TokenAmount, format_token_amount, parse_token_amount};
