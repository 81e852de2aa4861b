//! Exact decimal token amounts.
//!
//! Amounts are held as base units in a `BigUint` and shifted by a fixed number of decimal
//! places when converting to and from their human-readable form. No floating point is involved
//! at any step, so values far beyond `u128` survive a parse/format cycle unchanged.

use crate::contract::TOKEN_DECIMALS;

use num_bigint::BigUint;
use std::fmt;
use std::str::FromStr;

/// Errors raised while parsing or encoding token amounts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
	#[error("Amount is empty")]
	Empty,

	#[error("Amount '{0}' is not a non-negative decimal number")]
	Malformed(String),

	#[error("Amount '{value}' has more than {decimals} decimal places")]
	TooPrecise { value: String, decimals: u32 },

	#[error("Amount '{0}' has a fractional part but whole token units are required")]
	Fractional(String),

	#[error("Unknown amount unit '{0}' (expected 'whole' or 'base')")]
	UnknownUnit(String),
}

/// Parse a human-readable decimal string into base units, shifting by `decimals` places.
pub fn parse_token_amount(value: &str, decimals: u32) -> Result<BigUint, AmountError> {
	let value = value.trim();
	if value.is_empty() {
		return Err(AmountError::Empty);
	}

	let (int_part, frac_part) = match value.split_once('.') {
		Some((int_part, frac_part)) => (int_part, frac_part),
		None => (value, ""),
	};

	let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
	if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
	{
		return Err(AmountError::Malformed(value.to_string()));
	}

	let frac_trimmed = frac_part.trim_end_matches('0');
	if frac_trimmed.len() > decimals as usize {
		return Err(AmountError::TooPrecise {
			value: value.to_string(),
			decimals,
		});
	}

	let mut digits = String::with_capacity(int_part.len() + decimals as usize);
	digits.push_str(if int_part.is_empty() { "0" } else { int_part });
	digits.push_str(frac_trimmed);
	for _ in frac_trimmed.len()..decimals as usize {
		digits.push('0');
	}

	BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| AmountError::Malformed(value.to_string()))
}

/// Format base units as a decimal string with `decimals` places, trailing zeros removed.
pub fn format_token_amount(amount: &BigUint, decimals: u32) -> String {
	let digits = amount.to_str_radix(10);
	let decimals = decimals as usize;
	if decimals == 0 {
		return digits;
	}

	let padded = if digits.len() <= decimals {
		format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
	} else {
		digits
	};

	let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
	let frac_part = frac_part.trim_end_matches('0');
	if frac_part.is_empty() {
		int_part.to_string()
	} else {
		format!("{}.{}", int_part, frac_part)
	}
}

fn scale_factor() -> BigUint {
	BigUint::from(10u32).pow(TOKEN_DECIMALS)
}

/// A token amount with a fixed 18-place decimal scale.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount {
	base_units: BigUint,
}

impl TokenAmount {
	pub fn from_base_units(base_units: BigUint) -> Self {
		Self { base_units }
	}

	pub fn from_whole_units(whole: BigUint) -> Self {
		Self {
			base_units: whole * scale_factor(),
		}
	}

	/// Parse a human-readable amount such as `"12.5"`.
	pub fn parse(value: &str) -> Result<Self, AmountError> {
		parse_token_amount(value, TOKEN_DECIMALS).map(Self::from_base_units)
	}

	pub fn base_units(&self) -> &BigUint {
		&self.base_units
	}

	/// Whole token units, or `None` when the amount has a fractional part.
	pub fn whole_units(&self) -> Option<BigUint> {
		let scale = scale_factor();
		if (&self.base_units % &scale) == BigUint::ZERO {
			Some(&self.base_units / scale)
		} else {
			None
		}
	}

	pub fn is_zero(&self) -> bool {
		self.base_units == BigUint::ZERO
	}
}

impl fmt::Display for TokenAmount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&format_token_amount(&self.base_units, TOKEN_DECIMALS))
	}
}

impl FromStr for TokenAmount {
	type Err = AmountError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

/// Unit in which the crowdfunding contract expresses campaign amounts.
///
/// The token `approve` call always takes base units; this only governs `createCampaign`,
/// `fundCampaign` and the amounts returned by `getCampaign`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AmountUnit {
	/// Unscaled whole tokens.
	#[default]
	Whole,
	/// 18-decimal base units.
	Base,
}

impl AmountUnit {
	/// Encode an amount as the decimal integer string the contract expects.
	pub fn encode(&self, amount: &TokenAmount) -> Result<String, AmountError> {
		match self {
			AmountUnit::Whole => amount
				.whole_units()
				.map(|whole| whole.to_str_radix(10))
				.ok_or_else(|| AmountError::Fractional(amount.to_string())),
			AmountUnit::Base => Ok(amount.base_units().to_str_radix(10)),
		}
	}

	/// Interpret a raw unsigned integer returned by the contract.
	pub fn decode(&self, raw: BigUint) -> TokenAmount {
		match self {
			AmountUnit::Whole => TokenAmount::from_whole_units(raw),
			AmountUnit::Base => TokenAmount::from_base_units(raw),
		}
	}
}

impl FromStr for AmountUnit {
	type Err = AmountError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"whole" => Ok(AmountUnit::Whole),
			"base" => Ok(AmountUnit::Base),
			other => Err(AmountError::UnknownUnit(other.to_string())),
		}
	}
}
