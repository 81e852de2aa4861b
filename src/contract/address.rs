use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
	#[error("address '{0}' is missing the 0x prefix")]
	MissingPrefix(String),
	#[error("address '{0}' must be 20 bytes")]
	InvalidLength(String),
	#[error("address '{0}' is not valid hex")]
	InvalidHex(String),
}

/// A 20-byte account or contract address, kept in the form it was given.
#[derive(Debug, Clone)]
pub struct Address {
	text: String,
	bytes: [u8; 20],
}

impl Address {
	pub fn parse(encoded: &str) -> Result<Self, AddressError> {
		let encoded = encoded.trim();
		let digits = encoded
			.strip_prefix("0x")
			.or_else(|| encoded.strip_prefix("0X"))
			.ok_or_else(|| AddressError::MissingPrefix(encoded.to_string()))?;
		if digits.len() != 40 {
			return Err(AddressError::InvalidLength(encoded.to_string()));
		}

		let mut bytes = [0u8; 20];
		hex::decode_to_slice(digits, &mut bytes)
			.map_err(|_| AddressError::InvalidHex(encoded.to_string()))?;

		Ok(Self {
			text: encoded.to_string(),
			bytes,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.text
	}

	pub fn as_bytes(&self) -> &[u8; 20] {
		&self.bytes
	}
}

// Checksum casing is presentation only.
impl PartialEq for Address {
	fn eq(&self, other: &Self) -> bool {
		self.bytes == other.bytes
	}
}

impl Eq for Address {}

impl std::hash::Hash for Address {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.bytes.hash(state);
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}

impl FromStr for Address {
	type Err = AddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
