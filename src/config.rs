//! Client configuration.
//!
//! Defaults target the public crowdfunding deployment and its payment token. Every field can be
//! overridden from the environment.

use crate::contract::{Address, AddressError};
use crate::utils::AmountUnit;

use std::time::Duration;
use thiserror::Error;

pub const ENV_PROVIDER_URL: &str = "CROWDFUND_PROVIDER_URL";
pub const ENV_CONTRACT_ADDRESS: &str = "CROWDFUND_CONTRACT_ADDRESS";
pub const ENV_TOKEN_ADDRESS: &str = "CROWDFUND_TOKEN_ADDRESS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "CROWDFUND_HTTP_TIMEOUT_SECS";
pub const ENV_RECEIPT_POLL_MS: &str = "CROWDFUND_RECEIPT_POLL_MS";
pub const ENV_REFRESH_RETRY_SECS: &str = "CROWDFUND_REFRESH_RETRY_SECS";
pub const ENV_AMOUNT_UNIT: &str = "CROWDFUND_AMOUNT_UNIT";

const DEFAULT_CONTRACT_ADDRESS: &str = "0x7EC6c1FE083621ece6F75D998A060C912486AAF7";
const DEFAULT_TOKEN_ADDRESS: &str = "0x874069Fa1Eb16D44d622F2e0Ca25eeA172369bC1";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid value '{value}' for {key}: {reason}")]
	Invalid {
		key: &'static str,
		value: String,
		reason: String,
	},
	#[error("invalid address for {key}: {source}")]
	Address {
		key: &'static str,
		source: AddressError,
	},
}

/// Configuration for the crowdfunding client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// Wallet provider JSON-RPC endpoint. `None` when no provider is installed.
	pub provider_url: Option<String>,
	/// Crowdfunding contract address.
	pub contract_address: Address,
	/// Payment token contract address.
	pub token_address: Address,
	/// HTTP request timeout for provider calls.
	pub http_timeout: Duration,
	/// Delay between receipt polls while a transaction awaits inclusion.
	pub receipt_poll_interval: Duration,
	/// Upper bound on time spent retrying a failed campaign refresh.
	pub refresh_retry_max_elapsed: Duration,
	/// Unit of the amounts exchanged with the crowdfunding contract.
	pub amount_unit: AmountUnit,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			provider_url: None,
			contract_address: Address::parse(DEFAULT_CONTRACT_ADDRESS)
				.unwrap_or_else(|_| unreachable!("default contract address is well formed")),
			token_address: Address::parse(DEFAULT_TOKEN_ADDRESS)
				.unwrap_or_else(|_| unreachable!("default token address is well formed")),
			http_timeout: Duration::from_secs(30),
			receipt_poll_interval: Duration::from_millis(1000),
			refresh_retry_max_elapsed: Duration::from_secs(30),
			amount_unit: AmountUnit::Whole,
		}
	}
}

impl ClientConfig {
	/// Build config from environment variables, falling back to defaults.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Build config from an arbitrary key lookup. Blank values count as unset.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let get = |key: &str| {
			lookup(key)
				.map(|v| v.trim().to_string())
				.filter(|v| !v.is_empty())
		};
		let mut config = Self::default();

		if let Some(url) = get(ENV_PROVIDER_URL) {
			config.provider_url = Some(url);
		}
		if let Some(value) = get(ENV_CONTRACT_ADDRESS) {
			config.contract_address = parse_address(ENV_CONTRACT_ADDRESS, &value)?;
		}
		if let Some(value) = get(ENV_TOKEN_ADDRESS) {
			config.token_address = parse_address(ENV_TOKEN_ADDRESS, &value)?;
		}
		if let Some(value) = get(ENV_HTTP_TIMEOUT_SECS) {
			config.http_timeout = Duration::from_secs(parse_number(ENV_HTTP_TIMEOUT_SECS, &value)?);
		}
		if let Some(value) = get(ENV_RECEIPT_POLL_MS) {
			config.receipt_poll_interval =
				Duration::from_millis(parse_number(ENV_RECEIPT_POLL_MS, &value)?);
		}
		if let Some(value) = get(ENV_REFRESH_RETRY_SECS) {
			config.refresh_retry_max_elapsed =
				Duration::from_secs(parse_number(ENV_REFRESH_RETRY_SECS, &value)?);
		}
		if let Some(value) = get(ENV_AMOUNT_UNIT) {
			config.amount_unit = value.parse().map_err(|e: crate::utils::AmountError| {
				ConfigError::Invalid {
					key: ENV_AMOUNT_UNIT,
					value: value.clone(),
					reason: e.to_string(),
				}
			})?;
		}

		Ok(config)
	}
}

fn parse_address(key: &'static str, value: &str) -> Result<Address, ConfigError> {
	Address::parse(value).map_err(|source| ConfigError::Address { key, source })
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
	value.parse::<u64>().map_err(|e| ConfigError::Invalid {
		key,
		value: value.to_string(),
		reason: e.to_string(),
	})
}
