use crate::contract::Address;

use serde::{Deserialize, Serialize};

/// Options for a state-changing contract call
#[derive(Debug, Clone)]
pub struct SendOptions {
	/// The account that signs and pays for the transaction
	pub from: Address,
}

impl SendOptions {
	pub fn signed_by(from: Address) -> Self {
		Self { from }
	}
}

/// Confirmation that a submitted transaction was included and committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
	pub transaction_hash: String,
	pub block_number: Option<String>,
}

/// Errors raised by contract reads and writes
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContractError {
	/// A read-only call failed on the network or node. Safe to retry.
	#[error("Remote read of {method} failed: {reason}")]
	RemoteRead { method: String, reason: String },

	/// The signer declined the transaction. Nothing was submitted.
	#[error("Transaction {method} was rejected by the signer: {reason}")]
	TransactionRejected { method: String, reason: String },

	/// The contract rejected the transaction.
	#[error("Transaction {method} was reverted: {reason}")]
	TransactionReverted { method: String, reason: String },

	/// The network failed around submission; the transaction may or may not have been applied.
	#[error("Remote write of {method} failed, outcome unknown: {reason}")]
	RemoteWrite {
		method: String,
		reason: String,
		transaction_hash: Option<String>,
	},

	/// A read succeeded but its result did not match the contract interface.
	#[error("Unexpected result from {method}: {reason}")]
	Decode { method: String, reason: String },
}

impl ContractError {
	pub fn method(&self) -> &str {
		match self {
			ContractError::RemoteRead { method, .. }
			| ContractError::TransactionRejected { method, .. }
			| ContractError::TransactionReverted { method, .. }
			| ContractError::RemoteWrite { method, .. }
			| ContractError::Decode { method, .. } => method,
		}
	}

	/// Only failed reads may be repeated. Writes are never retried.
	pub fn is_retryable(&self) -> bool {
		matches!(self, ContractError::RemoteRead { .. })
	}

	pub(crate) fn decode(method: &str, reason: impl Into<String>) -> Self {
		ContractError::Decode {
			method: method.to_string(),
			reason: reason.into(),
		}
	}
}
