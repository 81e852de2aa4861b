//!
//! Contract handles for reading and writing through the wallet bridge.
//!
//! `ContractBinding` is the seam every higher layer depends on. `RpcContract` implements it over
//! JSON-RPC: reads are forwarded as `contract_call`, writes are signed and submitted with
//! `contract_send` and then followed until a receipt appears.

use crate::contract::{Address, ContractError, Receipt, SendOptions};
use crate::rpc::{JsonRpcClient, RpcError, TransactionReceipt};

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, info};

/// Typed handle to a deployed contract.
#[async_trait]
pub trait ContractBinding: Send + Sync {
	/// Address of the deployed contract
	fn address(&self) -> &Address;

	/// Read-only call. No signing, no state change.
	async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, ContractError>;

	/// State-changing call. Signs as `options.from` and waits for inclusion.
	async fn send(
		&self,
		method: &str,
		args: Vec<Value>,
		options: &SendOptions,
	) -> Result<Receipt, ContractError>;
}

/// Contract handle backed by a JSON-RPC wallet bridge
#[derive(Clone)]
pub struct RpcContract {
	client: JsonRpcClient,
	address: Address,
	receipt_poll_interval: Duration,
}

impl RpcContract {
	/// Creates a new contract handle
	pub fn new(client: JsonRpcClient, address: Address, receipt_poll_interval: Duration) -> Self {
		Self {
			client,
			address,
			receipt_poll_interval,
		}
	}

	async fn submit(
		&self,
		method: &str,
		args: Vec<Value>,
		options: &SendOptions,
	) -> Result<String, ContractError> {
		let params = json!([{
			"to": self.address.as_str(),
			"from": options.from.as_str(),
			"method": method,
			"args": args,
		}]);

		let result = self
			.client
			.request("contract_send", params)
			.await
			.map_err(|e| classify_send_error(method, e))?;

		match result {
			Value::String(hash) if !hash.is_empty() => Ok(hash),
			other => Err(ContractError::RemoteWrite {
				method: method.to_string(),
				reason: format!("bridge returned no transaction hash: {}", other),
				transaction_hash: None,
			}),
		}
	}

	async fn wait_for_receipt(
		&self,
		method: &str,
		tx_hash: &str,
	) -> Result<TransactionReceipt, ContractError> {
		loop {
			let result = self
				.client
				.request("eth_getTransactionReceipt", json!([tx_hash]))
				.await
				.map_err(|e| ContractError::RemoteWrite {
					method: method.to_string(),
					reason: format!("lost track of submitted transaction: {}", e),
					transaction_hash: Some(tx_hash.to_string()),
				})?;

			if result.is_null() {
				debug!("Transaction {} not yet included", tx_hash);
				tokio::time::sleep(self.receipt_poll_interval).await;
				continue;
			}

			return serde_json::from_value(result).map_err(|e| ContractError::RemoteWrite {
				method: method.to_string(),
				reason: format!("unreadable receipt: {}", e),
				transaction_hash: Some(tx_hash.to_string()),
			});
		}
	}
}

#[async_trait]
impl ContractBinding for RpcContract {
	fn address(&self) -> &Address {
		&self.address
	}

	async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, ContractError> {
		let params = json!([{
			"to": self.address.as_str(),
			"method": method,
			"args": args,
		}]);

		self.client
			.request("contract_call", params)
			.await
			.map_err(|e| ContractError::RemoteRead {
				method: method.to_string(),
				reason: e.to_string(),
			})
	}

	async fn send(
		&self,
		method: &str,
		args: Vec<Value>,
		options: &SendOptions,
	) -> Result<Receipt, ContractError> {
		let tx_hash = self.submit(method, args, options).await?;
		info!("Submitted {} to {} as {}", method, self.address, tx_hash);

		let receipt = self.wait_for_receipt(method, &tx_hash).await?;
		if !receipt.status.is_committed() {
			error!("Transaction {} ({}) reverted", tx_hash, method);
			return Err(ContractError::TransactionReverted {
				method: method.to_string(),
				reason: format!("transaction {} reverted", tx_hash),
			});
		}

		info!(
			"Transaction {} ({}) committed in block {:?}",
			tx_hash, method, receipt.block_number
		);
		Ok(Receipt {
			transaction_hash: receipt.transaction_hash,
			block_number: receipt.block_number,
		})
	}
}

/// Map a failed `contract_send` request onto the write error taxonomy.
fn classify_send_error(method: &str, error: RpcError) -> ContractError {
	let method = method.to_string();
	match error.remote() {
		Some(object) if object.is_user_rejection() => ContractError::TransactionRejected {
			method,
			reason: object.message.clone(),
		},
		Some(object) if object.is_revert() => ContractError::TransactionReverted {
			method,
			reason: object.message.clone(),
		},
		_ => ContractError::RemoteWrite {
			method,
			reason: error.to_string(),
			transaction_hash: None,
		},
	}
}
