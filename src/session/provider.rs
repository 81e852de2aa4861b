use crate::config::ClientConfig;
use crate::contract::{Address, ContractBinding, RpcContract};
use crate::rpc::{JsonRpcClient, RpcError};
use crate::session::ProviderError;

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// An external wallet that authorizes accounts and signs transactions
#[async_trait]
pub trait WalletProvider: Send + Sync {
	/// Ask the user to authorize this client.
	async fn enable(&self) -> Result<(), ProviderError>;

	/// Accounts the client has been authorized for, primary account first.
	async fn accounts(&self) -> Result<Vec<String>, ProviderError>;

	/// Bind a handle to the contract at `address` that signs through this provider.
	fn bind(&self, address: Address) -> Arc<dyn ContractBinding>;
}

/// Wallet provider reached over a JSON-RPC bridge
#[derive(Clone)]
pub struct RpcWalletProvider {
	client: JsonRpcClient,
	receipt_poll_interval: Duration,
}

impl RpcWalletProvider {
	pub fn new(client: JsonRpcClient, receipt_poll_interval: Duration) -> Self {
		Self {
			client,
			receipt_poll_interval,
		}
	}

	/// Build the provider named by the configuration, or `None` when no provider is configured.
	pub fn discover(config: &ClientConfig) -> Result<Option<Self>, RpcError> {
		let Some(url) = config.provider_url.as_deref() else {
			debug!("No wallet provider configured");
			return Ok(None);
		};

		info!("Discovered wallet provider at {}", url);
		let client = JsonRpcClient::new(url, config.http_timeout)?;
		Ok(Some(Self::new(client, config.receipt_poll_interval)))
	}
}

fn provider_error(error: RpcError) -> ProviderError {
	if error.is_transport() {
		ProviderError::Unreachable(error.to_string())
	} else {
		ProviderError::Denied(error.to_string())
	}
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
	async fn enable(&self) -> Result<(), ProviderError> {
		let accounts: Vec<String> = self
			.client
			.request_as("eth_requestAccounts", json!([]))
			.await
			.map_err(provider_error)?;
		debug!("Provider authorized {} account(s)", accounts.len());
		Ok(())
	}

	async fn accounts(&self) -> Result<Vec<String>, ProviderError> {
		self.client
			.request_as("eth_accounts", json!([]))
			.await
			.map_err(provider_error)
	}

	fn bind(&self, address: Address) -> Arc<dyn ContractBinding> {
		Arc::new(RpcContract::new(
			self.client.clone(),
			address,
			self.receipt_poll_interval,
		))
	}
}
