//!
//! HTTP client for JSON-RPC 2.0 endpoints.
//!
//! This module provides an async client that posts JSON-RPC requests to a wallet bridge or
//! node and unwraps the response envelope. It performs no retries: callers decide whether a
//! failed request is safe to repeat.

use super::types::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// JSON-RPC client over HTTP
#[derive(Clone)]
pub struct JsonRpcClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// The JSON-RPC endpoint.
	url: String,
	/// Request id counter shared between clones.
	next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
	/// Create a new JSON-RPC client.
	///
	/// # Arguments
	/// * `url` - The HTTP endpoint to post requests to.
	/// * `timeout` - Per-request HTTP timeout.
	///
	/// # Returns
	/// A new `JsonRpcClient`, or an `RpcError` if the HTTP client cannot be built.
	pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
		let http_client = Client::builder().timeout(timeout).build()?;
		Ok(Self::with_client(url, http_client))
	}

	/// Create a client over an already configured HTTP client.
	pub fn with_client(url: impl Into<String>, http_client: Client) -> Self {
		Self {
			http_client,
			url: url.into(),
			next_id: Arc::new(AtomicU64::new(1)),
		}
	}

	/// Execute a JSON-RPC request.
	///
	/// # Arguments
	/// * `method` - The JSON-RPC method name.
	/// * `params` - The positional or named parameters.
	///
	/// # Returns
	/// The `result` member of the response (`Value::Null` when the endpoint returned null),
	/// or an `RpcError` if the request fails or the endpoint answers with an error object.
	pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let request_body = RpcRequest::new(id, method, params);
		debug!("JSON-RPC request #{} {} to {}", id, method, self.url);

		let response = self
			.http_client
			.post(&self.url)
			.header("Content-Type", "application/json")
			.json(&request_body)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(RpcError::HttpStatus(response.status().as_u16()));
		}

		let response: RpcResponse = response.json().await?;

		if let Some(error) = response.error {
			debug!(
				"JSON-RPC request #{} {} failed with code {}: {}",
				id, method, error.code, error.message
			);
			return Err(RpcError::Remote(error));
		}

		// Servers may answer a null id, but never somebody else's.
		if let Some(answered) = response.id.filter(|v| !v.is_null()) {
			if answered.as_u64() != Some(id) {
				return Err(RpcError::IdMismatch {
					expected: id,
					answered: answered.to_string(),
				});
			}
		}

		Ok(response.result.unwrap_or(Value::Null))
	}

	/// Execute a JSON-RPC request and deserialize a non-null result.
	pub async fn request_as<T: DeserializeOwned>(
		&self,
		method: &str,
		params: Value,
	) -> Result<T, RpcError> {
		let result = self.request(method, params).await?;
		if result.is_null() {
			return Err(RpcError::NoData);
		}
		Ok(serde_json::from_value(result)?)
	}
}
