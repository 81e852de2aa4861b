//! Types for JSON-RPC requests, responses and transaction receipts

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// EIP-1193: the requested account or method has not been authorized.
pub const UNAUTHORIZED: i64 = 4100;
/// EIP-1474: execution reverted during gas estimation or simulation.
pub const EXECUTION_REVERTED: i64 = 3;
/// Generic node-side failure, used by several clients for reverts as well.
pub const SERVER_ERROR: i64 = -32000;

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response envelope. Exactly one of `result` or `error` is expected.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// The error member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    /// The signer declined the request.
    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_REQUEST || self.code == UNAUTHORIZED
    }

    /// The contract rejected the call.
    pub fn is_revert(&self) -> bool {
        self.code == EXECUTION_REVERTED
            || (self.code == SERVER_ERROR && self.message.to_ascii_lowercase().contains("revert"))
    }
}

/// Outcome of an included transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub enum ReceiptStatus {
    /// The transaction executed and its effects are committed
    Committed,
    /// The transaction was included but reverted by the contract
    Reverted,
}

impl ReceiptStatus {
    pub fn is_committed(&self) -> bool {
        matches!(self, ReceiptStatus::Committed)
    }
}

impl TryFrom<Value> for ReceiptStatus {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match &value {
            Value::Bool(true) => Ok(ReceiptStatus::Committed),
            Value::Bool(false) => Ok(ReceiptStatus::Reverted),
            Value::Number(n) => match n.as_u64() {
                Some(1) => Ok(ReceiptStatus::Committed),
                Some(0) => Ok(ReceiptStatus::Reverted),
                _ => Err(format!("Unknown receipt status: {}", value)),
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "0x1" | "1" | "0x01" => Ok(ReceiptStatus::Committed),
                "0x0" | "0" | "0x00" => Ok(ReceiptStatus::Reverted),
                _ => Err(format!("Unknown receipt status: {}", s)),
            },
            _ => Err(format!("Unknown receipt status: {}", value)),
        }
    }
}

/// Transaction receipt as reported by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// The transaction hash.
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    /// The block the transaction was included in, hex encoded.
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
    /// Whether the transaction committed or reverted.
    pub status: ReceiptStatus,
}

/// Error types for JSON-RPC transport
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("RPC error {}: {}", .0.code, .0.message)]
    Remote(RpcErrorObject),

    #[error("Response id {answered} does not match request id {expected}")]
    IdMismatch { expected: u64, answered: String },

    #[error("No result returned")]
    NoData,
}

impl RpcError {
    /// The JSON-RPC error object, when the remote end answered with one.
    pub fn remote(&self) -> Option<&RpcErrorObject> {
        match self {
            RpcError::Remote(object) => Some(object),
            _ => None,
        }
    }

    /// The request never produced a JSON-RPC answer (connection, timeout or HTTP failure).
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::HttpError(_) | RpcError::HttpStatus(_))
    }
}
