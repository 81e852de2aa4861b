//! JSON-RPC transport for the wallet provider and the contracts behind it
//!
//! This module provides the HTTP client and wire types used to talk to a wallet bridge that
//! speaks JSON-RPC 2.0. The bridge authorizes accounts, forwards read-only contract calls,
//! signs and submits state-changing calls, and reports transaction receipts.

/// HTTP JSON-RPC client
mod client;
/// Wire types, error codes and receipts
mod types;

pub use client::JsonRpcClient;
pub use types::*;
