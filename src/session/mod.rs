//! Wallet session management
//!
//! A session binds an authenticated identity to the signing capability of an external wallet
//! provider. Contract handles can only be obtained from a live `Session`, so nothing that signs
//! can be constructed before an identity exists.

/// Session lifecycle: connect, disconnect, current identity
pub mod manager;
/// Wallet provider trait and the JSON-RPC provider
pub mod provider;
/// Identity, session and error types
pub mod types;

pub use manager::SessionManager;
pub use provider::{RpcWalletProvider, WalletProvider};
pub use types::*;
