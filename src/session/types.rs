use crate::contract::{Address, ContractBinding};
use crate::session::WalletProvider;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The authenticated account controlling a session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(Address);

impl Identity {
	pub fn new(address: Address) -> Self {
		Self(address)
	}

	pub fn address(&self) -> &Address {
		&self.0
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// An authenticated identity bound to the provider that signs for it
///
/// Clones share one revocation flag: once the manager disconnects, no clone can bind new
/// contract handles.
#[derive(Clone)]
pub struct Session {
	identity: Identity,
	provider: Arc<dyn WalletProvider>,
	revoked: Arc<AtomicBool>,
}

impl Session {
	pub(crate) fn new(identity: Identity, provider: Arc<dyn WalletProvider>) -> Self {
		Self {
			identity,
			provider,
			revoked: Arc::new(AtomicBool::new(false)),
		}
	}

	pub fn identity(&self) -> &Identity {
		&self.identity
	}

	/// False once the session was disconnected.
	pub fn is_active(&self) -> bool {
		!self.revoked.load(Ordering::SeqCst)
	}

	/// Bind a signing-capable handle to the contract deployed at `address`.
	pub fn contract(&self, address: &Address) -> Result<Arc<dyn ContractBinding>, SessionError> {
		if !self.is_active() {
			return Err(SessionError::Disconnected(self.identity.to_string()));
		}
		Ok(self.provider.bind(address.clone()))
	}

	pub(crate) fn revoke(&self) {
		self.revoked.store(true, Ordering::SeqCst);
	}
}

impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("identity", &self.identity)
			.finish_non_exhaustive()
	}
}

/// Failures reported by a wallet provider
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
	#[error("Provider unreachable: {0}")]
	Unreachable(String),

	#[error("Provider denied the request: {0}")]
	Denied(String),
}

/// Session-level errors. None is retryable without user action.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
	#[error("No wallet provider available: {0}")]
	ProviderUnavailable(String),

	#[error("Wallet authorization denied: {0}")]
	AuthorizationDenied(String),

	/// The session was ended; reconnect to sign again.
	#[error("Session for {0} has been disconnected")]
	Disconnected(String),
}

impl From<ProviderError> for SessionError {
	fn from(error: ProviderError) -> Self {
		match error {
			ProviderError::Unreachable(reason) => SessionError::ProviderUnavailable(reason),
			ProviderError::Denied(reason) => SessionError::AuthorizationDenied(reason),
		}
	}
}
