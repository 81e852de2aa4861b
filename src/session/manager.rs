//! Session lifecycle.
//!
//! `SessionManager` acquires the signing capability of a wallet provider, records the
//! authenticated identity for the rest of the session, and reports the outcome through the
//! notification sink.

use crate::contract::Address;
use crate::notify::{Level, NotificationSink};
use crate::session::{Identity, Session, SessionError, WalletProvider};

use std::sync::Arc;
use tracing::{error, info, warn};

/// Holds the authenticated identity of the current session
pub struct SessionManager {
	/// `None` when no provider is discoverable in this environment
	provider: Option<Arc<dyn WalletProvider>>,
	notifier: Arc<dyn NotificationSink>,
	session: Option<Session>,
}

impl SessionManager {
	pub fn new(
		provider: Option<Arc<dyn WalletProvider>>,
		notifier: Arc<dyn NotificationSink>,
	) -> Self {
		Self {
			provider,
			notifier,
			session: None,
		}
	}

	/// Acquire a signing capability and establish the session identity.
	///
	/// Returns the existing session when already connected. On failure the identity stays unset
	/// and exactly one notification describes the cause.
	pub async fn connect(&mut self) -> Result<Session, SessionError> {
		if let Some(session) = &self.session {
			return Ok(session.clone());
		}

		let Some(provider) = self.provider.clone() else {
			warn!("No wallet provider discoverable");
			self.notifier.notify(
				Level::Error,
				"Please install a wallet extension to use this app",
			);
			return Err(SessionError::ProviderUnavailable(
				"no wallet provider discoverable".to_string(),
			));
		};

		match Self::authorize(provider.as_ref()).await {
			Ok(identity) => {
				info!("Connected as {}", identity);
				let session = Session::new(identity, provider);
				self.session = Some(session.clone());
				self.notifier
					.notify(Level::Success, "Connected to the blockchain successfully");
				Ok(session)
			}
			Err(e) => {
				error!("Failed to connect wallet: {}", e);
				let message = match &e {
					SessionError::ProviderUnavailable(_) => {
						"Could not reach the wallet provider; is the wallet running?"
					}
					SessionError::AuthorizationDenied(_) | SessionError::Disconnected(_) => {
						"Failed to connect to the blockchain"
					}
				};
				self.notifier.notify(Level::Error, message);
				Err(e)
			}
		}
	}

	async fn authorize(provider: &dyn WalletProvider) -> Result<Identity, SessionError> {
		provider.enable().await?;
		let accounts = provider.accounts().await?;

		let primary = accounts.first().ok_or_else(|| {
			SessionError::AuthorizationDenied("provider returned no accounts".to_string())
		})?;
		let address = Address::parse(primary).map_err(|e| {
			SessionError::AuthorizationDenied(format!("provider returned a bad account: {}", e))
		})?;

		Ok(Identity::new(address))
	}

	/// End the session. The identity is cleared and every clone of the session is revoked;
	/// contract handles already handed out keep their provider but no new ones can be bound.
	pub fn disconnect(&mut self) {
		if let Some(session) = self.session.take() {
			session.revoke();
			info!("Disconnected {}", session.identity());
			self.notifier.notify(Level::Info, "Wallet disconnected");
		}
	}

	pub fn session(&self) -> Option<&Session> {
		self.session.as_ref()
	}

	pub fn identity(&self) -> Option<&Identity> {
		self.session.as_ref().map(Session::identity)
	}
}
