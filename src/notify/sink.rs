//! Notification sinks.
//!
//! Sinks are synchronous and infallible from the caller's point of view: a notification is
//! the last step of an outcome, and a sink that fails to deliver must not turn a committed
//! transaction into an error.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
	Success,
	Error,
	Warning,
	Info,
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Level::Success => "success",
			Level::Error => "error",
			Level::Warning => "warning",
			Level::Info => "info",
		};
		f.write_str(name)
	}
}

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
	pub level: Level,
	pub message: String,
}

/// Receiver of user-facing outcome notifications.
pub trait NotificationSink: Send + Sync {
	fn notify(&self, level: Level, message: &str);
}

/// Sink that writes notifications to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
	fn notify(&self, level: Level, message: &str) {
		match level {
			Level::Success | Level::Info => tracing::info!(%level, "{}", message),
			Level::Warning => tracing::warn!(%level, "{}", message),
			Level::Error => tracing::error!(%level, "{}", message),
		}
	}
}

/// Sink that keeps every notification in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemorySink {
	notifications: Mutex<Vec<Notification>>,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Snapshot of all notifications received so far.
	pub fn notifications(&self) -> Vec<Notification> {
		self.notifications
			.lock()
			.map(|list| list.clone())
			.unwrap_or_default()
	}

	/// Drain the received notifications.
	pub fn take(&self) -> Vec<Notification> {
		self.notifications
			.lock()
			.map(|mut list| std::mem::take(&mut *list))
			.unwrap_or_default()
	}
}

impl NotificationSink for MemorySink {
	fn notify(&self, level: Level, message: &str) {
		if let Ok(mut list) = self.notifications.lock() {
			list.push(Notification {
				level,
				message: message.to_string(),
			});
		}
	}
}

/// Fan-out sink that forwards each notification to every registered sink.
///
/// Sinks are called in the order they are registered.
#[derive(Default, Clone)]
pub struct NotifierSet {
	sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotifierSet {
	pub fn new() -> Self {
		Self { sinks: Vec::new() }
	}

	pub fn register(&mut self, sink: Arc<dyn NotificationSink>) {
		self.sinks.push(sink);
	}

	pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
		self.register(sink);
		self
	}

	pub fn len(&self) -> usize {
		self.sinks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sinks.is_empty()
	}
}

impl NotificationSink for NotifierSet {
	fn notify(&self, level: Level, message: &str) {
		for sink in &self.sinks {
			sink.notify(level, message);
		}
	}
}
