//! User-facing outcome notifications
//!
//! Every user-observable outcome of a session, refresh or workflow is reported exactly once
//! through a `NotificationSink`. The presentation layer supplies its own sink (toasts, a log
//! pane); the crate ships a tracing-backed sink, an in-memory sink and a fan-out set.

/// Sink trait, levels and the built-in sinks
mod sink;

pub use sink::*;
