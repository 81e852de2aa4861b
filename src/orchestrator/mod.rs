//! Transaction workflows
//!
//! The orchestrator turns user intents (create, fund, close) into ordered contract writes and
//! reports each outcome exactly once. Funding is a two-step workflow tracked by a
//! `PendingTransaction`; create and close are single writes.

/// Funding workflow states
pub mod pending;
/// Workflow errors and failure wording
pub mod types;
/// `TransactionOrchestrator`
pub mod workflow;

pub use pending::{FundingState, PendingTransaction};
pub use types::WorkflowError;
pub use workflow::TransactionOrchestrator;
