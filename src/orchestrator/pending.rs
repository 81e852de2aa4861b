//! State of an in-flight funding workflow.

use crate::utils::TokenAmount;

use std::fmt;
use tracing::debug;

/// Steps of the approve-then-fund workflow.
///
/// `Idle → Approving → Approved → Funding → Committed`, with `ApprovalFailed` reachable from
/// `Approving` and `FundingFailed` reachable from `Funding`. `Committed`, `ApprovalFailed` and
/// `FundingFailed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundingState {
	Idle,
	Approving,
	Approved,
	Funding,
	Committed,
	ApprovalFailed,
	/// The approval stays committed on chain
	FundingFailed,
}

impl FundingState {
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			FundingState::Committed | FundingState::ApprovalFailed | FundingState::FundingFailed
		)
	}

	pub fn can_advance_to(&self, next: FundingState) -> bool {
		use FundingState::*;
		matches!(
			(self, next),
			(Idle, Approving)
				| (Approving, Approved)
				| (Approving, ApprovalFailed)
				| (Approved, Funding)
				| (Funding, Committed)
				| (Funding, FundingFailed)
		)
	}
}

impl fmt::Display for FundingState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

/// One funding operation and every state it has passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
	campaign_index: u64,
	amount: TokenAmount,
	history: Vec<FundingState>,
}

impl PendingTransaction {
	pub fn new(campaign_index: u64, amount: TokenAmount) -> Self {
		Self {
			campaign_index,
			amount,
			history: vec![FundingState::Idle],
		}
	}

	pub fn campaign_index(&self) -> u64 {
		self.campaign_index
	}

	pub fn amount(&self) -> &TokenAmount {
		&self.amount
	}

	pub fn state(&self) -> FundingState {
		self.history
			.last()
			.copied()
			.unwrap_or(FundingState::Idle)
	}

	/// Every state entered, oldest first, starting at `Idle`.
	pub fn history(&self) -> &[FundingState] {
		&self.history
	}

	pub(crate) fn advance(&mut self, next: FundingState) {
		let current = self.state();
		debug_assert!(
			current.can_advance_to(next),
			"illegal funding transition {} -> {}",
			current,
			next
		);
		debug!(
			"Funding campaign {}: {} -> {}",
			self.campaign_index, current, next
		);
		self.history.push(next);
	}
}
