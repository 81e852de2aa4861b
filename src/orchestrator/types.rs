use crate::contract::ContractError;
use crate::orchestrator::FundingState;

/// Outcome errors of the transaction workflows.
///
/// Every workflow failure is reported through exactly one notification before it is returned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkflowError {
	/// Rejected locally; nothing was sent to the network.
	#[error("Invalid input: {0}")]
	InvalidInput(String),

	/// A single-step write (create or close) failed.
	#[error(transparent)]
	Contract(#[from] ContractError),

	/// The token approval failed. No funding was attempted.
	#[error("Token approval failed: {0}")]
	ApprovalFailed(#[source] ContractError),

	/// Funding failed after the approval committed. The approval is not rolled back.
	#[error("Funding failed after approval: {0}")]
	FundingFailed(#[source] ContractError),
}

impl WorkflowError {
	/// The contract failure behind this error, if any.
	pub fn contract_error(&self) -> Option<&ContractError> {
		match self {
			WorkflowError::InvalidInput(_) => None,
			WorkflowError::Contract(e)
			| WorkflowError::ApprovalFailed(e)
			| WorkflowError::FundingFailed(e) => Some(e),
		}
	}

	/// Terminal funding state this error corresponds to.
	pub fn funding_state(&self) -> Option<FundingState> {
		match self {
			WorkflowError::ApprovalFailed(_) => Some(FundingState::ApprovalFailed),
			WorkflowError::FundingFailed(_) => Some(FundingState::FundingFailed),
			_ => None,
		}
	}

	/// Whether the user declined to sign.
	pub fn is_rejected(&self) -> bool {
		matches!(
			self.contract_error(),
			Some(ContractError::TransactionRejected { .. })
		)
	}

	/// Whether the contract reverted the transaction.
	pub fn is_reverted(&self) -> bool {
		matches!(
			self.contract_error(),
			Some(ContractError::TransactionReverted { .. })
		)
	}
}

/// User-facing wording for a failed contract write.
pub(crate) fn failure_message(action: &str, error: &ContractError) -> String {
	match error {
		ContractError::TransactionRejected { .. } => {
			format!("You declined the {} transaction", action)
		}
		ContractError::TransactionReverted { reason, .. } => {
			format!("The contract rejected the {}: {}", action, reason)
		}
		ContractError::RemoteWrite {
			transaction_hash: Some(hash),
			..
		} => format!(
			"Lost track of the {} transaction {}; check your wallet before trying again",
			action, hash
		),
		ContractError::RemoteWrite { .. } => format!(
			"Network error while submitting the {}; check your wallet before trying again",
			action
		),
		ContractError::RemoteRead { .. } | ContractError::Decode { .. } => {
			format!("Could not reach the network for the {}", action)
		}
	}
}
