//! Create, fund and close workflows.
//!
//! `TransactionOrchestrator` validates input against the latest campaign snapshot, submits the
//! contract writes in order, reports every outcome through the notifier and refreshes the
//! campaign list after each committed write. Writes are never retried: a failed write may already
//! have been applied, so the decision to resubmit stays with the user.

use crate::campaign::CampaignRepository;
use crate::contract::{Address, ContractBinding, ContractError, Receipt, SendOptions, methods};
use crate::notify::{Level, NotificationSink};
use crate::orchestrator::pending::{FundingState, PendingTransaction};
use crate::orchestrator::types::{WorkflowError, failure_message};
use crate::session::{Identity, Session, SessionError};
use crate::utils::{AmountUnit, TokenAmount};

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives the state-changing operations of one session
pub struct TransactionOrchestrator {
	identity: Identity,
	crowdfunding: Arc<dyn ContractBinding>,
	token: Arc<dyn ContractBinding>,
	repository: Arc<CampaignRepository>,
	notifier: Arc<dyn NotificationSink>,
	amount_unit: AmountUnit,
}

impl TransactionOrchestrator {
	/// Wire an orchestrator for `identity`.
	///
	/// The crowdfunding binding is shared with `repository`; `token` must be bound to the payment
	/// token through the same session.
	pub fn new(
		identity: Identity,
		token: Arc<dyn ContractBinding>,
		repository: Arc<CampaignRepository>,
		notifier: Arc<dyn NotificationSink>,
	) -> Self {
		let amount_unit = repository.amount_unit();
		if amount_unit == AmountUnit::Whole {
			warn!(
				"Campaign amounts are sent unscaled while approvals use 18-decimal base units; \
				 check the contract's expected unit"
			);
		}

		Self {
			identity,
			crowdfunding: repository.contract().clone(),
			token,
			repository,
			notifier,
			amount_unit,
		}
	}

	/// Wire an orchestrator from a live session. Fails once the session was disconnected.
	pub fn from_session(
		session: &Session,
		token_address: &Address,
		repository: Arc<CampaignRepository>,
		notifier: Arc<dyn NotificationSink>,
	) -> Result<Self, SessionError> {
		let token = session.contract(token_address)?;
		Ok(Self::new(
			session.identity().clone(),
			token,
			repository,
			notifier,
		))
	}

	pub fn identity(&self) -> &Identity {
		&self.identity
	}

	/// Create a campaign owned by the session identity.
	///
	/// All fields are validated before anything is sent. `goal` is a token amount and
	/// `period_days` a positive whole number of days.
	pub async fn create_campaign(
		&self,
		title: &str,
		description: &str,
		goal: &str,
		period_days: &str,
	) -> Result<Receipt, WorkflowError> {
		// Title and description go out as entered; whitespace only counts as blank.
		let (goal, period_days) = (goal.trim(), period_days.trim());
		if [title.trim(), description.trim(), goal, period_days]
			.iter()
			.any(|field| field.is_empty())
		{
			return Err(self.invalid("Please enter all fields"));
		}

		let goal = match TokenAmount::parse(goal) {
			Ok(amount) if !amount.is_zero() => amount,
			Ok(_) => return Err(self.invalid("The goal must be greater than zero")),
			Err(e) => return Err(self.invalid(&format!("Invalid goal: {}", e))),
		};
		let goal = self
			.amount_unit
			.encode(&goal)
			.map_err(|e| self.invalid(&format!("Invalid goal: {}", e)))?;
		let period_days = match period_days.parse::<u64>() {
			Ok(days) if days > 0 => days,
			_ => {
				return Err(self.invalid("The campaign period must be a positive number of days"));
			}
		};

		info!(
			"Creating campaign '{}' with goal {} over {} days",
			title, goal, period_days
		);
		let outcome = self
			.crowdfunding
			.send(
				methods::CREATE_CAMPAIGN,
				vec![
					json!(title),
					json!(description),
					json!(goal),
					json!(period_days.to_string()),
				],
				&self.signer(),
			)
			.await;

		match outcome {
			Ok(receipt) => {
				self.notifier.notify(
					Level::Success,
					"Your campaign has been created successfully",
				);
				self.refresh_after_commit().await;
				Ok(receipt)
			}
			Err(e) => Err(self.write_failed("campaign creation", e)),
		}
	}

	/// Approve the crowdfunding contract to spend `amount`, then fund campaign `index` with it.
	///
	/// The approval is always denominated in 18-decimal base units. If funding fails after the
	/// approval committed, the approval stays in place and the error says so.
	pub async fn fund_campaign(
		&self,
		index: u64,
		amount: &str,
	) -> Result<PendingTransaction, WorkflowError> {
		let amount = match TokenAmount::parse(amount.trim()) {
			Ok(amount) if !amount.is_zero() => amount,
			Ok(_) => return Err(self.invalid("The amount must be greater than zero")),
			Err(e) => return Err(self.invalid(&format!("Invalid amount: {}", e))),
		};
		self.open_campaign(index, "funded")?;
		let fund_amount = self
			.amount_unit
			.encode(&amount)
			.map_err(|e| self.invalid(&format!("Invalid amount: {}", e)))?;
		let approve_amount = amount.base_units().to_str_radix(10);

		let mut pending = PendingTransaction::new(index, amount);
		let signer = self.signer();

		pending.advance(FundingState::Approving);
		let approval = self
			.token
			.send(
				methods::APPROVE,
				vec![
					json!(self.crowdfunding.address().as_str()),
					json!(approve_amount),
				],
				&signer,
			)
			.await;
		if let Err(e) = approval {
			pending.advance(FundingState::ApprovalFailed);
			self.notifier.notify(
				Level::Error,
				&format!("Approval failed: {}", failure_message("token approval", &e)),
			);
			return Err(WorkflowError::ApprovalFailed(e));
		}
		pending.advance(FundingState::Approved);
		self.notifier.notify(
			Level::Success,
			&format!(
				"Approved {} tokens for campaign #{}",
				pending.amount(),
				index
			),
		);

		pending.advance(FundingState::Funding);
		let funding = self
			.crowdfunding
			.send(
				methods::FUND_CAMPAIGN,
				vec![json!(index), json!(fund_amount)],
				&signer,
			)
			.await;
		if let Err(e) = funding {
			pending.advance(FundingState::FundingFailed);
			self.notifier.notify(
				Level::Warning,
				&format!(
					"Funding failed, the approval of {} tokens remains in place: {}",
					pending.amount(),
					failure_message("funding", &e)
				),
			);
			return Err(WorkflowError::FundingFailed(e));
		}
		pending.advance(FundingState::Committed);
		self.notifier
			.notify(Level::Success, "You have successfully funded this campaign");

		self.refresh_after_commit().await;
		Ok(pending)
	}

	/// Close campaign `index`.
	///
	/// Ownership is left to the contract; a close by anyone else comes back as a revert.
	pub async fn close_campaign(&self, index: u64) -> Result<Receipt, WorkflowError> {
		self.open_campaign(index, "closed")?;

		info!("Closing campaign {}", index);
		let outcome = self
			.crowdfunding
			.send(methods::CLOSE_CAMPAIGN, vec![json!(index)], &self.signer())
			.await;

		match outcome {
			Ok(receipt) => {
				self.notifier
					.notify(Level::Info, "You have successfully closed the campaign");
				self.refresh_after_commit().await;
				Ok(receipt)
			}
			Err(e) => Err(self.write_failed("campaign close", e)),
		}
	}

	fn signer(&self) -> SendOptions {
		SendOptions::signed_by(self.identity.address().clone())
	}

	/// Look up an open campaign in the current snapshot.
	fn open_campaign(&self, index: u64, action: &str) -> Result<(), WorkflowError> {
		let snapshot = self.repository.snapshot();
		match snapshot.get(index) {
			None => Err(self.invalid(&format!("Campaign #{} does not exist", index))),
			Some(campaign) if !campaign.is_open => Err(self.invalid(&format!(
				"Campaign #{} is closed and cannot be {}",
				index, action
			))),
			Some(_) => Ok(()),
		}
	}

	fn invalid(&self, message: &str) -> WorkflowError {
		debug!("Rejected locally: {}", message);
		self.notifier.notify(Level::Error, message);
		WorkflowError::InvalidInput(message.to_string())
	}

	fn write_failed(&self, action: &str, error: ContractError) -> WorkflowError {
		warn!("{} failed: {}", action, error);
		self.notifier
			.notify(Level::Error, &failure_message(action, &error));
		WorkflowError::Contract(error)
	}

	/// The write already committed; a failed refresh is reported by the repository on its own.
	async fn refresh_after_commit(&self) {
		if let Err(e) = self.repository.refresh().await {
			warn!("Refresh after a committed write failed: {}", e);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::notify::MemorySink;
	use crate::session::{SessionManager, WalletProvider};
	use crate::testing::{
		ALICE, BOB, CROWDFUND, CallLog, MockContract, MockWallet, TOKEN, address, campaign_tuple,
		reverted,
	};
	use serde_json::Value;
	use std::sync::Mutex;

	struct Harness {
		orchestrator: TransactionOrchestrator,
		crowdfunding: Arc<MockContract>,
		token: Arc<MockContract>,
		log: CallLog,
		sink: Arc<MemorySink>,
	}

	impl Harness {
		fn methods(&self) -> Vec<String> {
			self.log
				.lock()
				.unwrap()
				.iter()
				.map(|call| call.method.clone())
				.collect()
		}

		fn levels(&self) -> Vec<Level> {
			self.sink.notifications().iter().map(|n| n.level).collect()
		}
	}

	/// Campaign 1 belongs to Alice, 2 to Bob, 3 is closed. Alice holds the session.
	async fn harness(unit: AmountUnit) -> Harness {
		let log: CallLog = Arc::new(Mutex::new(Vec::new()));
		let crowdfunding = Arc::new(MockContract::new(CROWDFUND, log.clone()));
		crowdfunding.serve_campaigns(vec![
			campaign_tuple(ALICE, "Well", "100", "10", true),
			campaign_tuple(BOB, "School", "500", "0", true),
			campaign_tuple(BOB, "Clinic", "900", "900", false),
		]);
		let token = Arc::new(MockContract::new(TOKEN, log.clone()));
		let sink = Arc::new(MemorySink::new());

		let repository = Arc::new(CampaignRepository::new(
			crowdfunding.clone(),
			sink.clone(),
			unit,
		));
		repository.refresh().await.unwrap();
		log.lock().unwrap().clear();
		sink.take();

		let orchestrator = TransactionOrchestrator::new(
			Identity::new(address(ALICE)),
			token.clone(),
			repository,
			sink.clone(),
		);
		Harness {
			orchestrator,
			crowdfunding,
			token,
			log,
			sink,
		}
	}

	#[tokio::test]
	async fn blank_fields_are_rejected_before_any_call() {
		let h = harness(AmountUnit::Whole).await;

		let err = h
			.orchestrator
			.create_campaign("  ", "Clean water", "100", "30")
			.await
			.unwrap_err();
		assert!(matches!(err, WorkflowError::InvalidInput(_)));
		assert!(h.methods().is_empty());

		let seen = h.sink.notifications();
		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].message, "Please enter all fields");
	}

	#[tokio::test]
	async fn malformed_goal_or_period_is_rejected_locally() {
		let h = harness(AmountUnit::Whole).await;

		for (goal, period) in [("lots", "30"), ("0", "30"), ("100", "0"), ("100", "a week")] {
			let result = h
				.orchestrator
				.create_campaign("Well", "Clean water", goal, period)
				.await;
			assert!(matches!(result, Err(WorkflowError::InvalidInput(_))));
		}
		assert!(h.methods().is_empty());
	}

	#[tokio::test]
	async fn create_sends_fields_in_order_and_refreshes() {
		let h = harness(AmountUnit::Whole).await;

		h.orchestrator
			.create_campaign(" Well ", "Clean water\n", " 100", "30 ")
			.await
			.unwrap();

		let calls = h.log.lock().unwrap().clone();
		assert_eq!(calls[0].method, "createCampaign");
		assert_eq!(
			calls[0].args,
			vec![json!(" Well "), json!("Clean water\n"), json!("100"), json!("30")]
		);
		assert_eq!(calls[0].from.as_deref(), Some(ALICE));
		assert_eq!(calls[1].method, "totalCampaigns");

		let seen = h.sink.notifications();
		assert_eq!(seen[0].message, "Your campaign has been created successfully");
		assert_eq!(seen[1].message, "Fetched 3 campaigns");
	}

	#[tokio::test]
	async fn reverted_create_does_not_refresh() {
		let h = harness(AmountUnit::Whole).await;
		h.crowdfunding
			.on_send("createCampaign", |_| Err(reverted("createCampaign", "bad period")));

		let err = h
			.orchestrator
			.create_campaign("Well", "Clean water", "100", "30")
			.await
			.unwrap_err();
		assert!(err.is_reverted());
		assert_eq!(h.methods(), vec!["createCampaign"]);
		assert_eq!(h.levels(), vec![Level::Error]);
	}

	#[tokio::test]
	async fn fund_approves_before_funding() {
		let h = harness(AmountUnit::Whole).await;

		let pending = h.orchestrator.fund_campaign(2, "25").await.unwrap();
		assert_eq!(pending.state(), FundingState::Committed);
		assert_eq!(
			pending.history(),
			&[
				FundingState::Idle,
				FundingState::Approving,
				FundingState::Approved,
				FundingState::Funding,
				FundingState::Committed,
			]
		);

		let calls = h.log.lock().unwrap().clone();
		assert_eq!(calls[0].contract, TOKEN);
		assert_eq!(calls[0].method, "approve");
		assert_eq!(
			calls[0].args,
			vec![json!(CROWDFUND), json!("25000000000000000000")]
		);
		assert_eq!(calls[1].contract, CROWDFUND);
		assert_eq!(calls[1].method, "fundCampaign");
		assert_eq!(calls[1].args, vec![json!(2), json!("25")]);
		assert_eq!(calls[2].method, "totalCampaigns");

		assert_eq!(
			h.levels(),
			vec![Level::Success, Level::Success, Level::Success]
		);
	}

	#[tokio::test]
	async fn base_units_allow_fractional_funding() {
		let h = harness(AmountUnit::Base).await;

		h.orchestrator.fund_campaign(1, "0.5").await.unwrap();

		let calls = h.log.lock().unwrap().clone();
		assert_eq!(calls[0].args[1], json!("500000000000000000"));
		assert_eq!(calls[1].args[1], json!("500000000000000000"));
	}

	#[tokio::test]
	async fn whole_units_reject_fractional_funding() {
		let h = harness(AmountUnit::Whole).await;

		let result = h.orchestrator.fund_campaign(1, "0.5").await;
		assert!(matches!(result, Err(WorkflowError::InvalidInput(_))));
		assert!(h.methods().is_empty());
	}

	#[tokio::test]
	async fn failed_approval_never_funds() {
		let h = harness(AmountUnit::Whole).await;
		h.token.on_send("approve", |_| {
			Err(ContractError::TransactionRejected {
				method: "approve".to_string(),
				reason: "User denied transaction signature".to_string(),
			})
		});

		let err = h.orchestrator.fund_campaign(1, "5").await.unwrap_err();
		assert!(matches!(err, WorkflowError::ApprovalFailed(_)));
		assert_eq!(err.funding_state(), Some(FundingState::ApprovalFailed));
		assert!(err.is_rejected());
		assert_eq!(h.methods(), vec!["approve"]);
		assert_eq!(h.levels(), vec![Level::Error]);
	}

	#[tokio::test]
	async fn failed_funding_reports_the_remaining_approval() {
		let h = harness(AmountUnit::Whole).await;
		h.crowdfunding
			.on_send("fundCampaign", |_| Err(reverted("fundCampaign", "deadline passed")));

		let err = h.orchestrator.fund_campaign(1, "5").await.unwrap_err();
		assert!(matches!(err, WorkflowError::FundingFailed(_)));
		// no refresh after a failed write
		assert_eq!(h.methods(), vec!["approve", "fundCampaign"]);

		let seen = h.sink.notifications();
		assert_eq!(seen.len(), 2);
		assert_eq!(seen[0].level, Level::Success);
		assert_eq!(seen[1].level, Level::Warning);
		assert!(seen[1].message.contains("approval of 5 tokens remains"));
	}

	#[tokio::test]
	async fn closed_or_unknown_campaigns_are_not_funded() {
		let h = harness(AmountUnit::Whole).await;

		for (index, amount) in [(3, "5"), (9, "5"), (1, "0")] {
			let result = h.orchestrator.fund_campaign(index, amount).await;
			assert!(matches!(result, Err(WorkflowError::InvalidInput(_))));
		}
		assert!(h.methods().is_empty());
		assert_eq!(h.sink.notifications().len(), 3);
	}

	#[tokio::test]
	async fn close_is_left_to_the_contract() {
		let h = harness(AmountUnit::Whole).await;
		h.crowdfunding
			.on_send("closeCampaign", |args: &[Value]| {
				if args[0] == json!(2) {
					Err(reverted("closeCampaign", "Only the owner can close"))
				} else {
					Ok(crate::testing::committed("closeCampaign"))
				}
			});

		// Alice does not own campaign 2, but the request still goes out
		let err = h.orchestrator.close_campaign(2).await.unwrap_err();
		assert!(err.is_reverted());
		assert_eq!(h.methods(), vec!["closeCampaign"]);

		h.log.lock().unwrap().clear();
		h.sink.take();
		h.orchestrator.close_campaign(1).await.unwrap();
		assert_eq!(h.methods()[0], "closeCampaign");
		assert_eq!(h.sink.notifications()[0].level, Level::Info);
	}

	#[tokio::test]
	async fn closed_campaigns_are_not_closed_again() {
		let h = harness(AmountUnit::Whole).await;

		let result = h.orchestrator.close_campaign(3).await;
		assert!(matches!(result, Err(WorkflowError::InvalidInput(_))));
		assert!(h.methods().is_empty());
	}

	/// A wallet holding Alice's account, with both contracts registered on one call log.
	async fn connected(log: &CallLog) -> (SessionManager, Session, Arc<MemorySink>) {
		let crowdfunding = Arc::new(MockContract::new(CROWDFUND, log.clone()));
		crowdfunding.serve_campaigns(vec![campaign_tuple(BOB, "School", "500", "0", true)]);
		let wallet = Arc::new(MockWallet::with_accounts(vec![ALICE.to_string()]));
		wallet.register(crowdfunding);
		wallet.register(Arc::new(MockContract::new(TOKEN, log.clone())));

		let sink = Arc::new(MemorySink::new());
		let provider: Arc<dyn WalletProvider> = wallet;
		let mut manager = SessionManager::new(Some(provider), sink.clone());
		let session = manager.connect().await.unwrap();
		(manager, session, sink)
	}

	#[tokio::test]
	async fn session_bound_contracts_sign_as_the_identity() {
		let log: CallLog = Arc::new(Mutex::new(Vec::new()));
		let (_manager, session, sink) = connected(&log).await;

		let repository = Arc::new(CampaignRepository::new(
			session.contract(&address(CROWDFUND)).unwrap(),
			sink.clone(),
			AmountUnit::Whole,
		));
		repository.refresh().await.unwrap();
		let orchestrator =
			TransactionOrchestrator::from_session(&session, &address(TOKEN), repository, sink)
				.unwrap();
		assert_eq!(orchestrator.identity(), session.identity());

		orchestrator.fund_campaign(1, "3").await.unwrap();
		orchestrator.close_campaign(1).await.unwrap();

		let writes: Vec<_> = log
			.lock()
			.unwrap()
			.iter()
			.filter(|call| call.from.is_some())
			.cloned()
			.collect();
		let methods: Vec<&str> = writes.iter().map(|call| call.method.as_str()).collect();
		assert_eq!(methods, vec!["approve", "fundCampaign", "closeCampaign"]);
		assert_eq!(writes[0].contract, TOKEN);
		assert_eq!(writes[1].contract, CROWDFUND);
		assert!(writes.iter().all(|call| call.from.as_deref() == Some(ALICE)));
	}

	#[tokio::test]
	async fn a_disconnected_session_cannot_build_an_orchestrator() {
		let log: CallLog = Arc::new(Mutex::new(Vec::new()));
		let (mut manager, session, sink) = connected(&log).await;
		let repository = Arc::new(CampaignRepository::new(
			session.contract(&address(CROWDFUND)).unwrap(),
			sink.clone(),
			AmountUnit::Whole,
		));

		manager.disconnect();

		let result =
			TransactionOrchestrator::from_session(&session, &address(TOKEN), repository, sink);
		assert!(matches!(result, Err(SessionError::Disconnected(_))));
		assert!(log.lock().unwrap().is_empty());
	}
}
