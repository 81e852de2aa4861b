//! Campaign synchronization.
//!
//! `CampaignRepository` pulls every campaign from the contract and publishes the result as an
//! immutable `CampaignCollection`. A refresh reads the campaign count, issues all per-index reads
//! at once, joins them at a single point, and only publishes if every index `1..=N` arrived.
//! The published snapshot is replaced wholesale, never edited, so readers always hold a complete
//! view even while a refresh is in flight.

use crate::campaign::fetch_tracker::FetchTracker;
use crate::campaign::types::{Campaign, CampaignCollection, RefreshError, parse_uint};
use crate::contract::{ContractBinding, methods};
use crate::notify::{Level, NotificationSink};
use crate::utils::AmountUnit;

use backoff::{ExponentialBackoff, future::retry};
use futures::future::try_join_all;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Mirrors the contract's campaigns into a published snapshot
pub struct CampaignRepository {
	contract: Arc<dyn ContractBinding>,
	notifier: Arc<dyn NotificationSink>,
	amount_unit: AmountUnit,
	snapshot: watch::Sender<Arc<CampaignCollection>>,
	/// Last refresh round handed out
	rounds: AtomicU64,
	retry_max_elapsed: Duration,
}

impl CampaignRepository {
	pub fn new(
		contract: Arc<dyn ContractBinding>,
		notifier: Arc<dyn NotificationSink>,
		amount_unit: AmountUnit,
	) -> Self {
		let (snapshot, _) = watch::channel(Arc::new(CampaignCollection::empty()));
		Self {
			contract,
			notifier,
			amount_unit,
			snapshot,
			rounds: AtomicU64::new(0),
			retry_max_elapsed: Duration::from_secs(30),
		}
	}

	/// Bound the time `refresh_with_retry` keeps retrying.
	pub fn with_retry_max_elapsed(mut self, max_elapsed: Duration) -> Self {
		self.retry_max_elapsed = max_elapsed;
		self
	}

	/// The latest published snapshot.
	pub fn snapshot(&self) -> Arc<CampaignCollection> {
		self.snapshot.borrow().clone()
	}

	/// A receiver that always holds the latest published snapshot.
	pub fn subscribe(&self) -> watch::Receiver<Arc<CampaignCollection>> {
		self.snapshot.subscribe()
	}

	/// The crowdfunding contract this repository mirrors.
	pub fn contract(&self) -> &Arc<dyn ContractBinding> {
		&self.contract
	}

	pub fn amount_unit(&self) -> AmountUnit {
		self.amount_unit
	}

	/// Fetch every campaign and publish the result.
	///
	/// Either all `N` campaigns are fetched and published, or nothing changes and the error is
	/// returned. Exactly one notification reports the outcome.
	pub async fn refresh(&self) -> Result<Arc<CampaignCollection>, RefreshError> {
		let round = self.next_round();
		let outcome = self.fetch_all(round).await;
		self.finish(outcome)
	}

	/// Like `refresh`, but retries failed reads with exponential backoff before giving up.
	///
	/// Only the read path is retried; there is nothing here that writes.
	pub async fn refresh_with_retry(&self) -> Result<Arc<CampaignCollection>, RefreshError> {
		let round = self.next_round();
		let policy = ExponentialBackoff {
			max_elapsed_time: Some(self.retry_max_elapsed),
			..ExponentialBackoff::default()
		};

		let outcome = retry(policy, || async move {
			self.fetch_all(round).await.map_err(|e| {
				if e.is_retryable() {
					warn!("Campaign refresh round {} failed, retrying: {}", round, e);
					backoff::Error::transient(e)
				} else {
					backoff::Error::permanent(e)
				}
			})
		})
		.await;

		self.finish(outcome)
	}

	fn next_round(&self) -> u64 {
		self.rounds.fetch_add(1, Ordering::SeqCst) + 1
	}

	async fn fetch_all(&self, round: u64) -> Result<CampaignCollection, RefreshError> {
		let total = self
			.contract
			.call(methods::TOTAL_CAMPAIGNS, Vec::new())
			.await
			.and_then(|value| parse_uint(methods::TOTAL_CAMPAIGNS, &value))
			.map_err(RefreshError::RemoteRead)?;
		debug!("Round {}: contract reports {} campaigns", round, total);

		// Contract indexing starts at 1.
		let contract = &self.contract;
		let unit = self.amount_unit;
		let reads = (1..=total).map(|index| async move {
			let value = contract
				.call(methods::GET_CAMPAIGN, vec![json!(index)])
				.await?;
			Campaign::from_tuple(index, &value, unit)
		});

		let campaigns = try_join_all(reads)
			.await
			.map_err(|e| RefreshError::RefreshIncomplete {
				expected: total,
				reason: e.to_string(),
				cause: Some(e),
			})?;

		let mut tracker = FetchTracker::new(total);
		for campaign in &campaigns {
			tracker.record_fetched(campaign.index);
		}
		tracker
			.validate_completion()
			.map_err(|reason| RefreshError::RefreshIncomplete {
				expected: total,
				reason,
				cause: None,
			})?;

		Ok(CampaignCollection::new(round, chrono::Utc::now(), campaigns))
	}

	fn finish(
		&self,
		outcome: Result<CampaignCollection, RefreshError>,
	) -> Result<Arc<CampaignCollection>, RefreshError> {
		match outcome {
			Ok(collection) => {
				self.publish(collection);
				// A newer round may have won; report what is actually published.
				let current = self.snapshot();
				self.notifier.notify(
					Level::Success,
					&format!("Fetched {} campaigns", current.len()),
				);
				Ok(current)
			}
			Err(e) => {
				error!("Campaign refresh failed: {}", e);
				self.notifier.notify(
					Level::Error,
					"Failed to fetch the latest campaigns, please try again",
				);
				Err(e)
			}
		}
	}

	/// Replace the published snapshot unless a newer round already landed.
	fn publish(&self, collection: CampaignCollection) {
		let round = collection.round;
		let published = self.snapshot.send_if_modified(|current| {
			if current.round >= round {
				return false;
			}
			for regression in collection.regressions_since(current) {
				warn!("Contract state regressed: {}", regression);
			}
			*current = Arc::new(collection);
			true
		});

		if published {
			info!("Published campaign snapshot round {}", round);
		} else {
			debug!("Discarded campaign snapshot round {}, a newer one is published", round);
		}
	}
}
