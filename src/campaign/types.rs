use crate::contract::{Address, ContractError, methods};
use crate::session::Identity;
use crate::utils::{AmountUnit, TokenAmount};

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde_json::Value;

const PREVIEW_CHARS: usize = 100;

/// One crowdfunding record as mirrored from the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
	/// 1-based index assigned by the contract at creation
	pub index: u64,
	pub owner: Address,
	pub title: String,
	pub description: String,
	pub goal_amount: TokenAmount,
	pub total_funded: TokenAmount,
	/// Unix timestamp in seconds
	pub deadline: i64,
	pub is_open: bool,
}

impl Campaign {
	/// Decode a `getCampaign` result.
	///
	/// The contract returns `(owner, title, description, goal, totalFunded, deadline, isOpen)`,
	/// either as a JSON array or as an object keyed `"0"`..`"6"`. Amounts become exact decimals
	/// here and nowhere else.
	pub fn from_tuple(index: u64, value: &Value, unit: AmountUnit) -> Result<Self, ContractError> {
		let field = |position: usize| tuple_field(value, index, position);
		let text = |position: usize| tuple_text(value, index, position);

		let owner = Address::parse(&text(0)?).map_err(|e| {
			ContractError::decode(methods::GET_CAMPAIGN, format!("campaign {}: {}", index, e))
		})?;

		let deadline = i64::try_from(parse_uint(methods::GET_CAMPAIGN, field(5)?)?).map_err(|_| {
			ContractError::decode(
				methods::GET_CAMPAIGN,
				format!("campaign {} deadline out of range", index),
			)
		})?;

		let is_open = match field(6)? {
			Value::Bool(open) => *open,
			Value::String(s) if s == "true" => true,
			Value::String(s) if s == "false" => false,
			other => {
				return Err(ContractError::decode(
					methods::GET_CAMPAIGN,
					format!("campaign {} open flag is not a bool: {}", index, other),
				));
			}
		};

		Ok(Self {
			index,
			owner,
			title: text(1)?,
			description: text(2)?,
			goal_amount: unit.decode(parse_big_uint(methods::GET_CAMPAIGN, field(3)?)?),
			total_funded: unit.decode(parse_big_uint(methods::GET_CAMPAIGN, field(4)?)?),
			deadline,
			is_open,
		})
	}

	pub fn deadline_at(&self) -> Option<DateTime<Utc>> {
		DateTime::from_timestamp(self.deadline, 0)
	}

	/// Whole hours until the deadline, rounded down; negative once it has passed.
	pub fn hours_left(&self, now: DateTime<Utc>) -> i64 {
		(self.deadline - now.timestamp()).div_euclid(3600)
	}

	pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
		now.timestamp() >= self.deadline
	}

	/// The first 100 characters of the description, with `...` when it was cut.
	pub fn description_preview(&self) -> String {
		let mut chars = self.description.chars();
		let preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
		if chars.next().is_some() {
			format!("{}...", preview)
		} else {
			preview
		}
	}

	/// Whether a fund action should be offered.
	pub fn can_fund(&self) -> bool {
		self.is_open
	}

	/// Whether a close action should be offered to `identity`. The contract still decides.
	pub fn can_close(&self, identity: &Identity) -> bool {
		self.is_open && &self.owner == identity.address()
	}
}

/// Positional field of a `getCampaign` result.
fn tuple_field(value: &Value, index: u64, position: usize) -> Result<&Value, ContractError> {
	let found = match value {
		Value::Array(items) => items.get(position),
		Value::Object(map) => map.get(&position.to_string()),
		_ => None,
	};
	found.ok_or_else(|| {
		ContractError::decode(
			methods::GET_CAMPAIGN,
			format!("campaign {} is missing field {}", index, position),
		)
	})
}

fn tuple_text(value: &Value, index: u64, position: usize) -> Result<String, ContractError> {
	tuple_field(value, index, position)?
		.as_str()
		.map(str::to_string)
		.ok_or_else(|| {
			ContractError::decode(
				methods::GET_CAMPAIGN,
				format!("campaign {} field {} is not a string", index, position),
			)
		})
}

/// Parse a contract uint delivered as a decimal string, `0x` hex string or JSON number.
pub fn parse_big_uint(method: &str, value: &Value) -> Result<BigUint, ContractError> {
	match value {
		Value::Number(n) => n
			.as_u64()
			.map(BigUint::from)
			.ok_or_else(|| ContractError::decode(method, format!("not an unsigned integer: {}", n))),
		Value::String(s) => {
			let s = s.trim();
			let parsed = match s.strip_prefix("0x") {
				Some(hex_digits) => BigUint::parse_bytes(hex_digits.as_bytes(), 16),
				None => BigUint::parse_bytes(s.as_bytes(), 10),
			};
			parsed.ok_or_else(|| ContractError::decode(method, format!("not an unsigned integer: {}", s)))
		}
		other => Err(ContractError::decode(
			method,
			format!("not an unsigned integer: {}", other),
		)),
	}
}

/// Parse a contract uint that must fit in 64 bits.
pub fn parse_uint(method: &str, value: &Value) -> Result<u64, ContractError> {
	let big = parse_big_uint(method, value)?;
	u64::try_from(&big).map_err(|_| ContractError::decode(method, format!("{} exceeds 64 bits", big)))
}

/// A complete, immutable view of every campaign at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignCollection {
	/// Refresh round that produced this view; 0 before the first refresh
	pub round: u64,
	pub fetched_at: DateTime<Utc>,
	campaigns: Vec<Campaign>,
}

impl CampaignCollection {
	/// The view before anything has been fetched.
	pub fn empty() -> Self {
		Self {
			round: 0,
			fetched_at: DateTime::<Utc>::UNIX_EPOCH,
			campaigns: Vec::new(),
		}
	}

	/// Campaigns must be ordered by index, starting at 1, without gaps.
	pub(crate) fn new(round: u64, fetched_at: DateTime<Utc>, campaigns: Vec<Campaign>) -> Self {
		debug_assert!(
			campaigns
				.iter()
				.enumerate()
				.all(|(i, c)| c.index == i as u64 + 1)
		);
		Self {
			round,
			fetched_at,
			campaigns,
		}
	}

	pub fn len(&self) -> usize {
		self.campaigns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.campaigns.is_empty()
	}

	/// Look up a campaign by its 1-based contract index.
	pub fn get(&self, index: u64) -> Option<&Campaign> {
		let position = usize::try_from(index.checked_sub(1)?).ok()?;
		self.campaigns.get(position)
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Campaign> {
		self.campaigns.iter()
	}

	pub fn campaigns(&self) -> &[Campaign] {
		&self.campaigns
	}

	/// Describe every change from `previous` that the contract model does not allow:
	/// funds shrinking on an open campaign, or a closed campaign reopening.
	pub fn regressions_since(&self, previous: &CampaignCollection) -> Vec<String> {
		let mut found = Vec::new();
		for before in previous.iter() {
			let Some(after) = self.get(before.index) else {
				found.push(format!("campaign {} disappeared", before.index));
				continue;
			};
			if !before.is_open && after.is_open {
				found.push(format!("campaign {} reopened", before.index));
			}
			if before.is_open && after.total_funded < before.total_funded {
				found.push(format!(
					"campaign {} funding dropped from {} to {}",
					before.index, before.total_funded, after.total_funded
				));
			}
		}
		found
	}
}

impl Default for CampaignCollection {
	fn default() -> Self {
		Self::empty()
	}
}

impl<'a> IntoIterator for &'a CampaignCollection {
	type Item = &'a Campaign;
	type IntoIter = std::slice::Iter<'a, Campaign>;

	fn into_iter(self) -> Self::IntoIter {
		self.campaigns.iter()
	}
}

/// Errors raised while synchronizing the campaign collection.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RefreshError {
	#[error("Failed to read campaign count: {0}")]
	RemoteRead(#[source] ContractError),

	#[error("Refresh incomplete, expected {expected} campaigns: {reason}")]
	RefreshIncomplete {
		expected: u64,
		reason: String,
		/// The failed read, when one caused the gap
		cause: Option<ContractError>,
	},
}

impl RefreshError {
	/// Network failures and coverage gaps are worth another round; a result that does not
	/// decode will not decode the next time either.
	pub fn is_retryable(&self) -> bool {
		match self {
			RefreshError::RemoteRead(e) => e.is_retryable(),
			RefreshError::RefreshIncomplete { cause: Some(e), .. } => e.is_retryable(),
			RefreshError::RefreshIncomplete { cause: None, .. } => true,
		}
	}
}
