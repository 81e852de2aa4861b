//!
//! Contract bindings for the crowdfunding contract and its payment token.
//!
//! Provides the `ContractBinding` seam used by the repository and orchestrator, an implementation
//! backed by the JSON-RPC wallet bridge, account addresses, and the method names of the external
//! contract interface.
/// Account and contract addresses
pub mod address;
/// `ContractBinding` trait and the JSON-RPC implementation
pub mod binding;
/// Receipts, send options and contract errors
pub mod types;

pub use address::{Address, AddressError};
pub use binding::{ContractBinding, RpcContract};
pub use types::*;

/// Number of decimal places of the payment token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Method names of the external contract interface. Argument order is part of the interface.
pub mod methods {
	/// `totalCampaigns() -> uint`
	pub const TOTAL_CAMPAIGNS: &str = "totalCampaigns";
	/// `getCampaign(uint index) -> (owner, title, description, goal, totalFunded, deadline, isOpen)`
	pub const GET_CAMPAIGN: &str = "getCampaign";
	/// `createCampaign(title, description, goal, periodDays)`
	pub const CREATE_CAMPAIGN: &str = "createCampaign";
	/// `fundCampaign(index, amount)`
	pub const FUND_CAMPAIGN: &str = "fundCampaign";
	/// `closeCampaign(index)`
	pub const CLOSE_CAMPAIGN: &str = "closeCampaign";
	/// Token `approve(spender, amount)`
	pub const APPROVE: &str = "approve";
}
