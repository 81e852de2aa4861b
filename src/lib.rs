//! Client core for an on-chain crowdfunding dapp.
//!
//! Connects to an external wallet provider, mirrors the crowdfunding contract's campaigns into an
//! immutable snapshot, and drives the create, fund and close workflows against the contract and
//! its payment token.

pub mod campaign;
pub mod config;
pub mod contract;
pub mod notify;
pub mod orchestrator;
pub mod rpc;
pub mod session;
pub mod utils;

#[cfg(test)]
mod testing;

pub use campaign::{Campaign, CampaignCollection, CampaignRepository, RefreshError};
pub use config::{ClientConfig, ConfigError};
pub use contract::{Address, ContractBinding, ContractError};
pub use notify::{Level, NotificationSink, NotifierSet, TracingSink};
pub use orchestrator::{FundingState, PendingTransaction, TransactionOrchestrator, WorkflowError};
pub use session::{Identity, Session, SessionError, SessionManager};
pub use utils::{AmountUnit, TokenAmount};
