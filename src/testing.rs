//! Scripted contract and wallet doubles shared by the unit tests.

use crate::contract::{Address, ContractBinding, ContractError, Receipt, SendOptions};
use crate::rpc::JsonRpcClient;
use crate::session::{ProviderError, WalletProvider};

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const ALICE: &str = "0x1111111111111111111111111111111111111111";
pub const BOB: &str = "0x2222222222222222222222222222222222222222";
pub const CROWDFUND: &str = "0x7EC6c1FE083621ece6F75D998A060C912486AAF7";
pub const TOKEN: &str = "0x874069Fa1Eb16D44d622F2e0Ca25eeA172369bC1";

pub fn address(text: &str) -> Address {
	Address::parse(text).unwrap()
}

/// One call observed by a `MockContract`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
	pub contract: String,
	pub method: String,
	pub args: Vec<Value>,
	pub from: Option<String>,
}

pub type CallLog = Arc<Mutex<Vec<RecordedCall>>>;

type CallHandler = Box<dyn Fn(&[Value]) -> Result<Value, ContractError> + Send + Sync>;
type SendHandler = Box<dyn Fn(&[Value]) -> Result<Receipt, ContractError> + Send + Sync>;

/// Contract whose answers are scripted per method name. Unscripted reads fail as remote
/// read errors; unscripted sends commit.
pub struct MockContract {
	address: Address,
	log: CallLog,
	calls: Mutex<HashMap<String, CallHandler>>,
	sends: Mutex<HashMap<String, SendHandler>>,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
}

impl MockContract {
	pub fn new(address_text: &str, log: CallLog) -> Self {
		Self {
			address: address(address_text),
			log,
			calls: Mutex::new(HashMap::new()),
			sends: Mutex::new(HashMap::new()),
			in_flight: AtomicUsize::new(0),
			max_in_flight: AtomicUsize::new(0),
		}
	}

	pub fn on_call(
		&self,
		method: &str,
		handler: impl Fn(&[Value]) -> Result<Value, ContractError> + Send + Sync + 'static,
	) {
		self.calls
			.lock()
			.unwrap()
			.insert(method.to_string(), Box::new(handler));
	}

	pub fn on_send(
		&self,
		method: &str,
		handler: impl Fn(&[Value]) -> Result<Receipt, ContractError> + Send + Sync + 'static,
	) {
		self.sends
			.lock()
			.unwrap()
			.insert(method.to_string(), Box::new(handler));
	}

	/// Script `totalCampaigns`/`getCampaign` from a list of campaign tuples, index 1 first.
	pub fn serve_campaigns(&self, campaigns: Vec<Value>) {
		let total = campaigns.len();
		self.on_call("totalCampaigns", move |_| Ok(json!(total.to_string())));
		self.on_call("getCampaign", move |args| {
			let index = args[0].as_u64().unwrap() as usize;
			Ok(campaigns[index - 1].clone())
		});
	}

	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}

	fn record(&self, method: &str, args: &[Value], from: Option<&SendOptions>) {
		self.log.lock().unwrap().push(RecordedCall {
			contract: self.address.as_str().to_string(),
			method: method.to_string(),
			args: args.to_vec(),
			from: from.map(|o| o.from.as_str().to_string()),
		});
	}
}

#[async_trait]
impl ContractBinding for MockContract {
	fn address(&self) -> &Address {
		&self.address
	}

	async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, ContractError> {
		self.record(method, &args, None);

		let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_in_flight.fetch_max(current, Ordering::SeqCst);
		tokio::task::yield_now().await;
		self.in_flight.fetch_sub(1, Ordering::SeqCst);

		match self.calls.lock().unwrap().get(method) {
			Some(handler) => handler(&args),
			None => Err(ContractError::RemoteRead {
				method: method.to_string(),
				reason: "unscripted".to_string(),
			}),
		}
	}

	async fn send(
		&self,
		method: &str,
		args: Vec<Value>,
		options: &SendOptions,
	) -> Result<Receipt, ContractError> {
		self.record(method, &args, Some(options));
		tokio::task::yield_now().await;

		match self.sends.lock().unwrap().get(method) {
			Some(handler) => handler(&args),
			None => Ok(committed(method)),
		}
	}
}

pub fn committed(method: &str) -> Receipt {
	Receipt {
		transaction_hash: format!("0x{}", hex::encode(method)),
		block_number: Some("0x1".to_string()),
	}
}

pub fn reverted(method: &str, reason: &str) -> ContractError {
	ContractError::TransactionReverted {
		method: method.to_string(),
		reason: reason.to_string(),
	}
}

/// A `getCampaign` tuple: (owner, title, description, goal, totalFunded, deadline, isOpen).
pub fn campaign_tuple(owner: &str, title: &str, goal: &str, funded: &str, open: bool) -> Value {
	json!([
		owner,
		title,
		format!("{} description", title),
		goal,
		funded,
		"1700000000",
		open
	])
}

/// Wallet double that hands out pre-registered mock contracts.
pub struct MockWallet {
	accounts: Result<Vec<String>, ProviderError>,
	contracts: Mutex<HashMap<Address, Arc<MockContract>>>,
	enables: AtomicUsize,
}

impl MockWallet {
	pub fn with_accounts(accounts: Vec<String>) -> Self {
		Self {
			accounts: Ok(accounts),
			contracts: Mutex::new(HashMap::new()),
			enables: AtomicUsize::new(0),
		}
	}

	pub fn denying() -> Self {
		Self {
			accounts: Err(ProviderError::Denied("User rejected the request.".to_string())),
			contracts: Mutex::new(HashMap::new()),
			enables: AtomicUsize::new(0),
		}
	}

	pub fn register(&self, contract: Arc<MockContract>) {
		self.contracts
			.lock()
			.unwrap()
			.insert(contract.address().clone(), contract);
	}

	pub fn enable_count(&self) -> usize {
		self.enables.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl WalletProvider for MockWallet {
	async fn enable(&self) -> Result<(), ProviderError> {
		self.enables.fetch_add(1, Ordering::SeqCst);
		self.accounts.as_ref().map(|_| ()).map_err(Clone::clone)
	}

	async fn accounts(&self) -> Result<Vec<String>, ProviderError> {
		self.accounts.clone()
	}

	fn bind(&self, address: Address) -> Arc<dyn ContractBinding> {
		let mut contracts = self.contracts.lock().unwrap();
		let contract = contracts
			.entry(address.clone())
			.or_insert_with(|| {
				Arc::new(MockContract::new(
					address.as_str(),
					Arc::new(Mutex::new(Vec::new())),
				))
			})
			.clone();
		contract
	}
}

/// Loopback HTTP endpoint that answers every JSON-RPC request from a script.
///
/// The script receives the full request object and returns the full response object.
pub struct StubBridge {
	url: String,
	requests: Arc<Mutex<Vec<Value>>>,
}

impl StubBridge {
	pub async fn start(answer: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let url = format!("http://{}", listener.local_addr().unwrap());
		let requests = Arc::new(Mutex::new(Vec::new()));
		let answer = Arc::new(answer);

		let seen = requests.clone();
		tokio::spawn(async move {
			while let Ok((mut stream, _)) = listener.accept().await {
				let answer = answer.clone();
				let seen = seen.clone();
				tokio::spawn(async move {
					let Some(request) = read_request(&mut stream).await else {
						return;
					};
					seen.lock().unwrap().push(request.clone());
					let body = answer(&request).to_string();
					let response = format!(
						"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
						body.len(),
						body
					);
					let _ = stream.write_all(response.as_bytes()).await;
					let _ = stream.shutdown().await;
				});
			}
		});

		Self { url, requests }
	}

	/// A client for this endpoint that ignores any proxy settings of the environment.
	pub fn client(&self) -> JsonRpcClient {
		let http = reqwest::Client::builder().no_proxy().build().unwrap();
		JsonRpcClient::with_client(self.url.clone(), http)
	}

	/// Every request received so far, oldest first.
	pub fn requests(&self) -> Vec<Value> {
		self.requests.lock().unwrap().clone()
	}

	pub fn count(&self, method: &str) -> usize {
		self.requests()
			.iter()
			.filter(|request| request["method"] == method)
			.count()
	}
}

/// A successful response to `request`.
pub fn reply(request: &Value, result: Value) -> Value {
	json!({"jsonrpc": "2.0", "id": request["id"], "result": result})
}

/// An error response to `request`.
pub fn reply_error(request: &Value, code: i64, message: &str) -> Value {
	json!({
		"jsonrpc": "2.0",
		"id": request["id"],
		"error": {"code": code, "message": message}
	})
}

async fn read_request(stream: &mut TcpStream) -> Option<Value> {
	let mut buffer = Vec::new();
	let mut chunk = [0u8; 1024];
	loop {
		if let Some(end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
			let head = String::from_utf8_lossy(&buffer[..end]).to_ascii_lowercase();
			let length = head
				.lines()
				.find_map(|line| line.strip_prefix("content-length:"))
				.and_then(|value| value.trim().parse::<usize>().ok())
				.unwrap_or(0);
			let body_start = end + 4;
			while buffer.len() < body_start + length {
				let read = stream.read(&mut chunk).await.ok()?;
				if read == 0 {
					return None;
				}
				buffer.extend_from_slice(&chunk[..read]);
			}
			return serde_json::from_slice(&buffer[body_start..body_start + length]).ok();
		}

		let read = stream.read(&mut chunk).await.ok()?;
		if read == 0 {
			return None;
		}
		buffer.extend_from_slice(&chunk[..read]);
	}
}
