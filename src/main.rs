use crowdfund_sync::session::{RpcWalletProvider, WalletProvider};
use crowdfund_sync::{
	CampaignCollection, CampaignRepository, ClientConfig, NotificationSink, NotifierSet,
	SessionManager, TracingSink, TransactionOrchestrator,
};

use std::error::Error;
use std::sync::Arc;
use tracing::{error, info};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let mut filter =
		tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
	if let Ok(directive) = "crowdfund_sync=debug".parse() {
		filter = filter.add_directive(directive);
	}
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	let args: Vec<String> = std::env::args().skip(1).collect();
	if let Err(e) = run(&args).await {
		error!("{}", e);
		std::process::exit(1);
	}
}

async fn run(args: &[String]) -> Result<(), BoxError> {
	let config = ClientConfig::from_env()?;
	info!(
		"Crowdfunding contract {}, payment token {}",
		config.contract_address, config.token_address
	);

	let notifier: Arc<dyn NotificationSink> = Arc::new(NotifierSet::new().with(Arc::new(TracingSink)));
	let provider = RpcWalletProvider::discover(&config)?
		.map(|provider| Arc::new(provider) as Arc<dyn WalletProvider>);

	let mut sessions = SessionManager::new(provider, notifier.clone());
	let session = sessions.connect().await?;
	info!("Connected as {}", session.identity());

	let repository = Arc::new(
		CampaignRepository::new(
			session.contract(&config.contract_address)?,
			notifier.clone(),
			config.amount_unit,
		)
		.with_retry_max_elapsed(config.refresh_retry_max_elapsed),
	);
	let orchestrator = TransactionOrchestrator::from_session(
		&session,
		&config.token_address,
		repository.clone(),
		notifier,
	)?;

	repository.refresh_with_retry().await?;

	match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
		[] | ["list"] => {}
		["create", title, description, goal, days] => {
			let receipt = orchestrator
				.create_campaign(title, description, goal, days)
				.await?;
			info!("Campaign created in {}", receipt.transaction_hash);
		}
		["fund", index, amount] => {
			let pending = orchestrator.fund_campaign(parse_index(index)?, amount).await?;
			info!(
				"Funded campaign #{} with {} tokens",
				pending.campaign_index(),
				pending.amount()
			);
		}
		["close", index] => {
			let receipt = orchestrator.close_campaign(parse_index(index)?).await?;
			info!("Campaign closed in {}", receipt.transaction_hash);
		}
		_ => {
			return Err(
				"usage: crowdfund-sync [list | create <title> <description> <goal> <days> | \
				 fund <index> <amount> | close <index>]"
					.into(),
			);
		}
	}

	log_campaigns(&repository.snapshot(), &orchestrator);
	sessions.disconnect();
	Ok(())
}

fn parse_index(text: &str) -> Result<u64, BoxError> {
	text.parse::<u64>()
		.map_err(|_| format!("campaign index must be a number, got '{}'", text).into())
}

fn log_campaigns(collection: &CampaignCollection, orchestrator: &TransactionOrchestrator) {
	let now = chrono::Utc::now();
	info!(
		"{} campaigns as of {}",
		collection.len(),
		collection.fetched_at
	);
	for campaign in collection {
		let status = if !campaign.is_open {
			"closed".to_string()
		} else if campaign.is_past_deadline(now) {
			"deadline passed".to_string()
		} else {
			format!("{} hours left", campaign.hours_left(now))
		};
		let yours = if campaign.can_close(orchestrator.identity()) {
			" (yours)"
		} else {
			""
		};
		info!(
			"#{} {}{}: raised {} of {}, {}",
			campaign.index,
			campaign.title,
			yours,
			campaign.total_funded,
			campaign.goal_amount,
			status
		);
		info!("    {}", campaign.description_preview());
	}
}
