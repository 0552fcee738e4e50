use std::sync::Arc;

use gig_domain::{access::RuleSet, roster::Roster};
use gig_service::GigService;
use gig_storage::db::Db;

use crate::{seed, session::SessionStore};

static RULES: RuleSet = RuleSet::standard();

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<GigService>,
	pub roster: Arc<Roster>,
	pub sessions: SessionStore,
	pub rules: &'static RuleSet,
}
impl AppState {
	pub async fn new(config: gig_config::Config) -> color_eyre::Result<Self> {
		let roster = Roster::from_config(&config.auth)?;
		let db = Db::connect(&config.storage.sqlite).await?;

		db.ensure_schema().await?;

		let service = GigService::new(config, db);

		if service.cfg.seed.demo_data {
			seed::load_demo_data(&service).await?;
		}

		Ok(Self::with_service(service, roster))
	}

	/// Wires the state around an already-built service, which is how tests
	/// inject an in-memory database and stub providers.
	pub fn with_service(service: GigService, roster: Roster) -> Self {
		Self {
			service: Arc::new(service),
			roster: Arc::new(roster),
			sessions: SessionStore::default(),
			rules: &RULES,
		}
	}
}
