pub mod date_serde;
pub mod events;
pub mod rankings;
pub mod share;
pub mod time_serde;
pub mod venues;

mod error;
mod guard;

use std::{future::Future, pin::Pin, sync::Arc};

pub use error::{EntityKind, Error, Result};
pub use events::{EventInput, EventRecord, EventsOverview, HomeOverview};
pub use venues::{VenueInput, VenueRecord, VenueSummary};

use gig_config::{Config, FeedConfig, GeocodingConfig};
use gig_providers::{
	feed::{self, FeedPost},
	geocode::{self, Coordinates},
};
use gig_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait GeocodeProvider
where
	Self: Send + Sync,
{
	fn forward<'a>(
		&'a self,
		cfg: &'a GeocodingConfig,
		query: &'a str,
	) -> BoxFuture<'a, gig_providers::Result<Option<Coordinates>>>;
}

pub trait FeedProvider
where
	Self: Send + Sync,
{
	fn publish<'a>(
		&'a self,
		cfg: &'a FeedConfig,
		content: &'a str,
	) -> BoxFuture<'a, gig_providers::Result<()>>;

	fn latest<'a>(
		&'a self,
		cfg: &'a FeedConfig,
		limit: usize,
	) -> BoxFuture<'a, gig_providers::Result<Vec<FeedPost>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub geocoder: Arc<dyn GeocodeProvider>,
	pub feed: Arc<dyn FeedProvider>,
}

pub struct GigService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}

struct DefaultProviders;

impl GeocodeProvider for DefaultProviders {
	fn forward<'a>(
		&'a self,
		cfg: &'a GeocodingConfig,
		query: &'a str,
	) -> BoxFuture<'a, gig_providers::Result<Option<Coordinates>>> {
		Box::pin(geocode::forward(cfg, query))
	}
}

impl FeedProvider for DefaultProviders {
	fn publish<'a>(
		&'a self,
		cfg: &'a FeedConfig,
		content: &'a str,
	) -> BoxFuture<'a, gig_providers::Result<()>> {
		Box::pin(feed::publish(cfg, content))
	}

	fn latest<'a>(
		&'a self,
		cfg: &'a FeedConfig,
		limit: usize,
	) -> BoxFuture<'a, gig_providers::Result<Vec<FeedPost>>> {
		Box::pin(feed::latest(cfg, limit))
	}
}

impl Providers {
	pub fn new(geocoder: Arc<dyn GeocodeProvider>, feed: Arc<dyn FeedProvider>) -> Self {
		Self { geocoder, feed }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { geocoder: provider.clone(), feed: provider }
	}
}

impl GigService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}
}

pub(crate) fn today() -> time::Date {
	time::OffsetDateTime::now_utc().date()
}
