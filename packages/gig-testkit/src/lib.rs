mod error;

pub use error::{Error, Result};

use gig_config::{
	Auth, Config, FeedConfig, GeocodingConfig, Providers, Seed, Service, Sqlite, Storage, UserEntry,
};
use gig_storage::db::Db;

/// A fresh in-memory database with the schema applied. The single-connection
/// pool keeps the `:memory:` database alive for the pool's lifetime; a second
/// connection would see an empty database.
pub async fn memory_db() -> Result<Db> {
	let cfg = memory_sqlite();
	let db = Db::connect(&cfg).await?;

	db.ensure_schema().await?;

	Ok(db)
}

pub fn memory_sqlite() -> Sqlite {
	Sqlite { dsn: "sqlite::memory:".to_string(), pool_max_conns: 1 }
}

/// A complete configuration for tests. Three users cover one of each role, the
/// database is in memory, and both providers stay disabled so no test reaches
/// the network.
pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage { sqlite: memory_sqlite() },
		auth: Auth {
			users: vec![
				user("Rob", "Haines", &["admin"]),
				user("Gundeep", "Oberoi", &["organiser"]),
				user("Naddy", "Gundeep's Birthday", &["attendee"]),
			],
		},
		providers: Providers {
			geocoding: GeocodingConfig {
				enabled: false,
				api_base: "https://api.mapbox.com".to_string(),
				api_key: String::new(),
				timeout_ms: 1_500,
			},
			feed: FeedConfig {
				enabled: false,
				api_base: "https://mastodonapp.uk".to_string(),
				api_key: String::new(),
				timeout_ms: 1_500,
			},
		},
		seed: Seed { demo_data: false },
	}
}

fn user(username: &str, password: &str, roles: &[&str]) -> UserEntry {
	UserEntry {
		username: username.to_string(),
		password: password.to_string(),
		roles: roles.iter().map(|role| role.to_string()).collect(),
	}
}
