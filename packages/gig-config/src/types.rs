use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub auth: Auth,
	pub providers: Providers,
	pub seed: Seed,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub sqlite: Sqlite,
}

#[derive(Debug, Deserialize)]
pub struct Sqlite {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
	pub users: Vec<UserEntry>,
}

/// One sign-in identity. Passwords arrive in clear text and are hashed at
/// startup; `roles` holds lowercase role names.
#[derive(Debug, Deserialize)]
pub struct UserEntry {
	pub username: String,
	pub password: String,
	pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub geocoding: GeocodingConfig,
	pub feed: FeedConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeocodingConfig {
	pub enabled: bool,
	pub api_base: String,
	pub api_key: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct FeedConfig {
	pub enabled: bool,
	pub api_base: String,
	pub api_key: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Seed {
	pub demo_data: bool,
}
