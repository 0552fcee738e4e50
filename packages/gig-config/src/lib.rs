mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Auth, Config, FeedConfig, GeocodingConfig, Providers, Seed, Service, Sqlite, Storage,
	UserEntry,
};

use std::{collections::HashSet, fs, path::Path};

pub const KNOWN_ROLES: &[&str] = &["admin", "organiser", "attendee"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.sqlite.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.sqlite.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.sqlite.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.sqlite.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.auth.users.is_empty() {
		return Err(Error::Validation { message: "auth.users must be non-empty.".to_string() });
	}

	let mut seen = HashSet::new();

	for user in &cfg.auth.users {
		if user.username.is_empty() {
			return Err(Error::Validation {
				message: "auth.users username must be non-empty.".to_string(),
			});
		}
		if user.password.is_empty() {
			return Err(Error::Validation {
				message: format!("auth.users password for {} must be non-empty.", user.username),
			});
		}
		if user.roles.is_empty() {
			return Err(Error::Validation {
				message: format!("auth.users roles for {} must be non-empty.", user.username),
			});
		}

		for role in &user.roles {
			if !KNOWN_ROLES.contains(&role.as_str()) {
				return Err(Error::Validation {
					message: format!(
						"auth.users role {role} for {} must be one of admin, organiser, or attendee.",
						user.username
					),
				});
			}
		}

		if !seen.insert(user.username.as_str()) {
			return Err(Error::Validation {
				message: format!("auth.users username {} must be unique.", user.username),
			});
		}
	}

	for (label, provider_enabled, api_base, api_key, timeout_ms) in [
		(
			"geocoding",
			cfg.providers.geocoding.enabled,
			&cfg.providers.geocoding.api_base,
			&cfg.providers.geocoding.api_key,
			cfg.providers.geocoding.timeout_ms,
		),
		(
			"feed",
			cfg.providers.feed.enabled,
			&cfg.providers.feed.api_base,
			&cfg.providers.feed.api_key,
			cfg.providers.feed.timeout_ms,
		),
	] {
		if !provider_enabled {
			continue;
		}
		if api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.api_base must be non-empty when enabled."),
			});
		}
		if api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.api_key must be non-empty when enabled."),
			});
		}
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.timeout_ms must be greater than zero."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for user in &mut cfg.auth.users {
		user.username = user.username.trim().to_string();
		user.roles = user.roles.iter().map(|role| role.trim().to_lowercase()).collect();
	}
}
