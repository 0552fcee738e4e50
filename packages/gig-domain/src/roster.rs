use argon2::{
	Argon2,
	password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use gig_config::Auth;

use crate::access::Role;

#[derive(Debug)]
pub struct Principal {
	pub username: String,
	pub roles: Vec<Role>,
	secret_hash: String,
}

/// Sign-in identities hashed from config at startup. Clear-text passwords do
/// not outlive `from_config`.
#[derive(Debug)]
pub struct Roster {
	principals: Vec<Principal>,
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
	#[error("Unknown role {role} for user {username}.")]
	UnknownRole { username: String, role: String },
	#[error("Failed to hash the password for user {username}.")]
	Hash { username: String, message: String },
}

impl Roster {
	pub fn from_config(auth: &Auth) -> Result<Self, RosterError> {
		let mut principals = Vec::with_capacity(auth.users.len());

		for user in &auth.users {
			let roles = user
				.roles
				.iter()
				.map(|raw| {
					Role::parse(raw).ok_or_else(|| RosterError::UnknownRole {
						username: user.username.clone(),
						role: raw.clone(),
					})
				})
				.collect::<Result<Vec<_>, _>>()?;
			let salt = SaltString::generate(&mut OsRng);
			let secret_hash = Argon2::default()
				.hash_password(user.password.as_bytes(), &salt)
				.map_err(|err| RosterError::Hash {
					username: user.username.clone(),
					message: err.to_string(),
				})?
				.to_string();

			principals.push(Principal { username: user.username.clone(), roles, secret_hash });
		}

		Ok(Self { principals })
	}

	pub fn find(&self, username: &str) -> Option<&Principal> {
		self.principals.iter().find(|principal| principal.username == username)
	}

	/// An unknown user and a wrong password are indistinguishable to the
	/// caller.
	pub fn verify(&self, username: &str, password: &str) -> Option<&Principal> {
		let principal = self.find(username)?;
		let parsed = PasswordHash::new(&principal.secret_hash).ok()?;

		Argon2::default().verify_password(password.as_bytes(), &parsed).ok()?;

		Some(principal)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn auth() -> Auth {
		Auth {
			users: vec![
				gig_config::UserEntry {
					username: "Rob".to_string(),
					password: "Haines".to_string(),
					roles: vec!["admin".to_string()],
				},
				gig_config::UserEntry {
					username: "Naddy".to_string(),
					password: "Gundeep's Birthday".to_string(),
					roles: vec!["attendee".to_string()],
				},
			],
		}
	}

	#[test]
	fn verify_accepts_the_configured_password() {
		let roster = Roster::from_config(&auth()).expect("expected roster to build");
		let principal = roster.verify("Rob", "Haines").expect("expected verification");

		assert_eq!(principal.username, "Rob");
		assert_eq!(principal.roles, vec![Role::Admin]);
	}

	#[test]
	fn verify_rejects_wrong_password_and_unknown_user() {
		let roster = Roster::from_config(&auth()).expect("expected roster to build");

		assert!(roster.verify("Rob", "haines").is_none());
		assert!(roster.verify("Nobody", "Haines").is_none());
	}

	#[test]
	fn passwords_are_stored_hashed() {
		let roster = Roster::from_config(&auth()).expect("expected roster to build");
		let principal = roster.find("Naddy").expect("expected principal");

		assert!(principal.secret_hash.starts_with("$argon2"));
		assert_ne!(principal.secret_hash, "Gundeep's Birthday");
	}

	#[test]
	fn unknown_roles_fail_the_build() {
		let mut auth = auth();

		auth.users[0].roles = vec!["superuser".to_string()];

		let err = Roster::from_config(&auth).expect_err("expected unknown role error");

		assert!(err.to_string().contains("Unknown role superuser for user Rob."));
	}
}
