use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use gig_domain::access::Role;

pub const SESSION_COOKIE: &str = "gig_session";

/// What the access layer and handlers see of a signed-in session.
#[derive(Clone, Debug)]
pub struct SessionContext {
	pub token: String,
	pub username: String,
	pub roles: Vec<Role>,
	pub csrf_token: String,
}

#[derive(Debug)]
struct Session {
	username: String,
	roles: Vec<Role>,
	csrf_token: String,
	flash: Option<String>,
}

/// In-memory sessions keyed by an opaque token. Sessions do not survive a
/// restart; signing in again is the recovery path.
#[derive(Clone, Default)]
pub struct SessionStore {
	sessions: Arc<RwLock<HashMap<String, Session>>>,
}
impl SessionStore {
	/// Opens a session and returns its token. Each session gets its own CSRF
	/// token, minted alongside the session token.
	pub async fn create(&self, username: &str, roles: &[Role]) -> String {
		let token = Uuid::new_v4().to_string();
		let session = Session {
			username: username.to_string(),
			roles: roles.to_vec(),
			csrf_token: Uuid::new_v4().to_string(),
			flash: None,
		};

		self.sessions.write().await.insert(token.clone(), session);

		token
	}

	pub async fn get(&self, token: &str) -> Option<SessionContext> {
		let sessions = self.sessions.read().await;
		let session = sessions.get(token)?;

		Some(SessionContext {
			token: token.to_string(),
			username: session.username.clone(),
			roles: session.roles.clone(),
			csrf_token: session.csrf_token.clone(),
		})
	}

	pub async fn destroy(&self, token: &str) {
		self.sessions.write().await.remove(token);
	}

	pub async fn set_flash(&self, token: &str, message: &str) {
		if let Some(session) = self.sessions.write().await.get_mut(token) {
			session.flash = Some(message.to_string());
		}
	}

	/// Removes and returns the pending flash message, so it renders exactly
	/// once.
	pub async fn take_flash(&self, token: &str) -> Option<String> {
		self.sessions.write().await.get_mut(token).and_then(|session| session.flash.take())
	}
}

/// Extracts the session token from a `Cookie` header value.
pub fn session_token(cookie_header: &str) -> Option<&str> {
	cookie_header.split(';').map(str::trim).find_map(|pair| {
		let (name, value) = pair.split_once('=')?;

		(name == SESSION_COOKIE).then_some(value)
	})
}
