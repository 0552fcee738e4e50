use axum::{
	Json,
	body::{self, Body, Bytes},
	extract::{Request, State},
	http::{HeaderMap, StatusCode, header},
	middleware::Next,
	response::{IntoResponse, Redirect, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};

use gig_domain::access::{self, Access, AccessDecision, Method, Role, Scheme};

use crate::{pages, session, state::AppState};

const FORM_BODY_LIMIT: usize = 64 * 1_024;

/// The one middleware in front of every route: pick the credential scheme,
/// resolve the principal, check the CSRF token on session-backed writes, and
/// run the rule table. Only `Permit` reaches the handler.
pub async fn enforce(State(state): State<AppState>, req: Request, next: Next) -> Response {
	let method = Method::parse(req.method().as_str());
	let path = req.uri().path().to_string();
	let scheme = access::select_scheme(&path);
	let is_write = method.map(|method| method.is_write()).unwrap_or(true);
	let mut req = req;
	let mut session_ctx = None;
	let mut api_roles: Option<Vec<Role>> = None;
	let mut csrf_valid = true;

	match scheme {
		Scheme::ApiHeader => {
			api_roles = basic_roles(&state, req.headers());
		},
		Scheme::Session => {
			let token = req
				.headers()
				.get(header::COOKIE)
				.and_then(|value| value.to_str().ok())
				.and_then(session::session_token)
				.map(str::to_string);

			if let Some(token) = token
				&& let Some(ctx) = state.sessions.get(&token).await
			{
				if is_write {
					let (rebuilt, supplied) = csrf_token_from(req).await;

					req = rebuilt;
					csrf_valid = supplied.as_deref() == Some(ctx.csrf_token.as_str());
				}

				session_ctx = Some(ctx);
			}
		},
	}

	let roles = session_ctx.as_ref().map(|ctx| ctx.roles.as_slice()).or(api_roles.as_deref());
	let access = Access { scheme, method, path: &path, roles, csrf_valid };
	let evaluation = access::evaluate_access(state.rules, &access);

	match evaluation.decision {
		AccessDecision::Permit => {
			if let Some(ctx) = session_ctx {
				req.extensions_mut().insert(ctx);
			}

			next.run(req).await
		},
		AccessDecision::AuthenticationRequired => match scheme {
			Scheme::ApiHeader => (
				StatusCode::UNAUTHORIZED,
				[(header::WWW_AUTHENTICATE, "Basic realm=\"gig\"")],
				Json(serde_json::json!({ "error": "Authentication required." })),
			)
				.into_response(),
			Scheme::Session => Redirect::to("/sign-in").into_response(),
		},
		AccessDecision::AuthorizationDenied => {
			tracing::debug!(%path, csrf_valid, "Request denied.");

			match scheme {
				Scheme::ApiHeader => (
					StatusCode::FORBIDDEN,
					Json(serde_json::json!({ "error": "Forbidden." })),
				)
					.into_response(),
				Scheme::Session => (
					StatusCode::FORBIDDEN,
					pages::forbidden(session_ctx.as_ref()),
				)
					.into_response(),
			}
		},
	}
}

/// Roles carried by a valid `Authorization: Basic` header. Missing, malformed,
/// and unverifiable credentials are all the same to the caller.
fn basic_roles(state: &AppState, headers: &HeaderMap) -> Option<Vec<Role>> {
	let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
	let encoded = header.strip_prefix("Basic ")?;
	let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
	let (username, password) = decoded.split_once(':')?;
	let principal = state.roster.verify(username, password)?;

	Some(principal.roles.clone())
}

/// Pulls the CSRF token out of the request: the `X-CSRF-Token` header for
/// bodiless requests, else the `_csrf` field of a form body. The body is
/// buffered and put back so the handler still sees it.
async fn csrf_token_from(req: Request) -> (Request, Option<String>) {
	if let Some(token) = req.headers().get("x-csrf-token").and_then(|value| value.to_str().ok()) {
		let token = token.to_string();

		return (req, Some(token));
	}

	let is_form = req
		.headers()
		.get(header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.map(|value| value.starts_with("application/x-www-form-urlencoded"))
		.unwrap_or(false);

	if !is_form {
		return (req, None);
	}

	let (parts, body) = req.into_parts();
	let bytes = body::to_bytes(body, FORM_BODY_LIMIT).await.unwrap_or_else(|_| Bytes::new());
	let token = form_value(std::str::from_utf8(&bytes).unwrap_or(""), "_csrf");

	(Request::from_parts(parts, Body::from(bytes)), token)
}

/// Tokens are UUIDs, so neither percent-escapes nor `+` can appear in a valid
/// value and no decoding is needed.
fn form_value(body: &str, key: &str) -> Option<String> {
	body.split('&').find_map(|pair| {
		let (name, value) = pair.split_once('=')?;

		(name == key).then(|| value.to_string())
	})
}
