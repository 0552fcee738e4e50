use axum::{
	Extension, Json, Router,
	http::{StatusCode, Uri},
	middleware,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde_json::json;

use crate::{access, api, session::SessionContext, state::AppState, web};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(web::home))
		.route("/index.html", get(web::index_html))
		.route("/sign-in", get(web::sign_in_page).post(web::sign_in))
		.route("/sign-out", post(web::sign_out))
		.route("/events", get(web::events_page).post(web::event_create))
		.route("/events/new", get(web::event_new))
		.route(
			"/events/update/{id}",
			get(web::event_edit).post(web::event_update).put(web::event_update),
		)
		.route("/events/delete/{id}", post(web::event_delete))
		.route("/events/{id}", get(web::event_page).delete(web::event_delete))
		.route("/events/{id}/share", post(web::event_share))
		.route("/venues", get(web::venues_page).post(web::venue_create))
		.route("/venues/new", get(web::venue_new))
		.route(
			"/venues/update/{id}",
			get(web::venue_edit).post(web::venue_update).put(web::venue_update),
		)
		.route("/venues/delete/{id}", post(web::venue_delete))
		.route("/venues/{id}", get(web::venue_page).delete(web::venue_delete))
		.route("/api", get(api::index))
		.route("/api/events", get(api::list_events).post(api::create_event))
		.route("/api/events/new", get(api::not_acceptable))
		.route("/api/events/update", get(api::not_acceptable))
		.route(
			"/api/events/{id}",
			get(api::get_event).put(api::update_event).delete(api::delete_event),
		)
		.route("/api/venues", get(api::list_venues).post(api::create_venue))
		.route("/api/venues/new", get(api::not_acceptable))
		.route("/api/venues/update", get(api::not_acceptable))
		.route(
			"/api/venues/{id}",
			get(api::get_venue).put(api::update_venue).delete(api::delete_venue),
		)
		.route("/api/venues/{id}/events", get(api::venue_events))
		.route("/api/venues/{id}/next3events", get(api::venue_next_events))
		.fallback(not_found)
		.layer(middleware::from_fn_with_state(state.clone(), access::enforce))
		.with_state(state)
}

/// Unmatched programmatic paths keep the JSON error contract; everything else
/// gets the HTML 404 page.
async fn not_found(uri: Uri, ctx: Option<Extension<SessionContext>>) -> Response {
	if uri.path() == "/api" || uri.path().starts_with("/api/") {
		api::not_found()
	} else {
		web::not_found(ctx).await
	}
}

/// A service failure translated to the programmatic surface's status-code
/// contract, with a stable `error` string and the offending id.
#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	body: serde_json::Value,
}
impl From<gig_service::Error> for ApiError {
	fn from(err: gig_service::Error) -> Self {
		let message = err.to_string();

		match err {
			gig_service::Error::NotFound { id, .. } => Self {
				status: StatusCode::NOT_FOUND,
				body: json!({ "error": message, "id": id }),
			},
			gig_service::Error::VenueHasEvents { id } => Self {
				status: StatusCode::CONFLICT,
				body: json!({ "error": message, "id": id }),
			},
			gig_service::Error::Validation(fields) => Self {
				status: StatusCode::UNPROCESSABLE_ENTITY,
				body: json!({ "error": "Validation failed.", "fields": fields }),
			},
			gig_service::Error::Storage { message } => {
				tracing::error!(%message, "Storage failure while serving a request.");

				Self {
					status: StatusCode::INTERNAL_SERVER_ERROR,
					body: json!({ "error": "Internal error." }),
				}
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(self.body)).into_response()
	}
}
