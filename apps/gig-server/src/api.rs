use axum::{
	Json,
	extract::{Path, State},
	http::{StatusCode, header},
	response::{IntoResponse, Response},
};
use serde_json::json;

use gig_service::{EventInput, EventRecord, VenueInput, VenueRecord};

use crate::{routes::ApiError, state::AppState};

pub(crate) async fn index() -> Json<serde_json::Value> {
	Json(json!({
		"events": "/api/events",
		"venues": "/api/venues",
	}))
}

/// The original API exposed `new`/`update` as form-backing resources it could
/// not serve as JSON; they answer 406 rather than falling into the `{id}`
/// routes.
pub(crate) async fn not_acceptable() -> StatusCode {
	StatusCode::NOT_ACCEPTABLE
}

pub(crate) fn not_found() -> Response {
	(StatusCode::NOT_FOUND, Json(json!({ "error": "The resource could not be found." })))
		.into_response()
}

pub(crate) async fn list_events(
	State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
	let events = state.service.list_events().await?;

	Ok(Json(json!({ "events": events })))
}

pub(crate) async fn get_event(
	State(state): State<AppState>,
	Path(id): Path<i64>,
) -> Result<Json<EventRecord>, ApiError> {
	Ok(Json(state.service.get_event(id).await?))
}

pub(crate) async fn create_event(
	State(state): State<AppState>,
	Json(input): Json<EventInput>,
) -> Result<Response, ApiError> {
	let event = state.service.create_event(input).await?;

	Ok(created(format!("/api/events/{}", event.id), Json(event)))
}

/// Replaces the event wholesale. Mirrors the original API's update contract,
/// 201 with a Location back to the resource.
pub(crate) async fn update_event(
	State(state): State<AppState>,
	Path(id): Path<i64>,
	Json(input): Json<EventInput>,
) -> Result<Response, ApiError> {
	let event = state.service.update_event(id, input).await?;

	Ok(created(format!("/api/events/{id}"), Json(event)))
}

pub(crate) async fn delete_event(
	State(state): State<AppState>,
	Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
	state.service.delete_event(id).await?;

	Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_venues(
	State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
	let venues = state.service.list_venues().await?;

	Ok(Json(json!({ "venues": venues })))
}

pub(crate) async fn get_venue(
	State(state): State<AppState>,
	Path(id): Path<i64>,
) -> Result<Json<VenueRecord>, ApiError> {
	Ok(Json(state.service.get_venue(id).await?))
}

pub(crate) async fn create_venue(
	State(state): State<AppState>,
	Json(input): Json<VenueInput>,
) -> Result<Response, ApiError> {
	let venue = state.service.create_venue(input).await?;

	Ok(created(format!("/api/venues/{}", venue.id), Json(venue)))
}

pub(crate) async fn update_venue(
	State(state): State<AppState>,
	Path(id): Path<i64>,
	Json(input): Json<VenueInput>,
) -> Result<Response, ApiError> {
	let venue = state.service.update_venue(id, input).await?;

	Ok(created(format!("/api/venues/{id}"), Json(venue)))
}

pub(crate) async fn delete_venue(
	State(state): State<AppState>,
	Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
	state.service.delete_venue(id).await?;

	Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn venue_events(
	State(state): State<AppState>,
	Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
	let events = state.service.venue_events(id).await?;

	Ok(Json(json!({ "events": events })))
}

pub(crate) async fn venue_next_events(
	State(state): State<AppState>,
	Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
	let events = state.service.venue_next_events(id).await?;

	Ok(Json(json!({ "events": events })))
}

fn created(location: String, body: impl IntoResponse) -> Response {
	(StatusCode::CREATED, [(header::LOCATION, location)], body).into_response()
}
