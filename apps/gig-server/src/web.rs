use axum::{
	Extension, Form,
	extract::{Path, State},
	http::{StatusCode, header},
	response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use time::macros::format_description;

use gig_domain::validate::FieldErrors;
use gig_service::{EventInput, EventRecord, VenueInput, VenueRecord, date_serde, time_serde};

use crate::{
	pages,
	session::{SESSION_COOKIE, SessionContext},
	state::AppState,
};

pub(crate) async fn home(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
) -> Response {
	let user = user(&ctx);

	match state.service.home_overview().await {
		Ok(overview) => {
			let flash = take_flash(&state, user).await;

			pages::home(user, flash.as_deref(), &overview).into_response()
		},
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn index_html() -> Redirect {
	Redirect::to("/")
}

pub(crate) async fn sign_in_page(ctx: Option<Extension<SessionContext>>) -> Response {
	pages::sign_in(user(&ctx), None, "").into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInForm {
	#[serde(default)]
	username: String,
	#[serde(default)]
	password: String,
}

pub(crate) async fn sign_in(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Form(form): Form<SignInForm>,
) -> Response {
	match state.roster.verify(&form.username, &form.password) {
		Some(principal) => {
			let token = state.sessions.create(&principal.username, &principal.roles).await;
			let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");

			tracing::info!(username = principal.username.as_str(), "Signed in.");

			([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
		},
		None => pages::sign_in(
			user(&ctx),
			Some("The username or password is incorrect."),
			&form.username,
		)
		.into_response(),
	}
}

pub(crate) async fn sign_out(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
) -> Response {
	if let Some(Extension(ctx)) = ctx {
		state.sessions.destroy(&ctx.token).await;
	}

	let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");

	([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

pub(crate) async fn not_found(ctx: Option<Extension<SessionContext>>) -> Response {
	(
		StatusCode::NOT_FOUND,
		pages::not_found(user(&ctx), "The page could not be found."),
	)
		.into_response()
}

// Events.

pub(crate) async fn events_page(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
) -> Response {
	let user = user(&ctx);

	match state.service.events_overview().await {
		Ok(overview) => {
			let flash = take_flash(&state, user).await;

			pages::events(user, flash.as_deref(), &overview).into_response()
		},
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn event_page(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Path(id): Path<i64>,
) -> Response {
	let user = user(&ctx);

	match state.service.get_event(id).await {
		Ok(event) => {
			let flash = take_flash(&state, user).await;

			pages::event_detail(user, flash.as_deref(), &event).into_response()
		},
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn event_new(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
) -> Response {
	event_form_page(
		&state,
		user(&ctx),
		"Add event",
		"/events",
		&EventForm::default(),
		&FieldErrors::new(),
	)
	.await
}

pub(crate) async fn event_create(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Form(form): Form<EventForm>,
) -> Response {
	let user = user(&ctx);
	let (input, errors) = form.parse();

	if !errors.is_empty() {
		return event_form_page(&state, user, "Add event", "/events", &form, &errors).await;
	}

	match state.service.create_event(input).await {
		Ok(_) => redirect_with_flash(&state, user, "/events", "Event successfully added.").await,
		Err(gig_service::Error::Validation(errors)) =>
			event_form_page(&state, user, "Add event", "/events", &form, &errors).await,
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn event_edit(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Path(id): Path<i64>,
) -> Response {
	let user = user(&ctx);

	match state.service.get_event(id).await {
		Ok(event) => {
			let form = EventForm::from_record(&event);
			let action = format!("/events/update/{id}");

			event_form_page(&state, user, "Edit event", &action, &form, &FieldErrors::new()).await
		},
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn event_update(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Path(id): Path<i64>,
	Form(form): Form<EventForm>,
) -> Response {
	let user = user(&ctx);
	let action = format!("/events/update/{id}");
	let (input, errors) = form.parse();

	if !errors.is_empty() {
		return event_form_page(&state, user, "Edit event", &action, &form, &errors).await;
	}

	match state.service.update_event(id, input).await {
		Ok(_) => redirect_with_flash(&state, user, "/events", "Event successfully updated.").await,
		Err(gig_service::Error::Validation(errors)) =>
			event_form_page(&state, user, "Edit event", &action, &form, &errors).await,
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn event_delete(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Path(id): Path<i64>,
) -> Response {
	let user = user(&ctx);

	match state.service.delete_event(id).await {
		Ok(()) => redirect_with_flash(&state, user, "/events", "Event successfully deleted.").await,
		Err(err) => failure(user, err),
	}
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShareForm {
	#[serde(default)]
	content: String,
}

/// Posts the form's content to the social feed and returns to the event page
/// either way; only a successful post earns a flash.
pub(crate) async fn event_share(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Path(id): Path<i64>,
	Form(form): Form<ShareForm>,
) -> Response {
	let user = user(&ctx);
	let back = format!("/events/{id}");

	match state.service.share_event(id, &form.content).await {
		Ok(true) => {
			let message = format!("Your Post: '{}' was posted.", form.content);

			redirect_with_flash(&state, user, &back, &message).await
		},
		Ok(false) => Redirect::to(&back).into_response(),
		Err(err) => failure(user, err),
	}
}

// Venues.

pub(crate) async fn venues_page(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
) -> Response {
	let user = user(&ctx);

	match state.service.list_venues().await {
		Ok(venues) => {
			let flash = take_flash(&state, user).await;

			pages::venues(user, flash.as_deref(), &venues).into_response()
		},
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn venue_page(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Path(id): Path<i64>,
) -> Response {
	let user = user(&ctx);
	let venue = match state.service.get_venue(id).await {
		Ok(venue) => venue,
		Err(err) => return failure(user, err),
	};

	match state.service.venue_events(id).await {
		Ok(events) => {
			let flash = take_flash(&state, user).await;

			pages::venue_detail(user, flash.as_deref(), &venue, &events).into_response()
		},
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn venue_new(ctx: Option<Extension<SessionContext>>) -> Response {
	pages::venue_form(user(&ctx), "Add venue", "/venues", &VenueForm::default(), &FieldErrors::new())
		.into_response()
}

pub(crate) async fn venue_create(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Form(form): Form<VenueForm>,
) -> Response {
	let user = user(&ctx);
	let (input, errors) = form.parse();

	if !errors.is_empty() {
		return pages::venue_form(user, "Add venue", "/venues", &form, &errors).into_response();
	}

	match state.service.create_venue(input).await {
		Ok(_) => redirect_with_flash(&state, user, "/venues", "Venue successfully added.").await,
		Err(gig_service::Error::Validation(errors)) =>
			pages::venue_form(user, "Add venue", "/venues", &form, &errors).into_response(),
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn venue_edit(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Path(id): Path<i64>,
) -> Response {
	let user = user(&ctx);

	match state.service.get_venue(id).await {
		Ok(venue) => {
			let form = VenueForm::from_record(&venue);
			let action = format!("/venues/update/{id}");

			pages::venue_form(user, "Edit venue", &action, &form, &FieldErrors::new())
				.into_response()
		},
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn venue_update(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Path(id): Path<i64>,
	Form(form): Form<VenueForm>,
) -> Response {
	let user = user(&ctx);
	let action = format!("/venues/update/{id}");
	let (input, errors) = form.parse();

	if !errors.is_empty() {
		return pages::venue_form(user, "Edit venue", &action, &form, &errors).into_response();
	}

	match state.service.update_venue(id, input).await {
		Ok(_) => redirect_with_flash(&state, user, "/venues", "Venue successfully updated.").await,
		Err(gig_service::Error::Validation(errors)) =>
			pages::venue_form(user, "Edit venue", &action, &form, &errors).into_response(),
		Err(err) => failure(user, err),
	}
}

pub(crate) async fn venue_delete(
	State(state): State<AppState>,
	ctx: Option<Extension<SessionContext>>,
	Path(id): Path<i64>,
) -> Response {
	let user = user(&ctx);

	match state.service.delete_venue(id).await {
		Ok(()) => redirect_with_flash(&state, user, "/venues", "Venue successfully deleted.").await,
		Err(err) => failure(user, err),
	}
}

// Forms.

/// Raw event form fields. Values stay as submitted strings so a failed
/// submission re-renders exactly what the user typed.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct EventForm {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub date: String,
	#[serde(default)]
	pub time: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub venue: String,
}
impl EventForm {
	fn from_record(event: &EventRecord) -> Self {
		Self {
			name: event.name.clone(),
			date: event
				.date
				.format(format_description!("[year]-[month]-[day]"))
				.unwrap_or_default(),
			time: event
				.time
				.and_then(|time| time.format(format_description!("[hour]:[minute]")).ok())
				.unwrap_or_default(),
			description: event.description.clone().unwrap_or_default(),
			venue: event.venue.id.to_string(),
		}
	}

	/// Turns submitted strings into a typed input, collecting format problems
	/// the field validation cannot see.
	fn parse(&self) -> (EventInput, FieldErrors) {
		let mut errors = FieldErrors::new();
		let date = match self.date.trim() {
			"" => None,
			raw => match date_serde::parse(raw) {
				Ok(date) => Some(date),
				Err(_) => {
					errors.set("date", "The date must be in the format YYYY-MM-DD.");

					None
				},
			},
		};
		let time = match self.time.trim() {
			"" => None,
			raw => match time_serde::parse(raw) {
				Ok(time) => Some(time),
				Err(_) => {
					errors.set("time", "The time must be in the format HH:MM.");

					None
				},
			},
		};
		let venue_id = match self.venue.trim() {
			"" => None,
			raw => match raw.parse::<i64>() {
				Ok(id) => Some(id),
				Err(_) => {
					errors.set("venue", "The venue is required.");

					None
				},
			},
		};
		let description = self.description.trim();
		let input = EventInput {
			name: self.name.clone(),
			date,
			time,
			description: (!description.is_empty()).then(|| description.to_string()),
			venue_id,
		};

		(input, errors)
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct VenueForm {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub capacity: String,
	#[serde(default)]
	pub postcode: String,
	#[serde(default)]
	pub road_name: String,
	#[serde(default)]
	pub latitude: String,
	#[serde(default)]
	pub longitude: String,
}
impl VenueForm {
	fn from_record(venue: &VenueRecord) -> Self {
		Self {
			name: venue.name.clone(),
			capacity: venue.capacity.to_string(),
			postcode: venue.postcode.clone(),
			road_name: venue.road_name.clone(),
			latitude: venue.latitude.map(|value| value.to_string()).unwrap_or_default(),
			longitude: venue.longitude.map(|value| value.to_string()).unwrap_or_default(),
		}
	}

	fn parse(&self) -> (VenueInput, FieldErrors) {
		let mut errors = FieldErrors::new();
		let capacity = match self.capacity.trim() {
			"" => None,
			raw => match raw.parse::<i64>() {
				Ok(capacity) => Some(capacity),
				Err(_) => {
					errors.set("capacity", "Capacity must be a positive integer");

					None
				},
			},
		};
		let latitude = parse_coordinate(&self.latitude, "latitude", &mut errors);
		let longitude = parse_coordinate(&self.longitude, "longitude", &mut errors);
		let input = VenueInput {
			name: self.name.clone(),
			capacity,
			postcode: self.postcode.clone(),
			road_name: self.road_name.clone(),
			latitude,
			longitude,
		};

		(input, errors)
	}
}

fn parse_coordinate(raw: &str, field: &str, errors: &mut FieldErrors) -> Option<f64> {
	match raw.trim() {
		"" => None,
		raw => match raw.parse::<f64>() {
			Ok(value) => Some(value),
			Err(_) => {
				errors.set(field, &format!("The {field} must be a number."));

				None
			},
		},
	}
}

// Helpers.

fn user<'a>(ctx: &'a Option<Extension<SessionContext>>) -> Option<&'a SessionContext> {
	ctx.as_ref().map(|Extension(ctx)| ctx)
}

async fn take_flash(state: &AppState, user: Option<&SessionContext>) -> Option<String> {
	match user {
		Some(ctx) => state.sessions.take_flash(&ctx.token).await,
		None => None,
	}
}

async fn redirect_with_flash(
	state: &AppState,
	user: Option<&SessionContext>,
	path: &str,
	message: &str,
) -> Response {
	if let Some(ctx) = user {
		state.sessions.set_flash(&ctx.token, message).await;
	}

	Redirect::to(path).into_response()
}

async fn event_form_page(
	state: &AppState,
	user: Option<&SessionContext>,
	title: &str,
	action: &str,
	form: &EventForm,
	errors: &FieldErrors,
) -> Response {
	match state.service.list_venues().await {
		Ok(venues) =>
			pages::event_form(user, title, action, form, &venues, errors).into_response(),
		Err(err) => failure(user, err),
	}
}

/// Non-validation service failures rendered per the status-code contract: the
/// id stays visible on 404 and 409 pages.
fn failure(user: Option<&SessionContext>, err: gig_service::Error) -> Response {
	let message = err.to_string();

	match err {
		gig_service::Error::NotFound { .. } =>
			(StatusCode::NOT_FOUND, pages::not_found(user, &message)).into_response(),
		gig_service::Error::VenueHasEvents { .. } =>
			(StatusCode::CONFLICT, pages::conflict(user, &message)).into_response(),
		gig_service::Error::Validation(_) => {
			tracing::error!("A validation failure escaped its form handler.");

			(StatusCode::INTERNAL_SERVER_ERROR, pages::server_error(user)).into_response()
		},
		gig_service::Error::Storage { message } => {
			tracing::error!(%message, "Storage failure while serving a page.");

			(StatusCode::INTERNAL_SERVER_ERROR, pages::server_error(user)).into_response()
		},
	}
}
