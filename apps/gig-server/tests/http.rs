use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
	response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use time::{Duration, OffsetDateTime, macros::format_description};
use tower::util::ServiceExt;

use gig_domain::roster::Roster;
use gig_server::{routes, session, state::AppState};
use gig_service::GigService;

async fn app() -> (Router, AppState) {
	let cfg = gig_testkit::test_config();
	let roster = Roster::from_config(&cfg.auth).expect("Failed to build the roster.");
	let db = gig_testkit::memory_db().await.expect("Failed to create the in-memory database.");
	let state = AppState::with_service(GigService::new(cfg, db), roster);

	(routes::router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
	app.clone().oneshot(request).await.expect("Failed to call the router.")
}

async fn json_body(response: Response) -> serde_json::Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read the response body.");

	serde_json::from_slice(&bytes).expect("Failed to parse the response body.")
}

async fn text_body(response: Response) -> String {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read the response body.");

	String::from_utf8(bytes.to_vec()).expect("Failed to decode the response body.")
}

fn basic(username: &str, password: &str) -> String {
	format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

fn organiser() -> String {
	basic("Gundeep", "Oberoi")
}

fn json_request(method: &str, uri: &str, auth: &str, payload: &serde_json::Value) -> Request<Body> {
	Request::builder()
		.method(method)
		.uri(uri)
		.header(header::AUTHORIZATION, auth)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

fn future_date(days: i64) -> String {
	(OffsetDateTime::now_utc().date() + Duration::days(days))
		.format(format_description!("[year]-[month]-[day]"))
		.expect("Failed to format date.")
}

fn venue_payload(name: &str) -> serde_json::Value {
	serde_json::json!({
		"name": name,
		"capacity": 100,
		"postcode": "M13 9PY",
		"road_name": "Oxford Road",
	})
}

async fn api_create_venue(app: &Router, name: &str) -> i64 {
	let response =
		send(app, json_request("POST", "/api/venues", &organiser(), &venue_payload(name))).await;

	assert_eq!(response.status(), StatusCode::CREATED);

	json_body(response).await["id"].as_i64().expect("Expected a venue id.")
}

async fn api_create_event(app: &Router, name: &str, venue_id: i64) -> i64 {
	let payload = serde_json::json!({
		"name": name,
		"date": future_date(7),
		"time": "19:00",
		"venue": venue_id,
	});
	let response = send(app, json_request("POST", "/api/events", &organiser(), &payload)).await;

	assert_eq!(response.status(), StatusCode::CREATED);

	json_body(response).await["id"].as_i64().expect("Expected an event id.")
}

/// Signs in through the form and returns the session cookie pair the browser
/// would hold: the `Cookie` header value and the session's CSRF token.
async fn sign_in(app: &Router, state: &AppState, username: &str, password: &str) -> (String, String) {
	let body = format!("username={}&password={}", urlencode(username), urlencode(password));
	let response = send(
		app,
		Request::builder()
			.method("POST")
			.uri("/sign-in")
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(Body::from(body))
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::SEE_OTHER, "Expected a successful sign-in.");

	let set_cookie = response
		.headers()
		.get(header::SET_COOKIE)
		.expect("Expected a session cookie.")
		.to_str()
		.expect("Expected a readable cookie.")
		.to_string();
	let token =
		session::session_token(&set_cookie).expect("Expected a session token.").to_string();
	let ctx = state.sessions.get(&token).await.expect("Expected a live session.");

	(format!("{}={token}", session::SESSION_COOKIE), ctx.csrf_token)
}

fn urlencode(raw: &str) -> String {
	raw.replace('%', "%25").replace(' ', "%20").replace('&', "%26").replace('\'', "%27")
}

fn form_request(uri: &str, cookie: &str, body: String) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::COOKIE, cookie)
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(Body::from(body))
		.expect("Failed to build request.")
}

#[tokio::test]
async fn public_pages_need_no_credentials() {
	let (app, _state) = app().await;

	for uri in ["/", "/events", "/venues", "/sign-in"] {
		let response = send(
			&app,
			Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request."),
		)
		.await;

		assert_eq!(response.status(), StatusCode::OK, "Expected {uri} to be public.");
	}

	let response = send(
		&app,
		Request::builder().uri("/api").body(Body::empty()).expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["events"], "/api/events");
}

#[tokio::test]
async fn api_writes_challenge_anonymous_callers() {
	let (app, _state) = app().await;
	let response = send(
		&app,
		Request::builder()
			.method("POST")
			.uri("/api/venues")
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(venue_payload("Hall").to_string()))
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

	// Wrong passwords get the same challenge.
	let response = send(
		&app,
		json_request("POST", "/api/venues", &basic("Gundeep", "wrong"), &venue_payload("Hall")),
	)
	.await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn attendees_cannot_write_through_the_api() {
	let (app, _state) = app().await;
	let response = send(
		&app,
		json_request(
			"POST",
			"/api/venues",
			&basic("Naddy", "Gundeep's Birthday"),
			&venue_payload("Hall"),
		),
	)
	.await;

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn organisers_manage_events_and_venues_through_the_api() {
	let (app, _state) = app().await;
	let venue_id = api_create_venue(&app, "Kilburn Mega Lab").await;
	let event_id = api_create_event(&app, "Open Day", venue_id).await;

	let response = send(
		&app,
		Request::builder()
			.uri(format!("/api/events/{event_id}"))
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);

	let event = json_body(response).await;

	assert_eq!(event["name"], "Open Day");
	assert_eq!(event["venue"]["id"], venue_id);

	let payload = serde_json::json!({
		"name": "Open Day (moved)",
		"date": future_date(14),
		"venue": venue_id,
	});
	let response = send(
		&app,
		json_request("PUT", &format!("/api/events/{event_id}"), &organiser(), &payload),
	)
	.await;

	assert_eq!(response.status(), StatusCode::CREATED);
	assert_eq!(
		response.headers().get(header::LOCATION).and_then(|value| value.to_str().ok()),
		Some(format!("/api/events/{event_id}").as_str())
	);

	let response = send(
		&app,
		Request::builder()
			.method("DELETE")
			.uri(format!("/api/events/{event_id}"))
			.header(header::AUTHORIZATION, organiser())
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::NO_CONTENT);

	let response = send(
		&app,
		Request::builder()
			.uri(format!("/api/events/{event_id}"))
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);

	let body = json_body(response).await;

	assert_eq!(body["error"], format!("Could not find event {event_id}."));
	assert_eq!(body["id"], event_id);
}

#[tokio::test]
async fn api_validation_failures_are_422_with_field_reasons() {
	let (app, _state) = app().await;
	let payload = serde_json::json!({
		"name": "",
		"capacity": 0,
		"postcode": "NOT A POSTCODE",
		"road_name": "Oxford Road",
	});
	let response = send(&app, json_request("POST", "/api/venues", &organiser(), &payload)).await;

	assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

	let body = json_body(response).await;

	assert_eq!(body["error"], "Validation failed.");
	assert_eq!(body["fields"]["name"], "The name is required.");
	assert_eq!(body["fields"]["capacity"], "Capacity must be a positive integer");
	assert_eq!(body["fields"]["postcode"], "Invalid post code");
}

#[tokio::test]
async fn venue_deletes_conflict_until_the_events_are_gone() {
	let (app, state) = app().await;
	let venue_id = api_create_venue(&app, "Busy Hall").await;
	let event_id = api_create_event(&app, "Party", venue_id).await;

	let response = send(
		&app,
		Request::builder()
			.method("DELETE")
			.uri(format!("/api/venues/{venue_id}"))
			.header(header::AUTHORIZATION, organiser())
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::CONFLICT);

	let body = json_body(response).await;

	assert_eq!(
		body["error"],
		format!("Could not delete venue {venue_id} because it has one or more events.")
	);
	assert_eq!(body["id"], venue_id);
	assert!(
		state.service.get_venue(venue_id).await.is_ok(),
		"The conflicting delete must leave the venue in place."
	);

	let response = send(
		&app,
		Request::builder()
			.method("DELETE")
			.uri(format!("/api/events/{event_id}"))
			.header(header::AUTHORIZATION, organiser())
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::NO_CONTENT);

	let response = send(
		&app,
		Request::builder()
			.method("DELETE")
			.uri(format!("/api/venues/{venue_id}"))
			.header(header::AUTHORIZATION, organiser())
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::NO_CONTENT);
	assert!(state.service.get_venue(venue_id).await.is_err());
}

#[tokio::test]
async fn anonymous_visitors_are_sent_to_sign_in() {
	let (app, _state) = app().await;
	let response = send(
		&app,
		Request::builder()
			.uri("/events/new")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(
		response.headers().get(header::LOCATION).and_then(|value| value.to_str().ok()),
		Some("/sign-in")
	);
}

#[tokio::test]
async fn session_writes_without_a_csrf_token_are_forbidden() {
	let (app, state) = app().await;
	let venue_id = api_create_venue(&app, "Hall").await;
	let event_id = api_create_event(&app, "Original", venue_id).await;
	let (cookie, csrf) = sign_in(&app, &state, "Rob", "Haines").await;

	// Admin session, valid fields, no token.
	let body = format!("name=Renamed&date={}&venue={venue_id}", future_date(10));
	let response =
		send(&app, form_request(&format!("/events/update/{event_id}"), &cookie, body)).await;

	assert_eq!(response.status(), StatusCode::FORBIDDEN);

	let event = state.service.get_event(event_id).await.expect("Failed to fetch event.");

	assert_eq!(event.name, "Original", "A forbidden update must not change the event.");

	// The same submission with the token goes through.
	let body =
		format!("name=Renamed&date={}&venue={venue_id}&_csrf={csrf}", future_date(10));
	let response =
		send(&app, form_request(&format!("/events/update/{event_id}"), &cookie, body)).await;

	assert_eq!(response.status(), StatusCode::SEE_OTHER);

	let event = state.service.get_event(event_id).await.expect("Failed to fetch event.");

	assert_eq!(event.name, "Renamed");
}

#[tokio::test]
async fn bodiless_session_deletes_take_the_csrf_header() {
	let (app, state) = app().await;
	let venue_id = api_create_venue(&app, "Hall").await;
	let event_id = api_create_event(&app, "Party", venue_id).await;
	let (cookie, csrf) = sign_in(&app, &state, "Rob", "Haines").await;

	// No form body and no header means no token.
	let response = send(
		&app,
		Request::builder()
			.method("DELETE")
			.uri(format!("/events/{event_id}"))
			.header(header::COOKIE, &cookie)
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	assert!(
		state.service.get_event(event_id).await.is_ok(),
		"A forbidden delete must leave the event in place."
	);

	// The header carries the token where a form body cannot.
	let response = send(
		&app,
		Request::builder()
			.method("DELETE")
			.uri(format!("/events/{event_id}"))
			.header(header::COOKIE, &cookie)
			.header("x-csrf-token", &csrf)
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert!(state.service.get_event(event_id).await.is_err());

	let response = send(
		&app,
		Request::builder()
			.method("DELETE")
			.uri(format!("/venues/{venue_id}"))
			.header(header::COOKIE, &cookie)
			.header("x-csrf-token", &csrf)
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert!(state.service.get_venue(venue_id).await.is_err());
}

#[tokio::test]
async fn signed_in_users_can_sign_in_again() {
	let (app, state) = app().await;
	let (cookie, csrf) = sign_in(&app, &state, "Rob", "Haines").await;

	// The form page embeds the live session's token for the re-submission.
	let response = send(
		&app,
		Request::builder()
			.uri("/sign-in")
			.header(header::COOKIE, &cookie)
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert!(text_body(response).await.contains(&csrf));

	let body = format!("username=Gundeep&password=Oberoi&_csrf={csrf}");
	let response = send(&app, form_request("/sign-in", &cookie, body)).await;

	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert!(response.headers().contains_key(header::SET_COOKIE));
}

#[tokio::test]
async fn web_venue_delete_conflict_renders_a_409_page() {
	let (app, state) = app().await;
	let venue_id = api_create_venue(&app, "Busy Hall").await;

	api_create_event(&app, "Party", venue_id).await;

	let (cookie, csrf) = sign_in(&app, &state, "Rob", "Haines").await;
	let response = send(
		&app,
		form_request(&format!("/venues/delete/{venue_id}"), &cookie, format!("_csrf={csrf}")),
	)
	.await;

	assert_eq!(response.status(), StatusCode::CONFLICT);
	assert!(text_body(response).await.contains(&format!("venue {venue_id}")));
	assert!(state.service.get_venue(venue_id).await.is_ok());
}

#[tokio::test]
async fn web_create_flow_validates_and_flashes() {
	let (app, state) = app().await;
	let venue_id = api_create_venue(&app, "Hall").await;
	let (cookie, csrf) = sign_in(&app, &state, "Rob", "Haines").await;

	// A bad submission re-renders the form with the reasons, 200.
	let body = format!("name=&date=&venue={venue_id}&_csrf={csrf}");
	let response = send(&app, form_request("/events", &cookie, body)).await;

	assert_eq!(response.status(), StatusCode::OK);

	let page = text_body(response).await;

	assert!(page.contains("The name is required."));
	assert!(page.contains("The date is required."));

	// A good one redirects, and the flash shows on the events page.
	let body = format!("name=Open%20Day&date={}&venue={venue_id}&_csrf={csrf}", future_date(7));
	let response = send(&app, form_request("/events", &cookie, body)).await;

	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(
		response.headers().get(header::LOCATION).and_then(|value| value.to_str().ok()),
		Some("/events")
	);

	let response = send(
		&app,
		Request::builder()
			.uri("/events")
			.header(header::COOKIE, &cookie)
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);

	let page = text_body(response).await;

	assert!(page.contains("Event successfully added."));
	assert!(page.contains("Open Day"));
}

#[tokio::test]
async fn attendees_can_share_but_not_manage() {
	let (app, state) = app().await;
	let venue_id = api_create_venue(&app, "Hall").await;
	let event_id = api_create_event(&app, "Party", venue_id).await;
	let (cookie, csrf) = sign_in(&app, &state, "Naddy", "Gundeep's Birthday").await;

	// The feed is disabled in tests, so the share silently declines but the
	// route itself is permitted.
	let response = send(
		&app,
		form_request(
			&format!("/events/{event_id}/share"),
			&cookie,
			format!("content=See%20you%20there&_csrf={csrf}"),
		),
	)
	.await;

	assert_eq!(response.status(), StatusCode::SEE_OTHER);

	let body = format!("name=Party%202&date={}&venue={venue_id}&_csrf={csrf}", future_date(7));
	let response = send(&app, form_request("/events", &cookie, body)).await;

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_web_ids_render_404_pages_with_the_id() {
	let (app, _state) = app().await;
	let response = send(
		&app,
		Request::builder()
			.uri("/events/999")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert!(text_body(response).await.contains("event 999"));

	let response = send(
		&app,
		Request::builder()
			.uri("/no-such-page")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	// Unknown routes fall through to the default rule, so anonymous visitors
	// are asked to sign in before they learn whether the page exists.
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn unknown_api_paths_answer_with_the_json_error_body() {
	let (app, _state) = app().await;
	let response = send(
		&app,
		Request::builder()
			.uri("/api/events/5/bogus")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(json_body(response).await["error"], "The resource could not be found.");
}

#[tokio::test]
async fn form_backing_api_resources_are_not_acceptable() {
	let (app, _state) = app().await;

	for uri in ["/api/events/new", "/api/events/update", "/api/venues/new", "/api/venues/update"] {
		// These segments are not numeric ids, so the public detail rule does
		// not cover them and credentials are required.
		let response = send(
			&app,
			Request::builder()
				.uri(uri)
				.header(header::AUTHORIZATION, organiser())
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await;

		assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE, "Expected 406 for {uri}.");
	}
}

#[tokio::test]
async fn venue_scoped_api_queries_are_public() {
	let (app, _state) = app().await;
	let venue_id = api_create_venue(&app, "Hall").await;

	api_create_event(&app, "Party", venue_id).await;

	for suffix in ["events", "next3events"] {
		let response = send(
			&app,
			Request::builder()
				.uri(format!("/api/venues/{venue_id}/{suffix}"))
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await;

		assert_eq!(response.status(), StatusCode::OK);

		let body = json_body(response).await;

		assert_eq!(body["events"][0]["name"], "Party");
	}
}

#[tokio::test]
async fn sign_out_destroys_the_session() {
	let (app, state) = app().await;
	let (cookie, csrf) = sign_in(&app, &state, "Rob", "Haines").await;
	let response = send(&app, form_request("/sign-out", &cookie, format!("_csrf={csrf}"))).await;

	assert_eq!(response.status(), StatusCode::SEE_OTHER);

	let token = cookie.split_once('=').map(|(_, token)| token).expect("Expected a token.");

	assert!(state.sessions.get(token).await.is_none());
}
