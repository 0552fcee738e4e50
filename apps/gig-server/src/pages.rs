//! Server-rendered pages for the interactive surface. Markup is deliberately
//! plain; every dynamic value goes through [`escape`].

use std::fmt::Write as _;

use axum::response::Html;
use time::{Date, Time, macros::format_description};

use gig_domain::validate::FieldErrors;
use gig_service::{EventRecord, EventsOverview, HomeOverview, VenueRecord};

use crate::{
	session::SessionContext,
	web::{EventForm, VenueForm},
};

pub(crate) fn home(
	user: Option<&SessionContext>,
	flash: Option<&str>,
	overview: &HomeOverview,
) -> Html<String> {
	let mut body = String::from("<h2>Upcoming events</h2>");

	if overview.upcoming.is_empty() {
		body.push_str("<p>There are no upcoming events.</p>");
	} else {
		body.push_str("<ul>");

		for event in &overview.upcoming {
			let _ = write!(body, "<li>{}</li>", event_line(event));
		}

		body.push_str("</ul>");
	}

	body.push_str("<h2>Busiest venues</h2><ul>");

	for summary in &overview.busiest_venues {
		let _ = write!(
			body,
			"<li><a href=\"/venues/{}\">{}</a> ({} events)</li>",
			summary.venue.id,
			escape(&summary.venue.name),
			summary.event_count
		);
	}

	body.push_str("</ul>");

	layout(user, flash, "Gig", &body)
}

pub(crate) fn sign_in(
	user: Option<&SessionContext>,
	error: Option<&str>,
	username: &str,
) -> Html<String> {
	let error = error
		.map(|message| format!("<p class=\"error\">{}</p>", escape(message)))
		.unwrap_or_default();
	// Signing in again with a session attached is still a state-changing
	// session-scheme POST, so the form carries the current session's token.
	let csrf = user.map(csrf_field).unwrap_or_default();
	let body = format!(
		"{error}<form method=\"post\" action=\"/sign-in\">{csrf}\
		<label>Username <input name=\"username\" value=\"{}\"></label>\
		<label>Password <input name=\"password\" type=\"password\"></label>\
		<button type=\"submit\">Sign in</button></form>",
		escape(username)
	);

	layout(user, None, "Sign in", &body)
}

pub(crate) fn events(
	user: Option<&SessionContext>,
	flash: Option<&str>,
	overview: &EventsOverview,
) -> Html<String> {
	let mut body = String::new();

	if user.is_some() {
		body.push_str("<p><a href=\"/events/new\">Add event</a></p>");
	}

	body.push_str("<h2>Upcoming events</h2>");
	push_event_list(&mut body, &overview.upcoming);
	body.push_str("<h2>Past events</h2>");
	push_event_list(&mut body, &overview.past);

	if !overview.latest_posts.is_empty() {
		body.push_str("<h2>Latest posts</h2><ul>");

		for post in &overview.latest_posts {
			let _ = write!(
				body,
				"<li>{} {} <a href=\"{}\">{}</a></li>",
				post.date.map(format_date).unwrap_or_default(),
				post.time.map(format_time).unwrap_or_default(),
				escape(&post.uri),
				escape(&post.content)
			);
		}

		body.push_str("</ul>");
	}

	layout(user, flash, "Events", &body)
}

pub(crate) fn event_detail(
	user: Option<&SessionContext>,
	flash: Option<&str>,
	event: &EventRecord,
) -> Html<String> {
	let mut body = format!(
		"<p>{} {}</p><p>At <a href=\"/venues/{}\">{}</a></p>",
		format_date(event.date),
		event.time.map(format_time).unwrap_or_default(),
		event.venue.id,
		escape(&event.venue.name)
	);

	if let Some(description) = &event.description {
		let _ = write!(body, "<p>{}</p>", escape(description));
	}
	if let Some(ctx) = user {
		let _ = write!(
			body,
			"<form method=\"post\" action=\"/events/{}/share\">{}\
			<label>Share <input name=\"content\"></label>\
			<button type=\"submit\">Post</button></form>\
			<p><a href=\"/events/update/{}\">Edit</a></p>\
			<form method=\"post\" action=\"/events/delete/{}\">{}\
			<button type=\"submit\">Delete</button></form>",
			event.id,
			csrf_field(ctx),
			event.id,
			event.id,
			csrf_field(ctx)
		);
	}

	layout(user, flash, &event.name, &body)
}

pub(crate) fn event_form(
	user: Option<&SessionContext>,
	title: &str,
	action: &str,
	form: &EventForm,
	venues: &[VenueRecord],
	errors: &FieldErrors,
) -> Html<String> {
	let mut options = String::new();

	for venue in venues {
		let selected =
			if form.venue == venue.id.to_string() { " selected" } else { "" };
		let _ = write!(
			options,
			"<option value=\"{}\"{selected}>{}</option>",
			venue.id,
			escape(&venue.name)
		);
	}

	let csrf = user.map(csrf_field).unwrap_or_default();
	let body = format!(
		"<form method=\"post\" action=\"{}\">{csrf}\
		<label>Name <input name=\"name\" value=\"{}\"></label>{}\
		<label>Date <input name=\"date\" value=\"{}\" placeholder=\"YYYY-MM-DD\"></label>{}\
		<label>Time <input name=\"time\" value=\"{}\" placeholder=\"HH:MM\"></label>{}\
		<label>Description <textarea name=\"description\">{}</textarea></label>{}\
		<label>Venue <select name=\"venue\"><option value=\"\"></option>{options}</select></label>{}\
		<button type=\"submit\">Save</button></form>",
		escape(action),
		escape(&form.name),
		error_line(errors, "name"),
		escape(&form.date),
		error_line(errors, "date"),
		escape(&form.time),
		error_line(errors, "time"),
		escape(&form.description),
		error_line(errors, "description"),
		error_line(errors, "venue"),
	);

	layout(user, None, title, &body)
}

pub(crate) fn venues(
	user: Option<&SessionContext>,
	flash: Option<&str>,
	venues: &[VenueRecord],
) -> Html<String> {
	let mut body = String::new();

	if user.is_some() {
		body.push_str("<p><a href=\"/venues/new\">Add venue</a></p>");
	}

	body.push_str("<ul>");

	for venue in venues {
		let _ = write!(
			body,
			"<li><a href=\"/venues/{}\">{}</a>, {} (capacity {})</li>",
			venue.id,
			escape(&venue.name),
			escape(&venue.postcode),
			venue.capacity
		);
	}

	body.push_str("</ul>");

	layout(user, flash, "Venues", &body)
}

pub(crate) fn venue_detail(
	user: Option<&SessionContext>,
	flash: Option<&str>,
	venue: &VenueRecord,
	events: &[EventRecord],
) -> Html<String> {
	let mut body = format!(
		"<p>{}, {}</p><p>Capacity {}</p>",
		escape(&venue.road_name),
		escape(&venue.postcode),
		venue.capacity
	);

	if let (Some(latitude), Some(longitude)) = (venue.latitude, venue.longitude) {
		let _ = write!(body, "<p>Located at {latitude}, {longitude}</p>");
	}

	body.push_str("<h2>Events at this venue</h2>");
	push_event_list(&mut body, events);

	if let Some(ctx) = user {
		let _ = write!(
			body,
			"<p><a href=\"/venues/update/{}\">Edit</a></p>\
			<form method=\"post\" action=\"/venues/delete/{}\">{}\
			<button type=\"submit\">Delete</button></form>",
			venue.id,
			venue.id,
			csrf_field(ctx)
		);
	}

	layout(user, flash, &venue.name, &body)
}

pub(crate) fn venue_form(
	user: Option<&SessionContext>,
	title: &str,
	action: &str,
	form: &VenueForm,
	errors: &FieldErrors,
) -> Html<String> {
	let csrf = user.map(csrf_field).unwrap_or_default();
	let body = format!(
		"<form method=\"post\" action=\"{}\">{csrf}\
		<label>Name <input name=\"name\" value=\"{}\"></label>{}\
		<label>Capacity <input name=\"capacity\" value=\"{}\"></label>{}\
		<label>Postcode <input name=\"postcode\" value=\"{}\"></label>{}\
		<label>Road name <input name=\"road_name\" value=\"{}\"></label>{}\
		<label>Latitude <input name=\"latitude\" value=\"{}\"></label>{}\
		<label>Longitude <input name=\"longitude\" value=\"{}\"></label>{}\
		<button type=\"submit\">Save</button></form>",
		escape(action),
		escape(&form.name),
		error_line(errors, "name"),
		escape(&form.capacity),
		error_line(errors, "capacity"),
		escape(&form.postcode),
		error_line(errors, "postcode"),
		escape(&form.road_name),
		error_line(errors, "road_name"),
		escape(&form.latitude),
		error_line(errors, "latitude"),
		escape(&form.longitude),
		error_line(errors, "longitude"),
	);

	layout(user, None, title, &body)
}

pub(crate) fn not_found(user: Option<&SessionContext>, message: &str) -> Html<String> {
	layout(user, None, "Not found", &format!("<p>{}</p>", escape(message)))
}

pub(crate) fn conflict(user: Option<&SessionContext>, message: &str) -> Html<String> {
	layout(user, None, "Conflict", &format!("<p>{}</p>", escape(message)))
}

pub(crate) fn forbidden(user: Option<&SessionContext>) -> Html<String> {
	layout(user, None, "Forbidden", "<p>You do not have permission to do that.</p>")
}

pub(crate) fn server_error(user: Option<&SessionContext>) -> Html<String> {
	layout(user, None, "Something went wrong", "<p>Please try again later.</p>")
}

fn layout(
	user: Option<&SessionContext>,
	flash: Option<&str>,
	title: &str,
	body: &str,
) -> Html<String> {
	let account = match user {
		Some(ctx) => format!(
			"<span>{}</span> <form method=\"post\" action=\"/sign-out\">{}\
			<button type=\"submit\">Sign out</button></form>",
			escape(&ctx.username),
			csrf_field(ctx)
		),
		None => "<a href=\"/sign-in\">Sign in</a>".to_string(),
	};
	let flash = flash
		.map(|message| format!("<p class=\"flash\">{}</p>", escape(message)))
		.unwrap_or_default();
	let title = escape(title);

	Html(format!(
		"<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head><body>\
		<nav><a href=\"/\">Home</a> <a href=\"/events\">Events</a> <a href=\"/venues\">Venues</a> \
		{account}</nav>{flash}<main><h1>{title}</h1>{body}</main></body></html>"
	))
}

fn push_event_list(body: &mut String, events: &[EventRecord]) {
	if events.is_empty() {
		body.push_str("<p>No events.</p>");

		return;
	}

	body.push_str("<ul>");

	for event in events {
		let _ = write!(body, "<li>{}</li>", event_line(event));
	}

	body.push_str("</ul>");
}

fn event_line(event: &EventRecord) -> String {
	format!(
		"{} {} <a href=\"/events/{}\">{}</a> at {}",
		format_date(event.date),
		event.time.map(format_time).unwrap_or_default(),
		event.id,
		escape(&event.name),
		escape(&event.venue.name)
	)
}

fn csrf_field(ctx: &SessionContext) -> String {
	format!("<input type=\"hidden\" name=\"_csrf\" value=\"{}\">", escape(&ctx.csrf_token))
}

fn error_line(errors: &FieldErrors, field: &str) -> String {
	errors
		.get(field)
		.map(|message| format!("<p class=\"error\">{}</p>", escape(message)))
		.unwrap_or_default()
}

fn format_date(date: Date) -> String {
	date.format(format_description!("[year]-[month]-[day]")).unwrap_or_default()
}

fn format_time(time: Time) -> String {
	time.format(format_description!("[hour]:[minute]")).unwrap_or_default()
}

fn escape(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());

	for ch in raw.chars() {
		match ch {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			_ => escaped.push(ch),
		}
	}

	escaped
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escape_neutralizes_markup() {
		assert_eq!(escape("<script>\"x\" & 'y'</script>"), "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;");
		assert_eq!(escape("plain"), "plain");
	}
}
