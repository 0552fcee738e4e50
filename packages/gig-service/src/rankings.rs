use time::Date;

use gig_storage::models::{Event, Venue};

/// The next events strictly after `today`, earliest first. Ties on a date
/// break by name so the selection is stable across runs.
pub fn top_upcoming(events: &[Event], today: Date, limit: usize) -> Vec<Event> {
	let mut upcoming = strictly_after(events, today);

	upcoming.truncate(limit);

	upcoming
}

/// Venues ranked by how many events they host, busiest first. The sort is
/// stable, so venues with equal counts keep their input order.
pub fn busiest_venues(venues: &[Venue], events: &[Event], limit: usize) -> Vec<(Venue, usize)> {
	let mut ranked = venues
		.iter()
		.map(|venue| {
			let count = events.iter().filter(|event| event.venue_id == venue.id).count();

			(venue.clone(), count)
		})
		.collect::<Vec<_>>();

	ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
	ranked.truncate(limit);

	ranked
}

pub fn strictly_before(events: &[Event], today: Date) -> Vec<Event> {
	let mut past = events.iter().filter(|event| event.date < today).cloned().collect::<Vec<_>>();

	past.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));

	past
}

pub fn strictly_after(events: &[Event], today: Date) -> Vec<Event> {
	let mut future = events.iter().filter(|event| event.date > today).cloned().collect::<Vec<_>>();

	future.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));

	future
}
