use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, Transaction};
use time::{Date, Time};

use gig_domain::validate::{self, EventDraft, EventWrite, FieldErrors};
use gig_providers::feed::FeedPost;
use gig_storage::{
	models::{Event, NewEvent},
	queries,
};

use crate::{EntityKind, Error, GigService, Result, VenueRecord, VenueSummary, guard, rankings};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventRecord {
	pub id: i64,
	#[serde(with = "crate::date_serde")]
	pub date: Date,
	#[serde(default, with = "crate::time_serde::option")]
	pub time: Option<Time>,
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	pub venue: VenueRecord,
}
impl EventRecord {
	pub(crate) fn new(event: Event, venue: VenueRecord) -> Self {
		Self {
			id: event.id,
			date: event.date,
			time: event.time,
			name: event.name,
			description: event.description,
			venue,
		}
	}
}

/// Fields accepted when creating or replacing an event. The venue arrives as
/// its id, matching the form's select field.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventInput {
	#[serde(default)]
	pub name: String,
	#[serde(default, with = "crate::date_serde::option")]
	pub date: Option<Date>,
	#[serde(default, with = "crate::time_serde::option")]
	pub time: Option<Time>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default, rename = "venue")]
	pub venue_id: Option<i64>,
}
impl EventInput {
	fn draft(&self) -> EventDraft {
		EventDraft {
			name: self.name.clone(),
			date: self.date,
			time: self.time,
			description: self.description.clone(),
			venue_id: self.venue_id,
		}
	}
}

/// Everything the events page shows: every event plus the past and upcoming
/// partitions and the latest social posts.
#[derive(Clone, Debug)]
pub struct EventsOverview {
	pub events: Vec<EventRecord>,
	pub past: Vec<EventRecord>,
	pub upcoming: Vec<EventRecord>,
	pub latest_posts: Vec<FeedPost>,
}

/// The home page payload: the next three events anywhere and the three venues
/// hosting the most events.
#[derive(Clone, Debug)]
pub struct HomeOverview {
	pub upcoming: Vec<EventRecord>,
	pub busiest_venues: Vec<VenueSummary>,
}

impl GigService {
	pub async fn list_events(&self) -> Result<Vec<EventRecord>> {
		let venue_map = self.venue_map().await?;
		let events = queries::events_ordered(&self.db).await?;

		Ok(join_venues(events, &venue_map))
	}

	/// The events page payload. The partitions leave out events on the
	/// boundary day itself; both sides order by date and then name.
	pub async fn events_overview(&self) -> Result<EventsOverview> {
		let venue_map = self.venue_map().await?;
		let events = queries::events_ordered(&self.db).await?;
		let today = crate::today();
		let past = rankings::strictly_before(&events, today);
		let upcoming = rankings::strictly_after(&events, today);
		let latest_posts = self.latest_posts().await;

		Ok(EventsOverview {
			events: join_venues(events, &venue_map),
			past: join_venues(past, &venue_map),
			upcoming: join_venues(upcoming, &venue_map),
			latest_posts,
		})
	}

	pub async fn home_overview(&self) -> Result<HomeOverview> {
		let venues = queries::venues_ordered(&self.db).await?;
		let events = queries::events_ordered(&self.db).await?;
		let venue_map = venues
			.iter()
			.map(|venue| (venue.id, VenueRecord::from(venue.clone())))
			.collect::<HashMap<_, _>>();
		let today = crate::today();
		let upcoming = join_venues(rankings::top_upcoming(&events, today, 3), &venue_map);
		let busiest_venues = rankings::busiest_venues(&venues, &events, 3)
			.into_iter()
			.map(|(venue, event_count)| VenueSummary { venue: venue.into(), event_count })
			.collect();

		Ok(HomeOverview { upcoming, busiest_venues })
	}

	pub async fn get_event(&self, id: i64) -> Result<EventRecord> {
		let event = queries::event_by_id(&self.db, id)
			.await?
			.ok_or(Error::NotFound { kind: EntityKind::Event, id })?;
		let venue = self.get_venue(event.venue_id).await?;

		Ok(EventRecord::new(event, venue))
	}

	pub async fn create_event(&self, input: EventInput) -> Result<EventRecord> {
		let write =
			validate::validate_event(&input.draft(), crate::today()).map_err(Error::Validation)?;
		let event = new_event(write);
		let mut tx = self.db.pool.begin().await?;
		let venue = event_venue(&mut tx, event.venue_id).await?;
		let id = queries::insert_event_tx(&mut tx, &event).await?;

		tx.commit().await?;

		Ok(record(id, event, venue))
	}

	pub async fn update_event(&self, id: i64, input: EventInput) -> Result<EventRecord> {
		let write =
			validate::validate_event(&input.draft(), crate::today()).map_err(Error::Validation)?;
		let event = new_event(write);
		let mut tx = self.db.pool.begin().await?;

		guard::ensure_event_exists(&mut tx, id).await?;

		let venue = event_venue(&mut tx, event.venue_id).await?;

		queries::update_event_tx(&mut tx, id, &event).await?;
		tx.commit().await?;

		Ok(record(id, event, venue))
	}

	pub async fn delete_event(&self, id: i64) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		guard::ensure_event_exists(&mut tx, id).await?;
		queries::delete_event_tx(&mut tx, id).await?;
		tx.commit().await?;

		Ok(())
	}

	pub(crate) async fn venue_map(&self) -> Result<HashMap<i64, VenueRecord>> {
		let venues = queries::venues_ordered(&self.db).await?;

		Ok(venues.into_iter().map(|venue| (venue.id, VenueRecord::from(venue))).collect())
	}
}

fn new_event(write: EventWrite) -> NewEvent {
	NewEvent {
		name: write.name,
		date: write.date,
		time: write.time,
		description: write.description,
		venue_id: write.venue_id,
	}
}

fn record(id: i64, event: NewEvent, venue: VenueRecord) -> EventRecord {
	EventRecord {
		id,
		date: event.date,
		time: event.time,
		name: event.name,
		description: event.description,
		venue,
	}
}

/// Resolves the event's venue inside the write transaction. A missing venue
/// reports as a field error so forms can re-render it next to the selector.
async fn event_venue(tx: &mut Transaction<'_, Sqlite>, venue_id: i64) -> Result<VenueRecord> {
	let Some(venue) = queries::venue_by_id_tx(tx, venue_id).await? else {
		let mut errors = FieldErrors::new();

		errors.set("venue", "The venue does not exist.");

		return Err(Error::Validation(errors));
	};

	Ok(venue.into())
}

fn join_venues(events: Vec<Event>, venues: &HashMap<i64, VenueRecord>) -> Vec<EventRecord> {
	let mut records = Vec::with_capacity(events.len());

	for event in events {
		let Some(venue) = venues.get(&event.venue_id) else {
			tracing::warn!(event_id = event.id, "Event references a missing venue.");

			continue;
		};

		records.push(EventRecord::new(event, venue.clone()));
	}

	records
}
