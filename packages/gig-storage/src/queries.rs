use sqlx::{Executor, Sqlite, Transaction};
use time::Date;

use crate::{
	Error, Result,
	db::Db,
	models::{Event, NewEvent, NewVenue, Venue},
};

pub async fn insert_venue(db: &Db, venue: &NewVenue) -> Result<i64> {
	let result = sqlx::query(
		"\
INSERT INTO venues (name, capacity, postcode, road_name, latitude, longitude)
VALUES (?, ?, ?, ?, ?, ?)",
	)
	.bind(venue.name.as_str())
	.bind(venue.capacity)
	.bind(venue.postcode.as_str())
	.bind(venue.road_name.as_str())
	.bind(venue.latitude)
	.bind(venue.longitude)
	.execute(&db.pool)
	.await?;

	Ok(result.last_insert_rowid())
}

pub async fn update_venue_tx(
	tx: &mut Transaction<'_, Sqlite>,
	id: i64,
	venue: &NewVenue,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE venues
SET
	name = ?,
	capacity = ?,
	postcode = ?,
	road_name = ?,
	latitude = ?,
	longitude = ?
WHERE id = ?",
	)
	.bind(venue.name.as_str())
	.bind(venue.capacity)
	.bind(venue.postcode.as_str())
	.bind(venue.road_name.as_str())
	.bind(venue.latitude)
	.bind(venue.longitude)
	.bind(id)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

pub async fn delete_venue_tx(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<()> {
	sqlx::query("DELETE FROM venues WHERE id = ?").bind(id).execute(&mut **tx).await?;

	Ok(())
}

pub async fn venue_by_id(db: &Db, id: i64) -> Result<Option<Venue>> {
	let venue = venue_by_id_exec(&db.pool, id).await?;

	Ok(venue)
}

pub async fn venue_by_id_tx(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<Option<Venue>> {
	let venue = venue_by_id_exec(&mut **tx, id).await?;

	Ok(venue)
}

pub async fn venues_ordered(db: &Db) -> Result<Vec<Venue>> {
	let venues: Vec<Venue> = sqlx::query_as(
		"\
SELECT id, name, capacity, postcode, road_name, latitude, longitude
FROM venues
ORDER BY id",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(venues)
}

pub async fn count_venues(db: &Db) -> Result<i64> {
	let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM venues").fetch_one(&db.pool).await?;

	Ok(count)
}

pub async fn insert_event_tx(tx: &mut Transaction<'_, Sqlite>, event: &NewEvent) -> Result<i64> {
	let result = sqlx::query(
		"\
INSERT INTO events (name, date, time, description, venue_id)
VALUES (?, ?, ?, ?, ?)",
	)
	.bind(event.name.as_str())
	.bind(event.date)
	.bind(event.time)
	.bind(event.description.as_deref())
	.bind(event.venue_id)
	.execute(&mut **tx)
	.await?;

	Ok(result.last_insert_rowid())
}

pub async fn update_event_tx(
	tx: &mut Transaction<'_, Sqlite>,
	id: i64,
	event: &NewEvent,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE events
SET
	name = ?,
	date = ?,
	time = ?,
	description = ?,
	venue_id = ?
WHERE id = ?",
	)
	.bind(event.name.as_str())
	.bind(event.date)
	.bind(event.time)
	.bind(event.description.as_deref())
	.bind(event.venue_id)
	.bind(id)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

pub async fn delete_event_tx(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<()> {
	sqlx::query("DELETE FROM events WHERE id = ?").bind(id).execute(&mut **tx).await?;

	Ok(())
}

pub async fn event_by_id(db: &Db, id: i64) -> Result<Option<Event>> {
	let event = event_by_id_exec(&db.pool, id).await?;

	Ok(event)
}

pub async fn event_by_id_tx(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<Option<Event>> {
	let event = event_by_id_exec(&mut **tx, id).await?;

	Ok(event)
}

/// Every event, earliest first. Events on the same day order by time, with
/// unscheduled times ahead of scheduled ones.
pub async fn events_ordered(db: &Db) -> Result<Vec<Event>> {
	let events: Vec<Event> = sqlx::query_as(
		"\
SELECT id, name, date, time, description, venue_id
FROM events
ORDER BY date, time",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(events)
}

pub async fn events_for_venue(db: &Db, venue_id: i64) -> Result<Vec<Event>> {
	let events: Vec<Event> = sqlx::query_as(
		"\
SELECT id, name, date, time, description, venue_id
FROM events
WHERE venue_id = ?
ORDER BY date, name",
	)
	.bind(venue_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(events)
}

/// Events at a venue strictly after `after`, earliest first. Dates are stored as
/// ISO-8601 text, so the comparison is chronological.
pub async fn upcoming_events_for_venue(
	db: &Db,
	venue_id: i64,
	after: Date,
	limit: i64,
) -> Result<Vec<Event>> {
	if limit < 1 {
		return Err(Error::InvalidArgument(format!(
			"upcoming event limit must be positive; limit={limit}"
		)));
	}

	let events: Vec<Event> = sqlx::query_as(
		"\
SELECT id, name, date, time, description, venue_id
FROM events
WHERE venue_id = ? AND date > ?
ORDER BY date, name
LIMIT ?",
	)
	.bind(venue_id)
	.bind(after)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(events)
}

pub async fn count_events(db: &Db) -> Result<i64> {
	let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events").fetch_one(&db.pool).await?;

	Ok(count)
}

pub async fn count_events_for_venue_tx(
	tx: &mut Transaction<'_, Sqlite>,
	venue_id: i64,
) -> Result<i64> {
	let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE venue_id = ?")
		.bind(venue_id)
		.fetch_one(&mut **tx)
		.await?;

	Ok(count)
}

async fn venue_by_id_exec<'e, E>(executor: E, id: i64) -> Result<Option<Venue>>
where
	E: Executor<'e, Database = Sqlite>,
{
	let venue: Option<Venue> = sqlx::query_as(
		"\
SELECT id, name, capacity, postcode, road_name, latitude, longitude
FROM venues
WHERE id = ?",
	)
	.bind(id)
	.fetch_optional(executor)
	.await?;

	Ok(venue)
}

async fn event_by_id_exec<'e, E>(executor: E, id: i64) -> Result<Option<Event>>
where
	E: Executor<'e, Database = Sqlite>,
{
	let event: Option<Event> = sqlx::query_as(
		"\
SELECT id, name, date, time, description, venue_id
FROM events
WHERE id = ?",
	)
	.bind(id)
	.fetch_optional(executor)
	.await?;

	Ok(event)
}
