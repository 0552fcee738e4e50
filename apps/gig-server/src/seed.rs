//! Demo data for an empty database, switched on by `seed.demo_data`. Dates are
//! relative to today so both partitions of the events page have content.

use time::{Duration, OffsetDateTime, Time, macros::time};

use gig_service::{EventInput, GigService, VenueInput};
use gig_storage::{models::NewEvent, queries};

pub(crate) async fn load_demo_data(service: &GigService) -> color_eyre::Result<()> {
	let venues = queries::count_venues(&service.db).await?;
	let events = queries::count_events(&service.db).await?;

	if venues > 0 || events > 0 {
		tracing::info!(venues, events, "Database already populated; skipping demo data.");

		return Ok(());
	}

	let today = OffsetDateTime::now_utc().date();
	let engineering = service
		.create_venue(venue("Engineering Building A", 10_000, "M13 9SS", "Booth St E"))
		.await?;
	let kilburn =
		service.create_venue(venue("Kilburn Mega Lab", 100, "M13 9PY", "Oxford Road")).await?;
	let simon =
		service.create_venue(venue("Simon Building", 1_000_000_000, "M13 9PS", "Brunswick St")).await?;

	// Write validation refuses past dates, so the past demo event goes through
	// storage directly.
	let mut tx = service.db.pool.begin().await?;

	queries::insert_event_tx(
		&mut tx,
		&NewEvent {
			name: "Birthday".to_string(),
			date: today - Duration::days(7),
			time: Some(time!(00:00)),
			description: None,
			venue_id: engineering.id,
		},
	)
	.await?;
	tx.commit().await?;

	service
		.create_event(event("Party 2", today + Duration::days(7), time!(19:00), kilburn.id))
		.await?;
	service
		.create_event(event("Party 1", today + Duration::days(14), time!(22:00), simon.id))
		.await?;

	tracing::info!("Seeded demo venues and events.");

	Ok(())
}

fn venue(name: &str, capacity: i64, postcode: &str, road_name: &str) -> VenueInput {
	VenueInput {
		name: name.to_string(),
		capacity: Some(capacity),
		postcode: postcode.to_string(),
		road_name: road_name.to_string(),
		latitude: None,
		longitude: None,
	}
}

fn event(name: &str, date: time::Date, time: Time, venue_id: i64) -> EventInput {
	EventInput {
		name: name.to_string(),
		date: Some(date),
		time: Some(time),
		description: None,
		venue_id: Some(venue_id),
	}
}
