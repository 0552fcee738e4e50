use serde::{Deserialize, Serialize};

use gig_domain::validate::{self, VenueDraft, VenueWrite};
use gig_storage::{
	models::{NewVenue, Venue},
	queries,
};

use crate::{EntityKind, Error, EventRecord, GigService, Result, guard};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VenueRecord {
	pub id: i64,
	pub name: String,
	pub capacity: i64,
	pub postcode: String,
	pub road_name: String,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}
impl From<Venue> for VenueRecord {
	fn from(venue: Venue) -> Self {
		Self {
			id: venue.id,
			name: venue.name,
			capacity: venue.capacity,
			postcode: venue.postcode,
			road_name: venue.road_name,
			latitude: venue.latitude,
			longitude: venue.longitude,
		}
	}
}

/// A venue together with how many events it hosts.
#[derive(Clone, Debug, Serialize)]
pub struct VenueSummary {
	pub venue: VenueRecord,
	pub event_count: usize,
}

/// Fields accepted when creating or replacing a venue. Coordinates are
/// optional; absent ones are filled in by geocoding when the provider is
/// enabled.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VenueInput {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub capacity: Option<i64>,
	#[serde(default)]
	pub postcode: String,
	#[serde(default)]
	pub road_name: String,
	#[serde(default)]
	pub latitude: Option<f64>,
	#[serde(default)]
	pub longitude: Option<f64>,
}
impl VenueInput {
	fn draft(&self) -> VenueDraft {
		VenueDraft {
			name: self.name.clone(),
			capacity: self.capacity,
			postcode: self.postcode.clone(),
			road_name: self.road_name.clone(),
			latitude: self.latitude,
			longitude: self.longitude,
		}
	}
}

impl GigService {
	pub async fn list_venues(&self) -> Result<Vec<VenueRecord>> {
		let venues = queries::venues_ordered(&self.db).await?;

		Ok(venues.into_iter().map(VenueRecord::from).collect())
	}

	pub async fn get_venue(&self, id: i64) -> Result<VenueRecord> {
		let venue = queries::venue_by_id(&self.db, id)
			.await?
			.ok_or(Error::NotFound { kind: EntityKind::Venue, id })?;

		Ok(venue.into())
	}

	pub async fn venue_events(&self, id: i64) -> Result<Vec<EventRecord>> {
		let venue = self.get_venue(id).await?;
		let events = queries::events_for_venue(&self.db, id).await?;

		Ok(events.into_iter().map(|event| EventRecord::new(event, venue.clone())).collect())
	}

	/// The venue's next three events after today.
	pub async fn venue_next_events(&self, id: i64) -> Result<Vec<EventRecord>> {
		let venue = self.get_venue(id).await?;
		let events = queries::upcoming_events_for_venue(&self.db, id, crate::today(), 3).await?;

		Ok(events.into_iter().map(|event| EventRecord::new(event, venue.clone())).collect())
	}

	pub async fn create_venue(&self, input: VenueInput) -> Result<VenueRecord> {
		let write = validate::validate_venue(&input.draft()).map_err(Error::Validation)?;
		let venue = self.located_venue(write).await;
		let id = queries::insert_venue(&self.db, &venue).await?;

		Ok(record(id, venue))
	}

	pub async fn update_venue(&self, id: i64, input: VenueInput) -> Result<VenueRecord> {
		let write = validate::validate_venue(&input.draft()).map_err(Error::Validation)?;
		let venue = self.located_venue(write).await;
		let mut tx = self.db.pool.begin().await?;

		guard::ensure_venue_exists(&mut tx, id).await?;
		queries::update_venue_tx(&mut tx, id, &venue).await?;
		tx.commit().await?;

		Ok(record(id, venue))
	}

	pub async fn delete_venue(&self, id: i64) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		guard::ensure_venue_exists(&mut tx, id).await?;
		guard::ensure_venue_deletable(&mut tx, id).await?;
		queries::delete_venue_tx(&mut tx, id).await?;
		tx.commit().await?;

		Ok(())
	}

	/// Fills in missing coordinates from the geocoding provider. Explicit
	/// coordinates, a disabled provider, and lookup failures all leave the
	/// drafted values untouched.
	async fn located_venue(&self, write: VenueWrite) -> NewVenue {
		let mut venue = NewVenue {
			name: write.name,
			capacity: write.capacity,
			postcode: write.postcode,
			road_name: write.road_name,
			latitude: write.latitude,
			longitude: write.longitude,
		};

		if venue.latitude.is_some() || venue.longitude.is_some() {
			return venue;
		}
		if !self.cfg.providers.geocoding.enabled {
			return venue;
		}

		let query = format!("{} {}", venue.road_name, venue.postcode);

		match self.providers.geocoder.forward(&self.cfg.providers.geocoding, &query).await {
			Ok(Some(coordinates)) => {
				venue.latitude = Some(coordinates.latitude);
				venue.longitude = Some(coordinates.longitude);
			},
			Ok(None) => {
				tracing::warn!(
					query = query.as_str(),
					"Geocoding found no match for the venue address."
				);
			},
			Err(err) => {
				tracing::warn!(error = %err, "Failed to geocode the venue address.");
			},
		}

		venue
	}
}

fn record(id: i64, venue: NewVenue) -> VenueRecord {
	VenueRecord {
		id,
		name: venue.name,
		capacity: venue.capacity,
		postcode: venue.postcode,
		road_name: venue.road_name,
		latitude: venue.latitude,
		longitude: venue.longitude,
	}
}
