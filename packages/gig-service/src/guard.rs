use sqlx::{Sqlite, Transaction};

use gig_storage::queries;

use crate::{EntityKind, Error, Result};

pub(crate) async fn ensure_event_exists(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<()> {
	if queries::event_by_id_tx(tx, id).await?.is_none() {
		return Err(Error::NotFound { kind: EntityKind::Event, id });
	}

	Ok(())
}

pub(crate) async fn ensure_venue_exists(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<()> {
	if queries::venue_by_id_tx(tx, id).await?.is_none() {
		return Err(Error::NotFound { kind: EntityKind::Venue, id });
	}

	Ok(())
}

pub(crate) async fn ensure_venue_deletable(
	tx: &mut Transaction<'_, Sqlite>,
	id: i64,
) -> Result<()> {
	if queries::count_events_for_venue_tx(tx, id).await? > 0 {
		return Err(Error::VenueHasEvents { id });
	}

	Ok(())
}
