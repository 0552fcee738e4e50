use time::{Date, Time};

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Venue {
	pub id: i64,
	pub name: String,
	pub capacity: i64,
	pub postcode: String,
	pub road_name: String,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Event {
	pub id: i64,
	pub name: String,
	pub date: Date,
	pub time: Option<Time>,
	pub description: Option<String>,
	pub venue_id: i64,
}

/// Column values for a venue insert or update. The id comes from the database.
#[derive(Debug)]
pub struct NewVenue {
	pub name: String,
	pub capacity: i64,
	pub postcode: String,
	pub road_name: String,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}

#[derive(Debug)]
pub struct NewEvent {
	pub name: String,
	pub date: Date,
	pub time: Option<Time>,
	pub description: Option<String>,
	pub venue_id: i64,
}
