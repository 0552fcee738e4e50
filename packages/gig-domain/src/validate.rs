use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer, ser::SerializeMap};
use time::{Date, Time};

/// UK postcode grammar, matched against the whole trimmed value.
const POSTCODE_PATTERN: &str = r"^(([A-Z][A-HJ-Y]?\d[A-Z\d]?|ASCN|STHL|TDCU|BBND|[BFS]IQQ|PCRN|TKCA) ?\d[A-Z]{2}|BFPO ?\d{1,4}|(KY\d|MSR|VG|AI)[ -]?\d{4}|[A-Z]{2} ?\d{2}|GE ?CX|GIR ?0A{2}|SAN ?TA1)$";

/// Field names mapped to one reason each, kept in first-set order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldErrors {
	entries: Vec<(String, String)>,
}

impl FieldErrors {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the reason for `field`, replacing any earlier one.
	pub fn set(&mut self, field: &str, message: &str) {
		if let Some(entry) = self.entries.iter_mut().find(|(name, _)| name == field) {
			entry.1 = message.to_string();
		} else {
			self.entries.push((field.to_string(), message.to_string()));
		}
	}

	pub fn get(&self, field: &str) -> Option<&str> {
		self.entries.iter().find(|(name, _)| name == field).map(|(_, message)| message.as_str())
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(name, message)| (name.as_str(), message.as_str()))
	}
}

impl Serialize for FieldErrors {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.entries.len()))?;

		for (field, message) in &self.entries {
			map.serialize_entry(field, message)?;
		}

		map.end()
	}
}

/// Raw create/update fields before checking. `None` marks an absent field.
#[derive(Clone, Debug, Default)]
pub struct EventDraft {
	pub name: String,
	pub date: Option<Date>,
	pub time: Option<Time>,
	pub description: Option<String>,
	pub venue_id: Option<i64>,
}

/// An event that passed every field check.
#[derive(Clone, Debug)]
pub struct EventWrite {
	pub name: String,
	pub date: Date,
	pub time: Option<Time>,
	pub description: Option<String>,
	pub venue_id: i64,
}

#[derive(Clone, Debug, Default)]
pub struct VenueDraft {
	pub name: String,
	pub capacity: Option<i64>,
	pub postcode: String,
	pub road_name: String,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct VenueWrite {
	pub name: String,
	pub capacity: i64,
	pub postcode: String,
	pub road_name: String,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}

/// Checks every field and reports all failures at once. The date must be
/// strictly after `today`.
pub fn validate_event(draft: &EventDraft, today: Date) -> Result<EventWrite, FieldErrors> {
	let mut errors = FieldErrors::new();
	let name = draft.name.trim();

	if name.is_empty() {
		errors.set("name", "The name is required.");
	} else if name.chars().count() > 256 {
		errors.set("name", "The name must have 256 characters or less.");
	}

	let date = match draft.date {
		None => {
			errors.set("date", "The date is required.");

			None
		},
		Some(date) if date <= today => {
			errors.set("date", "The date must be in the future.");

			None
		},
		Some(date) => Some(date),
	};

	if let Some(description) = draft.description.as_deref()
		&& description.chars().count() > 500
	{
		errors.set("description", "The description must have 500 characters or less.");
	}

	if draft.venue_id.is_none() {
		errors.set("venue", "The venue is required.");
	}

	match (date, draft.venue_id) {
		(Some(date), Some(venue_id)) if errors.is_empty() => Ok(EventWrite {
			name: name.to_string(),
			date,
			time: draft.time,
			description: normalize_description(draft.description.as_deref()),
			venue_id,
		}),
		_ => Err(errors),
	}
}

pub fn validate_venue(draft: &VenueDraft) -> Result<VenueWrite, FieldErrors> {
	let mut errors = FieldErrors::new();
	let name = draft.name.trim();
	let postcode = draft.postcode.trim();
	let road_name = draft.road_name.trim();

	if name.is_empty() {
		errors.set("name", "The name is required.");
	} else if name.chars().count() > 256 {
		errors.set("name", "The name must have 256 characters or less.");
	}

	let capacity = match draft.capacity {
		Some(capacity) if capacity >= 1 => Some(capacity),
		_ => {
			errors.set("capacity", "Capacity must be a positive integer");

			None
		},
	};

	if postcode.is_empty() {
		errors.set("postcode", "The postcode is required.");
	} else if !postcode_valid(postcode) {
		errors.set("postcode", "Invalid post code");
	}

	if road_name.is_empty() {
		errors.set("road_name", "The road name is required.");
	} else if road_name.chars().count() > 300 {
		errors.set("road_name", "The road name must have 300 characters or less.");
	}

	match capacity {
		Some(capacity) if errors.is_empty() => Ok(VenueWrite {
			name: name.to_string(),
			capacity,
			postcode: postcode.to_string(),
			road_name: road_name.to_string(),
			latitude: draft.latitude,
			longitude: draft.longitude,
		}),
		_ => Err(errors),
	}
}

fn postcode_valid(raw: &str) -> bool {
	static POSTCODE: LazyLock<Regex> = LazyLock::new(|| {
		Regex::new(POSTCODE_PATTERN).expect("postcode pattern must compile")
	});

	POSTCODE.is_match(raw)
}

fn normalize_description(description: Option<&str>) -> Option<String> {
	description.map(str::trim).filter(|text| !text.is_empty()).map(str::to_string)
}
