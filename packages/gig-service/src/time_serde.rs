pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{Time, macros::format_description};

pub fn serialize<S>(value: &Time, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted =
		value.format(format_description!("[hour]:[minute]")).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Time, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse(&raw).map_err(serde::de::Error::custom)
}

/// Parses a wall-clock time. Seconds are accepted and truncated on output.
pub fn parse(raw: &str) -> Result<Time, time::error::Parse> {
	Time::parse(raw, format_description!("[hour]:[minute]"))
		.or_else(|_| Time::parse(raw, format_description!("[hour]:[minute]:[second]")))
}
