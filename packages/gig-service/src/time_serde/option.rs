use serde::{Deserialize as _, Deserializer, Serializer};
use time::Time;

pub fn serialize<S>(value: &Option<Time>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	match value {
		Some(value) => crate::time_serde::serialize(value, serializer),
		None => serializer.serialize_none(),
	}
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Time>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<String>::deserialize(deserializer)?;

	match raw {
		Some(value) =>
			crate::time_serde::parse(&value).map(Some).map_err(serde::de::Error::custom),
		None => Ok(None),
	}
}
