use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
	pub latitude: f64,
	pub longitude: f64,
}

/// Forward-geocode a free-text query against the Mapbox places endpoint.
/// Returns `None` when the provider has no match for the query.
pub async fn forward(
	cfg: &gig_config::GeocodingConfig,
	query: &str,
) -> Result<Option<Coordinates>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let mut url = Url::parse(&cfg.api_base).map_err(|err| Error::InvalidConfig {
		message: format!("Invalid geocoding api_base: {err}."),
	})?;

	{
		let mut segments = url.path_segments_mut().map_err(|_| Error::InvalidConfig {
			message: "Geocoding api_base cannot be a base URL.".to_string(),
		})?;
		let document = format!("{query}.json");

		segments.pop_if_empty().extend(["geocoding", "v5", "mapbox.places", document.as_str()]);
	}

	let res = client
		.get(url)
		.query(&[("access_token", cfg.api_key.as_str()), ("limit", "1")])
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(parse_coordinates(&json))
}

fn parse_coordinates(json: &Value) -> Option<Coordinates> {
	let center = json.get("features")?.as_array()?.first()?.get("center")?.as_array()?;
	let longitude = center.first()?.as_f64()?;
	let latitude = center.get(1)?.as_f64()?;

	Some(Coordinates { latitude, longitude })
}
