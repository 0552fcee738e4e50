use std::{sync::LazyLock, time::Duration};

use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use time::{Date, OffsetDateTime, Time, format_description::well_known::Rfc3339};

use crate::Result;

/// One post from the social feed, with its markup stripped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeedPost {
	pub uri: String,
	pub content: String,
	pub date: Option<Date>,
	pub time: Option<Time>,
}

/// Publish a status to the feed. The post is unlisted so shared events do not
/// land on the public timeline.
pub async fn publish(cfg: &gig_config::FeedConfig, content: &str) -> Result<()> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/api/v1/statuses", cfg.api_base);
	let body = serde_json::json!({
		"status": content,
		"visibility": "unlisted",
	});

	client.post(url).bearer_auth(&cfg.api_key).json(&body).send().await?.error_for_status()?;

	Ok(())
}

/// The newest posts on the account's home timeline, newest first.
pub async fn latest(cfg: &gig_config::FeedConfig, limit: usize) -> Result<Vec<FeedPost>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/api/v1/timelines/home", cfg.api_base);
	let res = client
		.get(url)
		.query(&[("limit", limit.to_string())])
		.bearer_auth(&cfg.api_key)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(parse_posts(&json))
}

fn parse_posts(json: &Value) -> Vec<FeedPost> {
	let Some(items) = json.as_array() else {
		return Vec::new();
	};

	items.iter().filter_map(parse_post).collect()
}

fn parse_post(item: &Value) -> Option<FeedPost> {
	let uri = item.get("uri").and_then(Value::as_str).unwrap_or_default().to_string();
	let content = strip_tags(item.get("content")?.as_str()?);
	let posted = item
		.get("created_at")
		.and_then(Value::as_str)
		.and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok());

	Some(FeedPost {
		uri,
		content,
		date: posted.map(OffsetDateTime::date),
		time: posted.map(OffsetDateTime::time),
	})
}

fn strip_tags(content: &str) -> String {
	static TAG: LazyLock<Regex> =
		LazyLock::new(|| Regex::new("<[^>]*>").expect("tag pattern must compile"));

	TAG.replace_all(content, "").into_owned()
}
