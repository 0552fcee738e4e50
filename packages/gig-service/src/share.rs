use gig_providers::feed::FeedPost;

use crate::{GigService, Result};

impl GigService {
	/// Publishes `content` to the social feed on behalf of an event. Returns
	/// whether the post went out; a disabled provider and a failed publish both
	/// report `false` rather than an error, since sharing is best-effort.
	pub async fn share_event(&self, id: i64, content: &str) -> Result<bool> {
		// The event must exist even when the feed is off, so a share against a
		// stale id still reports 404.
		self.get_event(id).await?;

		if !self.cfg.providers.feed.enabled {
			tracing::debug!(event_id = id, "Feed provider is disabled; skipping the share.");

			return Ok(false);
		}

		match self.providers.feed.publish(&self.cfg.providers.feed, content).await {
			Ok(()) => Ok(true),
			Err(err) => {
				tracing::warn!(event_id = id, error = %err, "Failed to publish to the feed.");

				Ok(false)
			},
		}
	}

	/// The latest three feed posts for the events page, empty when the
	/// provider is disabled or unreachable.
	pub(crate) async fn latest_posts(&self) -> Vec<FeedPost> {
		if !self.cfg.providers.feed.enabled {
			return Vec::new();
		}

		match self.providers.feed.latest(&self.cfg.providers.feed, 3).await {
			Ok(posts) => posts,
			Err(err) => {
				tracing::warn!(error = %err, "Failed to fetch the latest feed posts.");

				Vec::new()
			},
		}
	}
}
