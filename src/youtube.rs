//! YouTube Data API v3 client.
//!
//! Only two read endpoints are used: `search.list` for the lightweight hits
//! and `videos.list` for snippet, statistics and content details.  Both take
//! the API key per call so that the fetch controller can rotate keys.
//!
//! A 403 answer is reported as [`UpstreamError::Quota`]; the API uses it for
//! exhausted daily quota.

use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::candidate::{SearchHit, SearchResponse, VideoDetails, VideoListResponse};
use crate::config::Config;
use crate::error::UpstreamError;

pub const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Most ids `videos.list` accepts per call, and the largest `maxResults`.
pub const MAX_PAGE_SIZE: u32 = 50;

const QUOTA_STATUS: u16 = 403;

/// The video platform as seen by the fetch controller.
pub trait VideoSearch {
    /// Search by free text, returning up to `max_results` hits.
    fn search(&self, query: &str, max_results: u32, api_key: &str) -> Result<Vec<SearchHit>, UpstreamError>;

    /// Fetch extended metadata for a batch of video ids.
    fn video_details(&self, video_ids: &[String], api_key: &str) -> Result<Vec<VideoDetails>, UpstreamError>;
}

/// Blocking HTTP implementation of [`VideoSearch`].
pub struct YouTubeClient {
    base_url: String,
    agent: ureq::Agent,
}

impl YouTubeClient {
    pub fn new(timeout: Duration) -> Self {
        YouTubeClient {
            base_url: API_BASE_URL.to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs()))
    }

    /// Point the client at another server (API mocks, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        api_key: &str,
    ) -> Result<T, UpstreamError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self.agent.get(&url).set("Accept", "application/json");
        for (name, value) in params {
            request = request.query(name, value);
        }
        request = request.query("key", api_key);

        match request.call() {
            Ok(response) => Ok(response.into_json()?),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                if status == QUOTA_STATUS {
                    log::debug!("{} rejected with {}: {}", endpoint, status, error_message(&body));
                    return Err(UpstreamError::Quota { status });
                }
                Err(UpstreamError::Status { status, message: error_message(&body) })
            }
            Err(ureq::Error::Transport(transport)) => Err(UpstreamError::Transport(transport.to_string())),
        }
    }
}

impl VideoSearch for YouTubeClient {
    fn search(&self, query: &str, max_results: u32, api_key: &str) -> Result<Vec<SearchHit>, UpstreamError> {
        let max_results = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let response: SearchResponse = self.get_json(
            "search",
            &[
                ("part", "id,snippet"),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("q", query),
            ],
            api_key,
        )?;
        Ok(response.items)
    }

    fn video_details(&self, video_ids: &[String], api_key: &str) -> Result<Vec<VideoDetails>, UpstreamError> {
        let mut details = Vec::with_capacity(video_ids.len());
        for chunk in video_ids.chunks(MAX_PAGE_SIZE as usize) {
            let ids = chunk.join(",");
            let response: VideoListResponse = self.get_json(
                "videos",
                &[("part", "snippet,contentDetails,statistics"), ("id", ids.as_str())],
                api_key,
            )?;
            details.extend(response.items);
        }
        Ok(details)
    }
}

/// Pull `error.message` out of an API error body, or fall back to the
/// (truncated) raw body.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    if let Some(message) = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return message.to_string();
    }
    body.chars().take(200).collect()
}
