#![forbid(unsafe_code)]

//! Thin client for the two YouTube Data API v3 endpoints the exporter needs:
//! `playlistItems` (paginated) and `videos` (batch details).

use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ApiKey;
use crate::metadata::{MAX_DETAIL_BATCH, VideoRecord};
use crate::retry::RetryPolicy;

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const PLAYLIST_PAGE_SIZE: usize = 50;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Seam between the client and the network. Any `Err` counts as a failed
/// attempt, whatever the HTTP status.
pub trait ApiTransport {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value>;
}

impl<T: ApiTransport + ?Sized> ApiTransport for &T {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        (**self).get_json(url, query)
    }
}

/// Blocking transport backed by a shared `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("playlist-export/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(REQUEST_TIMEOUT)
    }
}

impl ApiTransport for UreqTransport {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(key, value);
        }
        // ureq turns every non-2xx status into `Error::Status`.
        let response = request.call().with_context(|| format!("GET {url}"))?;
        response
            .into_json::<Value>()
            .with_context(|| format!("decoding JSON from {url}"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaylistItem {
    #[serde(default)]
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    #[serde(default)]
    resource_id: ResourceId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    snippet: VideoSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    medium: Option<Thumbnail>,
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnail {
    #[serde(default)]
    url: Option<String>,
}

impl Thumbnails {
    /// Medium resolution first, then the default one, else empty.
    fn best_url(&self) -> String {
        [&self.medium, &self.default]
            .into_iter()
            .flatten()
            .filter_map(|thumb| thumb.url.as_deref())
            .find(|url| !url.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

impl VideoItem {
    fn into_record(self) -> Option<VideoRecord> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let thumbnail = self.snippet.thumbnails.best_url();
        Some(VideoRecord {
            id,
            title: self.snippet.title.unwrap_or_default(),
            published_at: self.snippet.published_at,
            thumbnail,
            description: self.snippet.description.unwrap_or_default(),
        })
    }
}

pub struct YouTubeClient<T> {
    transport: T,
    api_key: ApiKey,
    retry: RetryPolicy,
    base_url: String,
}

impl<T: ApiTransport> YouTubeClient<T> {
    pub fn new(transport: T, api_key: ApiKey) -> Self {
        Self {
            transport,
            api_key,
            retry: RetryPolicy::default(),
            base_url: YOUTUBE_API_BASE.to_string(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn get<R: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<R> {
        let url = format!("{}/{endpoint}", self.base_url);
        let value = self
            .retry
            .run(endpoint, || self.transport.get_json(&url, query))?;
        serde_json::from_value(value).with_context(|| format!("unexpected {endpoint} payload"))
    }

    /// Lazily walks a playlist one page at a time.
    pub fn playlist_pages<'a>(&'a self, playlist_id: &'a str) -> PlaylistPages<'a, T> {
        PlaylistPages {
            client: self,
            playlist_id,
            next_token: None,
            finished: false,
        }
    }

    /// Every video id referenced by the playlist, in playlist order.
    pub fn playlist_video_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for page in self.playlist_pages(playlist_id) {
            ids.extend(page.with_context(|| format!("listing playlist {playlist_id}"))?);
        }
        Ok(ids)
    }

    /// Metadata for up to [`MAX_DETAIL_BATCH`] videos in a single request.
    /// Ids unknown to the API are simply absent from the result.
    pub fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoRecord>> {
        ensure!(
            video_ids.len() <= MAX_DETAIL_BATCH,
            "details batch of {} ids exceeds the limit of {MAX_DETAIL_BATCH}",
            video_ids.len()
        );
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = video_ids.join(",");
        let max_results = MAX_DETAIL_BATCH.to_string();
        let response: VideoListResponse = self.get(
            "videos",
            &[
                ("part", "snippet,contentDetails"),
                ("id", &joined),
                ("maxResults", &max_results),
                ("key", self.api_key.as_str()),
            ],
        )?;
        Ok(response
            .items
            .into_iter()
            .filter_map(VideoItem::into_record)
            .collect())
    }
}

/// Finite, non-restartable sequence of playlist pages. Each item holds the
/// video ids found on that page. Iteration ends after the last page or the
/// first error.
pub struct PlaylistPages<'a, T> {
    client: &'a YouTubeClient<T>,
    playlist_id: &'a str,
    next_token: Option<String>,
    finished: bool,
}

impl<T: ApiTransport> Iterator for PlaylistPages<'_, T> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let page_size = PLAYLIST_PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("maxResults", page_size.as_str()),
            ("playlistId", self.playlist_id),
            ("key", self.client.api_key.as_str()),
        ];
        if let Some(token) = self.next_token.as_deref() {
            query.push(("pageToken", token));
        }

        let page: PlaylistItemsPage = match self.client.get("playlistItems", &query) {
            Ok(page) => page,
            Err(err) => {
                self.finished = true;
                return Some(Err(err));
            }
        };

        self.next_token = page.next_page_token.filter(|token| !token.is_empty());
        self.finished = self.next_token.is_none();
        let ids = page
            .items
            .into_iter()
            .filter_map(|item| item.snippet.resource_id.video_id)
            .filter(|id| !id.is_empty())
            .collect();
        Some(Ok(ids))
    }
}
