//! In-memory stand-ins for the YouTube API used by unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use anyhow::{Result, anyhow, bail};
use serde_json::{Value, json};

use crate::config::ApiKey;
use crate::youtube::ApiTransport;

pub fn test_key() -> ApiKey {
    ApiKey::parse("test-key").unwrap()
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn capture(url: &str, query: &[(&str, &str)]) -> Self {
        Self {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

/// Replays canned responses in order, one per request.
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<Value, &'static str>>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<Value, &'static str>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }
}

impl ApiTransport for ScriptedTransport {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.calls.borrow_mut().push(RecordedCall::capture(url, query));
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(reason)) => Err(anyhow!("scripted failure: {reason}")),
            None => bail!("no scripted response left for {url}"),
        }
    }
}

/// Fake API that answers from playlist contents and per-video publish times.
/// Playlists are served two ids per page to exercise pagination.
#[derive(Default)]
pub struct FakeYouTube {
    playlists: HashMap<String, Vec<String>>,
    published: HashMap<String, Option<String>>,
    failing_playlists: Vec<String>,
    calls: RefCell<Vec<RecordedCall>>,
}

const FAKE_PAGE_SIZE: usize = 2;

impl FakeYouTube {
    pub fn playlist(mut self, id: &str, videos: &[&str]) -> Self {
        self.playlists
            .insert(id.to_string(), videos.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn video(mut self, id: &str, published_at: Option<&str>) -> Self {
        self.published
            .insert(id.to_string(), published_at.map(str::to_owned));
        self
    }

    pub fn failing_playlist(mut self, id: &str) -> Self {
        self.failing_playlists.push(id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    fn playlist_page(&self, call: &RecordedCall) -> Result<Value> {
        let playlist_id = call.param("playlistId").unwrap_or_default();
        if self.failing_playlists.iter().any(|id| id == playlist_id) {
            bail!("HTTP 404 for playlist {playlist_id}");
        }
        let videos = self
            .playlists
            .get(playlist_id)
            .ok_or_else(|| anyhow!("unknown playlist {playlist_id}"))?;
        let start: usize = call
            .param("pageToken")
            .map(|token| token.parse::<usize>())
            .transpose()?
            .unwrap_or(0);
        let end = (start + FAKE_PAGE_SIZE).min(videos.len());
        let items: Vec<Value> = videos[start..end]
            .iter()
            .map(|id| json!({"snippet": {"resourceId": {"videoId": id}}}))
            .collect();
        let mut page = json!({"items": items});
        if end < videos.len() {
            page["nextPageToken"] = json!(end.to_string());
        }
        Ok(page)
    }

    fn video_list(&self, call: &RecordedCall) -> Result<Value> {
        let items: Vec<Value> = call
            .param("id")
            .unwrap_or_default()
            .split(',')
            .filter_map(|id| {
                let published = self.published.get(id)?;
                let mut snippet = json!({
                    "title": format!("Title {id}"),
                    "description": format!("About {id}"),
                    "thumbnails": {"medium": {"url": format!("https://img/{id}/mq.jpg")}}
                });
                if let Some(published) = published {
                    snippet["publishedAt"] = json!(published);
                }
                Some(json!({"id": id, "snippet": snippet}))
            })
            .collect();
        Ok(json!({"items": items}))
    }
}

impl ApiTransport for FakeYouTube {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let call = RecordedCall::capture(url, query);
        self.calls.borrow_mut().push(call.clone());
        if url.ends_with("/playlistItems") {
            self.playlist_page(&call)
        } else if url.ends_with("/videos") {
            self.video_list(&call)
        } else {
            bail!("unexpected endpoint {url}")
        }
    }
}
