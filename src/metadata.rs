//! Video metadata as persisted in the exported JSON document.
//!
//! Field names mirror what the static site consumes (`publishedAt`,
//! `fetchedAt`), so the structs use camelCase on the wire.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of ids the `videos` endpoint accepts per request.
pub const MAX_DETAIL_BATCH: usize = 50;

/// Normalized metadata for one video.
///
/// Missing upstream fields are already coalesced: strings default to empty and
/// an unknown publish time stays `None` (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub description: String,
}

impl VideoRecord {
    /// Parsed publish time. Unparseable values are treated like absent ones.
    pub fn published_timestamp(&self) -> Option<DateTime<Utc>> {
        self.published_at
            .as_deref()
            .and_then(|value| DateTime::parse_from_rfc3339(value.trim()).ok())
            .map(|datetime| datetime.with_timezone(&Utc))
    }
}

/// Top-level JSON document written once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub fetched_at: String,
    pub count: usize,
    pub videos: Vec<VideoRecord>,
}

impl ExportDocument {
    /// Sorts `videos` newest-first and stamps the document with `fetched_at`.
    pub fn new(mut videos: Vec<VideoRecord>, fetched_at: DateTime<Utc>) -> Self {
        sort_newest_first(&mut videos);
        Self {
            fetched_at: fetched_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            count: videos.len(),
            videos,
        }
    }
}

/// Drops repeated ids, keeping the first occurrence of each.
pub fn dedupe_preserving_order<I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Stable sort by publish time, descending; undated records go last.
pub fn sort_newest_first(videos: &mut [VideoRecord]) {
    videos.sort_by_cached_key(|video| std::cmp::Reverse(video.published_timestamp()));
}

/// Splits ids into request-sized chunks for the details endpoint.
pub fn detail_batches(ids: &[String]) -> std::slice::Chunks<'_, String> {
    ids.chunks(MAX_DETAIL_BATCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_video(id: &str, published_at: Option<&str>) -> VideoRecord {
        VideoRecord {
            id: id.to_owned(),
            title: format!("Video {id}"),
            published_at: published_at.map(str::to_owned),
            thumbnail: format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg"),
            description: "desc".into(),
        }
    }

    fn ids(videos: &[VideoRecord]) -> Vec<&str> {
        videos.iter().map(|video| video.id.as_str()).collect()
    }

    #[test]
    fn dedupe_keeps_first_occurrence_order() {
        let deduped = dedupe_preserving_order(
            ["b", "a", "b", "c", "a"].into_iter().map(String::from),
        );
        assert_eq!(deduped, vec!["b", "a", "c"]);
    }

    #[test]
    fn sort_places_newest_first_and_undated_last() {
        let mut videos = vec![
            sample_video("undated", None),
            sample_video("old", Some("2021-03-04T10:00:00Z")),
            sample_video("new", Some("2024-01-01T00:00:00Z")),
            sample_video("mid", Some("2022-07-15T08:30:00+02:00")),
        ];
        sort_newest_first(&mut videos);
        assert_eq!(ids(&videos), vec!["new", "mid", "old", "undated"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut videos = vec![
            sample_video("first-undated", None),
            sample_video("same-a", Some("2023-01-01T00:00:00Z")),
            sample_video("second-undated", Some("not a date")),
            sample_video("same-b", Some("2023-01-01T00:00:00Z")),
        ];
        sort_newest_first(&mut videos);
        assert_eq!(
            ids(&videos),
            vec!["same-a", "same-b", "first-undated", "second-undated"]
        );
    }

    #[test]
    fn published_timestamp_honours_offsets() {
        let video = sample_video("x", Some("2023-06-01T12:00:00+02:00"));
        let expected = Utc.with_ymd_and_hms(2023, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(video.published_timestamp(), Some(expected));
    }

    #[test]
    fn detail_batches_partition_without_loss() {
        let all: Vec<String> = (0..123).map(|n| format!("v{n}")).collect();
        let batches: Vec<&[String]> = detail_batches(&all).collect();
        assert_eq!(
            batches.iter().map(|batch| batch.len()).collect::<Vec<_>>(),
            vec![50, 50, 23]
        );
        let rejoined: Vec<String> = batches.concat();
        assert_eq!(rejoined, all);
    }

    #[test]
    fn document_serializes_with_camel_case_and_nulls() {
        let fetched_at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let document = ExportDocument::new(
            vec![
                sample_video("undated", None),
                sample_video("dated", Some("2020-01-01T00:00:00Z")),
            ],
            fetched_at,
        );
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["fetchedAt"], "2024-05-06T07:08:09.000000Z");
        assert_eq!(value["count"], 2);
        assert_eq!(value["videos"][0]["id"], "dated");
        assert_eq!(value["videos"][0]["publishedAt"], "2020-01-01T00:00:00Z");
        assert!(value["videos"][1]["publishedAt"].is_null());
        assert_eq!(
            value["videos"][1]["thumbnail"],
            "https://i.ytimg.com/vi/undated/mqdefault.jpg"
        );
    }
}
