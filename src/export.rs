#![forbid(unsafe_code)]

//! The export pipeline: walk every playlist of a job, dedupe the ids, fetch
//! details in batches, sort newest-first and write one JSON document.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};

use crate::jobs::ExportJob;
use crate::metadata::{
    ExportDocument, MAX_DETAIL_BATCH, VideoRecord, dedupe_preserving_order, detail_batches,
};
use crate::youtube::{ApiTransport, YouTubeClient};

/// Pause between two `videos` requests.
pub const BATCH_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub batch_pause: Duration,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            batch_pause: BATCH_PAUSE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub output: PathBuf,
    pub unique_ids: usize,
    pub count: usize,
}

/// Runs `job` end to end and writes `<out_dir>/<job.output>`.
///
/// Any request that exhausts its retries aborts the run before anything is
/// written, so a previous export stays in place.
pub fn run_export<T: ApiTransport>(
    client: &YouTubeClient<T>,
    job: &ExportJob,
    out_dir: &Path,
    options: ExportOptions,
) -> Result<ExportSummary> {
    job.validate()?;
    let output = out_dir.join(&job.output);

    println!(
        "[{}] Starting fetch for {} playlists...",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        job.playlists.len()
    );
    let unique_ids = collect_unique_ids(client, &job.playlists)?;
    println!("Collected {} unique video IDs total.", unique_ids.len());

    let videos = fetch_details(client, &unique_ids, options.batch_pause)?;
    let document = ExportDocument::new(videos, Utc::now());

    println!("Writing {}...", output.display());
    write_document(&output, &document)?;
    println!("Done.");

    Ok(ExportSummary {
        output,
        unique_ids: unique_ids.len(),
        count: document.count,
    })
}

/// Ids from all playlists, one playlist at a time, first occurrence wins.
pub fn collect_unique_ids<T: ApiTransport>(
    client: &YouTubeClient<T>,
    playlists: &[String],
) -> Result<Vec<String>> {
    let mut all_ids = Vec::new();
    for playlist_id in playlists {
        println!(" -> fetching playlist: {playlist_id}");
        let ids = client.playlist_video_ids(playlist_id)?;
        println!("    got {} items", ids.len());
        all_ids.extend(ids);
    }
    Ok(dedupe_preserving_order(all_ids))
}

pub fn fetch_details<T: ApiTransport>(
    client: &YouTubeClient<T>,
    ids: &[String],
    batch_pause: Duration,
) -> Result<Vec<VideoRecord>> {
    let total = ids.len().div_ceil(MAX_DETAIL_BATCH);
    let mut videos = Vec::with_capacity(ids.len());
    for (index, batch) in detail_batches(ids).enumerate() {
        if index > 0 && !batch_pause.is_zero() {
            thread::sleep(batch_pause);
        }
        println!(
            "Fetching details batch {}/{} ({} ids)...",
            index + 1,
            total,
            batch.len()
        );
        let details = client
            .video_details(batch)
            .with_context(|| format!("fetching details batch {}/{}", index + 1, total))?;
        videos.extend(details);
    }
    Ok(videos)
}

/// Serializes the document and swaps it into place, creating the parent
/// directory when needed. The file is created with the process umask, like
/// any other `fs::write`.
pub fn write_document(path: &Path, document: &ExportDocument) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("Creating {}", parent.display()))?;
    }

    let payload = serde_json::to_vec_pretty(document).context("serializing export document")?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, payload).with_context(|| format!("Writing {}", tmp_path.display()))?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("Replacing {}", path.display()));
    }
    Ok(())
}
