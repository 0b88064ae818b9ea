#![forbid(unsafe_code)]

//! One-shot exporter: walks the playlists of a named job through the YouTube
//! Data API and writes `<out-dir>/<job output>` as a single JSON document.
//!
//! ```text
//! YT_API_KEY=... fetch_playlists sermons
//! fetch_playlists --jobs-file jobs.toml --out-dir public/data bible-studies
//! fetch_playlists --list
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use playlist_export::{
    config::{RuntimeOverrides, resolve_runtime_settings},
    export::{ExportOptions, run_export},
    jobs::JobCatalog,
    youtube::{UreqTransport, YouTubeClient},
};

#[derive(Debug, Parser)]
#[command(
    name = "fetch_playlists",
    version,
    about = "Export curated YouTube playlists to a JSON document"
)]
struct ExportArgs {
    /// Job to run (built in: sermons, bible-studies).
    #[arg(required_unless_present = "list")]
    job: Option<String>,

    /// TOML file with extra `[[job]]` definitions.
    #[arg(long, value_name = "PATH")]
    jobs_file: Option<PathBuf>,

    /// Directory the document is written to (default: $EXPORT_OUT_DIR or `data`).
    #[arg(long, value_name = "PATH")]
    out_dir: Option<PathBuf>,

    /// Dotenv file consulted for YT_API_KEY / EXPORT_OUT_DIR.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Print the known jobs and exit.
    #[arg(long, conflicts_with = "job")]
    list: bool,
}

impl ExportArgs {
    fn catalog(&self) -> Result<JobCatalog> {
        match &self.jobs_file {
            Some(path) => JobCatalog::with_file(path),
            None => Ok(JobCatalog::builtin()),
        }
    }
}

fn main() -> Result<()> {
    let args = ExportArgs::parse();
    let catalog = args.catalog()?;

    if args.list {
        for job in catalog.iter() {
            println!(
                "{:<16} {:>3} playlist(s) -> {}",
                job.name,
                job.playlists.len(),
                job.output
            );
        }
        return Ok(());
    }

    let job_name = args.job.as_deref().context("no job given")?;
    let job = catalog.get(job_name)?;

    // Key validation happens here, before any network traffic.
    let settings = resolve_runtime_settings(RuntimeOverrides {
        out_dir: args.out_dir.clone(),
        env_path: args.env_file.clone(),
    })?;

    let client = YouTubeClient::new(UreqTransport::default(), settings.api_key);
    let summary = run_export(&client, job, &settings.out_dir, ExportOptions::default())
        .with_context(|| format!("export job {} failed", job.name))?;

    println!(
        "Exported {} videos ({} unique ids) to {}",
        summary.count,
        summary.unique_ids,
        summary.output.display()
    );
    Ok(())
}
