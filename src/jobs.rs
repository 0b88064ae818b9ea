#![forbid(unsafe_code)]

//! Named export jobs: which playlists to walk and where the document lands.
//!
//! Two jobs ship built in. A TOML file can add more or replace a built-in one
//! by reusing its name:
//!
//! ```toml
//! [[job]]
//! name = "sermons"
//! output = "sermons.json"
//! playlists = ["PL..."]
//! ```

use anyhow::{Context, Result, anyhow, bail, ensure};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path};

const SERMON_PLAYLISTS: &[&str] = &["PLbuqbfCDMAE_rNcOvWSrPG0zUoA2QaO5H"];

const BIBLE_STUDY_PLAYLISTS: &[&str] = &[
    "PLbuqbfCDMAE-xp_H2EKYCrwUJ-rKO6fuD", // Revelation
    "PLbuqbfCDMAE_MWpDy1sGpvQ-_z-32ovJ_", // The Unveiled Kingdom
    "PLbuqbfCDMAE_SGPhawImwsR3m1omXAZev", // Luke
    "PLbuqbfCDMAE80fArN-lh00mKxM-xJgghQ", // Kingdom of God
    "PLbuqbfCDMAE-DQBK5TvsHGqnP2OTdjqv1", // The Athanasian Creed
    "PLbuqbfCDMAE93NQkUKX8eDgIJDnN9cJWo", // End Times
    "PLbuqbfCDMAE9TCJuil__sUWVaKe4oDWy5", // John
    "PLbuqbfCDMAE-2pk4y8T0O95E5k_qLm-s-", // Unforgivable
    "PLbuqbfCDMAE854bzM7kKsrCkhgISDt10P", // Hosea
    "PLbuqbfCDMAE_bBv_hurIfDoV9Jzj5IIxc", // Peter's Letters
    "PLbuqbfCDMAE9rgAE5lYZ5kOFzBu-deI9s", // Malachi
    "PLbuqbfCDMAE8qySl0084Nckh_4DXQT029", // The Lord's Supper
    "PLbuqbfCDMAE_jf-0YTZ4lg1Yc2YkzaaKh", // Nehemiah
    "PLbuqbfCDMAE-GVM2XrEHSB2h0gZGdbkms", // Augsburg Confession
    "PLbuqbfCDMAE9cdFnbNgEbyrQqHn_TBttX", // Job
    "PLbuqbfCDMAE_TeQsgXR-qBWe0Mex0SyHS", // Song Of Songs
    "PLbuqbfCDMAE_Rb3QiyePAuDx9AVGSJLPl", // Exodus
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportJob {
    pub name: String,
    /// File name relative to the output directory.
    pub output: String,
    pub playlists: Vec<String>,
}

impl ExportJob {
    fn from_static(name: &str, output: &str, playlists: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            output: output.to_string(),
            playlists: playlists.iter().map(|id| id.to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.name.trim().is_empty(), "job name must not be empty");
        ensure!(
            !self.playlists.is_empty(),
            "job {} lists no playlists",
            self.name
        );
        if let Some(blank) = self.playlists.iter().position(|id| id.trim().is_empty()) {
            bail!("job {} has an empty playlist id at position {}", self.name, blank);
        }
        let output = Path::new(&self.output);
        let confined = !self.output.trim().is_empty()
            && output
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        ensure!(
            confined,
            "job {} output {:?} must be a relative path inside the output directory",
            self.name,
            self.output
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct JobsFile {
    #[serde(default, rename = "job")]
    jobs: Vec<ExportJob>,
}

#[derive(Debug, Clone)]
pub struct JobCatalog {
    jobs: Vec<ExportJob>,
}

impl JobCatalog {
    pub fn builtin() -> Self {
        Self {
            jobs: vec![
                ExportJob::from_static("sermons", "sermons.json", SERMON_PLAYLISTS),
                ExportJob::from_static(
                    "bible-studies",
                    "bible-studies.json",
                    BIBLE_STUDY_PLAYLISTS,
                ),
            ],
        }
    }

    /// Built-in jobs merged with the `[[job]]` tables from `path`.
    pub fn with_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading jobs file {}", path.display()))?;
        let mut catalog = Self::builtin();
        catalog
            .merge_toml(&raw)
            .with_context(|| format!("Loading jobs from {}", path.display()))?;
        Ok(catalog)
    }

    fn merge_toml(&mut self, raw: &str) -> Result<()> {
        let file: JobsFile = toml::from_str(raw)?;
        for job in file.jobs {
            job.validate()?;
            match self.jobs.iter_mut().find(|existing| existing.name == job.name) {
                Some(existing) => *existing = job,
                None => self.jobs.push(job),
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ExportJob> {
        self.jobs
            .iter()
            .find(|job| job.name == name)
            .ok_or_else(|| {
                anyhow!(
                    "unknown job {name:?}; known jobs: {}",
                    self.names().collect::<Vec<_>>().join(", ")
                )
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExportJob> {
        self.jobs.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.iter().map(|job| job.name.as_str())
    }
}
