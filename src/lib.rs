#![forbid(unsafe_code)]

//! Library side of the playlist exporter: configuration, the YouTube Data API
//! client and the fetch/dedupe/sort/write pipeline used by `fetch_playlists`.

pub mod config;
pub mod export;
pub mod jobs;
pub mod metadata;
pub mod retry;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;
