//! Playhead HTTP client
//!
//! [`HttpProgressStore`] implements the core crate's
//! [`ProgressStore`](playhead_core::ports::ProgressStore) against the media
//! server's watch-progress endpoints:
//!
//! - `GET {base}/progress/{media_id}?user_id={user}` returns a record or `null`
//! - `POST {base}/progress` upserts a record

#![allow(missing_docs)]

pub mod config;
pub mod dto;
pub mod store;

pub use config::ClientConfig;
pub use store::HttpProgressStore;
