//! YouTube Data API transport for the upload engine.

mod client;

pub use client::{ClientError, YouTubeClient};
