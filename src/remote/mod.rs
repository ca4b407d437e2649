//! Network fetch collaborator
//!
//! The download pipeline only needs "give me the body at this URL". The
//! [`BibleApi`] trait is that seam; [`HttpBibleApi`] is the production client.

pub mod http;

pub use http::HttpBibleApi;

use crate::error::Result;
use async_trait::async_trait;

/// Fetches raw version payloads
#[async_trait]
pub trait BibleApi: Send + Sync {
    /// Return the full response body at `url` as text
    async fn download_version(&self, url: &str) -> Result<String>;
}
