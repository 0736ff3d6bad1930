//! Sanity CMS access: query client, image URLs and queries

mod client;
mod error;
mod image;
pub mod query;

pub use client::SanityClient;
pub use error::{ContentError, Result};
pub use image::{ImageUrl, ImageUrlBuilder};

use async_trait::async_trait;
use serde_json::Value;

use crate::comments::NewComment;
use crate::content::PostSummary;

/// Where page data comes from
///
/// Implemented by [`SanityClient`]; the page provider, cache and comment
/// endpoint only see this trait.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Slugs of every post document
    async fn list_slugs(&self) -> Result<Vec<String>>;

    /// Summaries of every post, newest first
    async fn list_posts(&self) -> Result<Vec<PostSummary>>;

    /// Raw post document for `slug`; `null` when there is none
    async fn fetch_post_document(&self, slug: &str) -> Result<Value>;

    /// Store a new, unapproved comment
    async fn create_comment(&self, comment: &NewComment) -> Result<()>;
}
