//! Path and props provider for post pages
//!
//! `static_paths` enumerates every post slug at build time. `static_props`
//! fetches one post for a slug and reports `NotFound` when the CMS returns
//! nothing, so a page is never rendered from a partial document.

use serde_json::Value;
use std::time::Duration;

use crate::content::Post;
use crate::sanity::{ContentError, ContentSource, Result};

/// What to do with slugs that were not known at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Generate the page on first request and wait for it
    Blocking,
}

/// Build-time path listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPaths {
    pub slugs: Vec<String>,
    pub fallback: Fallback,
}

/// Result of fetching one page
#[derive(Debug, Clone, PartialEq)]
pub enum PageProps {
    Found { post: Box<Post>, revalidate: Duration },
    NotFound,
}

impl PageProps {
    pub fn post(&self) -> Option<&Post> {
        match self {
            PageProps::Found { post, .. } => Some(post),
            PageProps::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PageProps::NotFound)
    }
}

/// List every post slug
pub async fn static_paths<S>(source: &S) -> Result<StaticPaths>
where
    S: ContentSource + ?Sized,
{
    let slugs = source.list_slugs().await?;
    tracing::debug!("Found {} post paths", slugs.len());
    Ok(StaticPaths {
        slugs,
        fallback: Fallback::Blocking,
    })
}

/// Fetch the post for `slug`
///
/// CMS failures are returned as errors; an empty document is `NotFound`.
pub async fn static_props<S>(source: &S, slug: &str, revalidate: Duration) -> Result<PageProps>
where
    S: ContentSource + ?Sized,
{
    let document = source.fetch_post_document(slug).await?;
    let post = post_from_document(document).map_err(|e| ContentError::InvalidPost {
        slug: slug.to_string(),
        source: e,
    })?;
    match post {
        Some(post) => Ok(PageProps::Found {
            post: Box::new(post),
            revalidate,
        }),
        None => {
            tracing::debug!("No post for slug {}", slug);
            Ok(PageProps::NotFound)
        }
    }
}

/// Decode a query result, treating `null` and `{}` as no document
pub fn post_from_document(document: Value) -> std::result::Result<Option<Post>, serde_json::Error> {
    if is_empty_document(&document) {
        return Ok(None);
    }
    serde_json::from_value(document).map(Some)
}

fn is_empty_document(document: &Value) -> bool {
    match document {
        Value::Null => true,
        Value::Object(fields) => fields.values().all(Value::is_null),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
