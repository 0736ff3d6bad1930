//! Post, Author and Comment documents as returned by the CMS

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::portable_text::Block;

/// A blog post
///
/// Owned by the CMS; the front-end only reads it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    /// Document id
    #[serde(rename = "_id")]
    pub id: String,

    /// Creation timestamp
    #[serde(rename = "_createdAt")]
    pub created_at: DateTime<Utc>,

    /// Post title
    pub title: String,

    /// Short description shown under the title
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// URL slug
    pub slug: Slug,

    /// Hero image
    #[serde(rename = "mainImage", default)]
    pub main_image: Option<ImageRef>,

    /// Expanded author reference
    #[serde(default)]
    pub author: Option<Author>,

    /// Approved comments only
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,

    /// Rich-text body
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<Block>,
}

/// A post as listed on the home page
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_createdAt")]
    pub created_at: DateTime<Utc>,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub slug: Slug,
    #[serde(rename = "mainImage", default)]
    pub main_image: Option<ImageRef>,
    #[serde(default)]
    pub author: Option<Author>,
}

impl PostSummary {
    /// Decode a listing, dropping documents that are not usable posts
    pub fn from_documents(documents: Vec<serde_json::Value>) -> Vec<PostSummary> {
        documents
            .into_iter()
            .filter_map(|document| {
                let id = document
                    .get("_id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("<no id>")
                    .to_string();
                match serde_json::from_value(document) {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        tracing::warn!("Skipping post {} in listing: {}", id, e);
                        None
                    }
                }
            })
            .collect()
    }
}

/// Post author, referenced by posts
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// A reader comment
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    pub comment: String,
    #[serde(default)]
    pub approved: bool,
    /// Back-reference to the post
    #[serde(default)]
    pub post: Option<Reference>,
}

/// Slug object (`{ current }`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    pub current: String,
}

/// Image field pointing to an uploaded asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub asset: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Reference to another document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_ref")]
    pub reference: String,
    #[serde(rename = "_type", default = "reference_type")]
    pub kind: String,
}

impl Reference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            reference: id.into(),
            kind: reference_type(),
        }
    }
}

fn reference_type() -> String {
    "reference".to_string()
}

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
