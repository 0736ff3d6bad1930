//! Shared test utilities.
//!
//! [`FakeSource`] is an in-memory [`ContentSource`] that counts how often
//! each query runs, so cache and page tests can assert on CMS traffic.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::comments::NewComment;
use crate::content::PostSummary;
use crate::sanity::{ContentError, ContentSource, Result};

/// Build a minimal post document
pub fn post_doc(slug: &str, title: &str) -> Value {
    json!({
        "_id": format!("post-{}", slug),
        "_createdAt": "2022-03-01T12:00:00Z",
        "title": title,
        "description": format!("About {}", title),
        "slug": { "current": slug },
        "mainImage": { "asset": { "_ref": "image-hero1-800x400-jpg", "_type": "reference" } },
        "author": {
            "name": "Jane Doe",
            "image": { "asset": { "_ref": "image-jane-64x64-png", "_type": "reference" } }
        },
        "comments": [],
        "body": [{
            "_type": "block",
            "style": "normal",
            "markDefs": [],
            "children": [{ "_type": "span", "text": format!("Body of {}", title), "marks": [] }]
        }]
    })
}

#[derive(Default)]
pub struct FakeSource {
    posts: Mutex<BTreeMap<String, Value>>,
    comments: Mutex<Vec<NewComment>>,
    post_queries: AtomicUsize,
    list_queries: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    fail: AtomicBool,
}

impl FakeSource {
    pub fn with_posts(slugs: &[&str]) -> Self {
        let source = Self::default();
        for slug in slugs {
            source.put(slug, post_doc(slug, &format!("Post {}", slug)));
        }
        source
    }

    pub fn put(&self, slug: &str, document: Value) {
        self.posts
            .lock()
            .unwrap()
            .insert(slug.to_string(), document);
    }

    pub fn remove(&self, slug: &str) {
        self.posts.lock().unwrap().remove(slug);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make every query take `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn list_queries(&self) -> usize {
        self.list_queries.load(Ordering::SeqCst)
    }

    pub fn post_queries(&self) -> usize {
        self.post_queries.load(Ordering::SeqCst)
    }

    pub fn created_comments(&self) -> Vec<NewComment> {
        self.comments.lock().unwrap().clone()
    }

    async fn wait(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ContentError::Status {
                url: "fake://cms".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn list_slugs(&self) -> Result<Vec<String>> {
        self.check()?;
        Ok(self.posts.lock().unwrap().keys().cloned().collect())
    }

    async fn list_posts(&self) -> Result<Vec<PostSummary>> {
        self.list_queries.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        self.check()?;
        let docs: Vec<Value> = self.posts.lock().unwrap().values().cloned().collect();
        Ok(PostSummary::from_documents(docs))
    }

    async fn fetch_post_document(&self, slug: &str) -> Result<Value> {
        self.post_queries.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        self.check()?;
        Ok(self
            .posts
            .lock()
            .unwrap()
            .get(slug)
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<()> {
        self.check()?;
        self.comments.lock().unwrap().push(comment.clone());
        Ok(())
    }
}
