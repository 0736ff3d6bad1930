//! Page cache with time-based revalidation
//!
//! Each slug maps to the last post fetched for it and the time of that
//! fetch. Inside the revalidation window the cached post is served without
//! touching the CMS. Once the window has elapsed the next request fetches
//! again; if that fetch fails the old post keeps being served.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::content::{Post, PostSummary};
use crate::pages::{self, PageProps};
use crate::sanity::{ContentSource, Result};

/// A cached post and when it was fetched
#[derive(Debug, Clone)]
struct CacheEntry {
    post: Arc<Post>,
    fetched_at: Instant,
}

/// Cached home page listing
#[derive(Debug, Clone)]
struct IndexEntry {
    posts: Arc<Vec<PostSummary>>,
    fetched_at: Instant,
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPage {
    Found(Arc<Post>),
    NotFound,
}

impl CachedPage {
    pub fn post(&self) -> Option<&Arc<Post>> {
        match self {
            CachedPage::Found(post) => Some(post),
            CachedPage::NotFound => None,
        }
    }
}

/// Revalidating cache of post pages
///
/// Concurrent requests for the same stale or missing slug share one CMS
/// query: the first caller fetches while later ones wait on the slug's
/// refresh lock and then read what it stored.
pub struct PageCache<S: ?Sized> {
    source: Arc<S>,
    revalidate: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    refreshing: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    index: RwLock<Option<IndexEntry>>,
    index_refresh: Mutex<()>,
}

impl<S> PageCache<S>
where
    S: ContentSource + ?Sized,
{
    pub fn new(source: Arc<S>, revalidate: Duration) -> Self {
        Self {
            source,
            revalidate,
            entries: RwLock::new(HashMap::new()),
            refreshing: Mutex::new(HashMap::new()),
            index: RwLock::new(None),
            index_refresh: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn revalidate(&self) -> Duration {
        self.revalidate
    }

    /// Fetch and cache every slug in `slugs`; returns how many were cached
    ///
    /// Posts the CMS returns but that cannot be decoded are skipped.
    pub async fn prewarm(&self, slugs: &[String]) -> Result<usize> {
        let mut cached = 0;
        for slug in slugs {
            match self.fetch(slug).await {
                Ok(PageProps::Found { post, .. }) => {
                    self.store(slug, Arc::new(*post)).await;
                    cached += 1;
                }
                Ok(PageProps::NotFound) => {
                    tracing::warn!("Listed slug {} has no post, skipping", slug);
                }
                Err(e) if e.is_invalid_post() => {
                    tracing::warn!("Skipping post {}: {}", slug, e);
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!("Prewarmed {} of {} post pages", cached, slugs.len());
        Ok(cached)
    }

    /// Look up `slug`, fetching from the CMS when missing or expired
    pub async fn get(&self, slug: &str) -> Result<CachedPage> {
        if let Some(post) = self.fresh(slug).await {
            tracing::debug!("Cache hit for {}", slug);
            return Ok(CachedPage::Found(post));
        }

        let lock = self.refresh_lock(slug).await;
        let result = {
            let _guard = lock.lock().await;
            self.refresh(slug).await
        };
        self.release_refresh_lock(slug, lock).await;
        result
    }

    /// Post summaries for the home page, revalidated like post pages
    pub async fn index(&self) -> Result<Arc<Vec<PostSummary>>> {
        if let Some(posts) = self.fresh_index().await {
            return Ok(posts);
        }

        let _guard = self.index_refresh.lock().await;
        // filled by another caller while waiting
        if let Some(posts) = self.fresh_index().await {
            return Ok(posts);
        }

        let stale = self.index.read().await.clone();
        match self.source.list_posts().await {
            Ok(posts) => {
                let posts = Arc::new(posts);
                *self.index.write().await = Some(IndexEntry {
                    posts: posts.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(posts)
            }
            Err(e) => match stale {
                Some(entry) => {
                    tracing::error!("Regenerating index failed, serving stale list: {}", e);
                    Ok(entry.posts)
                }
                None => Err(e),
            },
        }
    }

    /// Drop the cached page for `slug`; returns whether one existed
    pub async fn invalidate(&self, slug: &str) -> bool {
        self.entries.write().await.remove(slug).is_some()
    }

    /// Number of cached pages
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn fresh(&self, slug: &str) -> Option<Arc<Post>> {
        self.entries
            .read()
            .await
            .get(slug)
            .filter(|entry| entry.fetched_at.elapsed() < self.revalidate)
            .map(|entry| entry.post.clone())
    }

    async fn fresh_index(&self) -> Option<Arc<Vec<PostSummary>>> {
        self.index
            .read()
            .await
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.revalidate)
            .map(|entry| entry.posts.clone())
    }

    /// Fetch `slug` unless another caller refreshed it first; runs under the slug's lock
    async fn refresh(&self, slug: &str) -> Result<CachedPage> {
        let existing = self.entries.read().await.get(slug).cloned();

        match existing {
            Some(entry) if entry.fetched_at.elapsed() < self.revalidate => {
                Ok(CachedPage::Found(entry.post))
            }
            Some(entry) => {
                tracing::debug!("Revalidating {}", slug);
                match self.fetch(slug).await {
                    Ok(PageProps::Found { post, .. }) => {
                        let post = Arc::new(*post);
                        self.store(slug, post.clone()).await;
                        Ok(CachedPage::Found(post))
                    }
                    Ok(PageProps::NotFound) => {
                        tracing::info!("Post {} was removed, dropping cached page", slug);
                        self.invalidate(slug).await;
                        Ok(CachedPage::NotFound)
                    }
                    Err(e) => {
                        tracing::error!("Regenerating {} failed, serving stale page: {}", slug, e);
                        Ok(CachedPage::Found(entry.post))
                    }
                }
            }
            None => {
                tracing::debug!("Cache miss for {}", slug);
                match self.fetch(slug).await? {
                    PageProps::Found { post, .. } => {
                        let post = Arc::new(*post);
                        self.store(slug, post.clone()).await;
                        Ok(CachedPage::Found(post))
                    }
                    PageProps::NotFound => Ok(CachedPage::NotFound),
                }
            }
        }
    }

    async fn refresh_lock(&self, slug: &str) -> Arc<Mutex<()>> {
        self.refreshing
            .lock()
            .await
            .entry(slug.to_string())
            .or_default()
            .clone()
    }

    /// Forget the slug's lock once no other caller holds it
    async fn release_refresh_lock(&self, slug: &str, lock: Arc<Mutex<()>>) {
        let mut refreshing = self.refreshing.lock().await;
        // one reference in the map, one here
        if Arc::strong_count(&lock) <= 2 {
            refreshing.remove(slug);
        }
    }

    async fn fetch(&self, slug: &str) -> Result<PageProps> {
        pages::static_props(self.source.as_ref(), slug, self.revalidate).await
    }

    async fn store(&self, slug: &str, post: Arc<Post>) {
        self.entries.write().await.insert(
            slug.to_string(),
            CacheEntry {
                post,
                fetched_at: Instant::now(),
            },
        );
    }
}
