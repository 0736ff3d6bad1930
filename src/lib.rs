//! sanity-blog: a blog front-end backed by the Sanity CMS
//!
//! Posts, authors and approved comments are read from a Sanity dataset and
//! rendered with embedded Tera templates. Post pages are cached and
//! revalidated on a fixed window; new comments are forwarded to the CMS
//! unapproved and show up once a moderator approves them.

pub mod cache;
pub mod comments;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod pages;
pub mod sanity;
pub mod server;
pub mod templates;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cache::{CachedPage, PageCache};
use sanity::{ContentSource, SanityClient};
use templates::PageRenderer;

/// The main blog application
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    cache: PageCache<dyn ContentSource>,
    renderer: PageRenderer,
}

impl Blog {
    /// Create a blog from a directory, reading `_config.yml` (or `config_path`)
    /// and the environment, talking to Sanity over HTTP
    pub fn new<P: AsRef<Path>>(base_dir: P, config_path: Option<&Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| base_dir.join("_config.yml"));

        let config = config::SiteConfig::from_env_and_file(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        config.validate()?;

        let client = SanityClient::new(&config)?;
        Self::with_source(config, base_dir, Arc::new(client))
    }

    /// Create a blog reading content from `source`
    pub fn with_source(
        config: config::SiteConfig,
        base_dir: PathBuf,
        source: Arc<dyn ContentSource>,
    ) -> Result<Self> {
        let public_dir = base_dir.join(&config.public_dir);
        let cache = PageCache::new(source, Duration::from_secs(config.revalidate));
        let renderer = PageRenderer::new(&config)?;

        Ok(Self {
            config,
            base_dir,
            public_dir,
            cache,
            renderer,
        })
    }

    /// Content source shared by pages, cache and comment endpoint
    pub fn source(&self) -> &dyn ContentSource {
        self.cache.source().as_ref()
    }

    pub fn cache(&self) -> &PageCache<dyn ContentSource> {
        &self.cache
    }

    pub fn renderer(&self) -> &PageRenderer {
        &self.renderer
    }

    /// List every post slug
    pub async fn paths(&self) -> Result<pages::StaticPaths> {
        Ok(pages::static_paths(self.source()).await?)
    }

    /// Fill the page cache with every known post
    pub async fn prewarm(&self) -> Result<usize> {
        let paths = self.paths().await?;
        Ok(self.cache.prewarm(&paths.slugs).await?)
    }

    /// Render the page for `slug` through the cache; `None` when there is no such post
    pub async fn render_post(&self, slug: &str) -> Result<Option<String>> {
        match self.cache.get(slug).await? {
            CachedPage::Found(post) => Ok(Some(self.renderer.render_post(&post)?)),
            CachedPage::NotFound => Ok(None),
        }
    }

    /// Render the home page
    pub async fn render_index(&self) -> Result<String> {
        let posts = self.cache.index().await?;
        self.renderer.render_index(&posts)
    }

    /// Write the static site to the public directory
    pub async fn generate(&self) -> Result<generator::GenerateStats> {
        generator::run(self).await
    }

    /// Delete the generated public directory
    pub fn clean(&self) -> Result<()> {
        if self.public_dir.exists() {
            std::fs::remove_dir_all(&self.public_dir)
                .with_context(|| format!("Failed to delete {}", self.public_dir.display()))?;
            tracing::info!("Deleted: {:?}", self.public_dir);
        }
        Ok(())
    }
}
