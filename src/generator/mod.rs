//! Generator module - writes the static site to the public directory
//!
//! Lists every post path, fetches its props and renders it, then renders
//! the home page. Slugs the CMS lists but cannot return, or returns as a
//! document that is not a usable post, are skipped; any CMS failure fails
//! the whole build.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::helpers::{is_valid_slug, post_output_path};
use crate::pages::{self, PageProps};
use crate::Blog;

/// Counts reported after a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub skipped: usize,
}

/// Generate the entire site
pub async fn run(blog: &Blog) -> Result<GenerateStats> {
    let start = std::time::Instant::now();
    let public_dir = &blog.public_dir;
    fs::create_dir_all(public_dir)
        .with_context(|| format!("Failed to create {}", public_dir.display()))?;

    let paths = pages::static_paths(blog.source())
        .await
        .context("Failed to list post paths")?;
    tracing::info!("Found {} posts", paths.slugs.len());

    let revalidate = blog.cache().revalidate();
    let mut stats = GenerateStats::default();

    for slug in &paths.slugs {
        if !is_valid_slug(slug) {
            tracing::warn!("Skipping post with unusable slug {:?}", slug);
            stats.skipped += 1;
            continue;
        }

        let props = match pages::static_props(blog.source(), slug, revalidate).await {
            Ok(props) => props,
            Err(e) if e.is_invalid_post() => {
                tracing::warn!("Skipping post {}: {}", slug, e);
                stats.skipped += 1;
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to fetch post {}", slug)),
        };

        match props {
            PageProps::Found { post, .. } => {
                let html = blog.renderer().render_post(&post)?;
                write_page(public_dir, &post_output_path(slug), &html)?;
                stats.posts += 1;
            }
            PageProps::NotFound => {
                tracing::warn!("Listed slug {} has no post, skipping", slug);
                stats.skipped += 1;
            }
        }
    }

    let summaries = blog
        .source()
        .list_posts()
        .await
        .context("Failed to list posts")?;
    let index = blog.renderer().render_index(&summaries)?;
    write_page(public_dir, "index.html", &index)?;

    let not_found = blog.renderer().render_not_found()?;
    write_page(public_dir, "404.html", &not_found)?;

    tracing::info!(
        "Generated {} posts ({} skipped) in {:.2}s",
        stats.posts,
        stats.skipped,
        start.elapsed().as_secs_f64()
    );
    Ok(stats)
}

/// Write a page below `public_dir`, creating parent directories
fn write_page(public_dir: &Path, relative: &str, html: &str) -> Result<()> {
    let path = public_dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
