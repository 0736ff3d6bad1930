//! Template view models
//!
//! Every string field is HTML-safe: text is escaped here, `body_html` is
//! produced by the portable text renderer.

use chrono::Local;
use serde::Serialize;

use crate::content::{Author, Comment, ImageRef, PortableTextRenderer, Post, PostSummary};
use crate::helpers::{full_date, html_escape, post_path, time_tag, truncate};
use crate::sanity::ImageUrlBuilder;

const UNKNOWN_AUTHOR: &str = "Unknown author";

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub hero_url: Option<String>,
    pub author_name: String,
    pub author_image_url: Option<String>,
    /// `<time>` element with the locale string
    pub published: String,
    pub body_html: String,
    pub comments: Vec<CommentView>,
}

impl PostView {
    pub fn build(post: &Post, images: &ImageUrlBuilder) -> Self {
        let created = post.created_at.with_timezone(&Local);
        Self {
            id: html_escape(&post.id),
            title: html_escape(&post.title),
            description: html_escape(&post.description),
            hero_url: post
                .main_image
                .as_ref()
                .and_then(|image| image_url(images, image, None)),
            author_name: author_name(post.author.as_ref()),
            author_image_url: author_image(post.author.as_ref(), images),
            published: time_tag(&created),
            body_html: PortableTextRenderer::new(images).render(&post.body),
            comments: post.comments.iter().map(CommentView::build).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub name: String,
    pub comment: String,
}

impl CommentView {
    // email is never rendered
    pub fn build(comment: &Comment) -> Self {
        Self {
            id: html_escape(&comment.id),
            name: html_escape(&comment.name),
            comment: html_escape(&comment.comment),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub path: String,
    pub title: String,
    pub excerpt: String,
    pub hero_url: Option<String>,
    pub author_name: String,
    pub author_image_url: Option<String>,
    pub published_date: String,
}

impl SummaryView {
    pub fn build(post: &PostSummary, images: &ImageUrlBuilder) -> Self {
        Self {
            path: html_escape(&post_path(&post.slug.current)),
            title: html_escape(&post.title),
            excerpt: html_escape(&truncate(&post.description, 120, None)),
            hero_url: post
                .main_image
                .as_ref()
                .and_then(|image| image_url(images, image, Some(600))),
            author_name: author_name(post.author.as_ref()),
            author_image_url: author_image(post.author.as_ref(), images),
            published_date: full_date(&post.created_at.with_timezone(&Local)),
        }
    }
}

fn author_name(author: Option<&Author>) -> String {
    html_escape(author.map(|a| a.name.as_str()).unwrap_or(UNKNOWN_AUTHOR))
}

fn author_image(author: Option<&Author>, images: &ImageUrlBuilder) -> Option<String> {
    author
        .and_then(|a| a.image.as_ref())
        .and_then(|image| image_url(images, image, Some(96)))
}

fn image_url(images: &ImageUrlBuilder, image: &ImageRef, width: Option<u32>) -> Option<String> {
    let builder = images.image(image);
    let builder = match width {
        Some(w) => builder.width(w),
        None => builder,
    };
    match builder.url() {
        Ok(url) => Some(html_escape(&url)),
        Err(e) => {
            tracing::warn!("Skipping image: {}", e);
            None
        }
    }
}
