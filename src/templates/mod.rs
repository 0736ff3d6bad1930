//! Page templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping is off: every value
//! placed in a context goes through the view builders in `views`, which
//! escape text and pass pre-rendered HTML through untouched.

mod views;

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{Post, PostSummary};
use crate::helpers::html_escape;
use crate::sanity::ImageUrlBuilder;

pub use views::{CommentView, PostView, SummaryView};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            ("not_found.html", include_str!("theme/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
            (
                "partials/comments.html",
                include_str!("theme/partials/comments.html"),
            ),
            (
                "partials/comment_form.html",
                include_str!("theme/partials/comment_form.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

#[derive(Debug, Clone, Serialize)]
struct SiteData {
    title: String,
    description: String,
}

/// Renders full pages from CMS documents
pub struct PageRenderer {
    templates: TemplateRenderer,
    images: ImageUrlBuilder,
    site: SiteData,
    comment_endpoint: String,
}

impl PageRenderer {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            templates: TemplateRenderer::new()?,
            images: ImageUrlBuilder::from_config(config),
            site: SiteData {
                title: html_escape(&config.title),
                description: html_escape(&config.description),
            },
            comment_endpoint: html_escape(&config.comment_endpoint),
        })
    }

    /// Render a post page
    pub fn render_post(&self, post: &Post) -> Result<String> {
        let view = PostView::build(post, &self.images);
        let mut context = self.base_context();
        context.insert("page_description", &view.description);
        context.insert("post", &view);
        context.insert("comment_endpoint", &self.comment_endpoint);
        self.templates.render("post.html", &context)
    }

    /// Render the home page listing
    pub fn render_index(&self, posts: &[PostSummary]) -> Result<String> {
        let views: Vec<SummaryView> = posts
            .iter()
            .map(|post| SummaryView::build(post, &self.images))
            .collect();
        let mut context = self.base_context();
        context.insert("page_description", &self.site.description);
        context.insert("posts", &views);
        self.templates.render("index.html", &context)
    }

    /// Render the 404 page
    pub fn render_not_found(&self) -> Result<String> {
        let mut context = self.base_context();
        context.insert("page_description", "");
        self.templates.render("not_found.html", &context)
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert(
            "generator",
            concat!("sanity-blog ", env!("CARGO_PKG_VERSION")),
        );
        context
    }
}
