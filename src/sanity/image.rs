//! Image URL builder
//!
//! Turns an image asset reference into a CDN URL. Nothing is downloaded;
//! resizing is requested through query parameters and done by the CDN.

use lazy_static::lazy_static;
use regex::Regex;

use super::error::{ContentError, Result};
use crate::config::SiteConfig;
use crate::content::ImageRef;

const IMAGE_CDN: &str = "https://cdn.sanity.io/images";

lazy_static! {
    // image-<assetId>-<width>x<height>-<format>
    static ref ASSET_REF: Regex =
        Regex::new(r"^image-([A-Za-z0-9]+)-(\d+x\d+)-([a-z0-9]+)$").expect("valid regex");
}

/// Builds CDN URLs for images of one project/dataset
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
}

impl ImageUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(&config.project_id, &config.dataset)
    }

    /// Start building a URL for `source`
    pub fn image<'a>(&'a self, source: &'a ImageRef) -> ImageUrl<'a> {
        ImageUrl {
            builder: self,
            source,
            width: None,
            height: None,
            fit: None,
        }
    }
}

/// A URL under construction
#[derive(Debug, Clone)]
pub struct ImageUrl<'a> {
    builder: &'a ImageUrlBuilder,
    source: &'a ImageRef,
    width: Option<u32>,
    height: Option<u32>,
    fit: Option<String>,
}

impl ImageUrl<'_> {
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn fit(mut self, fit: &str) -> Self {
        self.fit = Some(fit.to_string());
        self
    }

    /// Produce the fully qualified URL
    pub fn url(&self) -> Result<String> {
        let reference = &self.source.asset.reference;
        let caps = ASSET_REF
            .captures(reference)
            .ok_or_else(|| ContentError::InvalidImageRef(reference.clone()))?;

        let mut url = format!(
            "{}/{}/{}/{}-{}.{}",
            IMAGE_CDN,
            self.builder.project_id,
            self.builder.dataset,
            &caps[1],
            &caps[2],
            &caps[3]
        );

        let mut params = Vec::new();
        if let Some(w) = self.width {
            params.push(format!("w={}", w));
        }
        if let Some(h) = self.height {
            params.push(format!("h={}", h));
        }
        if let Some(fit) = &self.fit {
            params.push(format!("fit={}", fit));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }

        Ok(url)
    }
}
