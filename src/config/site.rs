//! Site configuration (_config.yml + environment)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Revalidation window for generated post pages (one day)
pub const DEFAULT_REVALIDATE_SECS: u64 = 86400;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,

    // Sanity
    pub dataset: String,
    pub project_id: String,
    pub api_version: String,
    pub use_cdn: bool,
    /// Write token used for comment mutations
    #[serde(skip_serializing)]
    pub token: Option<String>,

    // Pages
    pub revalidate: u64,
    pub public_dir: String,
    pub comment_endpoint: String,
    /// Secret expected by the on-demand revalidation endpoint; unset disables it
    #[serde(skip_serializing)]
    pub revalidate_secret: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Medium Blog".to_string(),
            description: String::new(),

            dataset: "production".to_string(),
            project_id: String::new(),
            api_version: "2020-03-06".to_string(),
            use_cdn: false,
            token: None,

            revalidate: DEFAULT_REVALIDATE_SECS,
            public_dir: "public".to_string(),
            comment_endpoint: "/api/createComment".to_string(),
            revalidate_secret: None,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path` when it exists, then overlay the process environment
    pub fn from_env_and_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if path.as_ref().exists() {
            Self::load(path.as_ref())?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay environment variables; values found through `lookup` win over the file
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dataset) = lookup("SANITY_DATASET").filter(|v| !v.is_empty()) {
            self.dataset = dataset;
        }
        if let Some(project_id) = lookup("SANITY_PROJECT_ID").filter(|v| !v.is_empty()) {
            self.project_id = project_id;
        }
        if let Some(version) = lookup("SANITY_API_VERSION").filter(|v| !v.is_empty()) {
            self.api_version = version;
        }
        if let Some(token) = lookup("SANITY_API_TOKEN").filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        if let Some(secret) = lookup("REVALIDATE_SECRET").filter(|v| !v.is_empty()) {
            self.revalidate_secret = Some(secret);
        }
        if let Some(env) = lookup("BLOG_ENV") {
            self.use_cdn = env == "production";
        }
    }

    /// Check the fields required to talk to the CMS
    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_empty() {
            bail!("Sanity project id is not set (SANITY_PROJECT_ID or project_id in _config.yml)");
        }
        if !self
            .project_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            bail!("Invalid Sanity project id: {}", self.project_id);
        }
        if self.dataset.is_empty() {
            bail!("Sanity dataset is not set");
        }
        Ok(())
    }
}
