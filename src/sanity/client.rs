//! HTTP client for the Sanity query and mutation APIs

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::{ContentError, Result};
use super::query;
use super::ContentSource;
use crate::comments::NewComment;
use crate::config::SiteConfig;
use crate::content::{PostSummary, Slug};

/// Response envelope of the query endpoint
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct SlugRow {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    slug: Option<Slug>,
}

/// Sanity API client
///
/// Reads go through the CDN host when `use_cdn` is set; writes always
/// use the live API host.
#[derive(Debug, Clone)]
pub struct SanityClient {
    http: reqwest::Client,
    project_id: String,
    dataset: String,
    api_version: String,
    use_cdn: bool,
    token: Option<String>,
    base_url: Option<String>,
}

impl SanityClient {
    /// Create a client from the site configuration
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sanity-blog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ContentError::Client)?;

        Ok(Self {
            http,
            project_id: config.project_id.clone(),
            dataset: config.dataset.clone(),
            api_version: config.api_version.clone(),
            use_cdn: config.use_cdn,
            token: config.token.clone(),
            base_url: None,
        })
    }

    /// Send every request to `base_url` instead of the Sanity hosts
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Run a read-only query and decode its `result`
    pub async fn fetch<T>(&self, query: &str, params: &[(&str, Value)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.query_url();
        let mut pairs: Vec<(String, String)> = vec![("query".to_string(), query.to_string())];
        for (name, value) in params {
            pairs.push((format!("${}", name), value.to_string()));
        }

        tracing::debug!("Querying {} with {} params", url, params.len());

        let mut request = self.http.get(&url).query(&pairs);
        if let (Some(token), false) = (&self.token, self.use_cdn) {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| ContentError::Http {
            url: url.clone(),
            source,
        })?;
        let body = read_body(&url, response).await?;

        let envelope: QueryResponse<T> = serde_json::from_str(&body)?;
        Ok(envelope.result)
    }

    /// Create one document through the mutation API
    pub async fn create(&self, document: Value) -> Result<()> {
        let token = self.token.as_ref().ok_or(ContentError::MissingToken)?;
        let url = self.mutate_url();
        let payload = json!({ "mutations": [{ "create": document }] });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|source| ContentError::Http {
                url: url.clone(),
                source,
            })?;
        read_body(&url, response).await?;

        tracing::debug!("Created document through {}", url);
        Ok(())
    }

    // URL construction helpers
    fn host(&self, cdn: bool) -> String {
        match &self.base_url {
            Some(base) => base.clone(),
            None => format!(
                "https://{}.{}.sanity.io",
                self.project_id,
                if cdn { "apicdn" } else { "api" }
            ),
        }
    }

    fn query_url(&self) -> String {
        format!(
            "{}/v{}/data/query/{}",
            self.host(self.use_cdn),
            self.api_version,
            self.dataset
        )
    }

    fn mutate_url(&self) -> String {
        format!(
            "{}/v{}/data/mutate/{}",
            self.host(false),
            self.api_version,
            self.dataset
        )
    }
}

/// Read a response body, turning non-2xx statuses into errors
async fn read_body(url: &str, response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await.map_err(|source| ContentError::Http {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(ContentError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

#[async_trait]
impl ContentSource for SanityClient {
    async fn list_slugs(&self) -> Result<Vec<String>> {
        let rows: Vec<SlugRow> = self.fetch(query::ALL_SLUGS, &[]).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row.slug {
                Some(slug) if !slug.current.is_empty() => Some(slug.current),
                _ => {
                    tracing::debug!("Post {} has no slug, skipping", row.id);
                    None
                }
            })
            .collect())
    }

    async fn list_posts(&self) -> Result<Vec<PostSummary>> {
        let documents: Vec<Value> = self.fetch(query::ALL_POSTS, &[]).await?;
        Ok(PostSummary::from_documents(documents))
    }

    async fn fetch_post_document(&self, slug: &str) -> Result<Value> {
        self.fetch(query::POST_BY_SLUG, &[("slug", Value::from(slug))])
            .await
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<()> {
        self.create(comment.to_document()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SiteConfig {
        SiteConfig {
            project_id: "abc123".to_string(),
            dataset: "production".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_urls() {
        let client = SanityClient::new(&config()).unwrap();
        assert_eq!(
            client.query_url(),
            "https://abc123.api.sanity.io/v2020-03-06/data/query/production"
        );
        assert_eq!(
            client.mutate_url(),
            "https://abc123.api.sanity.io/v2020-03-06/data/mutate/production"
        );
    }

    #[test]
    fn test_cdn_only_for_reads() {
        let mut config = config();
        config.use_cdn = true;
        let client = SanityClient::new(&config).unwrap();
        assert!(client.query_url().starts_with("https://abc123.apicdn.sanity.io/"));
        assert!(client.mutate_url().starts_with("https://abc123.api.sanity.io/"));
    }

    #[test]
    fn test_base_url_override() {
        let client = SanityClient::new(&config())
            .unwrap()
            .with_base_url("http://127.0.0.1:9000/");
        assert_eq!(
            client.query_url(),
            "http://127.0.0.1:9000/v2020-03-06/data/query/production"
        );
    }

    #[tokio::test]
    async fn test_create_requires_token() {
        let client = SanityClient::new(&config()).unwrap();
        let err = client.create(json!({ "_type": "comment" })).await.unwrap_err();
        assert!(matches!(err, ContentError::MissingToken));
    }
}
