//! HTTP server: post pages, home page and the comment endpoint

use anyhow::Result;
use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::comments::{self, CommentForm, CreateCommentError};
use crate::helpers::{is_valid_slug, post_path};
use crate::Blog;

/// Server state
struct ServerState {
    blog: Arc<Blog>,
}

/// Build the application router
pub fn router(blog: Arc<Blog>) -> Router {
    let state = Arc::new(ServerState { blog });

    Router::new()
        .route("/", get(index_handler))
        .route("/post/:slug", get(post_handler))
        .route("/api/createComment", post(create_comment_handler))
        .route("/api/revalidate/:slug", post(revalidate_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Prewarm the page cache and start serving
pub async fn start(blog: Arc<Blog>, ip: &str, port: u16) -> Result<()> {
    match blog.prewarm().await {
        Ok(count) => tracing::info!("Cached {} post pages", count),
        // unknown slugs still render on demand
        Err(e) => tracing::warn!("Could not prewarm post pages: {:#}", e),
    }

    let app = router(blog);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Home page
async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    match state.blog.render_index().await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render home page: {:#}", e);
            server_error()
        }
    }
}

/// Post page; unknown slugs are generated on demand
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    if !is_valid_slug(&slug) {
        return not_found(&state.blog);
    }

    match state.blog.render_post(&slug).await {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => not_found(&state.blog),
        Err(e) => {
            tracing::error!("Failed to generate post {}: {:#}", slug, e);
            server_error()
        }
    }
}

/// Forward a comment to the CMS for moderation
async fn create_comment_handler(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let form: CommentForm = match serde_json::from_slice(&body) {
        Ok(form) => form,
        Err(e) => {
            tracing::debug!("Rejected comment body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Invalid comment body" })),
            )
                .into_response();
        }
    };

    match comments::create_comment(state.blog.source(), &form).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Comment submitted" })),
        )
            .into_response(),
        Err(CreateCommentError::Invalid(errors)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid comment", "errors": errors })),
        )
            .into_response(),
        Err(CreateCommentError::Content(e)) => {
            tracing::error!("Couldn't submit comment: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Couldn't submit comment" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RevalidateQuery {
    secret: Option<String>,
}

/// Drop one cached page so the next request fetches it again
async fn revalidate_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    Query(query): Query<RevalidateQuery>,
) -> Response {
    let Some(expected) = state.blog.config.revalidate_secret.as_deref() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if query.secret.as_deref() != Some(expected) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid token" })),
        )
            .into_response();
    }

    let revalidated = state.blog.cache().invalidate(&slug).await;
    tracing::info!("On-demand revalidation of {} (cached: {})", slug, revalidated);
    Json(json!({ "revalidated": revalidated })).into_response()
}

/// Serve files from the public directory
///
/// Post pages are always rendered through the cache; generated copies
/// under `post/` are never served.
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    if let Some(rest) = request.uri().path().strip_prefix("/post/") {
        let slug = rest.strip_suffix("index.html").unwrap_or(rest).trim_end_matches('/');
        if is_valid_slug(slug) {
            return Redirect::permanent(&post_path(slug)).into_response();
        }
        return not_found(&state.blog);
    }

    let mut service = ServeDir::new(&state.blog.public_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => not_found(&state.blog),
        Ok(response) => response.into_response(),
        Err(_) => server_error(),
    }
}

fn not_found(blog: &Blog) -> Response {
    match blog.renderer().render_not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render 404 page: {:#}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::test_helpers::FakeSource;
    use std::path::PathBuf;

    struct TestServer {
        base: String,
        source: Arc<FakeSource>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            self.handle.abort();
        }
    }

    async fn spawn(source: FakeSource, secret: Option<&str>) -> TestServer {
        let dir = std::env::temp_dir().join("sanity-blog-server-tests-missing");
        spawn_in(source, secret, dir).await
    }

    async fn spawn_in(source: FakeSource, secret: Option<&str>, dir: PathBuf) -> TestServer {
        let source = Arc::new(source);
        let config = SiteConfig {
            project_id: "proj".to_string(),
            revalidate_secret: secret.map(str::to_string),
            ..Default::default()
        };
        let blog = Blog::with_source(config, dir, source.clone()).unwrap();
        let app = router(Arc::new(blog));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base: format!("http://{}", addr),
            source,
            handle,
        }
    }

    #[tokio::test]
    async fn test_post_page_served_and_cached() {
        let server = spawn(FakeSource::with_posts(&["alpha"]), None).await;
        let client = reqwest::Client::new();

        for _ in 0..2 {
            let response = client
                .get(format!("{}/post/alpha", server.base))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
            assert!(response.text().await.unwrap().contains("Post alpha"));
        }
        assert_eq!(server.source.post_queries(), 1);
    }

    #[tokio::test]
    async fn test_unknown_post_is_404() {
        let server = spawn(FakeSource::with_posts(&["alpha"]), None).await;
        let response = reqwest::get(format!("{}/post/nope", server.base))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        assert!(response
            .text()
            .await
            .unwrap()
            .contains("This page could not be found"));
    }

    #[tokio::test]
    async fn test_cms_failure_is_500() {
        let source = FakeSource::with_posts(&["alpha"]);
        source.set_failing(true);
        let server = spawn(source, None).await;
        let response = reqwest::get(format!("{}/post/alpha", server.base))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
    }

    #[tokio::test]
    async fn test_home_page_lists_posts() {
        let server = spawn(FakeSource::with_posts(&["alpha", "beta"]), None).await;
        let body = reqwest::get(format!("{}/", server.base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains(r#"href="/post/alpha""#));
        assert!(body.contains(r#"href="/post/beta""#));
    }

    #[tokio::test]
    async fn test_create_comment() {
        let server = spawn(FakeSource::with_posts(&["alpha"]), None).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/createComment", server.base))
            .body(r#"{"_id":"post-alpha","name":"Jane","email":"jane@x.com","comment":"Great post!"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let created = server.source.created_comments();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].post_id, "post-alpha");
        assert_eq!(created[0].name, "Jane");
    }

    #[tokio::test]
    async fn test_create_comment_missing_name() {
        let server = spawn(FakeSource::with_posts(&["alpha"]), None).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/createComment", server.base))
            .json(&json!({ "_id": "post-alpha", "email": "jane@x.com", "comment": "Hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["errors"]["name"], "Name Field is required");
        assert!(server.source.created_comments().is_empty());
    }

    #[tokio::test]
    async fn test_create_comment_bad_json() {
        let server = spawn(FakeSource::default(), None).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/createComment", server.base))
            .body("not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_create_comment_cms_failure() {
        let source = FakeSource::default();
        source.set_failing(true);
        let server = spawn(source, None).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/createComment", server.base))
            .json(&json!({ "_id": "p", "name": "Jane", "email": "jane@x.com", "comment": "Hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
    }

    #[tokio::test]
    async fn test_form_submission_round_trip() {
        use crate::comments::{CommentSubmission, HttpCommentSink, SubmitError};

        let server = spawn(FakeSource::with_posts(&["alpha"]), None).await;
        let sink = HttpCommentSink::new(format!("{}/api/createComment", server.base));
        let form = CommentForm::new("post-alpha", "Jane", "jane@x.com", "Hello");

        let mut submission = CommentSubmission::new();
        submission.submit(&form, &sink).await.unwrap();
        assert!(submission.is_submitted());
        assert_eq!(server.source.created_comments().len(), 1);

        server.source.set_failing(true);
        let mut retry = CommentSubmission::new();
        let err = retry.submit(&form, &sink).await.unwrap_err();
        assert!(matches!(err, SubmitError::Rejected(500)));
        assert!(!retry.is_submitted());
    }

    #[tokio::test]
    async fn test_generated_post_copies_redirect_to_live_page() {
        let dir = tempfile::TempDir::new().unwrap();
        let public = dir.path().join("public");
        fs_write(&public.join("post/alpha/index.html"), "stale copy");
        fs_write(&public.join("robots.txt"), "User-agent: *");

        let server = spawn_in(
            FakeSource::with_posts(&["alpha"]),
            None,
            dir.path().to_path_buf(),
        )
        .await;
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        for path in ["/post/alpha/", "/post/alpha/index.html"] {
            let response = client
                .get(format!("{}{}", server.base, path))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 308, "{}", path);
            assert_eq!(response.headers()["location"], "/post/alpha");
        }

        let response = client
            .get(format!("{}/post/a/b/c", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        let robots = client
            .get(format!("{}/robots.txt", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(robots.status(), 200);
        assert_eq!(robots.text().await.unwrap(), "User-agent: *");
    }

    fn fs_write(path: &std::path::Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_revalidate_endpoint() {
        let server = spawn(FakeSource::with_posts(&["alpha"]), Some("s3cret")).await;
        let client = reqwest::Client::new();

        client
            .get(format!("{}/post/alpha", server.base))
            .send()
            .await
            .unwrap();

        let denied = client
            .post(format!("{}/api/revalidate/alpha?secret=wrong", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(denied.status(), 401);

        let body: serde_json::Value = client
            .post(format!("{}/api/revalidate/alpha?secret=s3cret", server.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["revalidated"], true);

        client
            .get(format!("{}/post/alpha", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(server.source.post_queries(), 2);
    }

    #[tokio::test]
    async fn test_revalidate_disabled_without_secret() {
        let server = spawn(FakeSource::default(), None).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/revalidate/alpha", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}
