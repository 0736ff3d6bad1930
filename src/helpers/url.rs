//! URL helper functions

/// Route of a post page
///
/// # Examples
/// ```ignore
/// post_path("my-first-post") // -> "/post/my-first-post"
/// ```
pub fn post_path(slug: &str) -> String {
    format!("/post/{}", slug.trim_matches('/'))
}

/// Output file for a post page, relative to the public directory
pub fn post_output_path(slug: &str) -> String {
    format!("post/{}/index.html", slug.trim_matches('/'))
}

/// Check whether a slug can be used as a single path segment
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(['/', '\\', '?', '#'])
        && !slug.chars().any(char::is_control)
}

/// Keep only hrefs with a scheme that is safe to put in a link
pub fn safe_href(href: &str) -> String {
    let trimmed = href.trim();
    let lower = trimmed.to_ascii_lowercase();
    let allowed = ["http://", "https://", "mailto:", "/", "#"]
        .iter()
        .any(|prefix| lower.starts_with(prefix));

    if allowed {
        trimmed.to_string()
    } else {
        "#".to_string()
    }
}
