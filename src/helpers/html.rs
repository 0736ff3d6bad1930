//! HTML helper functions

use super::url::safe_href;

/// Classes applied to links inside post bodies
const BODY_LINK_CLASS: &str = "text-blue-500 hover:underline";

/// Generate an anchor tag that opens in a new tab
///
/// # Examples
/// ```ignore
/// external_link("https://x.com", "X") // -> <a href="https://x.com" target="_blank" ...>X</a>
/// ```
pub fn external_link(href: &str, inner_html: &str) -> String {
    format!(
        r#"<a href="{}" target="_blank" rel="noopener" class="{}">{}</a>"#,
        html_escape(&safe_href(href)),
        BODY_LINK_CLASS,
        inner_html
    )
}

/// Generate an image tag
pub fn image_tag(src: &str, alt: &str, class: Option<&str>) -> String {
    let class_attr = class
        .map(|c| format!(r#" class="{}""#, html_escape(c)))
        .unwrap_or_default();

    format!(
        r#"<img src="{}" alt="{}"{}>"#,
        html_escape(src),
        html_escape(alt),
        class_attr
    )
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape text and turn newlines into line breaks
pub fn text_to_html(s: &str) -> String {
    html_escape(s).replace('\n', "<br/>")
}

/// Truncate a string to a specified length
pub fn truncate(s: &str, length: usize, omission: Option<&str>) -> String {
    let omission = omission.unwrap_or("...");

    if s.chars().count() <= length {
        s.to_string()
    } else {
        let truncated: String = s
            .chars()
            .take(length.saturating_sub(omission.len()))
            .collect();
        format!("{}{}", truncated.trim_end(), omission)
    }
}
