//! Article title handling
//!
//! Titles are the node identity throughout the crawl. This module decides which
//! titles are articles worth following and derives the human-facing label and
//! canonical article URL used in the final export.

use url::Url;

/// Separator between a namespace prefix and the page name (`Category:Physics`)
pub const NAMESPACE_SEPARATOR: char = ':';

/// Returns true if the title refers to a non-article page (category, talk, file, ...)
///
/// Detection is purely lexical: any `:` in the title marks it as namespaced. This
/// also drops the handful of main-namespace articles that contain a colon, which the
/// crawl accepts.
pub fn is_namespaced(title: &str) -> bool {
    title.contains(NAMESPACE_SEPARATOR)
}

/// Returns true if the title should be recorded and followed
pub fn is_article(title: &str) -> bool {
    !title.trim().is_empty() && !is_namespaced(title)
}

/// Derives the display label for a title (underscores become spaces)
pub fn display_label(title: &str) -> String {
    title.replace('_', " ")
}

/// Builds the canonical article URL for a title
///
/// Spaces become underscores and the title is pushed as a single percent-encoded path
/// segment, so `AC/DC` stays one segment.
///
/// # Example
///
/// ```
/// use url::Url;
/// use wikigraph::title::article_url;
///
/// let base = Url::parse("https://en.wikipedia.org/wiki/").unwrap();
/// assert_eq!(
///     article_url(&base, "Albert Einstein"),
///     "https://en.wikipedia.org/wiki/Albert_Einstein"
/// );
/// ```
pub fn article_url(base: &Url, title: &str) -> String {
    let segment = title.replace(' ', "_");
    let mut url = base.clone();

    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments.pop_if_empty().push(&segment);
        }
        // cannot-be-a-base URLs are rejected by config validation
        Err(()) => return format!("{}{}", base, segment),
    }

    url.to_string()
}
