//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters kept as-is in a path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/css/style.css") // -> "/blog/css/style.css"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/about/") // -> "https://example.com/blog/about/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Site path of a post page
pub fn post_path(config: &SiteConfig, id: &str) -> String {
    url_for(config, &format!("post/{}/", post_slug(id)))
}

/// Directory name of a post under `post/`
pub fn post_slug(id: &str) -> String {
    let slug = slug::slugify(id);
    if slug.is_empty() {
        encode_segment(id)
    } else {
        slug
    }
}

/// Site path of the listing after `page` loads (page 1 is the home page)
pub fn listing_path(config: &SiteConfig, page: usize) -> String {
    if page <= 1 {
        url_for(config, "")
    } else {
        url_for(config, &format!("page/{}/", page))
    }
}

/// Percent-encode a single path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}
