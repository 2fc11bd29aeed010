//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SiteConfig;

/// Characters escaped in URL paths; `/` and common path punctuation pass through
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}');

/// Prefix a site path with `baseurl`
///
/// # Examples
/// ```ignore
/// url_for(&config, "/css/style.css") // -> "/blog/css/style.css"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    if is_absolute_url(path) {
        return path.to_string();
    }
    let base = config.baseurl.trim_matches('/');
    let path = encode_path(path.trim_start_matches('/'));

    match (base.is_empty(), path.is_empty()) {
        (true, _) => format!("/{}", path),
        (false, true) => format!("/{}/", base),
        (false, false) => format!("/{}/{}", base, path),
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/about/") // -> "https://example.com/blog/about/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    if is_absolute_url(path) {
        return path.to_string();
    }
    format!("{}{}", config.url.trim_end_matches('/'), url_for(config, path))
}

/// Percent-encode a URL path
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}

fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//")
}
