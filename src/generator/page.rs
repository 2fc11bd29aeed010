//! Rendered output pages

use std::path::PathBuf;

use super::seo::SeoMeta;

/// What a page was composed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// A post's own permalink page
    Item { source: PathBuf },
    /// One page of the paginated listing
    Listing(Listing),
}

/// Listing page details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// 1-based page number
    pub number: usize,
    pub total_pages: usize,
    /// Sources of the items on this page, in listing order
    pub items: Vec<PathBuf>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

/// A rendered page, identified by its output path
#[derive(Debug, Clone)]
pub struct Page {
    /// Output path relative to the destination directory
    pub output_path: PathBuf,
    /// Site-relative URL
    pub url: String,
    pub body: String,
    pub seo: SeoMeta,
    pub kind: PageKind,
}

impl Page {
    pub fn listing(&self) -> Option<&Listing> {
        match &self.kind {
            PageKind::Listing(listing) => Some(listing),
            PageKind::Item { .. } => None,
        }
    }
}

/// Where a URL lives on disk: `/a/b/` -> `a/b/index.html`, `/a.html` -> `a.html`
pub fn output_path_for(url: &str) -> PathBuf {
    let trimmed = url.trim_start_matches('/');
    if trimmed.is_empty() || url.ends_with('/') {
        PathBuf::from(trimmed).join("index.html")
    } else if trimmed.ends_with(".html") || trimmed.ends_with(".htm") || trimmed.ends_with(".xml") {
        PathBuf::from(trimmed)
    } else {
        PathBuf::from(trimmed).join("index.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for() {
        assert_eq!(output_path_for("/"), PathBuf::from("index.html"));
        assert_eq!(
            output_path_for("/2024/01/15/hello/"),
            PathBuf::from("2024/01/15/hello/index.html")
        );
        assert_eq!(output_path_for("/about.html"), PathBuf::from("about.html"));
        assert_eq!(output_path_for("/blog/p2"), PathBuf::from("blog/p2/index.html"));
    }
}
