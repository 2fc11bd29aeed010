//! Content item model

use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;

use super::FrontMatter;

/// A post loaded from the content source. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Source file path relative to the site source
    pub source: PathBuf,

    /// Parsed front-matter (ordered mapping plus typed known keys)
    pub front_matter: FrontMatter,

    /// Resolved title (front-matter, or derived from the filename)
    pub title: String,

    /// Resolved publication date
    pub date: DateTime<FixedOffset>,

    /// Layout name to wrap this item with
    pub layout: String,

    /// URL-friendly name
    pub slug: String,

    /// Raw body text after the front-matter block
    pub raw: String,

    /// Site-relative URL path, e.g. `/2024/01/15/hello/`
    pub permalink: String,
}

impl ContentItem {
    /// Identity used in reports and error attribution
    pub fn id(&self) -> String {
        self.source.to_string_lossy().to_string()
    }

    /// Filename used as the ordering tie-break
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Whether the body should be run through the markdown renderer
    pub fn is_markdown(&self) -> bool {
        self.source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == "md" || e == "markdown")
            .unwrap_or(false)
    }
}

/// Order for listings: newest first, then filename
pub fn listing_order(a: &ContentItem, b: &ContentItem) -> std::cmp::Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| a.file_name().cmp(&b.file_name()))
        .then_with(|| a.source.cmp(&b.source))
}

/// Expand a permalink pattern for a post
pub fn expand_permalink(
    pattern: &str,
    date: &DateTime<FixedOffset>,
    slug: &str,
    categories: &[String],
) -> String {
    let categories = categories
        .iter()
        .map(|c| slug::slugify(c))
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    let result = pattern
        .replace(":year", &date.format("%Y").to_string())
        .replace(":i_month", &date.format("%-m").to_string())
        .replace(":i_day", &date.format("%-d").to_string())
        .replace(":month", &date.format("%m").to_string())
        .replace(":day", &date.format("%d").to_string())
        .replace(":categories", &categories)
        .replace(":title", slug)
        .replace(":slug", slug);

    normalize_path(&result)
}

/// Collapse duplicate slashes and make the path absolute
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push_str(segment);
        out.push('/');
    }
    // Keep file-style permalinks (`/about.html`) without the trailing slash
    if !path.ends_with('/') && out.len() > 1 {
        out.pop();
    }
    out
}

/// True when no segment of `path` is `.` or `..`, so it stays below the output root
pub fn is_contained_path(path: &str) -> bool {
    path.split(['/', '\\']).all(|segment| segment != "." && segment != "..")
}
