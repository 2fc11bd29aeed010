//! Pagination: splitting the ordered item list into listing pages

use serde::Serialize;
use std::ops::Range;

use crate::config::SiteConfig;
use crate::content::normalize_path;
use crate::helpers::{html_escape, url_for};

/// One listing page's slice of the ordered item list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// 1-based page number
    pub number: usize,
    pub total_pages: usize,
    /// Indices into the ordered item list
    pub range: Range<usize>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

/// Page N holds items `[(N-1)*per_page, N*per_page)`; the last page may be short
pub fn paginate(total_items: usize, per_page: usize) -> Vec<Slot> {
    if per_page == 0 {
        return Vec::new();
    }
    let total_pages = total_items.div_ceil(per_page);

    (1..=total_pages)
        .map(|number| {
            let start = (number - 1) * per_page;
            let end = (start + per_page).min(total_items);
            Slot {
                number,
                total_pages,
                range: start..end,
                prev: (number > 1).then(|| number - 1),
                next: (number < total_pages).then(|| number + 1),
            }
        })
        .collect()
}

/// URL of listing page `number`; page 1 is the site index
pub fn page_url(config: &SiteConfig, number: usize) -> String {
    if number <= 1 {
        "/".to_string()
    } else {
        normalize_path(&config.paginate_path.replace(":num", &number.to_string()))
    }
}

/// The `paginator` template variable
#[derive(Debug, Clone, Serialize)]
pub struct Paginator {
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub previous_page: Option<usize>,
    pub previous_page_path: Option<String>,
    pub next_page: Option<usize>,
    pub next_page_path: Option<String>,
    /// Ready-made `<a>` tags; absent on the first and last page respectively
    pub previous_link: Option<String>,
    pub next_link: Option<String>,
}

impl Paginator {
    pub fn new(slot: &Slot, config: &SiteConfig, total_items: usize) -> Self {
        let labels = &config.pagination;
        let previous_page_path = slot.prev.map(|n| page_url(config, n));
        let next_page_path = slot.next.map(|n| page_url(config, n));
        Self {
            page: slot.number,
            per_page: config.paginate,
            total_pages: slot.total_pages,
            total_items,
            previous_page: slot.prev,
            previous_link: previous_page_path
                .as_deref()
                .map(|path| pager_link(config, "prev", path, &labels.previous_label)),
            previous_page_path,
            next_page: slot.next,
            next_link: next_page_path
                .as_deref()
                .map(|path| pager_link(config, "next", path, &labels.next_label)),
            next_page_path,
        }
    }
}

fn pager_link(config: &SiteConfig, rel: &str, path: &str, label: &str) -> String {
    format!(
        r#"<a class="{rel}" rel="{rel}" href="{}">{}</a>"#,
        html_escape(&url_for(config, path)),
        html_escape(label)
    )
}
