//! Page composer - turns content items and templates into output pages
//!
//! Composition runs in two phases. Per-item pages have no cross-item
//! dependency and are rendered in parallel; listing pages need the final,
//! filtered item list, so they are built afterwards.

mod output;
mod page;
mod pagination;
mod report;
mod seo;

pub use output::{copy_static_files, prepare_destination, write_pages};
pub use page::{output_path_for, Listing, Page, PageKind};
pub use pagination::{page_url, paginate, Paginator, Slot};
pub use report::{Failure, ItemState, RunReport};
pub use seo::SeoMeta;

use rayon::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::SiteConfig;
use crate::content::{listing_order, ContentItem, MarkdownRenderer};
use crate::error::{Error, Result};
use crate::helpers::{date_xml, strip_html};
use crate::theme::{Renderer, Scope, TemplateResolver};

/// Pages produced by a run plus the report describing it
#[derive(Debug, Default)]
pub struct Composition {
    pub pages: Vec<Page>,
    pub report: RunReport,
}

/// A successfully composed item, kept for the listing phase
struct Composed<'i> {
    item: &'i ContentItem,
    page: Page,
    summary: Value,
}

/// Composes pages from content, templates and configuration
pub struct Composer<'a> {
    resolver: &'a TemplateResolver,
    config: &'a SiteConfig,
    markdown: MarkdownRenderer,
}

impl<'a> Composer<'a> {
    pub fn new(resolver: &'a TemplateResolver, config: &'a SiteConfig) -> Self {
        let markdown =
            MarkdownRenderer::with_options(&config.highlight.theme, config.highlight.line_numbers);
        Self {
            resolver,
            config,
            markdown,
        }
    }

    /// Compose every item page, then the listing pages
    pub fn compose(&self, items: &[ContentItem]) -> Composition {
        let mut report = RunReport::default();
        for item in items {
            report.record(item.id(), ItemState::Loaded);
        }

        let results: Vec<(&ContentItem, Result<Composed>)> = items
            .par_iter()
            .map(|item| (item, self.compose_item(item)))
            .collect();

        let mut composed = Vec::with_capacity(results.len());
        for (item, result) in results {
            match result {
                Ok(done) => composed.push(done),
                Err(e) => report.fail(item.id(), e),
            }
        }

        composed.sort_by(|a, b| listing_order(a.item, b.item));
        let composed = self.claim_output_paths(composed, &mut report);
        for done in &composed {
            report.record(done.item.id(), ItemState::Loaded.resolve().compose());
        }
        tracing::info!("Composed {} of {} items", composed.len(), items.len());

        let listings = self.compose_listings(&composed, &mut report);
        report.listing_pages = listings.len();

        let mut pages: Vec<Page> = composed.into_iter().map(|c| c.page).collect();
        pages.extend(listings);

        Composition { pages, report }
    }

    /// Render one item through its layout chain
    fn compose_item<'i>(&self, item: &'i ContentItem) -> Result<Composed<'i>> {
        let id = item.id();
        let chain = self.resolver.resolve_chain(&item.layout, &id)?;

        let (body, excerpt) = if item.is_markdown() {
            (
                self.markdown.render(&item.raw),
                self.markdown.render(MarkdownRenderer::split_excerpt(
                    &item.raw,
                    &self.config.excerpt_separator,
                )),
            )
        } else {
            (
                item.raw.clone(),
                MarkdownRenderer::split_excerpt(&item.raw, &self.config.excerpt_separator)
                    .to_string(),
            )
        };

        let seo = SeoMeta::for_item(item, self.config);
        let summary = item_object(item, &excerpt);
        let scope = Scope::new(self.config)
            .with("page", summary.clone())
            .with_seo(seo.render());
        let html = Renderer::new(self.resolver, &scope, &id).render_chain(&chain, body)?;

        tracing::debug!("Composed {} -> {}", id, item.permalink);
        Ok(Composed {
            item,
            summary,
            page: Page {
                output_path: output_path_for(&item.permalink),
                url: item.permalink.clone(),
                body: html,
                seo,
                kind: PageKind::Item {
                    source: item.source.clone(),
                },
            },
        })
    }

    /// Each output path belongs to one page. Listing pages come first, then
    /// items in listing order; any later claimant fails.
    fn claim_output_paths<'i>(
        &self,
        composed: Vec<Composed<'i>>,
        report: &mut RunReport,
    ) -> Vec<Composed<'i>> {
        let mut owners: HashMap<PathBuf, String> = HashMap::new();
        let mut kept = Vec::with_capacity(composed.len());
        for done in composed {
            let id = done.item.id();
            let path = done.page.output_path.clone();
            match owners.get(&path) {
                Some(owner) => {
                    let owner = owner.clone();
                    report.fail(id.clone(), Error::DuplicateOutput { item: id, path, owner });
                }
                None => {
                    owners.insert(path, id);
                    kept.push(done);
                }
            }
        }

        // Dropping an item can shrink the listing, so repeat until stable
        loop {
            let listing_count = paginate(kept.len(), self.config.paginate).len();
            let reserved: HashMap<PathBuf, usize> = (1..=listing_count)
                .map(|n| (output_path_for(&page_url(self.config, n)), n))
                .collect();
            let (clashing, free): (Vec<_>, Vec<_>) = kept
                .into_iter()
                .partition(|done| reserved.contains_key(&done.page.output_path));
            kept = free;
            if clashing.is_empty() {
                return kept;
            }
            for done in clashing {
                let id = done.item.id();
                let path = done.page.output_path;
                let owner = format!("listing page {}", reserved[&path]);
                report.fail(id.clone(), Error::DuplicateOutput { item: id, path, owner });
            }
        }
    }

    /// Split composed items into listing pages
    fn compose_listings(&self, composed: &[Composed], report: &mut RunReport) -> Vec<Page> {
        let slots = paginate(composed.len(), self.config.paginate);
        if slots.is_empty() {
            return Vec::new();
        }

        let mut pages = Vec::with_capacity(slots.len());
        for slot in &slots {
            let referrer = format!("listing page {}", slot.number);
            match self.compose_listing(slot, composed, &referrer) {
                Ok(page) => pages.push(page),
                Err(e) => report.fail(referrer, e),
            }
        }
        pages
    }

    fn compose_listing(&self, slot: &Slot, composed: &[Composed], referrer: &str) -> Result<Page> {
        let layout = &self.config.pagination.layout;
        let chain = self.resolver.resolve_chain(layout, referrer)?;
        let item_template = self
            .resolver
            .resolve_include(&self.config.pagination.item_include, referrer)?;

        let url = page_url(self.config, slot.number);
        let seo = SeoMeta::for_listing(self.config, slot.number, &url);
        let members = &composed[slot.range.clone()];
        let paginator = Paginator::new(slot, self.config, composed.len());
        let paginator = serde_json::to_value(&paginator).unwrap_or(Value::Null);
        let page_object = json!({
            "title": seo.title,
            "url": url,
            "layout": layout,
        });

        let mut content = String::new();
        for member in members {
            let scope = Scope::new(self.config)
                .with("page", page_object.clone())
                .with("paginator", paginator.clone())
                .with("post", member.summary.clone());
            let renderer = Renderer::new(self.resolver, &scope, referrer);
            content.push_str(&renderer.render(item_template, "")?);
        }

        let posts: Vec<Value> = members.iter().map(|m| m.summary.clone()).collect();
        let scope = Scope::new(self.config)
            .with("page", page_object)
            .with("paginator", with_posts(paginator, posts))
            .with_seo(seo.render());
        let body = Renderer::new(self.resolver, &scope, referrer).render_chain(&chain, content)?;

        Ok(Page {
            output_path: output_path_for(&url),
            url,
            body,
            seo,
            kind: PageKind::Listing(Listing {
                number: slot.number,
                total_pages: slot.total_pages,
                items: members.iter().map(|m| m.item.source.clone()).collect(),
                prev: slot.prev,
                next: slot.next,
            }),
        })
    }
}

/// `compose(contentItems, resolver, config) -> pages + report`
pub fn compose(
    items: &[ContentItem],
    resolver: &TemplateResolver,
    config: &SiteConfig,
) -> Composition {
    Composer::new(resolver, config).compose(items)
}

/// The `page` variable for an item: its front-matter plus computed fields
fn item_object(item: &ContentItem, excerpt_html: &str) -> Value {
    let mut map = Map::new();
    for (key, value) in &item.front_matter.fields {
        map.insert(
            key.clone(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
    }

    map.insert("title".into(), Value::String(item.title.clone()));
    map.insert("date".into(), Value::String(date_xml(&item.date)));
    map.insert("layout".into(), Value::String(item.layout.clone()));
    map.insert("slug".into(), Value::String(item.slug.clone()));
    map.insert("url".into(), Value::String(item.permalink.clone()));
    map.insert("path".into(), Value::String(item.id()));
    map.insert("excerpt".into(), Value::String(excerpt_html.to_string()));
    map.insert(
        "excerpt_text".into(),
        Value::String(strip_html(excerpt_html).trim().to_string()),
    );
    map.insert("tags".into(), json!(item.front_matter.tags));
    map.insert("categories".into(), json!(item.front_matter.categories));
    Value::Object(map)
}

fn with_posts(paginator: Value, posts: Vec<Value>) -> Value {
    match paginator {
        Value::Object(mut map) => {
            map.insert("posts".into(), Value::Array(posts));
            Value::Object(map)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;
    use crate::error::Error;
    use crate::theme::Template;
    use chrono::{FixedOffset, TimeZone};
    use std::path::PathBuf;

    fn item(name: &str, day: u32, layout: &str, front_matter: &str) -> ContentItem {
        let (fm, body) = FrontMatter::parse(front_matter).unwrap();
        ContentItem {
            source: PathBuf::from(format!("_posts/{}.md", name)),
            title: fm.title.clone().unwrap_or_else(|| name.to_string()),
            date: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 1, day, 12, 0, 0)
                .unwrap(),
            layout: layout.to_string(),
            slug: name.to_string(),
            raw: body.to_string(),
            permalink: format!("/2024/01/{:02}/{}/", day, name),
            front_matter: fm,
        }
    }

    fn resolver() -> TemplateResolver {
        let t = |name: &str, text: &str| Template::parse(name, name, text).unwrap();
        TemplateResolver::from_templates(
            vec![
                t("default", "<html><head>{% seo %}</head><body>{{ content }}</body></html>"),
                t(
                    "post",
                    concat!(
                        "---\nlayout: default\n---\n",
                        "<article><h1>{{ page.title }}</h1>{{ content }}</article>"
                    ),
                ),
                t(
                    "home",
                    concat!(
                        "---\nlayout: default\n---\n",
                        "<ul>{{ content }}</ul>{{ paginator.next_page_path }}"
                    ),
                ),
            ],
            vec![t("post-summary.html", "<li>{{ post.title }}</li>")],
        )
        .unwrap()
    }

    fn config(per_page: usize) -> SiteConfig {
        SiteConfig {
            title: "Blog".to_string(),
            paginate: per_page,
            ..Default::default()
        }
    }

    #[test]
    fn test_item_page_is_wrapped_outward_in() {
        let items = vec![item("hello", 1, "post", "---\ntitle: Hello\n---\nBody *text*")];
        let config = config(10);
        let composition = compose(&items, &resolver(), &config);

        let page = &composition.pages[0];
        assert_eq!(page.output_path, PathBuf::from("2024/01/01/hello/index.html"));
        assert!(page.body.starts_with("<html><head><title>Hello | Blog</title>"));
        let tail = concat!(
            "<body><article><h1>Hello</h1><p>Body <em>text</em></p>\n",
            "</article></body></html>"
        );
        assert!(page.body.ends_with(tail));
    }

    #[test]
    fn test_missing_layout_fails_only_that_item() {
        let items = vec![
            item("good", 1, "post", "---\n---\nok"),
            item("bad", 2, "missing", "---\n---\nnope"),
        ];
        let config = config(10);
        let composition = compose(&items, &resolver(), &config);

        assert_eq!(composition.report.composed(), 1);
        assert_eq!(composition.report.states["_posts/bad.md"], ItemState::Failed);
        assert!(matches!(
            composition.report.failures[0].error,
            Error::UnresolvedReference { .. }
        ));
        assert!(composition.pages.iter().all(|p| match &p.kind {
            PageKind::Item { source } => source != &PathBuf::from("_posts/bad.md"),
            PageKind::Listing(l) => !l.items.contains(&PathBuf::from("_posts/bad.md")),
        }));
    }

    #[test]
    fn test_five_items_two_per_page() {
        let items: Vec<_> = (1..=5)
            .map(|day| item(&format!("p{}", day), day, "post", "---\n---\nx"))
            .collect();
        let config = config(2);
        let composition = compose(&items, &resolver(), &config);

        let listings: Vec<_> = composition.pages.iter().filter_map(Page::listing).collect();
        assert_eq!(listings.len(), 3);
        let names: Vec<Vec<String>> = listings
            .iter()
            .map(|l| {
                l.items
                    .iter()
                    .map(|p| p.file_stem().unwrap().to_string_lossy().to_string())
                    .collect()
            })
            .collect();
        // Newest first
        assert_eq!(names, vec![vec!["p5", "p4"], vec!["p3", "p2"], vec!["p1"]]);
        assert_eq!(listings[0].next, Some(2));
        assert_eq!(listings[2].prev, Some(2));
        assert_eq!(listings[2].next, None);

        let first = composition
            .pages
            .iter()
            .find(|p| p.url == "/")
            .unwrap();
        assert!(first.body.contains("<ul><li>p5</li><li>p4</li></ul>/page/2/"));
        assert_eq!(composition.report.listing_pages, 3);
    }

    #[test]
    fn test_equal_dates_break_ties_by_filename() {
        let items = vec![
            item("b", 3, "post", "---\n---\n"),
            item("a", 3, "post", "---\n---\n"),
        ];
        let config = config(10);
        let composition = compose(&items, &resolver(), &config);
        let listing = composition.pages.iter().find_map(Page::listing).unwrap();
        assert_eq!(
            listing.items,
            vec![PathBuf::from("_posts/a.md"), PathBuf::from("_posts/b.md")]
        );
    }

    #[test]
    fn test_missing_pagination_layout_keeps_item_pages() {
        let config = SiteConfig {
            pagination: crate::config::PaginationConfig {
                layout: "nope".to_string(),
                ..Default::default()
            },
            ..config(1)
        };
        let items = vec![item("a", 1, "post", "---\n---\n"), item("b", 2, "post", "---\n---\n")];
        let composition = compose(&items, &resolver(), &config);

        assert_eq!(composition.pages.len(), 2);
        assert_eq!(composition.report.composed(), 2);
        assert_eq!(composition.report.failures.len(), 2);
        assert_eq!(composition.report.failures[0].source, "listing page 1");
    }

    #[test]
    fn test_colliding_output_paths_keep_the_first_claimant() {
        let mut first = item("a-same", 4, "post", "---\n---\nfirst");
        let mut second = item("b-same", 4, "post", "---\n---\nsecond");
        first.permalink = "/2024/01/04/same/".to_string();
        second.permalink = first.permalink.clone();
        let mut home = item("home", 5, "post", "---\n---\nhome");
        home.permalink = "/".to_string();
        let items = vec![second, home, first];
        let config = config(10);
        let composition = compose(&items, &resolver(), &config);
        let report = &composition.report;

        assert_eq!(report.composed(), 1);
        assert_eq!(report.skipped_by_kind().get("DuplicateOutputError"), Some(&2));
        assert_eq!(report.states["_posts/a-same.md"], ItemState::Composed);
        assert_eq!(report.states["_posts/b-same.md"], ItemState::Failed);
        assert_eq!(report.states["_posts/home.md"], ItemState::Failed);
        assert!(report.failures.iter().any(|f| matches!(
            &f.error,
            Error::DuplicateOutput { owner, .. } if owner == "listing page 1"
        )));
        assert!(report.failures.iter().any(|f| matches!(
            &f.error,
            Error::DuplicateOutput { owner, .. } if owner == "_posts/a-same.md"
        )));

        let mut paths: Vec<_> = composition.pages.iter().map(|p| p.output_path.clone()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), composition.pages.len());
        let index = composition.pages.iter().find(|p| p.url == "/").unwrap();
        assert!(index.body.contains("<ul><li>a-same</li></ul>"));
    }

    #[test]
    fn test_composition_is_deterministic() {
        let items: Vec<_> = (1..=4)
            .map(|day| item(&format!("p{}", day), day, "post", "---\ndescription: d\n---\nx"))
            .collect();
        let config = config(3);
        let resolver = resolver();

        let first = compose(&items, &resolver, &config);
        let second = compose(&items, &resolver, &config);
        let summary = |c: &Composition| -> Vec<(PathBuf, String)> {
            c.pages
                .iter()
                .map(|p| (p.output_path.clone(), p.body.clone()))
                .collect()
        };
        assert_eq!(summary(&first), summary(&second));
    }
}
