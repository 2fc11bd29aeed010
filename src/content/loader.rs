//! Content loader - loads posts from the posts directory

use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::frontmatter::parse_date;
use super::item::{expand_permalink, is_contained_path};
use super::{ContentItem, FrontMatter};
use crate::error::Error;
use crate::Site;

lazy_static! {
    static ref DATED_NAME: Regex = Regex::new(r"^(\d{4}-\d{2}-\d{2})-(.+)$").unwrap();
}

/// Everything one pass over the content source produced
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Successfully loaded items, ordered by filename then date
    pub items: Vec<ContentItem>,
    /// Files skipped because they could not be loaded
    pub failures: Vec<Error>,
    /// Files skipped because they are marked `published: false`
    pub unpublished: Vec<PathBuf>,
}

/// Loads content items from a directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    exclude: Vec<glob::Pattern>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        Self {
            site,
            exclude: site.config.exclude_patterns(),
        }
    }

    /// Load every post under `dir`. Bad files are collected, never fatal.
    pub fn load(&self, dir: &Path) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();
        if !dir.exists() {
            tracing::warn!("Content directory {:?} does not exist", dir);
            return outcome;
        }

        for entry in WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_content_file(path) || self.is_excluded(path) {
                continue;
            }

            match self.load_item(path) {
                Ok(item) => {
                    if item.front_matter.published || self.site.config.show_drafts {
                        outcome.items.push(item);
                    } else {
                        tracing::debug!("Skipping unpublished {:?}", item.source);
                        outcome.unpublished.push(item.source);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    outcome.failures.push(e);
                }
            }
        }

        outcome.items.sort_by(|a, b| {
            a.file_name()
                .cmp(&b.file_name())
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.source.cmp(&b.source))
        });

        outcome
    }

    /// Load a single item from a file
    pub fn load_item(&self, path: &Path) -> Result<ContentItem, Error> {
        let source = self.relative(path);
        let content = fs::read_to_string(path).map_err(|e| Error::io(&source, e))?;
        let (fm, body) = FrontMatter::parse(&content).map_err(|msg| Error::parse(&source, msg))?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled");
        let (name_date, name_slug) = match DATED_NAME.captures(stem) {
            Some(caps) => (Some(caps[1].to_string()), caps[2].to_string()),
            None => (None, stem.to_string()),
        };

        let tz = self.site.config.tz();
        let date = match (&fm.date, &name_date) {
            (Some(declared), _) => parse_date(declared, tz).ok_or_else(|| {
                Error::parse(&source, format!("unrecognized date {:?}", declared))
            })?,
            (None, Some(from_name)) => parse_date(from_name, tz).ok_or_else(|| {
                Error::parse(&source, format!("invalid filename date {:?}", from_name))
            })?,
            (None, None) => {
                return Err(Error::parse(
                    &source,
                    "missing `date` (set it in front-matter or use a YYYY-MM-DD- filename)",
                ))
            }
        };

        let slug = slug::slugify(fm.slug.as_deref().unwrap_or(&name_slug));
        if slug.is_empty() {
            return Err(Error::parse(&source, "cannot derive a slug from the filename"));
        }

        let title = fm
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| titleize(&slug));

        let layout = fm
            .layout
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| self.site.config.default_layout.clone());

        let permalink = match &fm.permalink {
            Some(explicit) => super::item::normalize_path(explicit),
            None => expand_permalink(&self.site.config.permalink, &date, &slug, &fm.categories),
        };
        if !is_contained_path(&permalink) {
            return Err(Error::parse(
                &source,
                format!("permalink {:?} must not contain `.` or `..` segments", permalink),
            ));
        }

        Ok(ContentItem {
            source,
            title,
            date,
            layout,
            slug,
            raw: body.to_string(),
            permalink,
            front_matter: fm,
        })
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.site.source_dir)
            .unwrap_or(path)
            .to_path_buf()
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = self.relative(path);
        self.exclude.iter().any(|p| p.matches_path(&relative))
    }
}

/// Check if a file is a content file
pub fn is_content_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.') || n.starts_with('~'))
        .unwrap_or(true);
    !hidden
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == "md" || e == "markdown" || e == "html")
            .unwrap_or(false)
}

/// `hello-world` -> `Hello World`
fn titleize(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn site_with(config: SiteConfig) -> (TempDir, Site) {
        let dir = TempDir::new().unwrap();
        let site = Site::with_config(dir.path(), config);
        fs::create_dir_all(&site.posts_dir).unwrap();
        (dir, site)
    }

    fn write(site: &Site, name: &str, content: &str) {
        fs::write(site.posts_dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_post_with_fallbacks() {
        let (_dir, site) = site_with(SiteConfig::default());
        write(&site, "2024-02-10-either-monad.md", "---\ntags: fp\n---\nBody");

        let outcome = ContentLoader::new(&site).load(&site.posts_dir);
        assert!(outcome.failures.is_empty());
        let item = &outcome.items[0];
        assert_eq!(item.title, "Either Monad");
        assert_eq!(item.layout, "post");
        assert_eq!(item.slug, "either-monad");
        assert_eq!(item.permalink, "/2024/02/10/either-monad/");
        assert_eq!(item.source, PathBuf::from("_posts/2024-02-10-either-monad.md"));
        assert_eq!(item.raw, "Body");
    }

    #[test]
    fn test_front_matter_overrides_filename() {
        let (_dir, site) = site_with(SiteConfig::default());
        write(
            &site,
            "2024-02-10-draft-name.md",
            "---\ntitle: Pipelines\ndate: 2023-12-31 23:00:00\nlayout: wide\nslug: pipes\n---\n",
        );

        let outcome = ContentLoader::new(&site).load(&site.posts_dir);
        let item = &outcome.items[0];
        assert_eq!(item.title, "Pipelines");
        assert_eq!(item.layout, "wide");
        assert_eq!(item.permalink, "/2023/12/31/pipes/");
    }

    #[test]
    fn test_malformed_file_is_skipped_not_fatal() {
        let (_dir, site) = site_with(SiteConfig::default());
        write(&site, "2024-01-01-good.md", "---\ntitle: Good\n---\nok");
        write(&site, "2024-01-02-bad.md", "---\ntitle: [broken\nno closing delimiter");
        write(&site, "2024-01-03-nodelim.md", "just a body");

        let outcome = ContentLoader::new(&site).load(&site.posts_dir);
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome
            .failures
            .iter()
            .all(|e| matches!(e, Error::Parse { .. }) && !e.is_fatal()));
    }

    #[test]
    fn test_missing_date_is_parse_error() {
        let (_dir, site) = site_with(SiteConfig::default());
        write(&site, "undated.md", "---\ntitle: Undated\n---\n");

        let outcome = ContentLoader::new(&site).load(&site.posts_dir);
        assert!(outcome.items.is_empty());
        assert!(outcome.failures[0].to_string().contains("missing `date`"));
    }

    #[test]
    fn test_order_is_reproducible() {
        let (_dir, site) = site_with(SiteConfig::default());
        write(&site, "b.md", "---\ndate: 2024-01-01\n---\n");
        write(&site, "a.md", "---\ndate: 2024-05-01\n---\n");
        write(&site, "c.md", "---\ndate: 2023-01-01\n---\n");

        let loader = ContentLoader::new(&site);
        let slugs = || -> Vec<String> {
            loader
                .load(&site.posts_dir)
                .items
                .into_iter()
                .map(|i| i.slug)
                .collect()
        };
        let first = slugs();
        let second = slugs();
        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unpublished_and_excluded() {
        let config = SiteConfig {
            exclude: vec!["_posts/wip-*".to_string()],
            ..Default::default()
        };
        let (_dir, site) = site_with(config);
        write(&site, "2024-01-01-live.md", "---\n---\n");
        write(&site, "2024-01-02-hidden.md", "---\npublished: false\n---\n");
        write(&site, "wip-notes.md", "not even front-matter");

        let outcome = ContentLoader::new(&site).load(&site.posts_dir);
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.unpublished.len(), 1);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_permalink_with_parent_segments_is_rejected() {
        let (_dir, site) = site_with(SiteConfig::default());
        write(&site, "2024-01-01-up.md", "---\npermalink: /../../escaped/\n---\nx");
        write(&site, "2024-01-02-fine.md", "---\npermalink: /about/\n---\ny");

        let outcome = ContentLoader::new(&site).load(&site.posts_dir);
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].permalink, "/about/");
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0], Error::Parse { .. }));
        assert!(outcome.failures[0].to_string().contains("`..`"));
    }

    #[test]
    fn test_titleize() {
        assert_eq!(titleize("either-monad"), "Either Monad");
        assert_eq!(titleize("a--b"), "A B");
    }
}
