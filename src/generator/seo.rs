//! SEO metadata derivation and tag rendering
//!
//! Values come from the content first. Site-wide defaults only fill gaps.

use serde::Serialize;

use crate::config::SiteConfig;
use crate::content::ContentItem;
use crate::helpers::{date_xml, full_url_for, html_escape};

/// Resolved SEO metadata for one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeoMeta {
    pub title: String,
    pub site_name: String,
    pub description: Option<String>,
    pub canonical_url: String,
    pub image: Option<String>,
    pub author: Option<String>,
    pub locale: Option<String>,
    pub twitter_username: Option<String>,
    pub og_type: &'static str,
    pub published_time: Option<String>,
}

impl SeoMeta {
    /// Metadata for a post page
    pub fn for_item(item: &ContentItem, config: &SiteConfig) -> Self {
        let fm = &item.front_matter;
        let locale = fm
            .fields
            .get("locale")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Self {
            title: item.title.clone(),
            site_name: config.title.clone(),
            description: fallback(fm.description.clone(), site_description(config)),
            canonical_url: full_url_for(config, &item.permalink),
            image: fallback(fm.image.clone(), present(&config.seo.image))
                .map(|i| full_url_for(config, &i)),
            author: fallback(fm.author.clone(), site_author(config)),
            locale: fallback(locale, site_locale(config)),
            twitter_username: present(&config.seo.twitter_username),
            og_type: "article",
            published_time: Some(date_xml(&item.date)),
        }
    }

    /// Metadata for listing page `number` (1-based) at `url`
    pub fn for_listing(config: &SiteConfig, number: usize, url: &str) -> Self {
        let title = if number > 1 {
            format!("Page {}", number)
        } else {
            config.title.clone()
        };

        Self {
            title,
            site_name: config.title.clone(),
            description: site_description(config),
            canonical_url: full_url_for(config, url),
            image: present(&config.seo.image).map(|i| full_url_for(config, &i)),
            author: site_author(config),
            locale: site_locale(config),
            twitter_username: present(&config.seo.twitter_username),
            og_type: "website",
            published_time: None,
        }
    }

    /// `Title | Site`, or just the site name when they match
    pub fn full_title(&self) -> String {
        if self.title.is_empty() || self.title == self.site_name {
            self.site_name.clone()
        } else if self.site_name.is_empty() {
            self.title.clone()
        } else {
            format!("{} | {}", self.title, self.site_name)
        }
    }

    /// The tag block emitted at `{% seo %}`
    pub fn render(&self) -> String {
        let mut tags = vec![
            format!("<title>{}</title>", html_escape(&self.full_title())),
            meta_property("og:title", &self.title),
            meta_property("og:site_name", &self.site_name),
            meta_property("og:type", self.og_type),
            format!(
                r#"<link rel="canonical" href="{}">"#,
                html_escape(&self.canonical_url)
            ),
            meta_property("og:url", &self.canonical_url),
        ];

        if let Some(description) = &self.description {
            tags.push(meta_name("description", description));
            tags.push(meta_property("og:description", description));
        }
        if let Some(locale) = &self.locale {
            tags.push(meta_property("og:locale", locale));
        }
        if let Some(image) = &self.image {
            tags.push(meta_property("og:image", image));
        }
        if let Some(author) = &self.author {
            tags.push(meta_name("author", author));
        }
        if let Some(published) = &self.published_time {
            tags.push(meta_property("article:published_time", published));
        }

        let card = if self.image.is_some() {
            "summary_large_image"
        } else {
            "summary"
        };
        tags.push(meta_name("twitter:card", card));
        if let Some(twitter) = &self.twitter_username {
            tags.push(meta_name(
                "twitter:site",
                &format!("@{}", twitter.trim_start_matches('@')),
            ));
        }

        tags.join("\n")
    }
}

/// Content value wins; the default is used only when content has none
fn fallback(content: Option<String>, default: Option<String>) -> Option<String> {
    content.filter(|v| !v.trim().is_empty()).or(default)
}

fn present(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

fn site_description(config: &SiteConfig) -> Option<String> {
    present(&config.seo.description).or_else(|| non_empty(&config.description))
}

fn site_author(config: &SiteConfig) -> Option<String> {
    present(&config.seo.author).or_else(|| non_empty(&config.author))
}

fn site_locale(config: &SiteConfig) -> Option<String> {
    present(&config.seo.locale).or_else(|| non_empty(&config.lang))
}

fn meta_name(name: &str, content: &str) -> String {
    format!(
        r#"<meta name="{}" content="{}">"#,
        name,
        html_escape(content)
    )
}

fn meta_property(property: &str, content: &str) -> String {
    format!(
        r#"<meta property="{}" content="{}">"#,
        property,
        html_escape(content)
    )
}
