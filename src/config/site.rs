//! Site configuration (_config.yml)

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub lang: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub baseurl: String,
    pub permalink: String,

    // Directory
    pub source: String,
    pub destination: String,
    pub posts_dir: String,
    pub layouts_dir: String,
    pub includes_dir: String,
    #[serde(default)]
    pub exclude: Vec<String>,

    // Writing
    pub default_layout: String,
    pub show_drafts: bool,
    pub excerpt_separator: String,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Pagination
    pub paginate: usize,
    pub paginate_path: String,
    #[serde(default)]
    pub pagination: PaginationConfig,

    // Meta
    #[serde(default)]
    pub seo: SeoDefaults,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Plume".to_string(),
            description: String::new(),
            author: String::new(),
            lang: "en".to_string(),
            timezone: "UTC".to_string(),

            url: "http://example.com".to_string(),
            baseurl: String::new(),
            permalink: "/:year/:month/:day/:title/".to_string(),

            source: ".".to_string(),
            destination: "_site".to_string(),
            posts_dir: "_posts".to_string(),
            layouts_dir: "_layouts".to_string(),
            includes_dir: "_includes".to_string(),
            exclude: Vec::new(),

            default_layout: "post".to_string(),
            show_drafts: false,
            excerpt_separator: "<!-- more -->".to_string(),
            highlight: HighlightConfig::default(),

            paginate: 10,
            paginate_path: "/page/:num/".to_string(),
            pagination: PaginationConfig::default(),

            seo: SeoDefaults::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: SiteConfig = if content.trim().is_empty() {
            SiteConfig::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| Error::config(path, e.to_string()))?
        };
        config.validate(path)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self, path: &Path) -> Result<()> {
        if self.paginate == 0 {
            return Err(Error::config(path, "`paginate` must be greater than 0"));
        }
        if !self.paginate_path.contains(":num") {
            return Err(Error::config(
                path,
                format!("`paginate_path` must contain `:num`, got {:?}", self.paginate_path),
            ));
        }
        if self.permalink.trim().is_empty() {
            return Err(Error::config(path, "`permalink` must not be empty"));
        }
        if self.destination.trim().is_empty() {
            return Err(Error::config(path, "`destination` must not be empty"));
        }
        if self.default_layout.trim().is_empty() {
            return Err(Error::config(path, "`default_layout` must not be empty"));
        }
        if self.timezone.parse::<Tz>().is_err() {
            return Err(Error::config(
                path,
                format!("unknown `timezone` {:?}", self.timezone),
            ));
        }
        for pattern in &self.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                Error::config(path, format!("invalid `exclude` pattern {:?}: {}", pattern, e))
            })?;
        }
        Ok(())
    }

    /// Timezone used to interpret front-matter dates
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }

    /// Compiled `exclude` patterns; invalid ones were rejected by `validate`
    pub fn exclude_patterns(&self) -> Vec<glob::Pattern> {
        self.exclude
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect()
    }
}

/// Listing page settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Layout that wraps each listing page
    pub layout: String,
    /// Include rendered once per item on a listing page
    pub item_include: String,
    /// Link text for `paginator.previous_link` and `paginator.next_link`
    pub previous_label: String,
    pub next_label: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            layout: "home".to_string(),
            item_include: "post-summary.html".to_string(),
            previous_label: "Newer".to_string(),
            next_label: "Older".to_string(),
        }
    }
}

/// Site-wide SEO fallbacks, used only where a page has no value of its own
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoDefaults {
    pub description: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub twitter_username: Option<String>,
    pub locale: Option<String>,
}

/// Code listing highlight configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_numbers: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_numbers: false,
        }
    }
}
