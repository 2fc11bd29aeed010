//! plume: composes blog pages from front-matter posts and a layout theme
//!
//! A run loads posts from the content source, resolves each post's layout
//! chain, wraps the rendered body outward through that chain, and splits
//! the post list into paginated listing pages. Every page carries SEO tags
//! derived from the post with site-wide defaults filling the gaps.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod templates;
pub mod theme;

pub use error::{Error, Result};
pub use generator::{compose, Composition, Page, RunReport};

use std::path::{Component, Path, PathBuf};

/// A site rooted at a directory, with its configuration and resolved paths
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory (where `_config.yml` lives)
    pub base_dir: PathBuf,
    /// Content source root
    pub source_dir: PathBuf,
    /// Output directory
    pub destination_dir: PathBuf,
    pub posts_dir: PathBuf,
    pub layouts_dir: PathBuf,
    pub includes_dir: PathBuf,
}

impl Site {
    /// Open the site in `base_dir`, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };

        let site = Self::with_config(base_dir, config);
        site.check_destination()?;
        Ok(site)
    }

    /// Site with an already-loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = if config.source.is_empty() || config.source == "." {
            base_dir.clone()
        } else {
            base_dir.join(&config.source)
        };
        let destination_dir = base_dir.join(&config.destination);
        let posts_dir = source_dir.join(&config.posts_dir);
        let layouts_dir = source_dir.join(&config.layouts_dir);
        let includes_dir = source_dir.join(&config.includes_dir);

        Self {
            config,
            base_dir,
            source_dir,
            destination_dir,
            posts_dir,
            layouts_dir,
            includes_dir,
        }
    }

    /// The destination is wiped on every run; it must not contain the source or the site root
    pub fn check_destination(&self) -> Result<()> {
        let dest = lexical(&self.destination_dir);
        let encloses = |path: &Path| lexical(path).starts_with(&dest);
        if encloses(&self.source_dir) || encloses(&self.base_dir) {
            return Err(Error::config(
                self.base_dir.join("_config.yml"),
                format!(
                    "`destination` {:?} must not be the site root or contain the source",
                    self.config.destination
                ),
            ));
        }
        Ok(())
    }

    /// Initialize a new site in `target_dir`
    pub fn init(target_dir: &Path) -> anyhow::Result<()> {
        commands::init::init_site(target_dir)
    }

    /// Generate the site into the destination directory
    pub fn generate(&self) -> anyhow::Result<RunReport> {
        commands::generate::run(self)
    }

    /// Remove the destination directory
    pub fn clean(&self) -> anyhow::Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str, layout: Option<&str>) -> anyhow::Result<PathBuf> {
        commands::new::run(self, title, layout)
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
