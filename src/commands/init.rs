//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::templates::{STARTER_FILES, WELCOME_POST};

/// Write the starter theme, configuration and a sample post into `target_dir`
pub fn init_site(target_dir: &Path) -> Result<()> {
    if target_dir.join("_config.yml").exists() {
        anyhow::bail!("{:?} already contains a _config.yml", target_dir);
    }

    fs::create_dir_all(target_dir)?;
    for (relative, contents) in STARTER_FILES {
        let path = target_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        tracing::debug!("Created: {:?}", path);
    }

    let now = chrono::Utc::now();
    let posts_dir = target_dir.join("_posts");
    fs::create_dir_all(&posts_dir)?;
    fs::write(
        posts_dir.join(format!("{}-welcome.md", now.format("%Y-%m-%d"))),
        WELCOME_POST.replace("{{ date }}", &now.format("%Y-%m-%d %H:%M:%S").to_string()),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Site;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_generate() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        let site = Site::new(dir.path()).unwrap();
        let report = site.generate().unwrap();
        assert!(report.is_clean(), "{}", report);
        assert_eq!(report.composed(), 1);
        assert_eq!(report.listing_pages, 1);

        let index = fs::read_to_string(site.destination_dir.join("index.html")).unwrap();
        assert!(index.contains("<title>My Blog</title>"));
        assert!(index.contains("Welcome</a>"));
        // A single listing page has no neighbours to link to
        assert!(!index.contains("href=\"\""));
        assert!(!index.contains("Newer") && !index.contains("Older"));
        assert!(site.destination_dir.join("assets/main.css").exists());
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();
        assert!(init_site(dir.path()).is_err());
    }
}
