//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Site;

/// Scaffold `<posts_dir>/YYYY-MM-DD-<slug>.md`; never overwrites
pub fn create_post(site: &Site, title: &str, layout: &str) -> Result<PathBuf> {
    let now = chrono::Utc::now().with_timezone(&site.config.tz());
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Title {:?} has no characters usable in a filename", title);
    }

    fs::create_dir_all(&site.posts_dir)?;
    let file_path = site
        .posts_dir
        .join(format!("{}-{}.md", now.format("%Y-%m-%d"), slug));

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let content = format!(
        "---\ntitle: {}\ndate: {}\nlayout: {}\n---\n",
        yaml_string(title),
        now.format("%Y-%m-%d %H:%M:%S"),
        layout
    );
    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Run the new command
pub fn run(site: &Site, title: &str, layout: Option<&str>) -> Result<PathBuf> {
    let layout = layout.unwrap_or(&site.config.default_layout);
    create_post(site, title, layout)
}

fn yaml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
