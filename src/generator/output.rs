//! Writing pages and static files to the destination directory

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path};
use walkdir::WalkDir;

use super::Page;
use crate::error::{Error, Result};
use crate::Site;

/// Remove and recreate the destination so stale pages never survive a run
pub fn prepare_destination(dest: &Path) -> Result<()> {
    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| Error::io(dest, e))?;
    }
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))
}

/// Write each page at its output path; returns the number written.
/// Output paths must be relative and free of `.`/`..` components.
pub fn write_pages(dest: &Path, pages: &[Page]) -> Result<usize> {
    for page in pages {
        let path = dest.join(&page.output_path);
        let contained = page
            .output_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(Error::io(
                &path,
                io::Error::new(io::ErrorKind::InvalidInput, "page path leaves the destination"),
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&path, &page.body).map_err(|e| Error::io(&path, e))?;
        tracing::debug!("Wrote {:?}", page.output_path);
    }
    Ok(pages.len())
}

/// Copy files that are not content, templates or configuration
pub fn copy_static_files(site: &Site) -> Result<usize> {
    let source = &site.source_dir;
    let exclude = site.config.exclude_patterns();
    let mut copied = 0;

    let walker = WalkDir::new(source)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(is_hidden_or_special(e.file_name().to_string_lossy().as_ref())
                    || e.path().starts_with(&site.destination_dir))
        });

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = path.strip_prefix(source) else {
            continue;
        };
        let relative_str = relative.to_string_lossy();

        if relative_str == "_config.yml" || exclude.iter().any(|p| p.matches(&relative_str)) {
            continue;
        }
        if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("md") | Some("markdown")
        ) {
            continue;
        }
        if has_front_matter(path) {
            tracing::debug!("Not copying {:?}: has front-matter", relative);
            continue;
        }

        let dest = site.destination_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::copy(path, &dest).map_err(|e| Error::io(path, e))?;
        copied += 1;
    }

    tracing::debug!("Copied {} static files", copied);
    Ok(copied)
}

fn is_hidden_or_special(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

fn has_front_matter(path: &Path) -> bool {
    let mut head = [0u8; 3];
    fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut head))
        .map(|_| &head == b"---")
        .unwrap_or(false)
}
