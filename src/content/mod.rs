//! Content module - loads posts and their front-matter

mod frontmatter;
mod item;
pub mod loader;
mod markdown;

pub use frontmatter::{parse_date, split as split_front_matter, FrontMatter};
pub use item::{expand_permalink, is_contained_path, listing_order, normalize_path, ContentItem};
pub use loader::{ContentLoader, LoadOutcome};
pub use markdown::MarkdownRenderer;
