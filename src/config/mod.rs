//! Configuration module

mod site;

pub use site::HighlightConfig;
pub use site::PaginationConfig;
pub use site::SeoDefaults;
pub use site::SiteConfig;
