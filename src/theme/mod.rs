//! Theme module - layouts, includes and their rendering

mod render;
mod resolver;
mod template;

pub use render::{Renderer, Scope};
pub use resolver::TemplateResolver;
pub use template::{Expr, Filter, InsertionPoint, Segment, Template};
