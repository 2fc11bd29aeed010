//! List site content

use anyhow::Result;
use std::collections::BTreeMap;

use crate::content::{listing_order, ContentLoader};
use crate::theme::TemplateResolver;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let outcome = ContentLoader::new(site).load(&site.posts_dir);
            let mut posts = outcome.items;
            posts.sort_by(listing_order);

            println!("Posts ({}):", posts.len());
            for post in &posts {
                println!(
                    "  {} - {} ({}) [{}] -> {}",
                    post.date.format("%Y-%m-%d"),
                    post.title,
                    post.layout,
                    post.id(),
                    post.permalink
                );
            }
            if !outcome.failures.is_empty() {
                println!("Skipped ({}):", outcome.failures.len());
                for failure in &outcome.failures {
                    println!("  {}", failure);
                }
            }
            for path in &outcome.unpublished {
                println!("  unpublished: {}", path.display());
            }
        }
        "layout" | "layouts" => {
            let resolver = TemplateResolver::load(&site.layouts_dir, &site.includes_dir)?;
            println!("Layouts:");
            for name in resolver.layout_names() {
                match resolver.resolve_chain(name, name) {
                    Ok(chain) => {
                        let names: Vec<_> = chain.iter().map(|t| t.name.as_str()).collect();
                        println!("  {}", names.join(" -> "));
                    }
                    Err(e) => println!("  {} (broken: {})", name, e),
                }
            }
            println!("Includes:");
            for name in resolver.include_names() {
                println!("  {}", name);
            }
        }
        "tag" | "tags" | "category" | "categories" => {
            let outcome = ContentLoader::new(site).load(&site.posts_dir);
            let tags = content_type.starts_with("tag");
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for post in &outcome.items {
                let values = if tags {
                    &post.front_matter.tags
                } else {
                    &post.front_matter.categories
                };
                for value in values {
                    *counts.entry(value.clone()).or_insert(0) += 1;
                }
            }

            let label = if tags { "Tags" } else { "Categories" };
            println!("{} ({}):", label, counts.len());
            let mut counts: Vec<_> = counts.into_iter().collect();
            counts.sort_by(|a, b| b.1.cmp(&a.1));
            for (name, count) in counts {
                println!("  {} ({})", name, count);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, layout, tag, category",
                content_type
            );
        }
    }

    Ok(())
}
