//! Template resolver - the registry of layouts and includes
//!
//! The registry is built once per run. Building it validates that no layout
//! chain and no include chain loops back on itself, and precomputes every
//! layout's composition order (leaf first, root last).

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::Template;
use crate::error::{Error, ReferenceKind, Result};

/// Composition order for a layout, or the ancestor that is missing
#[derive(Debug, Clone)]
enum LayoutChain {
    Complete(Vec<String>),
    Broken { missing: String },
}

/// Registry of layouts and includes, read-only once built
#[derive(Debug, Default)]
pub struct TemplateResolver {
    layouts: BTreeMap<String, Template>,
    includes: BTreeMap<String, Template>,
    chains: HashMap<String, LayoutChain>,
}

impl TemplateResolver {
    /// Scan the layout and include directories
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(layouts_dir: P, includes_dir: Q) -> Result<Self> {
        let layouts = scan(layouts_dir.as_ref(), NameStyle::Stem)?;
        let includes = scan(includes_dir.as_ref(), NameStyle::RelativePath)?;
        tracing::info!(
            "Loaded {} layouts and {} includes",
            layouts.len(),
            includes.len()
        );
        Self::from_templates(layouts, includes)
    }

    /// Build a registry from already-parsed templates
    pub fn from_templates(layouts: Vec<Template>, includes: Vec<Template>) -> Result<Self> {
        let layouts = register(layouts, "layout");
        let includes = register(includes, "include");

        let chains = build_chains(&layouts)?;
        check_include_cycles(&includes)?;

        for (name, chain) in &chains {
            if let LayoutChain::Broken { missing } = chain {
                tracing::warn!("Layout `{}` wraps missing layout `{}`", name, missing);
            }
        }

        Ok(Self {
            layouts,
            includes,
            chains,
        })
    }

    /// Look up a layout by name. `referrer` names who asked, for error attribution.
    pub fn resolve(&self, layout: &str, referrer: &str) -> Result<&Template> {
        self.layouts
            .get(layout)
            .ok_or_else(|| Error::unresolved(referrer, ReferenceKind::Layout, layout))
    }

    /// Look up an include by name; `head` also finds `head.html`
    pub fn resolve_include(&self, include: &str, referrer: &str) -> Result<&Template> {
        self.includes
            .get(include)
            .or_else(|| self.includes.get(&format!("{}.html", include)))
            .ok_or_else(|| Error::unresolved(referrer, ReferenceKind::Include, include))
    }

    /// Layouts to apply for `layout`, innermost first
    pub fn resolve_chain(&self, layout: &str, referrer: &str) -> Result<Vec<&Template>> {
        match self.chains.get(layout) {
            Some(LayoutChain::Complete(names)) => names
                .iter()
                .map(|name| self.resolve(name, referrer))
                .collect(),
            Some(LayoutChain::Broken { missing }) => {
                Err(Error::unresolved(referrer, ReferenceKind::Layout, missing))
            }
            None => Err(Error::unresolved(referrer, ReferenceKind::Layout, layout)),
        }
    }

    pub fn layout_names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    pub fn include_names(&self) -> impl Iterator<Item = &str> {
        self.includes.keys().map(String::as_str)
    }
}

#[derive(Clone, Copy)]
enum NameStyle {
    /// `_layouts/post.html` is `post`
    Stem,
    /// `_includes/social/icons.html` is `social/icons.html`
    RelativePath,
}

/// Key templates by name. The first template with a name wins; `post.html`
/// and `post.md` both answer to `post`, so later ones are dropped loudly.
fn register(templates: Vec<Template>, kind: &str) -> BTreeMap<String, Template> {
    let mut registry: BTreeMap<String, Template> = BTreeMap::new();
    for template in templates {
        match registry.get(&template.name) {
            Some(kept) => tracing::warn!(
                "Ignoring {} {:?}: {} `{}` is already defined by {:?}",
                kind,
                template.source,
                kind,
                template.name,
                kept.source
            ),
            None => {
                registry.insert(template.name.clone(), template);
            }
        }
    }
    registry
}

fn scan(dir: &Path, style: NameStyle) -> Result<Vec<Template>> {
    if !dir.exists() {
        tracing::debug!("Template directory {:?} not found", dir);
        return Ok(Vec::new());
    }

    let mut templates = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(true);
        if hidden {
            continue;
        }

        let relative = path.strip_prefix(dir).unwrap_or(path);
        let name = match style {
            NameStyle::Stem => {
                // Layouts are flat; nested files are not addressable by name
                if relative.components().count() > 1 {
                    continue;
                }
                relative
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default()
            }
            NameStyle::RelativePath => relative.to_string_lossy().replace('\\', "/"),
        };

        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        match Template::parse(&name, path, &text) {
            Ok(template) => templates.push(template),
            Err(message) => {
                // Anything that referenced it will surface as unresolved
                tracing::warn!("Skipping template {:?}: {}", path, message);
            }
        }
    }

    Ok(templates)
}

/// Walk every layout's parent chain once, rejecting cycles
fn build_chains(layouts: &BTreeMap<String, Template>) -> Result<HashMap<String, LayoutChain>> {
    let mut chains = HashMap::with_capacity(layouts.len());

    for name in layouts.keys() {
        let mut chain: Vec<String> = vec![name.clone()];
        let mut current = name;

        let resolved = loop {
            let Some(parent) = layouts.get(current).and_then(|t| t.parent.as_ref()) else {
                break LayoutChain::Complete(chain);
            };
            if let Some(start) = chain.iter().position(|n| n == parent) {
                let mut cycle = chain[start..].to_vec();
                cycle.push(parent.clone());
                return Err(Error::CyclicLayout { chain: cycle });
            }
            if !layouts.contains_key(parent) {
                break LayoutChain::Broken {
                    missing: parent.clone(),
                };
            }
            chain.push(parent.clone());
            current = parent;
        };

        chains.insert(name.clone(), resolved);
    }

    Ok(chains)
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first search over include -> include edges
fn check_include_cycles(includes: &BTreeMap<String, Template>) -> Result<()> {
    fn lookup<'a>(includes: &'a BTreeMap<String, Template>, name: &str) -> Option<&'a Template> {
        includes
            .get(name)
            .or_else(|| includes.get(&format!("{}.html", name)))
    }

    fn visit(
        template: &Template,
        includes: &BTreeMap<String, Template>,
        marks: &mut HashMap<String, Mark>,
        stack: &mut Vec<String>,
    ) -> Result<()> {
        marks.insert(template.name.clone(), Mark::Visiting);
        stack.push(template.name.clone());

        for child in template.includes() {
            let Some(child) = lookup(includes, child) else {
                continue;
            };
            match marks.get(&child.name) {
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|n| n == &child.name).unwrap_or(0);
                    let mut chain = stack[start..].to_vec();
                    chain.push(child.name.clone());
                    return Err(Error::CyclicInclude { chain });
                }
                Some(Mark::Done) => {}
                None => visit(child, includes, marks, stack)?,
            }
        }

        stack.pop();
        marks.insert(template.name.clone(), Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    for template in includes.values() {
        if !marks.contains_key(&template.name) {
            visit(template, includes, &mut marks, &mut Vec::new())?;
        }
    }
    Ok(())
}
