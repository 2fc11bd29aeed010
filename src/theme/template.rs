//! Template model and tag parsing
//!
//! Templates understand a small Liquid-like syntax:
//! - `{{ content }}` marks where the wrapped child content goes
//! - `{% include name.html %}` embeds an include
//! - `{% seo %}` marks where the SEO tag block goes
//! - `{{ page.title | escape }}` looks up a variable, with optional filters
//! - `{{ "/about/" | relative_url }}` filters a quoted literal
//!
//! Any other `{% ... %}` tag is emitted verbatim.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::content::FrontMatter;

lazy_static! {
    static ref TAG: Regex =
        Regex::new(r"(?s)\{\{-?\s*(.*?)\s*-?\}\}|\{%-?\s*(.*?)\s*-?%\}").unwrap();
}

/// A named place in a template where something else is substituted
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum InsertionPoint {
    Content,
    Include(String),
    Seo,
}

/// A filter applied to a variable, e.g. `date: "%Y"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub arg: Option<String>,
}

/// A variable lookup like `page.title | escape`, or a quoted literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub path: Vec<String>,
    pub literal: Option<String>,
    pub filters: Vec<Filter>,
}

/// Parsed piece of a template body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Content,
    Include(String),
    Seo,
    Variable(Expr),
}

/// A layout or include. Never mutated after load.
#[derive(Debug, Clone)]
pub struct Template {
    /// Registry name (`post` for layouts, `head.html` for includes)
    pub name: String,
    /// File the template was read from
    pub source: PathBuf,
    /// Raw body text after the optional front-matter
    pub raw: String,
    /// Parent layout this one wraps itself in
    pub parent: Option<String>,
    /// Named insertion points found in the body
    pub insertion_points: BTreeSet<InsertionPoint>,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template file's text
    pub fn parse(name: &str, source: impl Into<PathBuf>, text: &str) -> Result<Self, String> {
        let (fm, body) = FrontMatter::parse_optional(text)?;
        let segments = parse_segments(body);

        let insertion_points = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Content => Some(InsertionPoint::Content),
                Segment::Include(n) => Some(InsertionPoint::Include(n.clone())),
                Segment::Seo => Some(InsertionPoint::Seo),
                _ => None,
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            source: source.into(),
            raw: body.to_string(),
            parent: fm.layout.filter(|l| !l.trim().is_empty()),
            insertion_points,
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of includes this template embeds directly
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.insertion_points.iter().filter_map(|p| match p {
            InsertionPoint::Include(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Whether the template has a place for the wrapped child content
    pub fn wraps_content(&self) -> bool {
        self.insertion_points.contains(&InsertionPoint::Content)
    }
}

fn parse_segments(body: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(body) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Text(body[last..whole.start()].to_string()));
        }

        let segment = if let Some(expr) = caps.get(1) {
            parse_output(expr.as_str())
        } else {
            let tag = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            parse_tag(tag).unwrap_or_else(|| Segment::Text(whole.as_str().to_string()))
        };
        push_segment(&mut segments, segment);
        last = whole.end();
    }

    if last < body.len() {
        push_segment(&mut segments, Segment::Text(body[last..].to_string()));
    }
    segments
}

/// Append, merging adjacent text runs
fn push_segment(segments: &mut Vec<Segment>, segment: Segment) {
    if let (Some(Segment::Text(prev)), Segment::Text(next)) = (segments.last_mut(), &segment) {
        prev.push_str(next);
        return;
    }
    segments.push(segment);
}

fn parse_output(expr: &str) -> Segment {
    let mut parts = expr.split('|').map(str::trim);
    let head = parts.next().unwrap_or_default();
    let filters: Vec<Filter> = parts.filter(|p| !p.is_empty()).map(parse_filter).collect();

    if head == "content" && filters.is_empty() {
        return Segment::Content;
    }

    if head.len() >= 2
        && (head.starts_with('"') && head.ends_with('"')
            || head.starts_with('\'') && head.ends_with('\''))
    {
        return Segment::Variable(Expr {
            path: Vec::new(),
            literal: Some(head[1..head.len() - 1].to_string()),
            filters,
        });
    }

    Segment::Variable(Expr {
        literal: None,
        path: head
            .split('.')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        filters,
    })
}

fn parse_filter(raw: &str) -> Filter {
    match raw.split_once(':') {
        Some((name, arg)) => Filter {
            name: name.trim().to_string(),
            arg: Some(unquote(arg.trim()).to_string()),
        },
        None => Filter {
            name: raw.trim().to_string(),
            arg: None,
        },
    }
}

fn parse_tag(tag: &str) -> Option<Segment> {
    let mut words = tag.split_whitespace();
    match words.next()? {
        "include" => {
            let name = unquote(words.next()?);
            (!name.is_empty()).then(|| Segment::Include(name.to_string()))
        }
        "seo" => Some(Segment::Seo),
        _ => None,
    }
}

fn unquote(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layout_with_parent() {
        let text = "---\nlayout: default\n---\n<article>{{ content }}</article>\n";
        let t = Template::parse("post", "_layouts/post.html", text).unwrap();
        assert_eq!(t.parent.as_deref(), Some("default"));
        assert!(t.wraps_content());
        assert_eq!(
            t.segments(),
            &[
                Segment::Text("<article>".into()),
                Segment::Content,
                Segment::Text("</article>\n".into()),
            ]
        );
    }

    #[test]
    fn test_insertion_points() {
        let text = concat!(
            r#"<head>{% seo %}{% include "head.html" %}</head>"#,
            r#"{%- include nav.html -%}{{ content }}"#
        );
        let t = Template::parse("default", "_layouts/default.html", text).unwrap();
        let points: Vec<_> = t.insertion_points.iter().cloned().collect();
        assert_eq!(
            points,
            vec![
                InsertionPoint::Content,
                InsertionPoint::Include("head.html".into()),
                InsertionPoint::Include("nav.html".into()),
                InsertionPoint::Seo,
            ]
        );
        assert!(t.parent.is_none());
        assert_eq!(t.includes().collect::<Vec<_>>(), vec!["head.html", "nav.html"]);
    }

    #[test]
    fn test_variables_and_filters() {
        let text = r#"<a href="{{ page.url | relative_url }}">{{ page.date | date: "%Y" }}</a>"#;
        let t = Template::parse("x", "x", text).unwrap();
        match &t.segments()[1] {
            Segment::Variable(expr) => {
                assert_eq!(expr.path, vec!["page", "url"]);
                assert_eq!(expr.filters[0].name, "relative_url");
            }
            other => panic!("unexpected segment {:?}", other),
        }
        match &t.segments()[3] {
            Segment::Variable(expr) => {
                assert_eq!(expr.filters[0].name, "date");
                assert_eq!(expr.filters[0].arg.as_deref(), Some("%Y"));
            }
            other => panic!("unexpected segment {:?}", other),
        }
    }

    #[test]
    fn test_quoted_literal() {
        let t = Template::parse("x", "x", r#"{{ "/assets/main.css" | relative_url }}"#).unwrap();
        match &t.segments()[0] {
            Segment::Variable(expr) => {
                assert!(expr.path.is_empty());
                assert_eq!(expr.literal.as_deref(), Some("/assets/main.css"));
                assert_eq!(expr.filters[0].name, "relative_url");
            }
            other => panic!("unexpected segment {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tags_are_verbatim() {
        let t = Template::parse("x", "x", "a{% if page.title %}b{% endif %}c").unwrap();
        assert_eq!(
            t.segments(),
            &[Segment::Text("a{% if page.title %}b{% endif %}c".into())]
        );
    }
}
