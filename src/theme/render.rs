//! Template rendering: fills insertion points and variables

use serde_json::{Map, Value};

use super::template::{Expr, Filter, Segment};
use super::{Template, TemplateResolver};
use crate::config::SiteConfig;
use crate::error::Result;
use crate::helpers::{date_to_string, format_date_value, full_url_for, html_escape, url_for};

/// Variables visible to a template (`page`, `site`, `paginator`, `post`)
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    config: &'a SiteConfig,
    vars: Map<String, Value>,
    seo: String,
}

impl<'a> Scope<'a> {
    /// Scope with `site` bound to the configuration
    pub fn new(config: &'a SiteConfig) -> Self {
        let mut vars = Map::new();
        vars.insert(
            "site".to_string(),
            serde_json::to_value(config).unwrap_or(Value::Null),
        );
        Self {
            config,
            vars,
            seo: String::new(),
        }
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.vars.insert(name.to_string(), value);
        self
    }

    /// HTML emitted at `{% seo %}`
    pub fn with_seo(mut self, html: String) -> Self {
        self.seo = html;
        self
    }

    /// Dotted lookup; anything missing is `None`
    pub fn lookup(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut value = self.vars.get(first)?;
        for key in rest {
            value = match value {
                Value::Object(map) => map.get(key)?,
                Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(value)
    }
}

/// Renders templates for one page. Errors are attributed to `referrer`.
pub struct Renderer<'a> {
    resolver: &'a TemplateResolver,
    scope: &'a Scope<'a>,
    referrer: &'a str,
}

impl<'a> Renderer<'a> {
    pub fn new(resolver: &'a TemplateResolver, scope: &'a Scope<'a>, referrer: &'a str) -> Self {
        Self {
            resolver,
            scope,
            referrer,
        }
    }

    /// Wrap `content` in each layout of `chain`, innermost first
    pub fn render_chain(&self, chain: &[&Template], content: String) -> Result<String> {
        chain
            .iter()
            .try_fold(content, |inner, layout| self.render(layout, &inner))
    }

    /// Render one template with `content` at its content insertion point
    pub fn render(&self, template: &Template, content: &str) -> Result<String> {
        let mut out = String::with_capacity(template.raw.len() + content.len());

        for segment in template.segments() {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Content => out.push_str(content),
                Segment::Seo => out.push_str(&self.scope.seo),
                Segment::Include(name) => {
                    let include = self.resolver.resolve_include(name, self.referrer)?;
                    out.push_str(&self.render(include, content)?);
                }
                Segment::Variable(expr) => out.push_str(&self.evaluate(expr)),
            }
        }

        Ok(out)
    }

    fn evaluate(&self, expr: &Expr) -> String {
        let value = match &expr.literal {
            Some(literal) => literal.clone(),
            None => self
                .scope
                .lookup(&expr.path)
                .map(value_to_string)
                .unwrap_or_default(),
        };
        expr.filters
            .iter()
            .fold(value, |acc, filter| self.apply_filter(filter, acc))
    }

    fn apply_filter(&self, filter: &Filter, value: String) -> String {
        let config = self.scope.config;
        match filter.name.as_str() {
            "escape" | "xml_escape" => html_escape(&value),
            "relative_url" => url_for(config, &value),
            "absolute_url" => full_url_for(config, &value),
            "date_to_string" => date_to_string(&value).unwrap_or(value),
            "date" => match &filter.arg {
                Some(format) => format_date_value(&value, format).unwrap_or(value),
                None => value,
            },
            other => {
                tracing::debug!("{}: unknown filter `{}` left as a no-op", self.referrer, other);
                value
            }
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null | Value::Object(_) => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn template(name: &str, text: &str) -> Template {
        Template::parse(name, name, text).unwrap()
    }

    fn config() -> SiteConfig {
        SiteConfig {
            title: "Blog".to_string(),
            url: "https://example.com".to_string(),
            baseurl: "/blog".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_chain_wraps_outward() {
        let resolver = TemplateResolver::from_templates(
            vec![
                template("default", "<html>{{ content }}</html>"),
                template("post", "---\nlayout: default\n---\n<article>{{ content }}</article>"),
            ],
            vec![],
        )
        .unwrap();
        let config = config();
        let scope = Scope::new(&config);
        let renderer = Renderer::new(&resolver, &scope, "a.md");

        let chain = resolver.resolve_chain("post", "a.md").unwrap();
        let html = renderer.render_chain(&chain, "<p>hi</p>".to_string()).unwrap();
        assert_eq!(html, "<html><article><p>hi</p></article></html>");
    }

    #[test]
    fn test_variables_includes_and_seo() {
        let resolver = TemplateResolver::from_templates(
            vec![],
            vec![template("title.html", "<h1>{{ page.title | escape }}</h1>")],
        )
        .unwrap();
        let config = config();
        let scope = Scope::new(&config)
            .with("page", json!({"title": "A & B", "url": "/x/", "tags": ["fp", "rust"]}))
            .with_seo("<title>A</title>".to_string());
        let renderer = Renderer::new(&resolver, &scope, "a.md");

        let t = template(
            "t",
            concat!(
                "{% seo %}{% include title.html %}",
                "<a href=\"{{ page.url | absolute_url }}\">{{ site.title }}</a>",
                "{{ page.tags }}{{ page.missing }}"
            ),
        );
        let html = renderer.render(&t, "").unwrap();
        assert_eq!(
            html,
            concat!(
                "<title>A</title><h1>A &amp; B</h1>",
                "<a href=\"https://example.com/blog/x/\">Blog</a>fp, rust"
            )
        );
    }

    #[test]
    fn test_missing_include_is_attributed() {
        let resolver = TemplateResolver::default();
        let config = config();
        let scope = Scope::new(&config);
        let renderer = Renderer::new(&resolver, &scope, "_posts/a.md");

        let err = renderer
            .render(&template("t", "{% include nav.html %}"), "")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnresolvedReference { ref item, .. } if item == "_posts/a.md"
        ));
    }

    #[test]
    fn test_date_filters() {
        let resolver = TemplateResolver::default();
        let config = config();
        let scope = Scope::new(&config).with("page", json!({"date": "2024-03-07T09:00:00+00:00"}));
        let renderer = Renderer::new(&resolver, &scope, "a.md");

        let t = template("t", "{{ page.date | date: \"%Y\" }} {{ page.date | date_to_string }}");
        assert_eq!(renderer.render(&t, "").unwrap(), "2024 07 Mar 2024");
    }
}
