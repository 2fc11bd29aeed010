//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::helpers::html_escape;

/// Markdown renderer with syntax highlighting for fenced code listings
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", false)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            line_numbers,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        // Front-matter is stripped before this point, so no metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) => lang
                            .split_whitespace()
                            .next()
                            .filter(|l| !l.is_empty())
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let highlighted =
                        self.highlight_code(&code_block_content, code_block_lang.as_deref());
                    events.push(Event::Html(CowStr::from(highlighted)));
                    in_code_block = false;
                    code_block_lang = None;
                }
                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(highlighted) if self.line_numbers => self.add_line_numbers(&highlighted, lang),
            Some(highlighted) => format!(
                r#"<figure class="highlight {}">{}</figure>"#,
                html_escape(lang),
                highlighted
            ),
            None => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                html_escape(lang),
                html_escape(code)
            ),
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, code: &str, lang: &str) -> String {
        let gutter = (1..=code.lines().count())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            concat!(
                r#"<figure class="highlight {}"><table><tr>"#,
                r#"<td class="gutter"><pre>{}</pre></td><td class="code">{}</td>"#,
                r#"</tr></table></figure>"#
            ),
            html_escape(lang),
            gutter,
            code
        )
    }

    /// Markdown for the excerpt: text before `separator`, or the first paragraph
    pub fn split_excerpt<'a>(content: &'a str, separator: &str) -> &'a str {
        if !separator.is_empty() {
            if let Some(pos) = content.find(separator) {
                return content[..pos].trim();
            }
        }
        let content = content.trim_start();
        match content.find("\n\n") {
            Some(pos) => content[..pos].trim_end(),
            None => content.trim_end(),
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
