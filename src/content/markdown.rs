//! Markdown to HTML conversion with highlighted code blocks

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

/// Default syntect theme for fenced code blocks
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }

    /// Use a named syntect theme, falling back to the default one
    pub fn with_theme(theme_name: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(theme_name) {
            Some(theme) => theme,
            None => {
                tracing::warn!(
                    "Unknown highlight theme {:?}, using {}",
                    theme_name,
                    DEFAULT_THEME
                );
                themes.remove(DEFAULT_THEME).unwrap_or_default()
            }
        };

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        // Some(lang) while inside a code block
        let mut code_block: Option<Option<String>> = None;
        let mut code = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                            // Info strings like "rust,ignore" carry extra attributes
                            lang.split(|c: char| c == ',' || c.is_whitespace())
                                .next()
                                .map(str::to_string)
                        }
                        _ => None,
                    };
                    code_block = Some(lang);
                    code.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let lang = code_block.take().flatten();
                    events.push(Event::Html(CowStr::from(
                        self.highlight_code(&code, lang.as_deref()),
                    )));
                }
                Event::Text(text) if code_block.is_some() => code.push_str(&text),
                _ if code_block.is_some() => {}
                event => events.push(event),
            }
        }

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let Some(lang) = lang else {
            return format!("<pre><code>{}</code></pre>", html_escape(code));
        };

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        match highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme) {
            Ok(highlighted) => format!(r#"<figure class="highlight {}">{}</figure>"#, lang, highlighted),
            Err(e) => {
                tracing::debug!("Highlighting {} failed: {}", lang, e);
                format!(
                    r#"<pre><code class="language-{}">{}</code></pre>"#,
                    lang,
                    html_escape(code)
                )
            }
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
