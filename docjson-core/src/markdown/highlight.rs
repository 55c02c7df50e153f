//! Fenced code block rewriting, optionally highlighted with syntect.

use super::{html_escape, html_unescape, EventTransform};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// How fenced code blocks are emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeBlockStyle {
    /// Plain escaped code tagged with its language for client-side hooks
    #[default]
    Tagged,
    /// Code pre-tokenized into classed spans
    Highlighted,
}

/// Transformer for fenced code blocks
///
/// The code text is escaped exactly once and never re-indented, so
/// [`extract_code_payload`] recovers it byte-for-byte.
pub struct CodeBlockTransformer {
    style: CodeBlockStyle,
}

impl CodeBlockTransformer {
    pub fn new(style: CodeBlockStyle) -> Self {
        Self { style }
    }

    fn render_block(&self, code: &str, lang: &str) -> String {
        let body = match self.style {
            CodeBlockStyle::Highlighted if !lang.is_empty() => {
                highlight_code(code, lang).unwrap_or_else(|| html_escape(code))
            }
            _ => html_escape(code),
        };

        if lang.is_empty() {
            format!("<pre><code>{body}</code></pre>\n")
        } else {
            let lang = html_escape(lang);
            format!(
                "<pre class=\"language-{lang}\" data-lang=\"{lang}\"><code class=\"language-{lang}\">{body}</code></pre>\n"
            )
        }
    }
}

impl Default for CodeBlockTransformer {
    fn default() -> Self {
        Self::new(CodeBlockStyle::default())
    }
}

impl EventTransform for CodeBlockTransformer {
    fn transform<'a>(&mut self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut result = Vec::with_capacity(events.len());
        let mut code_lang: Option<String> = None;
        let mut code_content = String::new();

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    let lang = info.split_whitespace().next().unwrap_or_default();
                    code_lang = Some(lang.to_string());
                    code_content.clear();
                }
                Event::Text(text) if code_lang.is_some() => {
                    code_content.push_str(&text);
                }
                Event::End(TagEnd::CodeBlock) if code_lang.is_some() => {
                    let lang = code_lang.take().unwrap_or_default();
                    let markup = self.render_block(&code_content, &lang);
                    result.push(Event::Html(CowStr::from(markup)));
                }
                other => result.push(other),
            }
        }

        result
    }
}

fn highlight_code(code: &str, lang: &str) -> Option<String> {
    let ss = syntax_set();
    let syntax = ss
        .find_syntax_by_token(lang)
        .or_else(|| ss.find_syntax_by_extension(lang))?;

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, ss, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::debug!("Highlighting {} failed, emitting plain code: {}", lang, e);
            return None;
        }
    }
    Some(generator.finalize())
}

/// Recover the code text from markup produced by [`CodeBlockTransformer`].
///
/// Returns `None` when `html` holds no `<code>` element.
pub fn extract_code_payload(html: &str) -> Option<String> {
    let open = html.find("<code")?;
    let body_start = open + html[open..].find('>')? + 1;
    let body_end = body_start + html[body_start..].find("</code>")?;

    let mut text = String::with_capacity(body_end - body_start);
    let mut in_tag = false;
    for c in html[body_start..body_end].chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    Some(html_unescape(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownRenderer;

    fn render(style: CodeBlockStyle, markdown: &str) -> String {
        MarkdownRenderer::new(style).render_simple(markdown)
    }

    #[test]
    fn test_tagged_block_markup() {
        let html = render(CodeBlockStyle::Tagged, "```rust\nfn main() {}\n```\n");
        assert_eq!(
            html,
            "<pre class=\"language-rust\" data-lang=\"rust\"><code class=\"language-rust\">fn main() {}\n</code></pre>\n"
        );
    }

    #[test]
    fn test_info_string_extras_ignored() {
        let html = render(CodeBlockStyle::Tagged, "```ts title=\"a.ts\"\nlet a = 1;\n```\n");
        assert!(html.starts_with("<pre class=\"language-ts\" data-lang=\"ts\">"));
        assert!(!html.contains("title"));
    }

    #[test]
    fn test_block_without_language() {
        let html = render(CodeBlockStyle::Tagged, "```\nplain\n```\n");
        assert_eq!(html, "<pre><code>plain\n</code></pre>\n");
    }

    #[test]
    fn test_payload_round_trip() {
        let code = "if a < b && c > \"d\" {\n\tprintln!('{}', &x);\n}\n    indented &amp; kept\n";
        let markdown = format!("```rust\n{code}```\n");
        let html = render(CodeBlockStyle::Tagged, &markdown);
        assert_eq!(extract_code_payload(&html).as_deref(), Some(code));
    }

    #[test]
    fn test_highlighted_payload_round_trip() {
        let code = "fn main() {\n    let s = \"<tag>\";\n}\n";
        let markdown = format!("```rust\n{code}```\n");
        let html = render(CodeBlockStyle::Highlighted, &markdown);
        assert!(html.contains("<span class="));
        assert!(html.contains("data-lang=\"rust\""));
        assert_eq!(extract_code_payload(&html).as_deref(), Some(code));
    }

    #[test]
    fn test_highlighted_unknown_language_falls_back() {
        let html = render(CodeBlockStyle::Highlighted, "```nosuchlang\na < b\n```\n");
        assert!(html.contains("<code class=\"language-nosuchlang\">a &lt; b\n</code>"));
    }

    #[test]
    fn test_indented_blocks_untouched() {
        let html = render(CodeBlockStyle::Tagged, "    indented code\n");
        assert_eq!(html, "<pre><code>indented code\n</code></pre>\n");
    }

    #[test]
    fn test_inline_code_untouched() {
        let html = render(CodeBlockStyle::Tagged, "Use `a < b` here.");
        assert_eq!(html, "<p>Use <code>a &lt; b</code> here.</p>\n");
    }

    #[test]
    fn test_extract_without_code() {
        assert_eq!(extract_code_payload("<p>none</p>"), None);
    }
}
