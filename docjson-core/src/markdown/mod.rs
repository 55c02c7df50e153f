//! Markdown rendering with pluggable event-stream extensions.
//!
//! The renderer parses a body into pulldown-cmark events, threads them
//! through an ordered chain of [`EventTransform`]s and writes HTML. The
//! document pipeline wires three extensions, in this order:
//!
//! 1. [`HeadingCollector`] records the outline and injects anchor ids
//! 2. [`CodeBlockTransformer`] re-emits fenced code blocks
//! 3. [`LinkLocalizer`] rewrites relative links to site urls

pub mod headings;
pub mod highlight;
pub mod links;

#[cfg(test)]
mod test_integration;

use crate::models::HeadingEntry;
use pulldown_cmark::{html, Event, Options, Parser};

pub use headings::HeadingCollector;
pub use highlight::{extract_code_payload, CodeBlockStyle, CodeBlockTransformer};
pub use links::LinkLocalizer;

/// A rewrite over the event stream of one document.
///
/// Implementations see every event of the document in order and return the
/// stream the next extension (or the HTML writer) receives.
pub trait EventTransform {
    fn transform<'a>(&mut self, events: Vec<Event<'a>>) -> Vec<Event<'a>>;
}

/// Markdown renderer with custom extensions
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
    code_style: CodeBlockStyle,
}

impl MarkdownRenderer {
    pub fn new(code_style: CodeBlockStyle) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        Self {
            options,
            code_style,
        }
    }

    /// Render `markdown` through an arbitrary extension chain, applied in
    /// slice order.
    pub fn render_with(&self, markdown: &str, extensions: &mut [&mut dyn EventTransform]) -> String {
        let mut events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();

        for extension in extensions.iter_mut() {
            events = extension.transform(events);
        }

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Render a document body with the standard extensions.
    ///
    /// Headings are appended to `headings` in document order. Links are
    /// left alone when no localizer is given.
    pub fn render(
        &self,
        markdown: &str,
        headings: &mut Vec<HeadingEntry>,
        links: Option<&LinkLocalizer<'_>>,
    ) -> String {
        let mut heading_collector = HeadingCollector::new(headings);
        let mut code_blocks = CodeBlockTransformer::new(self.code_style);

        match links {
            Some(localizer) => {
                let mut localizer = localizer.clone();
                self.render_with(
                    markdown,
                    &mut [&mut heading_collector, &mut code_blocks, &mut localizer],
                )
            }
            None => self.render_with(markdown, &mut [&mut heading_collector, &mut code_blocks]),
        }
    }

    /// Render without collecting anything
    pub fn render_simple(&self, markdown: &str) -> String {
        let mut headings = Vec::new();
        self.render(markdown, &mut headings, None)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(CodeBlockStyle::default())
    }
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub(crate) fn html_unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
