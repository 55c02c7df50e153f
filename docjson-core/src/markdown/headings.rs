//! Heading outline collection and anchor id injection.

use super::EventTransform;
use crate::models::HeadingEntry;
use crate::slug::Slugger;
use pulldown_cmark::{CowStr, Event, HeadingLevel, Tag, TagEnd};

/// Records every heading into a caller-owned buffer and gives each one a
/// unique `id`.
pub struct HeadingCollector<'h> {
    headings: &'h mut Vec<HeadingEntry>,
    slugger: Slugger,
}

struct OpenHeading<'a> {
    level: HeadingLevel,
    text: String,
    inner: Vec<Event<'a>>,
}

impl<'h> HeadingCollector<'h> {
    pub fn new(headings: &'h mut Vec<HeadingEntry>) -> Self {
        Self {
            headings,
            slugger: Slugger::new(),
        }
    }

    fn close<'a>(&mut self, heading: OpenHeading<'a>, end: TagEnd, out: &mut Vec<Event<'a>>) {
        let id = self.slugger.slug(&heading.text);

        self.headings.push(HeadingEntry {
            level: heading.level as u8,
            text: heading.text,
            id: id.clone(),
        });

        out.push(Event::Start(Tag::Heading {
            level: heading.level,
            id: Some(CowStr::from(id)),
            classes: Vec::new(),
            attrs: Vec::new(),
        }));
        out.extend(heading.inner);
        out.push(Event::End(end));
    }
}

impl EventTransform for HeadingCollector<'_> {
    fn transform<'a>(&mut self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut result = Vec::with_capacity(events.len());
        let mut open: Option<OpenHeading<'a>> = None;

        for event in events {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    open = Some(OpenHeading {
                        level,
                        text: String::new(),
                        inner: Vec::new(),
                    });
                }
                Event::End(end @ TagEnd::Heading(_)) => match open.take() {
                    Some(heading) => self.close(heading, end, &mut result),
                    None => result.push(Event::End(end)),
                },
                other => match open.as_mut() {
                    Some(heading) => {
                        match &other {
                            Event::Text(text) | Event::Code(text) => heading.text.push_str(text),
                            Event::SoftBreak | Event::HardBreak => heading.text.push(' '),
                            _ => {}
                        }
                        heading.inner.push(other);
                    }
                    None => result.push(other),
                },
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownRenderer;

    fn collect(markdown: &str) -> (String, Vec<HeadingEntry>) {
        let renderer = MarkdownRenderer::default();
        let mut headings = Vec::new();
        let html = renderer.render(markdown, &mut headings, None);
        (html, headings)
    }

    fn entry(level: u8, text: &str, id: &str) -> HeadingEntry {
        HeadingEntry {
            level,
            text: text.to_string(),
            id: id.to_string(),
        }
    }

    #[test]
    fn test_headings_in_document_order() {
        let (_, headings) = collect("# Intro\n\ntext\n\n## Setup\n\nmore\n\n# Usage\n");
        assert_eq!(
            headings,
            vec![
                entry(1, "Intro", "intro"),
                entry(2, "Setup", "setup"),
                entry(1, "Usage", "usage"),
            ]
        );
    }

    #[test]
    fn test_ids_injected_into_markup() {
        let (html, _) = collect("## Getting *Started*\n");
        assert_eq!(
            html,
            "<h2 id=\"getting-started\">Getting <em>Started</em></h2>\n"
        );
    }

    #[test]
    fn test_duplicate_headings_get_suffixes() {
        let (html, headings) = collect("# Options\n\n## Options\n\n### Options\n");
        let ids: Vec<&str> = headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["options", "options-1", "options-2"]);
        assert!(html.contains("<h3 id=\"options-2\">"));
    }

    #[test]
    fn test_inline_code_is_part_of_text() {
        let (_, headings) = collect("## The `config` file\n");
        assert_eq!(headings, vec![entry(2, "The config file", "the-config-file")]);
    }

    #[test]
    fn test_braces_stay_in_heading_text() {
        let (html, headings) = collect("# Generic {T}\n\n## Map {K, V}\n");
        assert_eq!(
            headings,
            vec![
                entry(1, "Generic {T}", "generic-t"),
                entry(2, "Map {K, V}", "map-k-v"),
            ]
        );
        assert_eq!(
            html,
            "<h1 id=\"generic-t\">Generic {T}</h1>\n<h2 id=\"map-k-v\">Map {K, V}</h2>\n"
        );
    }

    #[test]
    fn test_attribute_like_suffix_is_plain_text() {
        let (html, headings) = collect("# Install {#setup .wide}\n\n# Setup\n");
        assert_eq!(headings[0].text, "Install {#setup .wide}");
        assert_eq!(headings[1], entry(1, "Setup", "setup"));
        assert!(html.contains(">Install {#setup .wide}</h1>"));
        assert!(!html.contains("class="));
    }

    #[test]
    fn test_markup_characters_escaped_in_heading() {
        let (html, headings) = collect("## a < b & c\n");
        assert_eq!(headings[0], entry(2, "a < b & c", "a-b-c"));
        assert!(html.contains("<h2 id=\"a-b-c\">a &lt; b &amp; c</h2>"));
    }

    #[test]
    fn test_setext_heading() {
        let (_, headings) = collect("Title\n=====\n\nSub\n---\n");
        assert_eq!(
            headings,
            vec![entry(1, "Title", "title"), entry(2, "Sub", "sub")]
        );
    }

    #[test]
    fn test_buffer_is_per_call() {
        let renderer = MarkdownRenderer::default();
        let mut first = Vec::new();
        let mut second = Vec::new();
        renderer.render("# A\n", &mut first, None);
        renderer.render("# A\n", &mut second, None);
        assert_eq!(first, second);
        assert_eq!(second[0].id, "a");
    }
}
