//! Link localization: relative markdown links become site urls.

use super::EventTransform;
use crate::structure::{normalize_path, SiteStructureIndex};
use percent_encoding::percent_decode_str;
use pulldown_cmark::{CowStr, Event, Tag};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static SCHEME_REGEX: OnceLock<Regex> = OnceLock::new();

fn scheme_regex() -> &'static Regex {
    SCHEME_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap())
}

/// Rewrites relative link targets using the site structure index
#[derive(Debug, Clone)]
pub struct LinkLocalizer<'a> {
    index: &'a SiteStructureIndex,
    base_dir: String,
}

impl<'a> LinkLocalizer<'a> {
    /// `artifact_path` is the artifact's destination relative to the asset
    /// directory, e.g. `guide/page.json`.
    pub fn new(index: &'a SiteStructureIndex, artifact_path: &Path) -> Self {
        let base_dir = artifact_path
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        Self { index, base_dir }
    }

    /// Resolve `href`, or `None` when it should be emitted unchanged
    pub fn localize(&self, href: &str) -> Option<String> {
        if is_external(href) || href.starts_with('/') {
            return None;
        }

        let split_at = href.find(['?', '#']).unwrap_or(href.len());
        let (path, suffix) = href.split_at(split_at);
        if path.is_empty() {
            return None;
        }
        let path = percent_decode_str(path).decode_utf8().ok()?;

        let joined = if self.base_dir.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.base_dir, path)
        };
        let key = normalize_path(&joined)?;

        self.index
            .url_for(&key)
            .map(|url| format!("{url}{suffix}"))
    }
}

impl EventTransform for LinkLocalizer<'_> {
    fn transform<'a>(&mut self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        events
            .into_iter()
            .map(|event| match event {
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    let dest_url = match self.localize(&dest_url) {
                        Some(localized) => {
                            tracing::trace!("Localized link {} -> {}", dest_url, localized);
                            CowStr::from(localized)
                        }
                        None => dest_url,
                    };
                    Event::Start(Tag::Link {
                        link_type,
                        dest_url,
                        title,
                        id,
                    })
                }
                other => other,
            })
            .collect()
    }
}

fn is_external(href: &str) -> bool {
    href.starts_with("//") || scheme_regex().is_match(href)
}
