//! Slug generation for heading anchors.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUN: OnceLock<Regex> = OnceLock::new();

fn hyphen_run() -> &'static Regex {
    HYPHEN_RUN.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Lowercase
/// - Replace whitespace and underscores with hyphens
/// - Remove special characters (except hyphens)
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use docjson_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let lowercased = input.to_lowercase();

    let cleaned = lowercased
        .graphemes(true)
        .filter_map(|g| match g {
            " " | "_" | "\t" | "\n" => Some("-"),
            _ => {
                let c = g.chars().next()?;
                // Keep unicode alphabetic characters as well as ascii
                if c.is_ascii_alphanumeric() || c == '-' || c.is_alphabetic() {
                    Some(g)
                } else {
                    None
                }
            }
        })
        .collect::<String>();

    let collapsed = hyphen_run().replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}

/// Hands out slugs that are unique within one document.
///
/// The first occurrence of a slug is returned as-is, later ones get a
/// numeric suffix (`intro`, `intro-1`, `intro-2`, ...).
#[derive(Debug, Default)]
pub struct Slugger {
    used: HashSet<String>,
}

/// Id used when a heading has no sluggable text.
pub const FALLBACK_SLUG: &str = "section";

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slugify `text` and reserve a unique id for it.
    pub fn slug(&mut self, text: &str) -> String {
        self.claim(&slugify(text))
    }

    /// Reserve `base` (or the next free suffixed form of it).
    fn claim(&mut self, base: &str) -> String {
        let base = if base.is_empty() { FALLBACK_SLUG } else { base };

        if self.used.insert(base.to_string()) {
            return base.to_string();
        }

        let mut n = 1;
        loop {
            let candidate = format!("{base}-{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
