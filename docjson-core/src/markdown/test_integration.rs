//! Integration tests for the full extension chain

use super::*;
use crate::structure::{SiteStructureIndex, StructureEntry};
use std::path::Path;

fn structure() -> SiteStructureIndex {
    SiteStructureIndex::new(
        vec![StructureEntry {
            text: Some("Other".to_string()),
            url: Some("/docs/other/page".to_string()),
            file_path: Some("/assets/docs/other/page.json".to_string()),
            items: Vec::new(),
        }],
        &["assets/docs"],
    )
}

#[test]
fn test_all_extensions_together() {
    let markdown = r#"# Intro

See [the other page](../other/page.md#setup).

## Example

```js
const a = b < c;
```

# Intro
"#;
    let index = structure();
    let localizer = LinkLocalizer::new(&index, Path::new("guide/page.json"));
    let renderer = MarkdownRenderer::default();
    let mut headings = Vec::new();
    let html = renderer.render(markdown, &mut headings, Some(&localizer));

    println!("HTML: {}", html);

    let ids: Vec<&str> = headings.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, ["intro", "example", "intro-1"]);
    assert!(html.contains("<a href=\"/docs/other/page#setup\">the other page</a>"));
    assert!(html.contains(
        "<code class=\"language-js\">const a = b &lt; c;\n</code>"
    ));
    assert!(html.contains("<h1 id=\"intro-1\">Intro</h1>"));
}

#[test]
fn test_link_inside_heading() {
    let index = structure();
    let localizer = LinkLocalizer::new(&index, Path::new("guide/page.json"));
    let renderer = MarkdownRenderer::default();
    let mut headings = Vec::new();
    let html = renderer.render(
        "## See [other](../other/page.md)\n",
        &mut headings,
        Some(&localizer),
    );

    assert_eq!(headings[0].text, "See other");
    assert_eq!(headings[0].id, "see-other");
    assert_eq!(
        html,
        "<h2 id=\"see-other\">See <a href=\"/docs/other/page\">other</a></h2>\n"
    );
}

#[test]
fn test_rendering_is_deterministic() {
    let markdown = "# A\n\n# A\n\n```rust\nlet x = 1;\n```\n";
    let renderer = MarkdownRenderer::new(CodeBlockStyle::Highlighted);
    let mut first = Vec::new();
    let mut second = Vec::new();
    let a = renderer.render(markdown, &mut first, None);
    let b = renderer.render(markdown, &mut second, None);
    assert_eq!(a, b);
    assert_eq!(first, second);
}
