//! On-page SEO signal extraction.
//!
//! Turns a raw HTML document into [`PageSignals`]: title, meta description,
//! heading outline, images, semantic landmarks and visible body text.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use seoscan_shared::{Heading, ImageRef, PageSignals};

static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector"));

static META_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[name]").expect("meta selector"));

static HEADING_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("heading selector")
});

static IMG_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("img selector"));

static SEMANTIC_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("header, nav, main, article, section, aside, footer")
        .expect("semantic selector")
});

static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector"));

/// Elements whose text never reaches the reader.
const INVISIBLE: &[&str] = &["script", "style", "noscript", "template"];

/// Extract the SEO-relevant signals from an HTML document.
///
/// `meta_relevance` is left at 0; scoring it needs a relevance scorer and is
/// done by the page source.
pub fn extract_signals(html: &str) -> PageSignals {
    let doc = Html::parse_document(html);

    let title = doc.select(&TITLE_SEL).next().map(|el| element_text(&el));

    let meta_description = doc
        .select(&META_SEL)
        .find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|n| n.eq_ignore_ascii_case("description"))
        })
        .map(|el| el.value().attr("content").unwrap_or("").trim().to_string());

    let headings = doc
        .select(&HEADING_SEL)
        .filter_map(|el| {
            let level = el.value().name()[1..].parse::<u8>().ok()?;
            Some(Heading::new(level, element_text(&el)))
        })
        .collect();

    let images = doc
        .select(&IMG_SEL)
        .map(|el| ImageRef {
            alt: el.value().attr("alt").map(str::to_string),
            src: el.value().attr("src").map(str::to_string),
        })
        .collect();

    let semantic_tags: BTreeSet<String> = doc
        .select(&SEMANTIC_SEL)
        .map(|el| el.value().name().to_ascii_lowercase())
        .collect();

    let body_text = doc
        .select(&BODY_SEL)
        .next()
        .map(|body| visible_text(&body))
        .unwrap_or_default();

    PageSignals {
        title,
        meta_description,
        headings,
        images,
        semantic_tags,
        body_text,
        meta_relevance: 0.0,
    }
}

/// Element text with whitespace runs collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text of `root` skipping script/style content.
fn visible_text(root: &ElementRef<'_>) -> String {
    let parts: Vec<&str> = root
        .descendants()
        .filter_map(|node| {
            let Node::Text(text) = node.value() else {
                return None;
            };
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()))
                .is_some_and(|name| INVISIBLE.contains(&name));
            (!hidden).then_some(&**text)
        })
        .collect();

    collapse_whitespace(&parts.join(" "))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
