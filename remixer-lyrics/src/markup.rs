//! Lyrics extraction from rendered song pages.
//!
//! Looks for an element with the `lyrics` class first and falls back to every
//! `data-lyrics-container="true"` element.

use scraper::{ElementRef, Html, Node, Selector};
use std::sync::OnceLock;

static LYRICS_CLASS: OnceLock<Selector> = OnceLock::new();
static LYRICS_CONTAINER: OnceLock<Selector> = OnceLock::new();

#[allow(clippy::expect_used)] // literal selectors, covered by tests
fn compiled(cell: &'static OnceLock<Selector>, selector: &str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(selector).expect("lyrics selector is valid"))
}

fn selectors() -> [&'static Selector; 2] {
    [
        compiled(&LYRICS_CLASS, ".lyrics"),
        compiled(&LYRICS_CONTAINER, r#"[data-lyrics-container="true"]"#),
    ]
}

/// Extract plain lyrics text from a song page, or `None` when no container
/// holds any text
#[must_use]
pub fn extract_lyrics(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    selectors()
        .into_iter()
        .map(|selector| {
            document
                .select(selector)
                .map(to_text)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .find(|text| !text.is_empty())
}

/// Text of a container in document order, with `<br>` as a newline
fn to_text(container: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in container.descendants() {
        match node.value() {
            Node::Text(fragment) => text.push_str(fragment),
            Node::Element(element) if element.name() == "br" => text.push('\n'),
            _ => {}
        }
    }
    text
}
