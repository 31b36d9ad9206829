//! Small HTML helpers shared by the scraping sources.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node, Selector};
use url::Url;

pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Collect the text under an element the way a `<pre>` block reads:
/// text nodes verbatim, `<br>` as a newline, inline tags such as `<b>`
/// unwrapped in place.
pub fn element_text(element: ElementRef) -> String {
    let mut text = String::new();
    collect_text(*element, &mut text);
    text
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(elem) => match elem.name() {
                "br" => out.push('\n'),
                "script" | "style" => {}
                _ => collect_text(child, out),
            },
            _ => {}
        }
    }
}

/// Resolve a possibly-relative link found on a page.
pub fn resolve_link(base: &str, href: &str) -> Result<String, url::ParseError> {
    Ok(Url::parse(base)?.join(href)?.to_string())
}
