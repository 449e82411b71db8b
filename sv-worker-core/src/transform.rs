use pulldown_cmark::{html, Options, Parser};

use crate::classify::ContentClass;

/// Turn a fetched body into the text that gets inlined into the page.
///
/// Markdown goes through pulldown-cmark with smart punctuation (curly
/// quotes, en/em dashes, ellipses); everything else is decoded unchanged.
pub fn transform(bytes: &[u8], class: ContentClass) -> String {
    let text = String::from_utf8_lossy(bytes);
    match class {
        ContentClass::Markdown => markdown_to_html(&text),
        _ => text.into_owned(),
    }
}

pub fn markdown_to_html(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::ENABLE_SMART_PUNCTUATION);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}
