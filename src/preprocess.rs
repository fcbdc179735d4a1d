//! Input normalization applied to every utterance before matching.
//!
//! The pipeline runs [`clean_whitespace`], [`unescape_html`] and
//! [`convert_to_ascii`] in that order.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use scraper::Html;
use unicode_normalization::UnicodeNormalization;

/// Named (`&amp;`), decimal (`&#39;`) and hex (`&#x27;`) character references.
static CHAR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);").unwrap());

/// Trim and collapse every run of whitespace to a single space.
pub fn clean_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode HTML character references (`&amp;`, `&#39;`, ...).
///
/// Only the references themselves are decoded; everything else, markup
/// included, passes through unchanged. Unknown names are left as written.
pub fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    CHAR_REF
        .replace_all(text, |caps: &Captures<'_>| decode_reference(&caps[0]))
        .into_owned()
}

/// Decode one `&...;` reference with the HTML5 entity table.
fn decode_reference(reference: &str) -> String {
    let decoded: String = Html::parse_fragment(reference)
        .root_element()
        .text()
        .collect();
    if decoded.is_empty() {
        reference.to_string()
    } else {
        decoded
    }
}

/// Decompose to NFKD and drop everything outside ASCII.
pub fn convert_to_ascii(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}

/// Run the full normalization pipeline.
pub fn normalize(text: &str) -> String {
    let cleaned = clean_whitespace(text);
    let unescaped = unescape_html(&cleaned);
    convert_to_ascii(&unescaped)
}
