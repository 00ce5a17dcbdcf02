use std::sync::LazyLock;

use log::debug;

use regex::Regex;

// A link path is the non-empty text between `<` and the first `>`.
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]+)>").expect("valid link regex"));

/// A single entry of a link-format document.
///
/// The path is the text between angle brackets, kept verbatim. The
/// attributes are whatever follows the closing bracket up to the next
/// entry, trimmed of separators. Attributes are never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<'a> {
    /// The URI reference between `<` and `>`.
    pub path: &'a str,
    /// The raw attribute text following the path.
    pub attributes: &'a str,
}

/// Parses a link-format document into its ordered sequence of links.
///
/// Every `<...>` token with a non-empty content becomes a [`Link`], in the
/// order in which it appears. A token runs from a `<` to the first `>`
/// after it. A document without any token produces an empty sequence,
/// malformed text between tokens is skipped.
#[must_use]
pub fn parse_links(document: &str) -> Vec<Link<'_>> {
    let mut links: Vec<Link<'_>> = Vec::new();
    let mut attributes_start = 0;

    for captures in LINK_RE.captures_iter(document) {
        let (Some(token), Some(path)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        if let Some(previous) = links.last_mut() {
            previous.attributes = attributes(&document[attributes_start..token.start()]);
        }

        links.push(Link {
            path: path.as_str(),
            attributes: "",
        });
        attributes_start = token.end();
    }

    match links.last_mut() {
        Some(last) => last.attributes = attributes(&document[attributes_start..]),
        None => debug!("No link in a document of {} bytes", document.len()),
    }

    links
}

// Attributes stop at the next `<`, even when it opens no valid link.
fn attributes(tail: &str) -> &str {
    let end = tail.find('<').unwrap_or(tail.len());
    tail[..end]
        .trim()
        .trim_end_matches(',')
        .trim_start_matches(';')
        .trim()
}
