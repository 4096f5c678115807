//! Provenance comments for stashed HTML.
//!
//! Before a fetched page is written to the cache, a comment recording where
//! and when it came from is placed as the first child of the `<html>` root.
//! Content without an `<html` root is stored untouched.

use chrono::Local;

/// Inserts a provenance comment into fetched content.
pub trait Annotator {
    /// Returns the annotated text, or `None` when `content` has no root
    /// element to annotate.
    fn annotate(&self, content: &str, comment: &str) -> Option<String>;
}

/// Default annotator: finds the `<html ...>` start tag by scanning and inserts
/// the comment right after it. The rest of the document is left byte-for-byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagScanAnnotator;

impl Annotator for TagScanAnnotator {
    fn annotate(&self, content: &str, comment: &str) -> Option<String> {
        if !content.contains("<html") {
            return None;
        }
        let insert_at = root_start_tag_end(content)?;
        let mut out = String::with_capacity(content.len() + comment.len() + 7);
        out.push_str(&content[..insert_at]);
        out.push_str("<!--");
        out.push_str(comment);
        out.push_str("-->");
        out.push_str(&content[insert_at..]);
        Some(out)
    }
}

/// Byte offset just past the `>` closing the first `<html` start tag.
///
/// Comments (`<!-- ... -->`, including IE conditional comments), declarations
/// (`<!DOCTYPE ...>`) and processing instructions are skipped whole, as are
/// tags such as `<htmlfoo>` whose name merely starts with "html".
fn root_start_tag_end(content: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = content[from..].find('<') {
        let at = from + rel;
        let rest = &content[at..];
        if let Some(body) = rest.strip_prefix("<!--") {
            let end = body.find("-->")?;
            from = at + "<!--".len() + end + "-->".len();
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            from = at + rest.find('>')? + 1;
        } else if let Some(after) = rest.strip_prefix("<html") {
            let name_end = at + "<html".len();
            match after.chars().next() {
                Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace() => {
                    return tag_close(content, name_end);
                }
                _ => from = name_end,
            }
        } else {
            from = at + 1;
        }
    }
    None
}

/// Finds the `>` that closes a start tag beginning before `from`, honouring
/// quoted attribute values.
fn tag_close(content: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, b) in content.as_bytes()[from..].iter().enumerate() {
        match (quote, *b) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(*b),
            (None, b'>') => return Some(from + i + 1),
            (None, _) => {}
        }
    }
    None
}

/// Text of the provenance comment for `uri`, stamped with the current local time.
pub fn provenance_message(uri: &str) -> String {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S %z");
    let mut msg = format!(
        "Stashed file retrieved by Upton {} from {} at {}",
        env!("CARGO_PKG_VERSION"),
        uri,
        now
    );
    // "--" would terminate the comment early.
    while msg.contains("--") {
        msg = msg.replace("--", "- -");
    }
    msg
}
