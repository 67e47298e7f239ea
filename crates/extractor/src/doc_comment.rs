//! Documentation comment handling for C# sources.
//!
//! A C# doc comment is either a run of `///` lines or a `/** ... */` block. Only the
//! `<summary>` element is kept; its inner text is returned as written, minus comment markers.

use regex::Regex;
use std::sync::OnceLock;

fn summary_element() -> &'static Regex {
    static SUMMARY_ELEMENT: OnceLock<Regex> = OnceLock::new();
    SUMMARY_ELEMENT.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"(?s)<summary\s*>(.*?)</summary\s*>").expect("valid summary regex")
    })
}

/// Kind of comment as seen by the documentation tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `/// line`
    DocLine,
    /// `/** block */`
    DocBlock,
    /// `// line` or `/* block */`
    Plain,
}

impl CommentKind {
    pub fn of(text: &str) -> Self {
        let text = text.trim_start();
        if text.starts_with("///") && !text.starts_with("////") {
            CommentKind::DocLine
        } else if text.starts_with("/**") && !text.starts_with("/**/") {
            CommentKind::DocBlock
        } else {
            CommentKind::Plain
        }
    }

    pub fn is_doc(self) -> bool {
        !matches!(self, CommentKind::Plain)
    }
}

/// Strip comment syntax from one comment token, keeping its line structure
pub fn strip_markers(text: &str) -> String {
    match CommentKind::of(text) {
        CommentKind::DocLine => text
            .lines()
            .map(strip_line_marker)
            .collect::<Vec<_>>()
            .join("\n"),
        CommentKind::DocBlock => {
            let inner = text.trim();
            let inner = inner.strip_prefix("/**").unwrap_or(inner);
            let inner = inner.strip_suffix("*/").unwrap_or(inner);
            inner
                .lines()
                .map(strip_block_line)
                .collect::<Vec<_>>()
                .join("\n")
        }
        CommentKind::Plain => text.to_string(),
    }
}

fn strip_line_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix("///") {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => line,
    }
}

fn strip_block_line(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix('*') {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => trimmed,
    }
}

/// Inner text of the first `<summary>` element, trimmed.
///
/// `None` when there is no summary element or it holds only whitespace.
pub fn extract_summary(doc_text: &str) -> Option<String> {
    let captures = summary_element().captures(doc_text)?;
    let body = captures.get(1)?.as_str().trim();
    if body.is_empty() {
        return None;
    }
    Some(body.to_string())
}

/// Summary of a sequence of comment tokens in source order
pub fn summary_from_comments<'a>(comments: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let doc_text = comments
        .into_iter()
        .filter(|text| CommentKind::of(text).is_doc())
        .map(strip_markers)
        .collect::<Vec<_>>()
        .join("\n");
    extract_summary(&doc_text)
}
