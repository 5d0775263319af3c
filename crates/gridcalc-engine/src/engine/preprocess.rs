//! Formula source normalization and rewriting.
//!
//! Formula text goes through two passes before Rhai sees it:
//!
//! - **Normalization**: whitespace is collapsed and references are written in
//!   canonical upper-case A1 form. The result is what a cell reports as its
//!   text, so `= a1 +  b1` and `=A1+B1` render identically.
//! - **Range expansion**: `A1:B2` becomes the array literal
//!   `[range_A1, range_B1, range_A2, range_B2]` so range built-ins such as
//!   `SUM` receive every covered cell. Range members are bound under their
//!   own names because they convert differently from plain operands.
//!
//! Both passes skip string literals.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

use super::Position;
use super::deps::range_cells;
use crate::error::CompileError;

/// A reference found in formula text: either a single cell or a range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RefSpan<'a> {
    /// Byte range of the whole reference in the scanned text.
    pub span: Range<usize>,
    pub first: &'a str,
    /// End of a range reference (`B5` in `A1:B5`).
    pub last: Option<&'a str>,
}

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z]+[0-9]+):([A-Za-z]+[0-9]+)\b")
            .expect("range reference regex must compile")
    })
}

fn cell_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z]+[0-9]+\b").expect("cell reference regex must compile")
    })
}

/// Replace the contents of string literals with spaces, keeping byte offsets
/// intact so matches found in the mask can be applied to the unmasked text.
pub(crate) fn mask_string_literals(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in script.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
                out.push('"');
                continue;
            }
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        } else {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
        }
    }

    out
}

/// Find every cell and range reference outside string literals, in order.
///
/// An identifier followed by `(` is a function call and one preceded by `.`
/// is a method or property; neither is a reference.
pub(crate) fn scan_references(text: &str) -> Vec<RefSpan<'_>> {
    let masked = mask_string_literals(text);
    let mut spans = Vec::new();

    for caps in range_re().captures_iter(&masked) {
        let (Some(whole), Some(first), Some(last)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        spans.push(RefSpan {
            span: whole.range(),
            first: &text[first.range()],
            last: Some(&text[last.range()]),
        });
    }

    for m in cell_ref_re().find_iter(&masked) {
        if spans.iter().any(|s| s.span.start <= m.start() && m.end() <= s.span.end) {
            continue;
        }
        if masked[m.end()..].trim_start().starts_with('(') {
            continue;
        }
        if masked[..m.start()].ends_with('.') {
            continue;
        }
        spans.push(RefSpan {
            span: m.range(),
            first: &text[m.range()],
            last: None,
        });
    }

    spans.sort_by_key(|s| s.span.start);
    spans
}

/// Rebuild `text`, replacing every reference span with `render(span)`.
fn rewrite_references<F>(text: &str, mut render: F) -> Result<String, CompileError>
where
    F: FnMut(&RefSpan<'_>) -> Result<String, CompileError>,
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in scan_references(text) {
        out.push_str(&text[cursor..span.span.start]);
        out.push_str(&render(&span)?);
        cursor = span.span.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn canonical_ref(name: &str) -> String {
    match Position::from_a1(name) {
        Some(pos) => pos.to_string(),
        None => name.to_ascii_uppercase(),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '!' | '&' | '|' | '^')
}

/// Whitespace between these two characters cannot be dropped without merging
/// two tokens into one (`a b`, `x - -1`).
fn needs_separator(prev: char, next: char) -> bool {
    (is_word_char(prev) && is_word_char(next)) || (is_operator_char(prev) && is_operator_char(next))
}

fn collapse_whitespace(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut pending_space = false;

    for ch in source.chars() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            if let Some(prev) = out.chars().next_back() {
                if needs_separator(prev, ch) {
                    out.push(' ');
                }
            }
            pending_space = false;
        }
        if ch == '"' {
            in_string = true;
        }
        out.push(ch);
    }

    out
}

/// Canonical rendering of formula source (without the leading `=`).
pub fn normalize_formula(source: &str) -> String {
    let collapsed = collapse_whitespace(source);
    let rendered = rewrite_references(&collapsed, |span| {
        Ok(match span.last {
            Some(last) => format!("{}:{}", canonical_ref(span.first), canonical_ref(last)),
            None => canonical_ref(span.first),
        })
    });
    // Rendering references never fails.
    rendered.unwrap_or(collapsed)
}

/// Name a range member is bound under during evaluation.
///
/// The `_` keeps the name from scanning as a cell reference.
pub(crate) fn range_member_name(pos: Position) -> String {
    format!("range_{}", pos)
}

/// Rewrite range references into Rhai array literals of their cells.
///
/// Ranges with an end outside the grid become an empty array; the formula
/// evaluates to `#REF!` before the array is ever read.
pub fn expand_ranges(canonical: &str, max_range_cells: usize) -> Result<String, CompileError> {
    rewrite_references(canonical, |span| match span.last {
        None => Ok(span.first.to_string()),
        Some(last) => {
            let cells = range_cells(span.first, last, max_range_cells)?.unwrap_or_default();
            let names: Vec<String> = cells.iter().copied().map(range_member_name).collect();
            Ok(format!("[{}]", names.join(", ")))
        }
    })
}
