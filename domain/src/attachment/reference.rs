//! `@path` attachment tokens and their extraction from raw input.
//!
//! Recognized shapes, matched left-to-right without overlap:
//!
//! - `@"quoted path"`
//! - `@'quoted path'`
//! - `@bareword` (longest run of non-whitespace)
//!
//! A token only starts at the beginning of the input or after whitespace.
//! This is narrower than matching `@` anywhere: addresses like
//! `user@example.com` stay plain text, and so does `a@b.txt`. To attach a
//! file whose reference would touch a preceding word, separate it with a
//! space. Extraction is pure text transformation; paths are resolved against
//! the filesystem later.

use std::fmt;
use std::path::{Path, PathBuf};

/// Marker left in the input by an aborted file picker.
pub const CANCELLED_MARKER: &str = "[cancelled]";

/// Where a reference is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    Resolved,
    Cancelled,
}

/// A file the user asked to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    raw: String,
    path: PathBuf,
    state: ResolutionState,
}

impl FileReference {
    /// A reference whose path is exactly as the user typed it.
    pub fn unresolved(raw: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            raw: raw.into(),
            path: path.into(),
            state: ResolutionState::Unresolved,
        }
    }

    /// A reference to an already-absolute path (e.g. from the file picker).
    pub fn resolved(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            raw: format!("@{}", path.display()),
            path,
            state: ResolutionState::Resolved,
        }
    }

    /// Marks the reference as resolved to `absolute`.
    pub fn resolve_to(self, absolute: impl Into<PathBuf>) -> Self {
        Self {
            path: absolute.into(),
            state: ResolutionState::Resolved,
            ..self
        }
    }

    pub fn cancel(self) -> Self {
        Self {
            state: ResolutionState::Cancelled,
            ..self
        }
    }

    /// The token as it appeared in the input, including the `@`.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        self.state == ResolutionState::Resolved
    }

    /// File name for display and upload naming.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Lowercased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Result of [`parse_attachments`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedInput {
    /// Input with every matched token removed.
    pub cleaned_text: String,
    /// References in left-to-right order.
    pub references: Vec<FileReference>,
}

impl ParsedInput {
    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }
}

/// Extract attachment tokens from raw user input.
///
/// Bare `@`, empty quotes and the [`CANCELLED_MARKER`] are removed from the
/// text but produce no reference. Whitespace around each removed token
/// collapses to a single space and the result is trimmed, so input with no
/// tokens comes back as `input.trim()`.
pub fn parse_attachments(input: &str) -> ParsedInput {
    let mut segments: Vec<&str> = Vec::new();
    let mut references = Vec::new();

    let mut segment_start = 0;
    let mut prev_is_whitespace = true;
    let mut chars = input.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch == '@' && prev_is_whitespace {
            let token = scan_token(input, idx);
            segments.push(&input[segment_start..idx]);
            if let Some(path) = token.path {
                references.push(FileReference::unresolved(&input[idx..token.end], path));
            }
            segment_start = token.end;

            // Skip past the consumed token
            while let Some(&(next, _)) = chars.peek() {
                if next >= token.end {
                    break;
                }
                chars.next();
            }
            prev_is_whitespace = false;
            continue;
        }
        prev_is_whitespace = ch.is_whitespace();
    }
    segments.push(&input[segment_start..]);

    ParsedInput {
        cleaned_text: join_segments(&segments),
        references,
    }
}

struct ScannedToken {
    /// Byte offset one past the token.
    end: usize,
    /// `None` for tokens that are removed without producing a reference.
    path: Option<String>,
}

/// Scan a token whose `@` sits at byte offset `at`.
fn scan_token(input: &str, at: usize) -> ScannedToken {
    let body_start = at + '@'.len_utf8();
    let rest = &input[body_start..];

    let Some(first) = rest.chars().next() else {
        return ScannedToken {
            end: body_start,
            path: None,
        };
    };

    if first.is_whitespace() {
        return ScannedToken {
            end: body_start,
            path: None,
        };
    }

    if first == '"' || first == '\'' {
        let quoted = &rest[first.len_utf8()..];
        if let Some(close) = quoted.find(first) {
            let inner = &quoted[..close];
            return ScannedToken {
                end: body_start + first.len_utf8() + close + first.len_utf8(),
                path: usable_path(inner),
            };
        }
        // Unterminated quote: fall back to a bareword without the quote
        let word = bareword(rest);
        return ScannedToken {
            end: body_start + word.len(),
            path: usable_path(&word[first.len_utf8()..]),
        };
    }

    let word = bareword(rest);
    ScannedToken {
        end: body_start + word.len(),
        path: usable_path(word),
    }
}

/// Longest leading run of non-whitespace.
fn bareword(s: &str) -> &str {
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    &s[..end]
}

fn usable_path(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() || trimmed == CANCELLED_MARKER {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Join plain-text segments, collapsing whitespace at each removal point.
fn join_segments(segments: &[&str]) -> String {
    let last = segments.len().saturating_sub(1);
    let pieces: Vec<&str> = segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            let mut s = *seg;
            if i > 0 {
                s = s.trim_start();
            }
            if i < last {
                s = s.trim_end();
            }
            s
        })
        .filter(|s| !s.is_empty())
        .collect();

    pieces.join(" ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(parsed: &ParsedInput) -> Vec<String> {
        parsed
            .references
            .iter()
            .map(|r| r.path().display().to_string())
            .collect()
    }

    #[test]
    fn text_without_tokens_is_only_trimmed() {
        for input in ["", "   ", "hello world", "  multi\nline  text \t", "no at here"] {
            let parsed = parse_attachments(input);
            assert!(parsed.references.is_empty(), "input: {input:?}");
            assert_eq!(parsed.cleaned_text, input.trim(), "input: {input:?}");
        }
    }

    #[test]
    fn double_quoted_path_with_space() {
        let parsed = parse_attachments(r#"Analyze @"a b.pdf" now"#);
        assert_eq!(paths(&parsed), vec!["a b.pdf"]);
        assert_eq!(parsed.cleaned_text, "Analyze now");
        assert_eq!(parsed.references[0].raw(), r#"@"a b.pdf""#);
        assert_eq!(parsed.references[0].state(), ResolutionState::Unresolved);
    }

    #[test]
    fn single_quoted_path() {
        let parsed = parse_attachments("look at @'my notes.txt'");
        assert_eq!(paths(&parsed), vec!["my notes.txt"]);
        assert_eq!(parsed.cleaned_text, "look at");
    }

    #[test]
    fn barewords_in_left_to_right_order() {
        let parsed = parse_attachments("Compare @one.txt and @two.txt");
        assert_eq!(paths(&parsed), vec!["one.txt", "two.txt"]);
        assert_eq!(parsed.cleaned_text, "Compare and");
    }

    #[test]
    fn bare_at_is_removed_without_reference() {
        let parsed = parse_attachments("hello @ world");
        assert!(parsed.references.is_empty());
        assert_eq!(parsed.cleaned_text, "hello world");

        let parsed = parse_attachments("trailing @");
        assert!(parsed.references.is_empty());
        assert_eq!(parsed.cleaned_text, "trailing");
    }

    #[test]
    fn cancelled_marker_is_dropped() {
        let parsed = parse_attachments("summarize @[cancelled] please");
        assert!(parsed.references.is_empty());
        assert_eq!(parsed.cleaned_text, "summarize please");
    }

    #[test]
    fn empty_quotes_are_dropped() {
        let parsed = parse_attachments(r#"x @"" y"#);
        assert!(parsed.references.is_empty());
        assert_eq!(parsed.cleaned_text, "x y");
    }

    #[test]
    fn email_addresses_are_not_tokens() {
        let parsed = parse_attachments("mail user@example.com about @report.md");
        assert_eq!(paths(&parsed), vec!["report.md"]);
        assert_eq!(parsed.cleaned_text, "mail user@example.com about");
    }

    #[test]
    fn at_inside_a_word_is_not_a_token() {
        let parsed = parse_attachments("see a@b.txt and (@c.txt)");
        assert!(parsed.references.is_empty());
        assert_eq!(parsed.cleaned_text, "see a@b.txt and (@c.txt)");
    }

    #[test]
    fn unterminated_quote_falls_back_to_bareword() {
        let parsed = parse_attachments(r#"read @"draft.txt later"#);
        assert_eq!(paths(&parsed), vec!["draft.txt"]);
        assert_eq!(parsed.cleaned_text, "read later");
    }

    #[test]
    fn token_only_input_yields_empty_text() {
        let parsed = parse_attachments("  @image.png  ");
        assert_eq!(paths(&parsed), vec!["image.png"]);
        assert_eq!(parsed.cleaned_text, "");
    }

    #[test]
    fn adjacent_quoted_and_bare_tokens() {
        let parsed = parse_attachments(r#"@"a.txt" @b.txt"#);
        assert_eq!(paths(&parsed), vec!["a.txt", "b.txt"]);
        assert_eq!(parsed.cleaned_text, "");
    }

    #[test]
    fn multibyte_text_around_tokens() {
        let parsed = parse_attachments("résumé @café.txt ✓");
        assert_eq!(paths(&parsed), vec!["café.txt"]);
        assert_eq!(parsed.cleaned_text, "résumé ✓");
    }

    #[test]
    fn reference_metadata() {
        let r = FileReference::unresolved("@docs/Guide.PDF", "docs/Guide.PDF");
        assert_eq!(r.extension().as_deref(), Some("pdf"));
        assert_eq!(r.display_name(), "Guide.PDF");

        let r = r.resolve_to("/abs/docs/Guide.PDF");
        assert!(r.is_resolved());
        assert_eq!(r.raw(), "@docs/Guide.PDF");
        assert_eq!(r.cancel().state(), ResolutionState::Cancelled);
    }
}
