//! Cross-line token scan.
//!
//! Walks the per-line literal tokens of every line in order, threading a single [`ScanState`]
//! from line to line. An open block comment, multiline string or string suppresses every token
//! until its matching close token; fold tokens push and pop one stack per fold literal pair.
//! The pass rewrites each line's comment and string ranges and produces the full fold list.

use crate::document::Lines;
use crate::folding::Folding;
use crate::language::{Language, TokenKind};

/// Construct open at the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Nothing open.
    #[default]
    Normal,
    /// A line comment; closed by the end of the line.
    LineComment,
    /// A block comment opened by literal pair `0`.
    BlockComment(usize),
    /// A multiline string opened by literal pair `0`.
    MultilineString(usize),
    /// A string opened by delimiter `index`. A `verbatim` string (one with a multiline prefix)
    /// spans lines freely; any other string continues only past a multiline postfix.
    String {
        /// Delimiter index.
        index: usize,
        /// Whether the string was opened with a multiline prefix.
        verbatim: bool,
    },
}

/// Result of a full pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    /// Every fold region found, unfolded.
    pub foldings: Vec<Folding>,
    /// State left open after the last line.
    pub state: ScanState,
}

/// Scan every line, rewriting comment and string ranges. Fold regions are only collected when
/// `collect_foldings` is set.
pub fn scan(lines: &mut Lines, language: &Language, collect_foldings: bool) -> ScanOutcome {
    let mut stacks: Vec<Vec<usize>> = vec![Vec::new(); language.folding_kinds()];
    let mut foldings = Vec::new();
    let mut state = ScanState::Normal;

    for line_index in 0..lines.len() {
        let Some(line) = lines.get_mut(line_index) else {
            continue;
        };

        line.comment_ranges.clear();
        line.string_ranges.clear();
        let mut comment_start = matches!(state, ScanState::BlockComment(_)).then_some(0);
        let mut string_start = matches!(
            state,
            ScanState::MultilineString(_) | ScanState::String { .. }
        )
        .then_some(0);

        for token in line.tokens().to_vec() {
            match state {
                ScanState::Normal => {}
                ScanState::LineComment => continue,
                ScanState::BlockComment(open) => {
                    if token.kind == TokenKind::BlockCommentEnd && token.index == open {
                        line.comment_ranges
                            .push(comment_start.unwrap_or(0)..token.end());
                        comment_start = None;
                        state = ScanState::Normal;
                    }
                    continue;
                }
                ScanState::MultilineString(open) => {
                    if language.closes_multiline_string(open, &token) {
                        line.string_ranges.push(string_start.unwrap_or(0)..token.end());
                        string_start = None;
                        state = ScanState::Normal;
                    }
                    continue;
                }
                ScanState::String { index, .. } => {
                    if token.kind == TokenKind::String && token.index == index {
                        line.string_ranges.push(string_start.unwrap_or(0)..token.end());
                        string_start = None;
                        state = ScanState::Normal;
                    }
                    continue;
                }
            }

            match token.kind {
                TokenKind::LineComment => {
                    comment_start = Some(token.char_index);
                    state = ScanState::LineComment;
                }
                TokenKind::BlockCommentStart => {
                    comment_start = Some(token.char_index);
                    state = ScanState::BlockComment(token.index);
                }
                TokenKind::String => {
                    string_start = Some(token.char_index);
                    state = ScanState::String {
                        index: token.index,
                        verbatim: token.is_multiline,
                    };
                }
                TokenKind::MultilineStringStart => {
                    string_start = Some(token.char_index);
                    state = ScanState::MultilineString(token.index);
                }
                TokenKind::FoldingStart => {
                    if collect_foldings && let Some(stack) = stacks.get_mut(token.index) {
                        stack.push(line_index);
                    }
                }
                TokenKind::FoldingEnd => {
                    if let Some(start) = stacks.get_mut(token.index).and_then(Vec::pop)
                        && start < line_index
                    {
                        foldings.push(Folding::new(start, line_index));
                    }
                }
                TokenKind::BlockCommentEnd | TokenKind::MultilineStringEnd => {}
            }
        }

        line.comment_start = comment_start;
        line.string_start = string_start;

        state = match state {
            ScanState::LineComment => ScanState::Normal,
            ScanState::String {
                verbatim: false, ..
            } if !language.ends_with_multiline_postfix(line.chars()) => ScanState::Normal,
            other => other,
        };
        line.set_colors_dirty();
    }

    let last_line = lines.len().saturating_sub(1);
    for start in stacks.into_iter().flatten() {
        if start < last_line {
            foldings.push(Folding::new(start, last_line));
        }
    }

    tracing::trace!(
        lines = lines.len(),
        foldings = foldings.len(),
        ?state,
        "token scan finished"
    );
    ScanOutcome { foldings, state }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn c_like() -> Language {
        let mut lang = Language::new("C");
        lang.add_line_comment("//")
            .and_then(|l| l.add_block_comment("/*", "*/"))
            .and_then(|l| l.add_string("\""))
            .and_then(|l| l.add_multiline_string("\"\"\"", "\"\"\""))
            .and_then(|l| l.add_multiline_prefix("@"))
            .and_then(|l| l.add_multiline_postfix("\\"))
            .and_then(|l| l.add_folding("{", "}"))
            .expect("valid tables");
        lang
    }

    fn lines(text: &str, lang: &Language) -> Lines {
        Lines::from_text(text, lang, Duration::ZERO)
    }

    fn pairs(outcome: &ScanOutcome) -> Vec<(usize, usize)> {
        let mut pairs: Vec<_> = outcome
            .foldings
            .iter()
            .map(|f| (f.start_line, f.end_line))
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn test_nested_foldings() {
        let lang = c_like();
        let mut lines = lines("a {\n  b {\n  }\n}", &lang);
        let outcome = scan(&mut lines, &lang, true);
        assert_eq!(pairs(&outcome), vec![(0, 3), (1, 2)]);
        assert_eq!(outcome.state, ScanState::Normal);
    }

    #[test]
    fn test_folding_tokens_inside_comments_and_strings_ignored() {
        let lang = c_like();
        let mut lines = lines("a {\n/* { */ \"}\"\n// }\n}", &lang);
        let outcome = scan(&mut lines, &lang, true);
        assert_eq!(pairs(&outcome), vec![(0, 3)]);
    }

    #[test]
    fn test_unclosed_fold_extends_to_end() {
        let lang = c_like();
        let mut lines = lines("a {\nb\nc", &lang);
        let outcome = scan(&mut lines, &lang, true);
        assert_eq!(pairs(&outcome), vec![(0, 2)]);

        let outcome = scan(&mut lines, &lang, false);
        assert!(outcome.foldings.is_empty());
    }

    #[test]
    fn test_stray_fold_end_ignored() {
        let lang = c_like();
        let mut lines = lines("}\n{\n}", &lang);
        let outcome = scan(&mut lines, &lang, true);
        assert_eq!(pairs(&outcome), vec![(1, 2)]);
    }

    #[test]
    fn test_block_comment_ranges_across_lines() {
        let lang = c_like();
        let mut lines = lines("x /* a\nb\nc */ y", &lang);
        scan(&mut lines, &lang, true);

        let first = lines.get(0).expect("line 0");
        assert_eq!(first.comment_start, Some(2));
        let middle = lines.get(1).expect("line 1");
        assert_eq!(middle.comment_start, Some(0));
        let last = lines.get(2).expect("line 2");
        assert_eq!(last.comment_ranges, vec![0..4]);
        assert_eq!(last.comment_start, None);
    }

    #[test]
    fn test_line_comment_suppressed_inside_block_comment() {
        let lang = c_like();
        let mut lines = lines("/* a // b */ x", &lang);
        let outcome = scan(&mut lines, &lang, true);
        let line = lines.get(0).expect("line 0");
        assert_eq!(line.comment_ranges, vec![0..12]);
        assert_eq!(line.comment_start, None);
        assert_eq!(outcome.state, ScanState::Normal);
    }

    #[test]
    fn test_string_and_line_comment_close_at_eol() {
        let lang = c_like();
        let mut lines = lines("\"abc\nx // c\ny", &lang);
        let outcome = scan(&mut lines, &lang, true);
        assert_eq!(lines.get(0).and_then(|l| l.string_start), Some(0));
        assert_eq!(lines.get(1).and_then(|l| l.string_start), None);
        assert_eq!(lines.get(1).and_then(|l| l.comment_start), Some(2));
        assert_eq!(lines.get(2).and_then(|l| l.comment_start), None);
        assert_eq!(outcome.state, ScanState::Normal);
    }

    #[test]
    fn test_string_continues_after_postfix() {
        let lang = c_like();
        let mut lines = lines("s = \"ab\\\ncd\" e", &lang);
        scan(&mut lines, &lang, true);
        assert_eq!(lines.get(0).and_then(|l| l.string_start), Some(4));
        assert_eq!(lines.get(1).map(|l| l.string_ranges.clone()), Some(vec![0..3]));
    }

    #[test]
    fn test_verbatim_and_multiline_strings() {
        let lang = c_like();
        let mut lines = lines("@\"a\nb\" \"\"\"c\nd\"\"\"", &lang);
        let outcome = scan(&mut lines, &lang, true);
        assert_eq!(lines.get(0).and_then(|l| l.string_start), Some(0));
        assert_eq!(lines.get(1).map(|l| l.string_ranges.clone()), Some(vec![0..2]));
        assert_eq!(lines.get(1).and_then(|l| l.string_start), Some(3));
        assert_eq!(lines.get(2).map(|l| l.string_ranges.clone()), Some(vec![0..4]));
        assert_eq!(outcome.state, ScanState::Normal);
    }
}
