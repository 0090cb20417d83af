//! Reversible structural edits.
//!
//! A [`Command`] is one primitive edit performed on behalf of a single caret: insert or delete
//! chars on the caret's line, split or merge lines, or indent/unindent the lines a selection
//! touches. Applying a command mutates the [`Document`] and rebalances every caret in the
//! [`CaretManager`]; reverting applies the inverse command.
//!
//! | Command              | Inverse               |
//! |----------------------|-----------------------|
//! | `InsertChars` fwd    | `DeleteChars` bwd     |
//! | `InsertChars` bwd    | `DeleteChars` fwd     |
//! | `SplitLine` fwd      | `MergeLine` bwd       |
//! | `MergeLine` fwd      | `SplitLine` bwd       |
//! | `Indent`             | remove recorded tabs  |
//! | `Unindent`           | re-insert tabs        |
//!
//! Commands store what they need for their inverse (deleted chars, touched lines) while they
//! run, so the same value can be applied, reverted and applied again.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::caret::{CaretId, CaretManager};
use crate::coordinates::Coordinates;
use crate::document::Document;

/// Which side of the caret an edit happens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditDirection {
    /// After the caret (the caret moves along with typed text).
    Forward,
    /// Before the caret.
    Backward,
}

impl EditDirection {
    /// Move `value` by `n` in this direction, saturating at zero.
    pub fn shift(self, value: usize, n: usize) -> usize {
        match self {
            EditDirection::Forward => value + n,
            EditDirection::Backward => value.saturating_sub(n),
        }
    }

    /// The other direction.
    pub fn opposite(self) -> Self {
        match self {
            EditDirection::Forward => EditDirection::Backward,
            EditDirection::Backward => EditDirection::Forward,
        }
    }
}

/// Mutable state a command works on.
pub struct EditContext<'a> {
    /// The text.
    pub doc: &'a mut Document,
    /// Every caret, including the one the command runs for.
    pub carets: &'a mut CaretManager,
}

/// A primitive reversible edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Insert `chars` at the caret. `Forward` moves the caret past them.
    InsertChars {
        /// Side of the caret.
        direction: EditDirection,
        /// Chars to insert.
        chars: Vec<char>,
    },
    /// Delete up to `count` chars next to the caret, within its line.
    DeleteChars {
        /// Side of the caret.
        direction: EditDirection,
        /// Requested number of chars.
        count: usize,
        /// Chars actually removed by the last application.
        deleted: Vec<char>,
    },
    /// Split the caret's line at the caret. `Forward` leaves the caret at the start of the new
    /// second line; `Backward` leaves it at the end of the first.
    SplitLine {
        /// Side of the caret.
        direction: EditDirection,
    },
    /// `Forward` appends the next line to the caret's line; `Backward` appends the caret's
    /// line to the previous one.
    MergeLine {
        /// Side of the caret.
        direction: EditDirection,
    },
    /// Prefix every line of the caret's selection with the tab string.
    Indent {
        /// Lines indented by the last application.
        lines: Vec<usize>,
    },
    /// Strip one leading tab string from every line of the caret's selection.
    Unindent {
        /// Lines unindented by the last application.
        lines: Vec<usize>,
    },
}

impl Command {
    /// Insert `chars` on the given side.
    pub fn insert(direction: EditDirection, chars: Vec<char>) -> Self {
        Command::InsertChars { direction, chars }
    }

    /// Delete `count` chars on the given side.
    pub fn delete(direction: EditDirection, count: usize) -> Self {
        Command::DeleteChars {
            direction,
            count,
            deleted: Vec::new(),
        }
    }

    /// One-line description for logs and debug reports.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Whether the command only inserts chars.
    pub fn is_insert(&self) -> bool {
        matches!(self, Command::InsertChars { .. })
    }

    /// Whether the command only deletes chars.
    pub fn is_delete(&self) -> bool {
        matches!(self, Command::DeleteChars { .. })
    }

    /// Apply the command for caret `id`.
    pub fn apply(&mut self, id: CaretId, ctx: &mut EditContext<'_>) {
        let Some(position) = caret_position(id, ctx) else {
            return;
        };
        tracing::trace!(caret = id.0, command = %self, ?position, "apply");

        match self {
            Command::InsertChars { direction, chars } => {
                insert_chars(id, ctx, position, *direction, chars);
            }
            Command::DeleteChars {
                direction,
                count,
                deleted,
            } => {
                *deleted = delete_chars(id, ctx, position, *direction, *count);
            }
            Command::SplitLine { direction } => split_line(id, ctx, position, *direction),
            Command::MergeLine { direction } => {
                let into = match direction {
                    EditDirection::Forward => Some(position.line),
                    EditDirection::Backward => position.line.checked_sub(1),
                };
                match into {
                    Some(into) => merge_line(id, ctx, into),
                    None => ctx.doc.internal_error("merge before the first line"),
                }
            }
            Command::Indent { lines } => {
                *lines = indent(id, ctx);
            }
            Command::Unindent { lines } => {
                *lines = unindent(id, ctx);
            }
        }
    }

    /// Undo the last application for caret `id`. The caret set must be in the state the
    /// application left it in.
    pub fn revert(&self, id: CaretId, ctx: &mut EditContext<'_>) {
        tracing::trace!(caret = id.0, command = %self, "revert");
        match self {
            Command::InsertChars { direction, chars } => {
                Command::delete(direction.opposite(), chars.len()).apply(id, ctx);
            }
            Command::DeleteChars {
                direction, deleted, ..
            } => {
                Command::insert(direction.opposite(), deleted.clone()).apply(id, ctx);
            }
            Command::SplitLine { direction } => {
                Command::MergeLine {
                    direction: direction.opposite(),
                }
                .apply(id, ctx);
            }
            Command::MergeLine { direction } => {
                Command::SplitLine {
                    direction: direction.opposite(),
                }
                .apply(id, ctx);
            }
            Command::Indent { lines } => {
                let tab: Vec<char> = ctx.doc.options().tab_string().chars().collect();
                for &line in lines {
                    let starts_with_tab = ctx
                        .doc
                        .line(line)
                        .is_some_and(|l| l.chars().starts_with(&tab));
                    if !starts_with_tab {
                        ctx.doc
                            .internal_error(&format!("line {line} lost its indentation"));
                        continue;
                    }
                    ctx.doc.remove_chars(line, 0, tab.len());
                    ctx.carets
                        .shift_caret_char(line, 0, EditDirection::Backward, tab.len());
                }
            }
            Command::Unindent { lines } => {
                let tab: Vec<char> = ctx.doc.options().tab_string().chars().collect();
                for &line in lines {
                    ctx.doc.insert_chars(line, 0, &tab);
                    ctx.carets
                        .shift_caret_char(line, 0, EditDirection::Forward, tab.len());
                }
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::InsertChars { direction, chars } => {
                write!(f, "insert {:?} {direction:?}", chars.iter().collect::<String>())
            }
            Command::DeleteChars {
                direction, count, ..
            } => write!(f, "delete {count} {direction:?}"),
            Command::SplitLine { direction } => write!(f, "split line {direction:?}"),
            Command::MergeLine { direction } => write!(f, "merge line {direction:?}"),
            Command::Indent { .. } => f.write_str("indent selection"),
            Command::Unindent { .. } => f.write_str("unindent selection"),
        }
    }
}

/// Position of caret `id`, with the char clamped to its line.
fn caret_position(id: CaretId, ctx: &mut EditContext<'_>) -> Option<Coordinates> {
    let Some(caret) = ctx.carets.get(id) else {
        ctx.doc
            .internal_error(&format!("command for missing caret {}", id.0));
        return None;
    };
    let mut position = caret.position;
    let Some(len) = ctx.doc.line_len(position.line) else {
        ctx.doc.internal_error(&format!(
            "caret {} on missing line {}",
            id.0, position.line
        ));
        return None;
    };
    position.char = position.char.min(len);
    Some(position)
}

fn insert_chars(
    id: CaretId,
    ctx: &mut EditContext<'_>,
    position: Coordinates,
    direction: EditDirection,
    chars: &[char],
) {
    if chars.is_empty() {
        return;
    }
    ctx.doc.insert_chars(position.line, position.char, chars);
    ctx.carets
        .shift_caret_char(position.line, position.char, EditDirection::Forward, chars.len());
    if direction == EditDirection::Forward {
        ctx.carets.input_char_caret(id, chars.len());
    }
}

fn delete_chars(
    id: CaretId,
    ctx: &mut EditContext<'_>,
    position: Coordinates,
    direction: EditDirection,
    count: usize,
) -> Vec<char> {
    let Coordinates { line, char, .. } = position;
    let len = ctx.doc.line_len(line).unwrap_or(0);
    let (from, deletable) = match direction {
        EditDirection::Forward => (char, count.min(len - char)),
        EditDirection::Backward => {
            let deletable = count.min(char);
            (char - deletable, deletable)
        }
    };

    let deleted = ctx.doc.remove_chars(line, from, deletable);
    ctx.carets
        .shift_caret_char(line, from, EditDirection::Backward, deleted.len());
    if direction == EditDirection::Backward {
        ctx.carets.delete_char_caret(id);
    }

    if deleted.len() != count {
        ctx.doc.internal_error(&format!(
            "deleted {} of {count} chars at {line}:{char}",
            deleted.len()
        ));
    }
    deleted
}

fn split_line(
    id: CaretId,
    ctx: &mut EditContext<'_>,
    position: Coordinates,
    direction: EditDirection,
) {
    let Coordinates { line, char, .. } = position;
    let len = ctx.doc.line_len(line).unwrap_or(0);

    match direction {
        EditDirection::Forward => {
            let rest = ctx.doc.remove_chars(line, char, len - char);
            ctx.doc.insert_line(line + 1);
            ctx.carets.shift_caret_line(line + 1, EditDirection::Forward);
            ctx.carets
                .split_line_caret(id, line, char, EditDirection::Forward);
            ctx.doc.shift_foldings(line + 1, EditDirection::Forward);
            if !rest.is_empty() {
                ctx.doc.insert_chars(line + 1, 0, &rest);
            }
        }
        EditDirection::Backward => {
            let head = ctx.doc.remove_chars(line, 0, char);
            ctx.doc.insert_line(line);
            ctx.carets.shift_caret_line(line, EditDirection::Forward);
            ctx.doc.shift_foldings(line, EditDirection::Forward);
            if !head.is_empty() {
                ctx.doc.insert_chars(line, 0, &head);
            }
            ctx.carets
                .split_line_caret(id, line, char, EditDirection::Backward);
        }
    }
}

/// Append line `into + 1` to line `into`.
fn merge_line(id: CaretId, ctx: &mut EditContext<'_>, into: usize) {
    let from = into + 1;
    let (Some(into_len), Some(from_len)) = (ctx.doc.line_len(into), ctx.doc.line_len(from)) else {
        ctx.doc
            .internal_error(&format!("merge of missing line {from} into {into}"));
        return;
    };

    ctx.carets.merge_line_caret(id, into, from, into_len);
    let moved = ctx.doc.remove_chars(from, 0, from_len);
    if !moved.is_empty() {
        ctx.doc.insert_chars(into, into_len, &moved);
    }
    ctx.doc.remove_line(from);
    ctx.carets.shift_caret_line(from, EditDirection::Backward);
    ctx.doc.shift_foldings(from, EditDirection::Backward);
}

/// Lines spanned by the selection of caret `id`.
fn selected_lines(id: CaretId, ctx: &EditContext<'_>) -> std::ops::RangeInclusive<usize> {
    match ctx.carets.get(id) {
        Some(caret) => {
            let (start, end) = caret.sorted_without_sub();
            start.line..=end.line.min(ctx.doc.line_count().saturating_sub(1))
        }
        None => 1..=0,
    }
}

fn indent(id: CaretId, ctx: &mut EditContext<'_>) -> Vec<usize> {
    let tab: Vec<char> = ctx.doc.options().tab_string().chars().collect();
    let mut lines = Vec::new();
    for line in selected_lines(id, ctx) {
        ctx.doc.insert_chars(line, 0, &tab);
        ctx.carets
            .shift_caret_char(line, 0, EditDirection::Forward, tab.len());
        lines.push(line);
    }
    lines
}

fn unindent(id: CaretId, ctx: &mut EditContext<'_>) -> Vec<usize> {
    let tab: Vec<char> = ctx.doc.options().tab_string().chars().collect();
    let mut lines = Vec::new();
    for line in selected_lines(id, ctx) {
        let starts_with_tab = ctx
            .doc
            .line(line)
            .is_some_and(|l| l.chars().starts_with(&tab));
        if starts_with_tab {
            ctx.doc.remove_chars(line, 0, tab.len());
            ctx.carets
                .shift_caret_char(line, 0, EditDirection::Backward, tab.len());
            lines.push(line);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::options::Options;
    use std::sync::Arc;

    struct Fixture {
        doc: Document,
        carets: CaretManager,
    }

    impl Fixture {
        fn new(text: &str) -> Self {
            let mut doc = Document::new(Options::default(), Arc::new(Language::plain_text()));
            doc.set_text(text);
            Self {
                doc,
                carets: CaretManager::new(),
            }
        }

        fn caret(&mut self, line: usize, char: usize) -> CaretId {
            self.carets
                .add_caret(Coordinates::new(line, char), &self.doc)
                .expect("valid caret")
        }

        fn ctx(&mut self) -> EditContext<'_> {
            EditContext {
                doc: &mut self.doc,
                carets: &mut self.carets,
            }
        }

        fn positions(&self) -> Vec<(usize, usize)> {
            self.carets
                .iter()
                .map(|c| (c.position.line, c.position.char))
                .collect()
        }
    }

    #[test]
    fn test_insert_forward_moves_caret_and_shifts_others() {
        let mut fx = Fixture::new("abcd");
        let a = fx.caret(0, 1);
        fx.caret(0, 3);

        let mut command = Command::insert(EditDirection::Forward, vec!['x', 'y']);
        command.apply(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "axybcd");
        assert_eq!(fx.positions(), vec![(0, 3), (0, 5)]);

        command.revert(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "abcd");
        assert_eq!(fx.positions(), vec![(0, 1), (0, 3)]);
    }

    #[test]
    fn test_delete_backward_records_chars() {
        let mut fx = Fixture::new("hello");
        let a = fx.caret(0, 4);

        let mut command = Command::delete(EditDirection::Backward, 2);
        command.apply(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "heo");
        assert_eq!(fx.positions(), vec![(0, 2)]);
        assert!(matches!(&command, Command::DeleteChars { deleted, .. } if deleted == &['l', 'l']));

        command.revert(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "hello");
        assert_eq!(fx.positions(), vec![(0, 4)]);
    }

    #[test]
    fn test_delete_forward_short_logs_internal_error() {
        let mut fx = Fixture::new("ab");
        let a = fx.caret(0, 1);
        let mut command = Command::delete(EditDirection::Forward, 5);
        command.apply(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "a");
        assert_eq!(fx.doc.internal_errors(), 1);

        command.revert(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "ab");
        assert_eq!(fx.positions(), vec![(0, 1)]);
    }

    #[test]
    fn test_split_and_merge_are_inverse() {
        let mut fx = Fixture::new("abcd\nef");
        let a = fx.caret(0, 2);
        fx.caret(0, 3);
        fx.caret(1, 1);

        let mut split = Command::SplitLine {
            direction: EditDirection::Forward,
        };
        split.apply(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "ab\ncd\nef");
        assert_eq!(fx.positions(), vec![(1, 0), (1, 1), (2, 1)]);

        split.revert(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "abcd\nef");
        assert_eq!(fx.positions(), vec![(0, 2), (0, 3), (1, 1)]);
    }

    #[test]
    fn test_merge_forward_and_split_backward() {
        let mut fx = Fixture::new("ab\ncd\nef");
        let a = fx.caret(0, 2);
        fx.caret(1, 1);
        fx.caret(2, 0);

        let mut merge = Command::MergeLine {
            direction: EditDirection::Forward,
        };
        merge.apply(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "abcd\nef");
        assert_eq!(fx.positions(), vec![(0, 2), (0, 3), (1, 0)]);

        merge.revert(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "ab\ncd\nef");
        assert_eq!(fx.positions(), vec![(0, 2), (1, 1), (2, 0)]);
    }

    #[test]
    fn test_merge_backward_on_first_line_is_refused() {
        let mut fx = Fixture::new("ab");
        let a = fx.caret(0, 0);
        Command::MergeLine {
            direction: EditDirection::Backward,
        }
        .apply(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "ab");
        assert_eq!(fx.doc.internal_errors(), 1);
    }

    #[test]
    fn test_indent_and_unindent_selection() {
        let mut fx = Fixture::new("a\n\tb\nc");
        let a = fx
            .carets
            .add_selection(Coordinates::new(0, 0), Coordinates::new(1, 1), &fx.doc)
            .expect("selection");

        let mut indent = Command::Indent { lines: Vec::new() };
        indent.apply(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "\ta\n\t\tb\nc");
        assert_eq!(fx.positions(), vec![(1, 2)]);

        let mut unindent = Command::Unindent { lines: Vec::new() };
        unindent.apply(a, &mut fx.ctx());
        unindent.apply(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "a\nb\nc");
        assert!(matches!(&unindent, Command::Unindent { lines } if lines == &[1]));

        unindent.revert(a, &mut fx.ctx());
        assert_eq!(fx.doc.text(), "a\n\tb\nc");
        indent.revert(a, &mut fx.ctx());
        assert_eq!(fx.doc.internal_errors(), 1);
    }

    #[test]
    fn test_direction_shift() {
        assert_eq!(EditDirection::Forward.shift(3, 2), 5);
        assert_eq!(EditDirection::Backward.shift(1, 2), 0);
        assert_eq!(EditDirection::Forward.opposite(), EditDirection::Backward);
    }
}
