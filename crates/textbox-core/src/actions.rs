//! Undoable user intents.
//!
//! An [`Action`] expands once per caret into a list of [`Command`]s. A caret's list is built
//! when its turn comes, so it already sees the edits made for earlier carets. The action keeps
//! the commands per caret id along with the caret set before and after execution; undo
//! restores the after-set, reverts every command in reverse and restores the before-set, redo
//! replays forward from the before-set.

use std::fmt::Write as _;

use crate::caret::{Caret, CaretId};
use crate::commands::{Command, EditContext, EditDirection};
use crate::coordinates::Coordinates;
use crate::document::Document;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Remove the text of every caret's selection.
    DeleteSelection,
    /// Insert text (already tab/EOL-normalized) at every caret.
    Paste(String),
    /// Type chars at every caret, replacing the following chars in overwrite mode.
    InputChars {
        /// Side of the caret.
        direction: EditDirection,
        /// Typed chars.
        chars: Vec<char>,
    },
    /// Delete one char (Backspace is `Backward`, Delete is `Forward`), joining lines at the
    /// line boundaries.
    DeleteChar(EditDirection),
    /// Split the line at every caret, re-inserting the leading indentation when auto-indent is
    /// on.
    Enter,
    /// Indent the selected lines of a single selecting caret, otherwise insert a tab.
    Tab,
    /// Unindent the selected lines of a single caret.
    UnTab,
}

impl ActionKind {
    fn create_commands(&self, caret: &Caret, doc: &Document, caret_count: usize) -> Vec<Command> {
        let position = caret.position;
        let line_len = doc.line_len(position.line).unwrap_or(0);
        let char = position.char.min(line_len);

        match self {
            ActionKind::DeleteSelection => delete_selection_commands(caret, doc),
            ActionKind::Paste(text) => {
                let mut commands = Vec::new();
                for (index, line) in text.split('\n').enumerate() {
                    if index > 0 {
                        commands.push(Command::SplitLine {
                            direction: EditDirection::Forward,
                        });
                    }
                    if !line.is_empty() {
                        commands.push(Command::insert(
                            EditDirection::Forward,
                            line.chars().collect(),
                        ));
                    }
                }
                commands
            }
            ActionKind::InputChars { direction, chars } => {
                let mut commands = Vec::new();
                if doc.options().overwrite {
                    let overwritten = chars.len().min(line_len - char);
                    if overwritten > 0 {
                        commands.push(Command::delete(*direction, overwritten));
                    }
                }
                commands.push(Command::insert(*direction, chars.clone()));
                commands
            }
            ActionKind::DeleteChar(direction) => match direction {
                EditDirection::Backward if char == 0 => {
                    if position.line == 0 {
                        Vec::new()
                    } else {
                        vec![Command::MergeLine {
                            direction: EditDirection::Backward,
                        }]
                    }
                }
                EditDirection::Forward if char == line_len => {
                    if position.line + 1 >= doc.line_count() {
                        Vec::new()
                    } else {
                        vec![Command::MergeLine {
                            direction: EditDirection::Forward,
                        }]
                    }
                }
                _ => vec![Command::delete(*direction, 1)],
            },
            ActionKind::Enter => {
                let mut commands = vec![Command::SplitLine {
                    direction: EditDirection::Forward,
                }];
                if doc.options().auto_indent
                    && let Some(line) = doc.line(position.line)
                {
                    let tabs = doc.options().count_tab_start(line.chars());
                    if tabs > 0 {
                        let indent = doc.options().tab_string().repeat(tabs);
                        commands.push(Command::insert(
                            EditDirection::Forward,
                            indent.chars().collect(),
                        ));
                    }
                }
                commands
            }
            ActionKind::Tab => {
                if caret_count == 1 && caret.has_char_selection() {
                    vec![Command::Indent { lines: Vec::new() }]
                } else {
                    vec![Command::insert(
                        EditDirection::Forward,
                        doc.options().tab_string().chars().collect(),
                    )]
                }
            }
            ActionKind::UnTab => {
                if caret_count == 1 {
                    vec![Command::Unindent { lines: Vec::new() }]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

/// Delete a selection line by line from the caret end towards the anchor, merging the lines in
/// between.
fn delete_selection_commands(caret: &Caret, doc: &Document) -> Vec<Command> {
    let mut commands = Vec::new();
    if !caret.has_char_selection() {
        return commands;
    }
    let Caret {
        position, anchor, ..
    } = *caret;

    if position.is_bigger_than_without_sub(&anchor) {
        for line in (anchor.line..=position.line).rev() {
            let Some(len) = doc.line_len(line) else {
                tracing::error!(line, "selection over missing line");
                continue;
            };
            let mut count = if line == position.line {
                position.char.min(len)
            } else {
                len
            };
            if line == anchor.line {
                count = count.saturating_sub(anchor.char);
            }
            push_delete(&mut commands, EditDirection::Backward, count);
            if line > anchor.line {
                commands.push(Command::MergeLine {
                    direction: EditDirection::Backward,
                });
            }
        }
    } else {
        for line in position.line..=anchor.line {
            let Some(len) = doc.line_len(line) else {
                tracing::error!(line, "selection over missing line");
                continue;
            };
            let mut count = if line == anchor.line {
                anchor.char.min(len)
            } else {
                len
            };
            if line == position.line {
                count = count.saturating_sub(position.char);
            }
            push_delete(&mut commands, EditDirection::Forward, count);
            if line < anchor.line {
                commands.push(Command::MergeLine {
                    direction: EditDirection::Forward,
                });
            }
        }
    }
    commands
}

fn push_delete(commands: &mut Vec<Command>, direction: EditDirection, count: usize) {
    if count > 0 {
        commands.push(Command::delete(direction, count));
    } else {
        tracing::debug!(?direction, "empty line segment in selection");
    }
}

/// Which coalescing group an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainClass {
    /// Every command inserts chars.
    Insert,
    /// Every command deletes chars.
    Delete,
}

/// One undo unit.
#[derive(Debug, Clone)]
pub struct Action {
    kind: ActionKind,
    commands: Vec<(CaretId, Vec<Command>)>,
    /// Caret set right after each command, in execution order.
    applied: Vec<Vec<Caret>>,
    start_carets: Vec<Caret>,
    end_carets: Vec<Caret>,
    start_text: Option<String>,
    end_text: Option<String>,
}

impl Action {
    /// An action that has not run yet.
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            commands: Vec::new(),
            applied: Vec::new(),
            start_carets: Vec::new(),
            end_carets: Vec::new(),
            start_text: None,
            end_text: None,
        }
    }

    /// The intent.
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Whether execution produced no command for any caret.
    pub fn is_empty(&self) -> bool {
        self.commands.iter().all(|(_, commands)| commands.is_empty())
    }

    /// Total number of commands over all carets.
    pub fn command_count(&self) -> usize {
        self.commands.iter().map(|(_, commands)| commands.len()).sum()
    }

    /// Caret set before the action.
    pub fn start_carets(&self) -> &[Caret] {
        &self.start_carets
    }

    /// Caret set after the action, before overlapping carets were merged.
    pub fn end_carets(&self) -> &[Caret] {
        &self.end_carets
    }

    /// Run the action for every caret.
    pub fn execute(&mut self, ctx: &mut EditContext<'_>) {
        self.commands.clear();
        self.applied.clear();
        let debug = ctx.doc.options().debug_mode;

        ctx.carets.set_dedup_deferred(true);
        self.start_carets = ctx.carets.snapshot();
        self.start_text = debug.then(|| ctx.doc.text());

        let caret_count = self.start_carets.len();
        for id in ctx.carets.ids() {
            let Some(caret) = ctx.carets.get(id).copied() else {
                continue;
            };
            let mut commands = self.kind.create_commands(&caret, ctx.doc, caret_count);
            for command in &mut commands {
                command.apply(id, ctx);
                self.applied.push(ctx.carets.snapshot());
            }
            self.commands.push((id, commands));
        }

        self.end_carets = ctx.carets.snapshot();
        self.end_text = debug.then(|| ctx.doc.text());
        ctx.carets.set_dedup_deferred(false);

        if debug {
            for caret in &self.end_carets {
                if !caret.position.is_valid(ctx.doc) || !caret.anchor.is_valid(ctx.doc) {
                    ctx.doc.internal_error(&format!(
                        "action left caret {} out of range",
                        caret.id().0
                    ));
                }
            }
            if !self.is_empty() && self.start_carets == self.end_carets {
                tracing::warn!(kind = ?self.kind, "action did not move any caret");
            }
        }
        tracing::debug!(kind = ?self.kind, commands = self.command_count(), "action executed");
    }

    /// Revert the action.
    pub fn undo(&mut self, ctx: &mut EditContext<'_>) {
        ctx.carets.set_dedup_deferred(true);
        ctx.carets.restore(&self.end_carets);
        verify_text(ctx.doc, self.end_text.as_deref(), "undo");

        // Each revert starts from the exact caret set its command produced.
        let mut applied = self.applied.iter().rev();
        for (id, commands) in self.commands.iter().rev() {
            for command in commands.iter().rev() {
                if let Some(carets) = applied.next() {
                    ctx.carets.restore(carets);
                }
                command.revert(*id, ctx);
            }
        }

        ctx.carets.restore(&self.start_carets);
        ctx.carets.set_dedup_deferred(false);
        verify_text(ctx.doc, self.start_text.as_deref(), "undo");
        tracing::debug!(kind = ?self.kind, "action undone");
    }

    /// Replay the action after it was undone.
    pub fn redo(&mut self, ctx: &mut EditContext<'_>) {
        ctx.carets.set_dedup_deferred(true);
        ctx.carets.restore(&self.start_carets);
        verify_text(ctx.doc, self.start_text.as_deref(), "redo");

        self.applied.clear();
        for (id, commands) in &mut self.commands {
            for command in commands.iter_mut() {
                command.apply(*id, ctx);
                self.applied.push(ctx.carets.snapshot());
            }
        }

        ctx.carets.restore(&self.end_carets);
        ctx.carets.set_dedup_deferred(false);
        verify_text(ctx.doc, self.end_text.as_deref(), "redo");
        tracing::debug!(kind = ?self.kind, "action redone");
    }

    /// The coalescing group, when every command has the same kind.
    pub fn chain_class(&self) -> Option<ChainClass> {
        let mut commands = self.commands.iter().flat_map(|(_, commands)| commands);
        if commands.clone().all(Command::is_insert) {
            Some(ChainClass::Insert)
        } else if commands.all(Command::is_delete) {
            Some(ChainClass::Delete)
        } else {
            None
        }
    }

    /// Whether this action continues exactly where `previous` left the carets: every
    /// previous end caret sits, selection-free, on this action's start position.
    pub fn is_chained(&self, previous: &Action) -> bool {
        previous.end_carets.len() == self.start_carets.len()
            && previous
                .end_carets
                .iter()
                .zip(&self.start_carets)
                .all(|(end, start)| {
                    same_spot(end.position, start.position) && same_spot(end.anchor, start.position)
                })
    }

    /// Multi-line listing of the commands per caret.
    pub fn describe(&self) -> String {
        let mut out = format!("{:?}\n", self.kind);
        for (id, commands) in &self.commands {
            let _ = writeln!(out, "\tcaret {}: {} commands", id.0, commands.len());
            for command in commands {
                let _ = writeln!(out, "\t\t{command}");
            }
        }
        out
    }
}

fn same_spot(a: Coordinates, b: Coordinates) -> bool {
    a.line == b.line && a.char == b.char
}

fn verify_text(doc: &mut Document, expected: Option<&str>, stage: &str) {
    if let Some(expected) = expected
        && doc.text() != expected
    {
        doc.internal_error(&format!("{stage}: text does not match the recorded snapshot"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caret::CaretManager;
    use crate::language::Language;
    use crate::options::{Options, TabMode};
    use std::sync::Arc;

    struct Fixture {
        doc: Document,
        carets: CaretManager,
    }

    impl Fixture {
        fn new(text: &str, options: Options) -> Self {
            let mut doc = Document::new(options, Arc::new(Language::plain_text()));
            doc.set_text(text);
            Self {
                doc,
                carets: CaretManager::new(),
            }
        }

        fn run(&mut self, kind: ActionKind) -> Action {
            let mut action = Action::new(kind);
            action.execute(&mut self.ctx());
            action
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

    fn debug_options() -> Options {
        Options {
            debug_mode: true,
            ..Options::default()
        }
    }

    #[test]
    fn test_backspace_at_line_start_merges() {
        let mut fx = Fixture::new("abc\ndef", debug_options());
        fx.carets.add_caret(Coordinates::new(1, 0), &fx.doc);
        let mut action = fx.run(ActionKind::DeleteChar(EditDirection::Backward));
        assert_eq!(fx.doc.text(), "abcdef");
        assert_eq!(fx.positions(), vec![(0, 3)]);

        action.undo(&mut fx.ctx());
        assert_eq!(fx.doc.text(), "abc\ndef");
        assert_eq!(fx.positions(), vec![(1, 0)]);
        assert_eq!(fx.doc.internal_errors(), 0);
    }

    #[test]
    fn test_undo_separates_carets_that_met() {
        let text = "fn main() {\n\tlet x = 1;\n}\n\nabc def";
        let mut fx = Fixture::new(text, debug_options());
        for (line, char) in [(0, 2), (3, 0), (2, 1), (2, 0)] {
            fx.carets.add_caret(Coordinates::new(line, char), &fx.doc);
        }
        let mut action = fx.run(ActionKind::DeleteChar(EditDirection::Backward));
        assert_ne!(fx.doc.text(), text);

        action.undo(&mut fx.ctx());
        assert_eq!(fx.doc.text(), text);
        assert_eq!(fx.positions(), vec![(0, 2), (3, 0), (2, 1), (2, 0)]);
        assert_eq!(fx.doc.internal_errors(), 0);
    }

    #[test]
    fn test_delete_at_document_edges_is_empty() {
        let mut fx = Fixture::new("ab", Options::default());
        fx.carets.add_caret(Coordinates::new(0, 2), &fx.doc);
        assert!(fx.run(ActionKind::DeleteChar(EditDirection::Forward)).is_empty());
        fx.carets.clear();
        fx.carets.add_caret(Coordinates::new(0, 0), &fx.doc);
        assert!(fx.run(ActionKind::DeleteChar(EditDirection::Backward)).is_empty());
        assert_eq!(fx.doc.text(), "ab");
    }

    #[test]
    fn test_delete_selection_both_directions() {
        for reversed in [false, true] {
            let mut fx = Fixture::new("one\ntwo\nthree", debug_options());
            let (a, b) = (Coordinates::new(0, 1), Coordinates::new(2, 2));
            let (anchor, position) = if reversed { (b, a) } else { (a, b) };
            fx.carets.add_selection(anchor, position, &fx.doc);

            let mut action = fx.run(ActionKind::DeleteSelection);
            assert_eq!(fx.doc.text(), "oree");
            assert_eq!(fx.positions(), vec![(0, 1)]);

            action.undo(&mut fx.ctx());
            assert_eq!(fx.doc.text(), "one\ntwo\nthree");
            assert_eq!(fx.carets.first().map(|c| (c.anchor, c.position)), Some((anchor, position)));

            action.redo(&mut fx.ctx());
            assert_eq!(fx.doc.text(), "oree");
            assert_eq!(fx.doc.internal_errors(), 0);
        }
    }

    #[test]
    fn test_paste_multiline_at_two_carets() {
        let mut fx = Fixture::new("ab\ncd", debug_options());
        fx.carets.add_caret(Coordinates::new(0, 1), &fx.doc);
        fx.carets.add_caret(Coordinates::new(1, 1), &fx.doc);

        let mut action = fx.run(ActionKind::Paste("X\nY".to_string()));
        assert_eq!(fx.doc.text(), "aX\nYb\ncX\nYd");
        assert_eq!(fx.positions(), vec![(1, 1), (3, 1)]);

        action.undo(&mut fx.ctx());
        assert_eq!(fx.doc.text(), "ab\ncd");
        assert_eq!(fx.positions(), vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn test_overwrite_replaces_following_chars() {
        let options = Options {
            overwrite: true,
            ..Options::default()
        };
        let mut fx = Fixture::new("abcd", options);
        fx.carets.add_caret(Coordinates::new(0, 3), &fx.doc);
        fx.run(ActionKind::InputChars {
            direction: EditDirection::Forward,
            chars: vec!['x', 'y'],
        });
        assert_eq!(fx.doc.text(), "abcxy");
        assert_eq!(fx.positions(), vec![(0, 5)]);
    }

    #[test]
    fn test_enter_auto_indents() {
        let mut fx = Fixture::new("\t\tfoo()", debug_options());
        fx.carets.add_caret(Coordinates::new(0, 5), &fx.doc);
        let mut action = fx.run(ActionKind::Enter);
        assert_eq!(fx.doc.text(), "\t\tfoo\n\t\t()");
        assert_eq!(fx.positions(), vec![(1, 2)]);

        action.undo(&mut fx.ctx());
        assert_eq!(fx.doc.text(), "\t\tfoo()");
        assert_eq!(fx.doc.internal_errors(), 0);
    }

    #[test]
    fn test_tab_indents_single_selection() {
        let options = Options {
            tab_mode: TabMode::Space,
            tab_size: 2,
            ..Options::default()
        };
        let mut fx = Fixture::new("a\nb\nc", options);
        fx.carets
            .add_selection(Coordinates::new(0, 0), Coordinates::new(1, 1), &fx.doc);
        fx.run(ActionKind::Tab);
        assert_eq!(fx.doc.text(), "  a\n  b\nc");

        fx.run(ActionKind::UnTab);
        assert_eq!(fx.doc.text(), "a\nb\nc");

        fx.carets.clear();
        fx.carets.add_caret(Coordinates::new(2, 1), &fx.doc);
        fx.run(ActionKind::Tab);
        assert_eq!(fx.doc.text(), "a\nb\nc  ");
    }

    #[test]
    fn test_chain_class_and_chaining() {
        let mut fx = Fixture::new("", Options::default());
        fx.carets.add_caret(Coordinates::new(0, 0), &fx.doc);
        let typing = |c| ActionKind::InputChars {
            direction: EditDirection::Forward,
            chars: vec![c],
        };
        let first = fx.run(typing('a'));
        let second = fx.run(typing('b'));
        assert_eq!(first.chain_class(), Some(ChainClass::Insert));
        assert!(second.is_chained(&first));

        let enter = fx.run(ActionKind::Enter);
        assert_eq!(enter.chain_class(), None);
        assert!(enter.is_chained(&second));
        assert!(!first.is_chained(&second));
        assert!(enter.describe().contains("split line"));
    }
}
