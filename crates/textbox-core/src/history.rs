//! Bounded undo/redo history with coalescing of consecutive typing and deleting.

use std::collections::VecDeque;
use std::fmt::Write as _;

use crate::actions::Action;
use crate::commands::EditContext;

/// Executed actions and the ones undone since.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Action>,
    redo: VecDeque<Action>,
    capacity: usize,
}

impl History {
    /// Empty history keeping at most `capacity` undoable actions.
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Run an action and record it. Refused when the document is read-only; actions that
    /// produced no command are not recorded. Returns whether the action was recorded.
    pub fn execute(&mut self, mut action: Action, ctx: &mut EditContext<'_>) -> bool {
        if ctx.doc.options().read_only {
            tracing::debug!(kind = ?action.kind(), "read-only, action refused");
            return false;
        }
        action.execute(ctx);
        if action.is_empty() {
            return false;
        }

        self.undo.push_back(action);
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        self.redo.clear();
        true
    }

    /// Undo the last action and every earlier action chained to it. Returns whether anything
    /// was undone.
    pub fn undo(&mut self, ctx: &mut EditContext<'_>) -> bool {
        if ctx.doc.options().read_only {
            return false;
        }
        let Some(mut action) = self.undo.pop_back() else {
            return false;
        };
        action.undo(ctx);
        let class = action.chain_class();
        self.redo.push_front(action);

        let Some(class) = class else {
            return true;
        };
        while let Some(previous) = self.undo.back()
            && previous.chain_class() == Some(class)
            && self
                .redo
                .front()
                .is_some_and(|later| later.is_chained(previous))
        {
            let Some(mut previous) = self.undo.pop_back() else {
                break;
            };
            previous.undo(ctx);
            self.redo.push_front(previous);
        }
        true
    }

    /// Redo the next undone action and every later action chained to it. Returns whether
    /// anything was redone.
    pub fn redo(&mut self, ctx: &mut EditContext<'_>) -> bool {
        if ctx.doc.options().read_only {
            return false;
        }
        let Some(mut action) = self.redo.pop_front() else {
            return false;
        };
        action.redo(ctx);
        let class = action.chain_class();
        self.undo.push_back(action);

        let Some(class) = class else {
            return true;
        };
        while let Some(next) = self.redo.front()
            && next.chain_class() == Some(class)
            && self
                .undo
                .back()
                .is_some_and(|earlier| next.is_chained(earlier))
        {
            let Some(mut next) = self.redo.pop_front() else {
                break;
            };
            next.redo(ctx);
            self.undo.push_back(next);
        }
        true
    }

    /// Whether there is anything to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether there is anything to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undoable actions.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of redoable actions.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Change the bound, evicting the oldest actions when needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Both stacks as text, oldest first.
    pub fn describe(&self) -> String {
        let mut out = String::from("History:\n");
        for action in &self.undo {
            let _ = write!(out, "{}", action.describe());
        }
        out.push_str("Redo History:\n");
        for action in &self.redo {
            let _ = write!(out, "{}", action.describe());
        }
        out
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(1000)
    }
}
