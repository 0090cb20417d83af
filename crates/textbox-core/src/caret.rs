//! Carets, selections and their structural bookkeeping.
//!
//! Every caret carries a [`CaretId`] issued in insertion order; the id doubles as the caret's
//! priority when overlapping carets are deduplicated (the earlier caret wins). Commands address
//! carets by id, so the caret list may shrink while an action runs without invalidating the
//! commands that still have to run.

use serde::{Deserialize, Serialize};

use crate::commands::EditDirection;
use crate::coordinates::{CaretMove, Coordinates, MoveEnv};
use crate::document::Document;
use crate::metrics::FontSource;

/// Stable identity of a caret, ordered by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaretId(pub u64);

/// A caret with an optional selection. The selection spans `anchor` to `position`; it is empty
/// when both coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caret {
    id: CaretId,
    /// Where the caret is drawn and where edits happen.
    pub position: Coordinates,
    /// Fixed end of the selection.
    pub anchor: Coordinates,
}

impl Caret {
    /// Identity of the caret.
    pub fn id(&self) -> CaretId {
        self.id
    }

    /// Whether anchor and position differ (sub-line aware).
    pub fn has_selection(&self, doc: &mut Document, src: &dyn FontSource) -> bool {
        !self.anchor.is_same_as(&self.position, doc, src)
    }

    /// Selection ends in document order (sub-line aware).
    pub fn sorted(&self, doc: &mut Document, src: &dyn FontSource) -> (Coordinates, Coordinates) {
        if self.position.is_bigger_than(&self.anchor, doc, src) {
            (self.anchor, self.position)
        } else {
            (self.position, self.anchor)
        }
    }

    /// Selection ends in document order, comparing line and char only.
    pub fn sorted_without_sub(&self) -> (Coordinates, Coordinates) {
        if self.position.is_bigger_than_without_sub(&self.anchor) {
            (self.anchor, self.position)
        } else {
            (self.position, self.anchor)
        }
    }

    /// Whether the selection covers at least one char.
    pub fn has_char_selection(&self) -> bool {
        let (start, end) = self.sorted_without_sub();
        end.is_bigger_than_without_sub(&start)
    }

    /// Collapse the selection onto the position.
    pub fn remove_selection(&mut self) {
        self.anchor = self.position;
    }
}

/// The caret set of one editor.
#[derive(Debug, Clone, Default)]
pub struct CaretManager {
    carets: Vec<Caret>,
    next_id: u64,
    dedup_deferred: bool,
    version: u64,
}

impl CaretManager {
    /// An empty caret set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of carets.
    pub fn len(&self) -> usize {
        self.carets.len()
    }

    /// Whether there are no carets.
    pub fn is_empty(&self) -> bool {
        self.carets.is_empty()
    }

    /// Carets in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Caret> {
        self.carets.iter()
    }

    /// Caret with the given id, if it survived deduplication.
    pub fn get(&self, id: CaretId) -> Option<&Caret> {
        self.carets.iter().find(|c| c.id == id)
    }

    /// First caret by priority.
    pub fn first(&self) -> Option<&Caret> {
        self.carets.first()
    }

    /// Increases on every caret change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Ids of every caret in priority order.
    pub fn ids(&self) -> Vec<CaretId> {
        self.carets.iter().map(|c| c.id).collect()
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    fn get_mut(&mut self, id: CaretId) -> Option<&mut Caret> {
        self.version += 1;
        self.carets.iter_mut().find(|c| c.id == id)
    }

    /// Remove every caret.
    pub fn clear(&mut self) {
        self.carets.clear();
        self.touch();
    }

    /// Add a caret without selection.
    pub fn add_caret(&mut self, position: Coordinates, doc: &Document) -> Option<CaretId> {
        self.add_selection(position, position, doc)
    }

    /// Add a caret selecting from `anchor` to `position`. Invalid endpoints are rejected; an
    /// overlap with an earlier caret drops the new one.
    pub fn add_selection(
        &mut self,
        anchor: Coordinates,
        position: Coordinates,
        doc: &Document,
    ) -> Option<CaretId> {
        if !position.is_valid(doc) || !anchor.is_valid(doc) {
            tracing::error!(?position, ?anchor, "rejecting invalid caret");
            return None;
        }
        let id = CaretId(self.next_id);
        self.next_id += 1;
        self.carets.push(Caret {
            id,
            position,
            anchor,
        });
        self.touch();
        self.dedup();
        self.get(id).map(Caret::id)
    }

    /// Drop every caret but the first and return it.
    pub fn keep_first(&mut self) -> Option<Caret> {
        if self.carets.len() > 1 {
            self.carets.truncate(1);
            self.touch();
        }
        self.carets.first().copied()
    }

    /// Move the first caret's position, keeping its anchor.
    pub fn set_first_position(&mut self, position: Coordinates) {
        if let Some(caret) = self.carets.first_mut() {
            caret.position = position;
            self.touch();
        }
        self.dedup();
    }

    /// Move every caret's position (the anchor stays, extending selections).
    pub fn move_positions(&mut self, caret_move: CaretMove, count: usize, env: &mut MoveEnv<'_>) {
        for caret in &mut self.carets {
            caret.position = caret.position.find_move(caret_move, count, env);
        }
        self.touch();
        self.dedup();
    }

    /// Move every caret's anchor.
    pub fn move_anchors(&mut self, caret_move: CaretMove, count: usize, env: &mut MoveEnv<'_>) {
        for caret in &mut self.carets {
            caret.anchor = caret.anchor.find_move(caret_move, count, env);
        }
        self.touch();
        self.dedup();
    }

    /// Whether any caret has a selection.
    pub fn has_selection(&self, doc: &mut Document, src: &dyn FontSource) -> bool {
        self.carets.iter().any(|c| c.has_selection(doc, src))
    }

    /// Collapse every selection.
    pub fn remove_selections(&mut self) {
        for caret in &mut self.carets {
            caret.remove_selection();
        }
        self.touch();
        self.dedup();
    }

    /// Forget every explicit sub-line.
    pub fn clear_subs(&mut self) {
        for caret in &mut self.carets {
            caret.position.sub = None;
            caret.anchor.sub = None;
        }
        self.touch();
    }

    /// Select everything with a single caret at the end of the document.
    pub fn select_all(&mut self, doc: &Document) {
        self.clear();
        let last = doc.line_count().saturating_sub(1);
        let end = Coordinates::new(last, doc.line_len(last).unwrap_or(0));
        self.add_selection(Coordinates::new(0, 0), end, doc);
    }

    /// Replace the caret set with one caret per `(from, to)` range. When any range is
    /// non-empty, empty ranges are skipped. `reversed` puts the position at `from`.
    pub fn select_rectangle(&mut self, ranges: &[(Coordinates, Coordinates)], reversed: bool) {
        self.carets.clear();
        let any_selection = ranges.iter().any(|(from, to)| from.char != to.char);
        for &(from, to) in ranges {
            if any_selection && from.char == to.char {
                continue;
            }
            let (position, anchor) = if reversed { (from, to) } else { (to, from) };
            let id = CaretId(self.next_id);
            self.next_id += 1;
            self.carets.push(Caret {
                id,
                position,
                anchor,
            });
        }
        self.touch();
        self.dedup();
    }

    /// Postpone deduplication while an action runs; turning it back on deduplicates.
    pub fn set_dedup_deferred(&mut self, deferred: bool) {
        self.dedup_deferred = deferred;
        if !deferred {
            self.dedup();
        }
    }

    /// Remove every caret whose span overlaps (or touches) an earlier caret's span.
    pub fn dedup(&mut self) {
        if self.dedup_deferred {
            return;
        }
        let mut i = self.carets.len();
        while i > 1 {
            i -= 1;
            let (start, end) = self.carets[i].sorted_without_sub();
            let overlapped = self.carets[..i].iter().any(|priority| {
                let (priority_start, priority_end) = priority.sorted_without_sub();
                !(priority_start.is_bigger_than_without_sub(&end)
                    || start.is_bigger_than_without_sub(&priority_end))
            });
            if overlapped {
                let removed = self.carets.remove(i);
                tracing::debug!(id = removed.id.0, "overlapping caret removed");
                self.touch();
            }
        }
    }

    /// Snapshot of every caret.
    pub fn snapshot(&self) -> Vec<Caret> {
        self.carets.clone()
    }

    /// Replace the caret set with a snapshot, without deduplicating.
    pub fn restore(&mut self, carets: &[Caret]) {
        self.carets = carets.to_vec();
        if let Some(max) = self.carets.iter().map(|c| c.id.0).max() {
            self.next_id = self.next_id.max(max + 1);
        }
        self.touch();
    }

    /// Whether any caret sits on `line`.
    pub fn line_has_caret(&self, line: usize) -> bool {
        self.carets.iter().any(|c| c.position.line == line)
    }

    /// Shift caret ends on `line` after `at` by `count` chars. Backward shifts stop at `at`.
    pub fn shift_caret_char(
        &mut self,
        line: usize,
        at: usize,
        direction: EditDirection,
        count: usize,
    ) {
        let shift = |c: &mut Coordinates| {
            if c.line == line && c.char > at {
                c.char = match direction {
                    EditDirection::Forward => c.char + count,
                    EditDirection::Backward => c.char.saturating_sub(count).max(at),
                };
                c.sub = None;
            }
        };
        for caret in &mut self.carets {
            shift(&mut caret.position);
            shift(&mut caret.anchor);
        }
        self.touch();
    }

    /// Advance a caret past `count` typed chars and collapse its selection.
    pub fn input_char_caret(&mut self, id: CaretId, count: usize) {
        if let Some(caret) = self.get_mut(id) {
            caret.position.char += count;
            caret.position.sub = None;
            caret.remove_selection();
        }
        self.dedup();
    }

    /// Collapse a caret's selection after a deletion already moved it.
    pub fn delete_char_caret(&mut self, id: CaretId) {
        if let Some(caret) = self.get_mut(id) {
            caret.remove_selection();
        }
        self.dedup();
    }

    /// Shift caret lines after a line insertion (`Forward`, lines at or after `index`) or
    /// removal (`Backward`, lines after `index`).
    pub fn shift_caret_line(&mut self, index: usize, direction: EditDirection) {
        let shift = |c: &mut Coordinates| match direction {
            EditDirection::Forward if c.line >= index => {
                c.line += 1;
                c.sub = None;
            }
            EditDirection::Backward if c.line > index => {
                c.line -= 1;
                c.sub = None;
            }
            _ => {}
        };
        for caret in &mut self.carets {
            shift(&mut caret.position);
            shift(&mut caret.anchor);
        }
        self.touch();
    }

    /// Move caret ends on `from_line` onto `into_line`, after its first `into_len` chars, and
    /// collapse the editing caret's selection.
    pub fn merge_line_caret(
        &mut self,
        id: CaretId,
        into_line: usize,
        from_line: usize,
        into_len: usize,
    ) {
        let merge = |c: &mut Coordinates| {
            if c.line == from_line {
                *c = Coordinates::new(into_line, c.char + into_len);
            }
        };
        for caret in &mut self.carets {
            merge(&mut caret.position);
            merge(&mut caret.anchor);
        }
        if let Some(caret) = self.get_mut(id) {
            caret.remove_selection();
        }
        self.dedup();
    }

    /// Redistribute caret ends after line `line` was split at `at`.
    ///
    /// `Forward`: ends on `line` at or after `at` move to the new next line. `Backward`: the
    /// split happened in front, so the editing caret lands at `(line, at)` and ends on the
    /// following line move back up when they lie before `at`.
    pub fn split_line_caret(
        &mut self,
        id: CaretId,
        line: usize,
        at: usize,
        direction: EditDirection,
    ) {
        match direction {
            EditDirection::Forward => {
                let split = |c: &mut Coordinates| {
                    if c.line == line && c.char >= at {
                        *c = Coordinates::new(line + 1, c.char - at);
                    }
                };
                for caret in &mut self.carets {
                    split(&mut caret.position);
                    split(&mut caret.anchor);
                }
            }
            EditDirection::Backward => {
                let split = |c: &mut Coordinates| {
                    if c.line == line + 1 {
                        *c = if c.char < at {
                            Coordinates::new(line, c.char)
                        } else {
                            Coordinates::new(line + 1, c.char - at)
                        };
                    }
                };
                for caret in &mut self.carets {
                    if caret.id == id {
                        caret.position = Coordinates::new(line, at);
                    } else {
                        split(&mut caret.position);
                    }
                    split(&mut caret.anchor);
                }
            }
        }
        if let Some(caret) = self.get_mut(id) {
            caret.remove_selection();
        }
        self.dedup();
    }

    /// Clipboard text: every non-empty selection in document order, fold-hidden lines
    /// included, joined with the line terminator.
    pub fn copy_text(&self, doc: &Document) -> String {
        let mut spans: Vec<(Coordinates, Coordinates)> = self
            .carets
            .iter()
            .filter(|c| c.has_char_selection())
            .map(Caret::sorted_without_sub)
            .collect();
        spans.sort_by_key(|(start, _)| (start.line, start.char));

        let eol = doc.options().eol_str();
        spans
            .iter()
            .map(|&(start, end)| text_between(doc, start, end, eol))
            .collect::<Vec<_>>()
            .join(eol)
    }
}

/// Text from `start` (inclusive) to `end` (exclusive).
pub fn text_between(doc: &Document, start: Coordinates, end: Coordinates, eol: &str) -> String {
    let mut text = String::new();
    for line_index in start.line..=end.line {
        let Some(line) = doc.line(line_index) else {
            break;
        };
        let chars = line.chars();
        let from = if line_index == start.line {
            start.char.min(chars.len())
        } else {
            0
        };
        let to = if line_index == end.line {
            end.char.min(chars.len())
        } else {
            chars.len()
        };
        if line_index > start.line {
            text.push_str(eol);
        }
        if from < to {
            text.extend(&chars[from..to]);
        }
    }
    text
}
