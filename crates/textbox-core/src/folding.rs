//! Collapsible line ranges.

use serde::{Deserialize, Serialize};

use crate::commands::EditDirection;

/// A fold region `[start_line, end_line]`. When folded, the lines strictly between the two
/// produce no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folding {
    /// Line holding the fold-start token.
    pub start_line: usize,
    /// Line holding the matching fold-end token (or the last line when unclosed).
    pub end_line: usize,
    /// Whether the interior is hidden.
    pub folded: bool,
}

impl Folding {
    /// Unfolded region.
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
            folded: false,
        }
    }

    /// Whether `line` lies in `[start_line, end_line]`.
    pub fn contains(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    /// Whether `line` is hidden by this region.
    pub fn hides(&self, line: usize) -> bool {
        self.folded && self.start_line < line && line < self.end_line
    }
}

/// Every fold region of a document, sorted by `(start_line, end_line)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldingList {
    foldings: Vec<Folding>,
}

impl FoldingList {
    /// Regions in order.
    pub fn iter(&self) -> impl Iterator<Item = &Folding> {
        self.foldings.iter()
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.foldings.len()
    }

    /// Whether there are no regions.
    pub fn is_empty(&self) -> bool {
        self.foldings.is_empty()
    }

    /// Replace the regions with `foldings`, keeping the `folded` flag of every region whose
    /// `(start_line, end_line)` existed before.
    pub fn rebuild(&mut self, mut foldings: Vec<Folding>) {
        foldings.sort_by_key(|f| (f.start_line, f.end_line));
        foldings.dedup_by_key(|f| (f.start_line, f.end_line));
        for folding in &mut foldings {
            folding.folded = self.foldings.iter().any(|old| {
                old.folded
                    && old.start_line == folding.start_line
                    && old.end_line == folding.end_line
            });
        }
        self.foldings = foldings;
    }

    /// Remove every region.
    pub fn clear(&mut self) {
        self.foldings.clear();
    }

    /// Move region bounds at or after `line` by one line in `direction`.
    pub fn shift_line(&mut self, line: usize, direction: EditDirection) {
        for folding in &mut self.foldings {
            if line <= folding.start_line {
                folding.start_line = direction.shift(folding.start_line, 1);
            }
            if line <= folding.end_line {
                folding.end_line = direction.shift(folding.end_line, 1);
            }
        }
    }

    /// Unfold every region containing `line`. Returns whether anything changed.
    pub fn unfold(&mut self, line: usize) -> bool {
        let mut changed = false;
        for folding in &mut self.foldings {
            if folding.folded && folding.contains(line) {
                folding.folded = false;
                changed = true;
            }
        }
        changed
    }

    /// Toggle the region starting at `start_line`. Returns the new state, or `None` when no
    /// region starts there.
    pub fn toggle(&mut self, start_line: usize) -> Option<bool> {
        let folding = self
            .foldings
            .iter_mut()
            .find(|f| f.start_line == start_line)?;
        folding.folded = !folding.folded;
        Some(folding.folded)
    }

    /// Fold or unfold every region.
    pub fn set_all(&mut self, folded: bool) {
        for folding in &mut self.foldings {
            folding.folded = folded;
        }
    }

    /// The innermost region starting at `line`.
    pub fn starting_at(&self, line: usize) -> Option<&Folding> {
        let index = self.foldings.partition_point(|f| f.start_line < line);
        self.foldings.get(index).filter(|f| f.start_line == line)
    }

    /// Whether `line` is hidden by any folded region.
    pub fn is_hidden(&self, line: usize) -> bool {
        self.foldings.iter().any(|f| f.hides(line))
    }

    /// Visibility of every line of a document with `line_count` lines, in one pass.
    pub fn visibility(&self, line_count: usize) -> Vec<bool> {
        let mut visible = Vec::with_capacity(line_count);
        let mut hidden_until = 0;
        let mut next = 0;
        for line in 0..line_count {
            visible.push(line >= hidden_until);
            while let Some(folding) = self.foldings.get(next)
                && folding.start_line <= line
            {
                if folding.folded {
                    hidden_until = hidden_until.max(folding.end_line);
                }
                next += 1;
            }
        }
        visible
    }
}
