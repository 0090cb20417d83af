//! Deferred scroll requests.
//!
//! Requests are recorded immediately but resolved once per frame, after the row list is
//! current, so a focus issued in the middle of an edit lands on the row the edit produced.

use crate::rows::Row;

/// Rows kept between a focused row and the view edge.
pub const FOCUS_MARGIN_ROWS: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollKind {
    /// Scroll only when the row is outside the view, keeping a margin.
    Focus,
    /// Put the row at the top of the view.
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScrollRequest {
    line: usize,
    sub: Option<usize>,
    kind: ScrollKind,
}

/// Pending scroll request of one text box.
#[derive(Debug, Clone, Default)]
pub struct ScrollManager {
    pending: Option<ScrollRequest>,
}

impl ScrollManager {
    /// Make `line` visible, clamped to `line_count`.
    pub fn focus(&mut self, line: usize, sub: Option<usize>, line_count: usize) {
        self.request(line, sub, line_count, ScrollKind::Focus);
    }

    /// Scroll `line` to the top of the view, clamped to `line_count`.
    pub fn scroll_to(&mut self, line: usize, sub: Option<usize>, line_count: usize) {
        self.request(line, sub, line_count, ScrollKind::Top);
    }

    fn request(&mut self, line: usize, sub: Option<usize>, line_count: usize, kind: ScrollKind) {
        self.pending = Some(ScrollRequest {
            line: line.min(line_count.saturating_sub(1)),
            sub,
            kind,
        });
    }

    /// Whether a request waits for the next frame.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolve the pending request against the current rows and view. Returns the new vertical
    /// scroll offset, or `None` when no scrolling is needed.
    pub fn resolve(
        &mut self,
        rows: &[Row],
        line_height: f32,
        view_y: f32,
        view_height: f32,
    ) -> Option<f32> {
        let request = self.pending.take()?;
        let key = (request.line, request.sub.unwrap_or(usize::MAX));
        let index = rows
            .partition_point(|row| (row.line, row.sub) <= key)
            .checked_sub(1)?;
        let mut scroll_y = index as f32 * line_height;

        if view_y <= scroll_y && scroll_y + line_height <= view_y + view_height {
            return None;
        }
        if request.kind == ScrollKind::Focus {
            let margin = line_height * FOCUS_MARGIN_ROWS;
            if scroll_y > view_y {
                scroll_y -= view_height - margin;
            } else {
                scroll_y -= margin;
            }
        }
        let scroll_y = scroll_y.max(0.0);
        tracing::trace!(line = request.line, scroll_y, "scroll resolved");
        Some(scroll_y)
    }
}
