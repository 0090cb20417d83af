//! Row projection: the flat list of visible sub-lines handed to the renderer.
//!
//! Rows are rebuilt lazily whenever the document version moves (edits, fold toggles, layout
//! invalidation). Each row additionally caches its selection and search highlight spans; those
//! caches are keyed on the caret set and search versions so caret movement never rebuilds the
//! row list itself.

use crate::cache::{Cache, CacheStats};
use crate::caret::CaretManager;
use crate::coordinates::Coordinates;
use crate::document::Document;
use crate::folding::Folding;
use crate::layout::LineSub;
use crate::metrics::FontSource;
use crate::search::Search;

/// One visual row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row {
    /// Line index.
    pub line: usize,
    /// Sub-line index within the line.
    pub sub: usize,
    /// The fold region starting on this line, set on the first sub-line only.
    pub folding: Option<Folding>,
}

/// Highlighted horizontal span of a row. Positions exclude the sub-line indent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSpan {
    /// Left edge.
    pub start_x: f32,
    /// Right edge.
    pub end_x: f32,
    /// First highlighted char.
    pub start_char: usize,
    /// One past the last highlighted char.
    pub end_char: usize,
}

/// Selection state of one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSelection {
    /// Selected spans, one per caret whose selection crosses the row.
    pub spans: Vec<RowSpan>,
    /// Caret positions drawn on this row.
    pub carets: Vec<Coordinates>,
}

/// Search highlights of one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSearch {
    /// `(match index, span)` of every match on the row.
    pub spans: Vec<(usize, RowSpan)>,
}

/// Builds and caches rows and their per-row highlight state.
#[derive(Debug)]
pub struct RowManager {
    rows: Cache<Vec<Row>>,
    doc_version: Option<u64>,
    selections: Vec<Cache<RowSelection>>,
    selection_key: Option<(u64, u64)>,
    searches: Vec<Cache<RowSearch>>,
    search_key: Option<(u64, u64)>,
}

impl Default for RowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RowManager {
    /// Empty manager; the first query builds everything.
    pub fn new() -> Self {
        Self {
            rows: Cache::new("Rows"),
            doc_version: None,
            selections: Vec::new(),
            selection_key: None,
            searches: Vec::new(),
            search_key: None,
        }
    }

    /// Force a rebuild on the next query.
    pub fn set_dirty(&mut self) {
        self.doc_version = None;
    }

    /// Visible rows, rebuilt if the document changed.
    pub fn rows(&mut self, doc: &mut Document, src: &dyn FontSource) -> &[Row] {
        let version = doc.version();
        if self.doc_version != Some(version) {
            self.rows.set_dirty();
            self.doc_version = Some(version);
        }
        if self.rows.is_dirty() {
            let rows = self.rows.force_with(|mut rows| {
                rows.clear();
                build_rows(doc, src, &mut rows);
                rows
            });
            let count = rows.len();
            self.selections
                .resize_with(count, || Cache::new("Row Selection"));
            self.searches.resize_with(count, || Cache::new("Row Search"));
            self.selection_key = None;
            self.search_key = None;
            tracing::trace!(rows = count, "rows rebuilt");
        }
        self.rows.peek()
    }

    /// Number of visible rows.
    pub fn row_count(&mut self, doc: &mut Document, src: &dyn FontSource) -> usize {
        self.rows(doc, src).len()
    }

    /// Row at `index`.
    pub fn row(&mut self, index: usize, doc: &mut Document, src: &dyn FontSource) -> Option<Row> {
        self.rows(doc, src).get(index).copied()
    }

    /// Index of the first row on `line` or, when it is hidden, on the next visible line.
    pub fn row_of_line(&mut self, line: usize, doc: &mut Document, src: &dyn FontSource) -> usize {
        let rows = self.rows(doc, src);
        rows.partition_point(|row| row.line < line)
            .min(rows.len().saturating_sub(1))
    }

    /// Index of the row showing `coordinates`, if visible.
    pub fn row_of(
        &mut self,
        coordinates: Coordinates,
        doc: &mut Document,
        src: &dyn FontSource,
    ) -> Option<usize> {
        let sub = doc.resolve_sub(coordinates, src)?;
        let rows = self.rows(doc, src);
        let index = rows.partition_point(|row| (row.line, row.sub) < (coordinates.line, sub));
        rows.get(index)
            .filter(|row| row.line == coordinates.line && row.sub == sub)
            .map(|_| index)
    }

    /// Selection spans and caret positions on row `index`.
    pub fn selection(
        &mut self,
        index: usize,
        doc: &mut Document,
        carets: &CaretManager,
        src: &dyn FontSource,
    ) -> Option<&RowSelection> {
        let row = self.row(index, doc, src)?;
        let key = (doc.version(), carets.version());
        if self.selection_key != Some(key) {
            for cache in &mut self.selections {
                cache.set_dirty();
            }
            self.selection_key = Some(key);
        }
        let cache = self.selections.get_mut(index)?;
        Some(cache.force_with(|_| row_selection(row, doc, carets, src)))
    }

    /// Search highlights on row `index`.
    pub fn search(
        &mut self,
        index: usize,
        doc: &mut Document,
        search: &Search,
        src: &dyn FontSource,
    ) -> Option<&RowSearch> {
        let row = self.row(index, doc, src)?;
        let key = (doc.version(), search.version());
        if self.search_key != Some(key) {
            for cache in &mut self.searches {
                cache.set_dirty();
            }
            self.search_key = Some(key);
        }
        let cache = self.searches.get_mut(index)?;
        Some(cache.force_with(|_| row_search(row, doc, search, src)))
    }

    /// Counters of the row caches, aggregated per cache name.
    pub fn stats(&self) -> Vec<(&'static str, CacheStats)> {
        let mut selection = CacheStats::default();
        for cache in &self.selections {
            selection.merge(&cache.stats());
        }
        let mut search = CacheStats::default();
        for cache in &self.searches {
            search.merge(&cache.stats());
        }
        vec![
            (self.rows.name(), self.rows.stats()),
            ("Row Selection", selection),
            ("Row Search", search),
        ]
    }
}

fn build_rows(doc: &mut Document, src: &dyn FontSource, rows: &mut Vec<Row>) {
    let visibility = doc.foldings().visibility(doc.line_count());
    for (line, visible) in visibility.into_iter().enumerate() {
        if !visible {
            continue;
        }
        let folding = doc.folding_at(line);
        let subs = doc.line_subs(line, src).len().max(1);
        rows.extend((0..subs).map(|sub| Row {
            line,
            sub,
            folding: if sub == 0 { folding } else { None },
        }));
    }
}

/// Span of `[start, end)` on the row's sub-line, given the sub-line keys of both ends.
fn span_on_row(
    sub: &LineSub,
    row_key: (usize, usize),
    (start, start_key): (Coordinates, (usize, usize)),
    (end, end_key): (Coordinates, (usize, usize)),
    whitespace_width: f32,
) -> Option<RowSpan> {
    if row_key < start_key || end_key < row_key {
        return None;
    }
    let (start_x, start_char) = if start_key == row_key {
        (sub.char_position(start.char), start.char)
    } else {
        (0.0, sub.start_char)
    };
    let (end_x, end_char) = if end_key == row_key {
        (sub.char_position(end.char), end.char)
    } else {
        let full = sub.char_widths.iter().sum::<f32>();
        // An empty row inside a selection still shows a sliver.
        (if full < 1.0 { whitespace_width } else { full }, sub.end_char())
    };
    Some(RowSpan {
        start_x,
        end_x,
        start_char,
        end_char,
    })
}

fn row_selection(
    row: Row,
    doc: &mut Document,
    carets: &CaretManager,
    src: &dyn FontSource,
) -> RowSelection {
    let mut selection = RowSelection::default();
    let Some(sub) = doc.line_subs(row.line, src).get(row.sub).cloned() else {
        return selection;
    };
    let whitespace_width = doc.fonts_mut().whitespace_width(src);
    let row_key = (row.line, row.sub);

    for caret in carets.iter() {
        let Some(position_sub) = doc.resolve_sub(caret.position, src) else {
            tracing::error!(position = ?caret.position, "caret outside the document");
            continue;
        };
        if caret.has_selection(doc, src) {
            let (start, end) = caret.sorted(doc, src);
            if let (Some(start_sub), Some(end_sub)) =
                (doc.resolve_sub(start, src), doc.resolve_sub(end, src))
                && let Some(span) = span_on_row(
                    &sub,
                    row_key,
                    (start, (start.line, start_sub)),
                    (end, (end.line, end_sub)),
                    whitespace_width,
                )
            {
                selection.spans.push(span);
            }
        }
        if (caret.position.line, position_sub) == row_key {
            selection.carets.push(caret.position);
        }
    }
    selection
}

fn row_search(row: Row, doc: &mut Document, search: &Search, src: &dyn FontSource) -> RowSearch {
    let mut result = RowSearch::default();
    let Some(sub) = doc.line_subs(row.line, src).get(row.sub).cloned() else {
        return result;
    };
    let whitespace_width = doc.fonts_mut().whitespace_width(src);
    let row_key = (row.line, row.sub);

    for (index, found) in search.matches().iter().enumerate() {
        if found.start.line != row.line {
            continue;
        }
        if let (Some(start_sub), Some(end_sub)) = (
            doc.resolve_sub(found.start, src),
            doc.resolve_sub(found.end, src),
        ) && let Some(span) = span_on_row(
            &sub,
            row_key,
            (found.start, (row.line, start_sub)),
            (found.end, (row.line, end_sub)),
            whitespace_width,
        ) {
            result.spans.push((index, span));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::metrics::MonospaceFont;
    use crate::options::{Options, WrapMode};
    use crate::search::SearchOptions;
    use std::sync::Arc;

    fn c_like() -> Arc<Language> {
        let mut lang = Language::new("C");
        lang.add_folding("{", "}").expect("valid tables");
        Arc::new(lang)
    }

    fn doc(text: &str, options: Options) -> Document {
        let mut doc = Document::new(options, c_like());
        doc.set_text(text);
        doc
    }

    fn keys(rows: &[Row]) -> Vec<(usize, usize)> {
        rows.iter().map(|r| (r.line, r.sub)).collect()
    }

    #[test]
    fn test_folded_region_hides_interior() {
        let src = MonospaceFont::default();
        let mut doc = doc("a {\nb\nc\n}\nd", Options::default());
        let mut rows = RowManager::new();
        assert_eq!(rows.row_count(&mut doc, &src), 5);
        assert!(rows.rows(&mut doc, &src)[0].folding.is_some());

        doc.toggle_fold(0);
        assert_eq!(
            keys(rows.rows(&mut doc, &src)),
            vec![(0, 0), (3, 0), (4, 0)]
        );
        assert_eq!(rows.row_of_line(1, &mut doc, &src), 1);
        assert_eq!(rows.row_of(Coordinates::new(4, 0), &mut doc, &src), Some(2));
        assert_eq!(rows.row_of(Coordinates::new(2, 0), &mut doc, &src), None);
    }

    #[test]
    fn test_wrapped_line_emits_one_row_per_sub() {
        let src = MonospaceFont::default();
        let options = Options {
            wrap_mode: WrapMode::BreakWord,
            ..Options::default()
        };
        let mut doc = doc("abcdefghij\nxy", options);
        doc.set_text_width(5.0);
        let mut rows = RowManager::new();
        let row_keys = keys(rows.rows(&mut doc, &src));
        assert_eq!(row_keys.first(), Some(&(0, 0)));
        assert_eq!(row_keys.last(), Some(&(1, 0)));
        assert!(row_keys.len() > 2);
    }

    #[test]
    fn test_row_selection_spans_lines() {
        let src = MonospaceFont::default();
        let mut doc = doc("abcd\nef\n\ngh", Options::default());
        let mut carets = CaretManager::new();
        carets.add_selection(Coordinates::new(0, 1), Coordinates::new(3, 1), &doc);
        let mut rows = RowManager::new();

        let first = rows
            .selection(0, &mut doc, &carets, &src)
            .cloned()
            .expect("row 0");
        assert_eq!(first.spans.len(), 1);
        assert_eq!((first.spans[0].start_x, first.spans[0].end_x), (1.0, 4.0));
        assert!(first.carets.is_empty());

        let empty = rows
            .selection(2, &mut doc, &carets, &src)
            .cloned()
            .expect("row 2");
        assert_eq!(empty.spans[0].end_x, 1.0);

        let last = rows
            .selection(3, &mut doc, &carets, &src)
            .cloned()
            .expect("row 3");
        assert_eq!((last.spans[0].start_x, last.spans[0].end_x), (0.0, 1.0));
        assert_eq!(last.carets, vec![Coordinates::new(3, 1)]);

        carets.remove_selections();
        let collapsed = rows
            .selection(0, &mut doc, &carets, &src)
            .cloned()
            .expect("row 0");
        assert!(collapsed.spans.is_empty());
    }

    #[test]
    fn test_row_search_spans() {
        let src = MonospaceFont::default();
        let mut doc = doc("xaxa\nb", Options::default());
        let mut search = Search::default();
        search
            .run(&doc, "a", SearchOptions::default())
            .expect("literal query");
        let mut rows = RowManager::new();
        let hits = rows
            .search(0, &mut doc, &search, &src)
            .cloned()
            .expect("row 0");
        let indices: Vec<_> = hits.spans.iter().map(|(i, s)| (*i, s.start_x)).collect();
        assert_eq!(indices, vec![(0, 1.0), (1, 3.0)]);
        assert!(
            rows.search(1, &mut doc, &search, &src)
                .is_some_and(|s| s.spans.is_empty())
        );
    }
}
