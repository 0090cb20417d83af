//! The editor instance.
//!
//! [`TextBox`] owns one document, its carets, history, row projection, search and scroll
//! state, plus the [`Backend`] it draws through. Hosts call [`TextBox::render`] once per frame;
//! everything else is a plain method call on the instance, so several text boxes can live side
//! by side without sharing any state.

mod dispatch;
mod render;

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use crate::actions::{Action, ActionKind};
use crate::backend::Backend;
use crate::caret::{Caret, CaretId, CaretManager};
use crate::commands::{EditContext, EditDirection};
use crate::coordinates::{CaretMove, Coordinates, MoveEnv};
use crate::document::Document;
use crate::error::TextBoxError;
use crate::folding::FoldingList;
use crate::history::History;
use crate::input::Vec2;
use crate::language::Language;
use crate::options::{Options, replace_eol};
use crate::rows::RowManager;
use crate::scroll::ScrollManager;
use crate::search::{Search, SearchMatch, SearchOptions};
use crate::theme::Theme;

/// A syntax-aware, foldable, multi-caret text box.
pub struct TextBox<B: Backend> {
    backend: B,
    doc: Document,
    carets: CaretManager,
    history: History,
    rows: RowManager,
    search: Search,
    scroll: ScrollManager,
    theme: Theme,

    view_pos: Vec2,
    view_size: Vec2,
    page_size: Vec2,
    line_number_width: f32,
    fold_width: f32,

    mouse_drag_start: Vec2,
    ime_composition: String,
    caret_blink: Instant,
}

impl<B: Backend> TextBox<B> {
    /// An empty plain-text box with default options.
    pub fn new(backend: B) -> Self {
        Self::with_language(backend, Options::default(), Arc::new(Language::plain_text()))
    }

    /// An empty box with the given options and language.
    pub fn with_language(backend: B, options: Options, language: Arc<Language>) -> Self {
        let history = History::new(options.history_capacity);
        let mut doc = Document::new(options, language);
        doc.update_font(&backend);
        let mut text_box = Self {
            backend,
            doc,
            carets: CaretManager::new(),
            history,
            rows: RowManager::new(),
            search: Search::default(),
            scroll: ScrollManager::default(),
            theme: Theme::default(),
            view_pos: Vec2::default(),
            view_size: Vec2::default(),
            page_size: Vec2::default(),
            line_number_width: 0.0,
            fold_width: 0.0,
            mouse_drag_start: Vec2::default(),
            ime_composition: String::new(),
            caret_blink: Instant::now(),
        };
        text_box.reset_carets();
        text_box
    }

    /// Replace the whole text. Carets collapse to a single caret at the start, history is
    /// cleared.
    pub fn set_text(&mut self, text: &str) {
        self.doc.set_text(text);
        self.history.clear();
        self.reset_carets();
        self.refresh_search();
    }

    /// The whole text, lines joined with the configured line terminator.
    pub fn text(&self) -> String {
        self.doc.text()
    }

    fn reset_carets(&mut self) {
        self.carets.clear();
        self.carets.add_caret(Coordinates::new(0, 0), &self.doc);
    }

    /// The document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The caret set.
    pub fn carets(&self) -> &CaretManager {
        &self.carets
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend, e.g. to script input.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The undo history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Current options.
    pub fn options(&self) -> &Options {
        self.doc.options()
    }

    /// Replace the options.
    pub fn set_options(&mut self, options: Options) {
        if self.doc.options() == &options {
            return;
        }
        self.history.set_capacity(options.history_capacity);
        self.doc.set_options(options);
        self.carets.clear_subs();
    }

    /// Change some options in place.
    pub fn update_options(&mut self, update: impl FnOnce(&mut Options)) {
        let mut options = self.doc.options().clone();
        update(&mut options);
        self.set_options(options);
    }

    /// Switch the language.
    pub fn set_language(&mut self, language: Arc<Language>) {
        self.doc.set_language(language);
    }

    /// Current theme.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Replace the theme.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Run an action at every caret and record it. Returns whether it was recorded.
    pub fn execute(&mut self, kind: ActionKind) -> bool {
        let mut ctx = EditContext {
            doc: &mut self.doc,
            carets: &mut self.carets,
        };
        let recorded = self.history.execute(Action::new(kind), &mut ctx);
        if recorded {
            self.refresh_search();
        }
        recorded
    }

    /// Insert `text` at every caret, replacing any selection.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let text = replace_eol(&self.doc.options().replace_tab(text));
        if text.is_empty() {
            return false;
        }
        self.delete_selection();
        self.execute(ActionKind::Paste(text))
    }

    /// Type `chars` at every caret, replacing any selection.
    pub fn input_chars(&mut self, chars: &[char]) -> bool {
        self.delete_selection();
        self.execute(ActionKind::InputChars {
            direction: EditDirection::Forward,
            chars: chars.to_vec(),
        })
    }

    /// Delete every selection, if any, and collapse the carets.
    pub fn delete_selection(&mut self) -> bool {
        if !self.has_selection() {
            return false;
        }
        let recorded = self.execute(ActionKind::DeleteSelection);
        self.carets.remove_selections();
        recorded
    }

    /// Backspace (`Backward`) or Delete (`Forward`): removes the selection when there is one,
    /// else one char per caret.
    pub fn delete_char(&mut self, direction: EditDirection) -> bool {
        if self.has_selection() {
            return self.delete_selection();
        }
        self.execute(ActionKind::DeleteChar(direction))
    }

    /// Undo the last step. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        let mut ctx = EditContext {
            doc: &mut self.doc,
            carets: &mut self.carets,
        };
        let undone = self.history.undo(&mut ctx);
        if undone {
            self.refresh_search();
        }
        undone
    }

    /// Redo the last undone step. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        let mut ctx = EditContext {
            doc: &mut self.doc,
            carets: &mut self.carets,
        };
        let redone = self.history.redo(&mut ctx);
        if redone {
            self.refresh_search();
        }
        redone
    }

    /// Put the selected text on the clipboard.
    pub fn copy(&mut self) {
        let text = self.carets.copy_text(&self.doc);
        if !text.is_empty() {
            self.backend.set_clipboard(&text);
        }
    }

    /// Copy, then delete the selection.
    pub fn cut(&mut self) {
        self.copy();
        self.delete_selection();
    }

    /// Insert the clipboard at every caret.
    pub fn paste(&mut self) -> bool {
        let text = self.backend.clipboard();
        self.insert_text(&text)
    }

    /// Whether any caret selects at least one char.
    pub fn has_selection(&self) -> bool {
        self.carets.iter().any(Caret::has_char_selection)
    }

    /// Replace every caret with a single caret at `position` (clamped into the document).
    pub fn set_caret(&mut self, mut position: Coordinates) {
        position.validate(&self.doc);
        self.carets.clear();
        self.carets.add_caret(position, &self.doc);
    }

    /// Add a caret. Returns `None` when the position is invalid or overlaps an earlier caret.
    pub fn add_caret(&mut self, position: Coordinates) -> Option<CaretId> {
        self.carets.add_caret(position, &self.doc)
    }

    /// Add a caret selecting from `anchor` to `position`.
    pub fn add_selection(&mut self, anchor: Coordinates, position: Coordinates) -> Option<CaretId> {
        self.carets.add_selection(anchor, position, &self.doc)
    }

    /// Replace every caret with a single selection.
    pub fn set_selection(&mut self, anchor: Coordinates, position: Coordinates) -> Option<CaretId> {
        self.carets.clear();
        self.carets.add_selection(anchor, position, &self.doc)
    }

    /// Select the whole text with a single caret.
    pub fn select_all(&mut self) {
        self.carets.select_all(&self.doc);
    }

    /// Move every caret; `extend` keeps the anchors so selections grow.
    pub fn move_carets(&mut self, caret_move: CaretMove, extend: bool) {
        let lines_per_page = self.lines_per_page();
        let mut env = MoveEnv {
            doc: &mut self.doc,
            src: &self.backend,
            lines_per_page,
        };
        self.carets.move_positions(caret_move, 1, &mut env);
        if !extend {
            self.carets.remove_selections();
        }
    }

    /// Drop every caret but the first and collapse its selection.
    pub fn clear_extra_carets(&mut self) {
        self.carets.keep_first();
        self.carets.remove_selections();
    }

    /// Fold regions.
    pub fn foldings(&self) -> &FoldingList {
        self.doc.foldings()
    }

    /// Fold every region.
    pub fn fold_all(&mut self) {
        self.doc.set_all_folded(true);
    }

    /// Unfold every region.
    pub fn unfold_all(&mut self) {
        self.doc.set_all_folded(false);
    }

    /// Toggle the region starting at `line`. Returns the new folded state.
    pub fn toggle_fold(&mut self, line: usize) -> Option<bool> {
        self.doc.toggle_fold(line)
    }

    /// Search for `query`, select the first match and bring it into view. Returns the number
    /// of matches.
    pub fn search(&mut self, query: &str, options: SearchOptions) -> Result<usize, TextBoxError> {
        let count = self.search.run(&self.doc, query, options)?;
        if let Some(found) = self.search.selected_match() {
            self.reveal(found);
        }
        Ok(count)
    }

    /// Select the next match, wrapping around.
    pub fn search_next(&mut self) -> Option<SearchMatch> {
        let found = self.search.next()?;
        self.reveal(found);
        Some(found)
    }

    /// Select the previous match, wrapping around.
    pub fn search_previous(&mut self) -> Option<SearchMatch> {
        let found = self.search.previous()?;
        self.reveal(found);
        Some(found)
    }

    /// Forget the search.
    pub fn reset_search(&mut self) {
        self.search.reset();
    }

    /// Number of matches of the current search.
    pub fn search_count(&self) -> usize {
        self.search.matches().len()
    }

    /// Index of the selected match.
    pub fn search_index(&self) -> Option<usize> {
        self.search.selected()
    }

    /// Current search state.
    pub fn search_state(&self) -> &Search {
        &self.search
    }

    fn reveal(&mut self, found: SearchMatch) {
        self.doc.unfold(found.start.line);
        self.scroll
            .focus(found.start.line, None, self.doc.line_count());
    }

    fn refresh_search(&mut self) {
        if let Err(err) = self.search.refresh(&self.doc) {
            tracing::error!(%err, "search refresh failed");
        }
    }

    /// Scroll so `line` is visible, keeping a margin, on the next frame.
    pub fn focus(&mut self, line: usize) {
        self.scroll.focus(line, None, self.doc.line_count());
    }

    /// Scroll `line` to the top on the next frame.
    pub fn scroll_to(&mut self, line: usize) {
        self.scroll.scroll_to(line, None, self.doc.line_count());
    }

    fn focus_first_caret(&mut self) {
        if let Some(caret) = self.carets.first() {
            let position = caret.position;
            let sub = self.doc.resolve_sub(position, &self.backend);
            self.scroll.focus(position.line, sub, self.doc.line_count());
        }
    }

    fn line_height(&self) -> f32 {
        self.doc.fonts().line_height()
    }

    fn lines_per_page(&self) -> usize {
        let line_height = self.line_height();
        if line_height <= 0.0 {
            return 0;
        }
        (self.view_size.y / line_height) as usize
    }

    /// Number of visible rows.
    pub fn row_count(&mut self) -> usize {
        self.rows.row_count(&mut self.doc, &self.backend)
    }

    /// Size of the scrollable page as of the last frame.
    pub fn page_size(&self) -> Vec2 {
        self.page_size
    }

    /// Internal invariant violations recorded so far.
    pub fn internal_error_count(&self) -> usize {
        self.doc.internal_errors()
    }

    /// Caret set, cache counters and history as text.
    pub fn debug_report(&self) -> String {
        let mut out = String::from("Carets:\n");
        for caret in self.carets.iter() {
            let _ = writeln!(
                out,
                "  #{} position ({}, {}) anchor ({}, {})",
                caret.id().0,
                caret.position.line,
                caret.position.char,
                caret.anchor.line,
                caret.anchor.char
            );
        }
        out.push_str("Caches:\n");
        for (name, stats) in self
            .doc
            .cache_stats()
            .into_iter()
            .chain(self.rows.stats())
        {
            let _ = writeln!(out, "  {name}: {stats}");
        }
        out.push_str(&self.history.describe());
        out
    }
}

impl<B: Backend + std::fmt::Debug> std::fmt::Debug for TextBox<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBox")
            .field("backend", &self.backend)
            .field("lines", &self.doc.line_count())
            .field("carets", &self.carets.len())
            .field("undo", &self.history.undo_len())
            .finish_non_exhaustive()
    }
}
