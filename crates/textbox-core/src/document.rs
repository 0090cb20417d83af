//! Line store and document-wide derived state.
//!
//! [`Lines`] keeps every [`Line`] in an [`Arena`] with a separate order vector, so inserting or
//! removing a line never moves the other lines' caches. [`Document`] owns the lines together
//! with everything derived from more than one line: the token scan, the fold list, the font
//! width cache, and the options that shape layout and colors.
//!
//! Every mutation bumps [`Document::version`]; the row projection compares versions to decide
//! when to rebuild.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::arena::{Arena, Handle};
use crate::cache::{Cache, CacheStats};
use crate::commands::EditDirection;
use crate::coordinates::Coordinates;
use crate::folding::{Folding, FoldingList};
use crate::language::{Language, StyleTag};
use crate::layout::{LayoutEnv, LineSub};
use crate::line::{ColorEnv, Line};
use crate::metrics::{FontManager, FontSource};
use crate::options::{Options, replace_eol};
use crate::tokenizer::{self, ScanState};

/// Ordered lines backed by an arena.
#[derive(Debug, Clone, Default)]
pub struct Lines {
    arena: Arena<Line>,
    order: Vec<Handle>,
}

impl Lines {
    /// Split `text` on `'\n'` into tokenized lines.
    pub fn from_text(text: &str, language: &Language, color_debounce: Duration) -> Self {
        let mut lines = Self::default();
        for (index, part) in text.split('\n').enumerate() {
            let mut line = Line::new(color_debounce);
            let chars: Vec<char> = part.chars().collect();
            line.insert_chars(0, &chars, language);
            lines.insert(index, line);
        }
        lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no lines.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Line at `index`.
    pub fn get(&self, index: usize) -> Option<&Line> {
        self.arena.get(*self.order.get(index)?)
    }

    /// Mutable line at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Line> {
        self.arena.get_mut(*self.order.get(index)?)
    }

    /// Arena handle of the line at `index`.
    pub fn handle(&self, index: usize) -> Option<Handle> {
        self.order.get(index).copied()
    }

    /// Insert `line` so that it ends up at `index` (clamped to the end).
    pub fn insert(&mut self, index: usize, line: Line) {
        let handle = self.arena.insert(line);
        self.order.insert(index.min(self.order.len()), handle);
    }

    /// Remove and return the line at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Line> {
        if index >= self.order.len() {
            return None;
        }
        let handle = self.order.remove(index);
        self.arena.remove(handle)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.order.clear();
    }

    /// Lines in order.
    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.order.iter().filter_map(|&h| self.arena.get(h))
    }
}

/// The text buffer and everything derived from it.
#[derive(Debug)]
pub struct Document {
    lines: Lines,
    foldings: FoldingList,
    scan: Cache<ScanState>,
    language: Arc<Language>,
    options: Options,
    fonts: FontManager,
    text_width: f32,
    version: u64,
    internal_errors: usize,
}

impl Document {
    /// A document holding a single empty line.
    pub fn new(options: Options, language: Arc<Language>) -> Self {
        let fonts = FontManager::new(options.tab_size, options.leading_height);
        let mut document = Self {
            lines: Lines::default(),
            foldings: FoldingList::default(),
            scan: Cache::with_debounce(
                "Language Token",
                Duration::from_millis(options.token_debounce_ms),
            ),
            language,
            options,
            fonts,
            text_width: 0.0,
            version: 0,
            internal_errors: 0,
        };
        document.set_text("");
        document
    }

    /// Replace the whole text. Line endings are normalized and tabs converted per the tab mode.
    pub fn set_text(&mut self, text: &str) {
        let text = replace_eol(&self.options.replace_tab(text));
        self.lines = Lines::from_text(&text, &self.language, self.color_debounce());
        self.foldings.clear();
        self.scan.set_dirty();
        self.flush_tokens();
        self.bump();
        tracing::debug!(lines = self.lines.len(), "text replaced");
    }

    /// Whole text joined with the configured line terminator, without a trailing one.
    pub fn text(&self) -> String {
        let eol = self.options.eol_str();
        let mut text = String::new();
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                text.push_str(eol);
            }
            text.extend(line.chars());
        }
        text
    }

    /// The line store.
    pub fn lines(&self) -> &Lines {
        &self.lines
    }

    /// Number of lines (at least one).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line at `index`.
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Char count of line `index`, or `None` when out of range.
    pub fn line_len(&self, index: usize) -> Option<usize> {
        self.lines.get(index).map(Line::len)
    }

    /// Text of line `index`.
    pub fn line_string(&mut self, index: usize) -> Option<&str> {
        self.lines.get_mut(index).map(|line| line.string())
    }

    /// Insert chars into a line. Unfolds any region containing the line and schedules a token
    /// scan when the line's tokens changed.
    pub fn insert_chars(&mut self, line_index: usize, at: usize, chars: &[char]) {
        let Some(line) = self.lines.get_mut(line_index) else {
            tracing::error!(line_index, "insert into missing line");
            return;
        };
        if line.insert_chars(at, chars, &self.language) {
            self.scan.set_dirty();
        }
        self.foldings.unfold(line_index);
        self.bump();
    }

    /// Remove up to `count` chars from a line and return them.
    pub fn remove_chars(&mut self, line_index: usize, at: usize, count: usize) -> Vec<char> {
        let Some(line) = self.lines.get_mut(line_index) else {
            tracing::error!(line_index, "remove from missing line");
            return Vec::new();
        };
        let (removed, tokens_changed) = line.remove_chars(at, count, &self.language);
        if tokens_changed {
            self.scan.set_dirty();
        }
        self.foldings.unfold(line_index);
        self.bump();
        removed
    }

    /// Insert an empty line at `index`.
    pub fn insert_line(&mut self, index: usize) {
        let line = Line::new(self.color_debounce());
        self.lines.insert(index, line);
        self.scan.set_dirty();
        self.bump();
    }

    /// Remove the line at `index`. The last remaining line is never removed.
    pub fn remove_line(&mut self, index: usize) -> Option<Line> {
        if self.lines.len() <= 1 {
            tracing::error!(index, "refusing to remove the only line");
            return None;
        }
        let removed = self.lines.remove(index);
        self.scan.set_dirty();
        self.bump();
        removed
    }

    /// Shift fold bounds after a line insertion (`Forward`) or removal (`Backward`).
    pub fn shift_foldings(&mut self, line_index: usize, direction: EditDirection) {
        self.foldings.shift_line(line_index, direction);
        self.bump();
    }

    /// Fold regions.
    pub fn foldings(&self) -> &FoldingList {
        &self.foldings
    }

    /// Toggle the fold region starting at `start_line`.
    pub fn toggle_fold(&mut self, start_line: usize) -> Option<bool> {
        let state = self.foldings.toggle(start_line)?;
        tracing::debug!(start_line, folded = state, "fold toggled");
        self.bump();
        Some(state)
    }

    /// Fold or unfold every region.
    pub fn set_all_folded(&mut self, folded: bool) {
        self.foldings.set_all(folded);
        self.bump();
    }

    /// Unfold every region containing `line_index`.
    pub fn unfold(&mut self, line_index: usize) {
        if self.foldings.unfold(line_index) {
            self.bump();
        }
    }

    /// Run the token scan if it is dirty and its debounce window has passed.
    pub fn refresh_tokens(&mut self, now: Instant) {
        let Self {
            lines,
            foldings,
            scan,
            language,
            options,
            version,
            ..
        } = self;
        let before = scan.stats().updates;
        scan.get_with(now, |_| {
            let outcome = tokenizer::scan(lines, &**language, options.syntax_folding);
            foldings.rebuild(outcome.foldings);
            outcome.state
        });
        if scan.stats().updates != before {
            *version += 1;
        }
    }

    /// Run the token scan now if it is dirty.
    pub fn flush_tokens(&mut self) {
        let Self {
            lines,
            foldings,
            scan,
            language,
            options,
            version,
            ..
        } = self;
        if !scan.is_dirty() {
            return;
        }
        scan.force_with(|_| {
            let outcome = tokenizer::scan(lines, &**language, options.syntax_folding);
            foldings.rebuild(outcome.foldings);
            outcome.state
        });
        *version += 1;
    }

    /// Open construct after the last line, as of the last scan.
    pub fn scan_state(&self) -> ScanState {
        *self.scan.peek()
    }

    /// Whether a token scan is pending.
    pub fn is_scan_dirty(&self) -> bool {
        self.scan.is_dirty()
    }

    /// Styles of line `index`, recomputed if dirty and due at `now`.
    pub fn colors(&mut self, index: usize, now: Instant) -> &[Option<StyleTag>] {
        let env = ColorEnv {
            language: &self.language,
            highlight: self.options.syntax_highlight,
            give_up_threshold: self.options.syntax_give_up_threshold,
        };
        match self.lines.get_mut(index) {
            Some(line) => line.colors(now, env),
            None => &[],
        }
    }

    /// Recompute every dirty color list regardless of debounce.
    pub fn flush_colors(&mut self) {
        let env = ColorEnv {
            language: &self.language,
            highlight: self.options.syntax_highlight,
            give_up_threshold: self.options.syntax_give_up_threshold,
        };
        for index in 0..self.lines.len() {
            if let Some(line) = self.lines.get_mut(index) {
                line.colors_forced(env);
            }
        }
    }

    /// Styles of line `index` as last computed.
    pub fn peek_colors(&self, index: usize) -> &[Option<StyleTag>] {
        self.lines.get(index).map(Line::peek_colors).unwrap_or(&[])
    }

    /// Sub-lines of line `index`.
    pub fn line_subs(&mut self, index: usize, src: &dyn FontSource) -> &[LineSub] {
        let mut env = LayoutEnv {
            fonts: &mut self.fonts,
            src,
            options: &self.options,
            line_width: self.text_width,
        };
        match self.lines.get_mut(index) {
            Some(line) => line.subs(&mut env),
            None => &[],
        }
    }

    /// Index of the sub-line holding `coordinates`: its explicit sub index when valid, else
    /// the first sub-line whose char span contains the char index.
    pub fn resolve_sub(&mut self, coordinates: Coordinates, src: &dyn FontSource) -> Option<usize> {
        let subs = self.line_subs(coordinates.line, src);
        if subs.is_empty() {
            return None;
        }
        if let Some(sub) = coordinates.sub
            && sub < subs.len()
        {
            return Some(sub);
        }
        let char_index = coordinates.char;
        if let Some(found) = subs
            .iter()
            .position(|s| s.start_char <= char_index && char_index <= s.end_char())
        {
            return Some(found);
        }
        tracing::error!(
            line = coordinates.line,
            char_index,
            "no sub-line contains the char index"
        );
        Some(subs.len() - 1)
    }

    /// Sub-line holding `coordinates`.
    pub fn line_sub(&mut self, coordinates: Coordinates, src: &dyn FontSource) -> Option<&LineSub> {
        let sub = self.resolve_sub(coordinates, src)?;
        self.line_subs(coordinates.line, src).get(sub)
    }

    /// Widest laid-out line.
    pub fn max_line_width(&self) -> f32 {
        self.lines.iter().map(Line::width).fold(0.0, f32::max)
    }

    /// Width available to text.
    pub fn text_width(&self) -> f32 {
        self.text_width
    }

    /// Change the width available to text, invalidating wrap layout when it changed.
    pub fn set_text_width(&mut self, width: f32) {
        if self.text_width == width {
            return;
        }
        self.text_width = width;
        if self.options.wrap_mode != crate::options::WrapMode::None {
            self.set_layout_dirty();
        }
    }

    /// Pick up a font size change from `src`.
    pub fn update_font(&mut self, src: &dyn FontSource) {
        if self.fonts.update_reference_size(src) {
            tracing::debug!(size = self.fonts.font_size(), "font size changed");
            self.set_layout_dirty();
        }
    }

    /// Glyph width cache.
    pub fn fonts(&self) -> &FontManager {
        &self.fonts
    }

    /// Mutable glyph width cache.
    pub fn fonts_mut(&mut self) -> &mut FontManager {
        &mut self.fonts
    }

    /// Current options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replace the options, invalidating exactly what depends on the changed fields.
    pub fn set_options(&mut self, options: Options) {
        let old = std::mem::replace(&mut self.options, options);
        let new = &self.options;

        self.fonts.set_tab_size(new.tab_size);
        self.fonts.set_leading_height(new.leading_height);
        self.scan
            .set_debounce(Duration::from_millis(new.token_debounce_ms));

        let layout = old.wrap_mode != new.wrap_mode
            || old.word_wrap_indent != new.word_wrap_indent
            || old.tab_mode != new.tab_mode
            || old.tab_size != new.tab_size;
        let colors = old.syntax_highlight != new.syntax_highlight
            || old.syntax_give_up_threshold != new.syntax_give_up_threshold;
        let debounce = old.color_debounce_ms != new.color_debounce_ms;
        let folding = old.syntax_folding != new.syntax_folding;

        let color_debounce = self.color_debounce();
        for index in 0..self.lines.len() {
            let Some(line) = self.lines.get_mut(index) else {
                continue;
            };
            if debounce {
                line.set_color_debounce(color_debounce);
            }
            if layout {
                line.set_layout_dirty();
            }
            if colors {
                line.set_colors_dirty();
            }
        }
        if folding {
            self.scan.set_dirty();
            self.flush_tokens();
        }
        self.bump();
    }

    /// Current language.
    pub fn language(&self) -> &Arc<Language> {
        &self.language
    }

    /// Switch language: every line is re-tokenized and the scan runs immediately.
    pub fn set_language(&mut self, language: Arc<Language>) {
        self.language = language;
        for index in 0..self.lines.len() {
            if let Some(line) = self.lines.get_mut(index) {
                line.update_tokens(&self.language);
                line.set_colors_dirty();
            }
        }
        self.scan.set_dirty();
        self.flush_tokens();
        self.bump();
        tracing::debug!(language = self.language.name(), "language changed");
    }

    /// Invalidate wrap layout of every line.
    pub fn set_layout_dirty(&mut self) {
        for index in 0..self.lines.len() {
            if let Some(line) = self.lines.get_mut(index) {
                line.set_layout_dirty();
            }
        }
        self.bump();
    }

    /// Record an internal invariant violation.
    pub fn internal_error(&mut self, message: &str) {
        self.internal_errors += 1;
        tracing::error!(count = self.internal_errors, "internal error: {message}");
    }

    /// Number of internal invariant violations recorded so far.
    pub fn internal_errors(&self) -> usize {
        self.internal_errors
    }

    /// Increases on every change that can affect rows.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Cache counters aggregated per cache name.
    pub fn cache_stats(&self) -> Vec<(&'static str, CacheStats)> {
        let mut totals: Vec<(&'static str, CacheStats)> =
            vec![(self.scan.name(), self.scan.stats())];
        for line in self.lines.iter() {
            for (name, stats) in line.stats() {
                match totals.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, total)) => total.merge(&stats),
                    None => totals.push((name, stats)),
                }
            }
        }
        totals
    }

    /// The fold region starting at `line_index`, if any.
    pub fn folding_at(&self, line_index: usize) -> Option<Folding> {
        self.foldings.starting_at(line_index).copied()
    }

    fn color_debounce(&self) -> Duration {
        Duration::from_millis(self.options.color_debounce_ms)
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MonospaceFont;
    use crate::options::{EolMode, WrapMode};

    fn c_like() -> Arc<Language> {
        let mut lang = Language::new("C");
        lang.add_line_comment("//")
            .and_then(|l| l.add_folding("{", "}"))
            .expect("valid tables");
        Arc::new(lang)
    }

    fn immediate() -> Options {
        Options {
            token_debounce_ms: 0,
            color_debounce_ms: 0,
            ..Options::default()
        }
    }

    #[test]
    fn test_lines_insert_remove_keep_order() {
        let lang = Language::plain_text();
        let mut lines = Lines::from_text("a\nb\nc", &lang, Duration::ZERO);
        lines.remove(1);
        lines.insert(0, Line::new(Duration::ZERO));
        let texts: Vec<String> = lines.iter().map(|l| l.chars().iter().collect()).collect();
        assert_eq!(texts, vec!["", "a", "c"]);
        assert!(lines.remove(7).is_none());
    }

    #[test]
    fn test_set_text_round_trips_normalized() {
        let mut doc = Document::new(
            Options {
                eol_mode: EolMode::Crlf,
                ..immediate()
            },
            Arc::new(Language::plain_text()),
        );
        doc.set_text("a\nb\r\nc\rd");
        assert_eq!(doc.line_count(), 4);
        assert_eq!(doc.text(), "a\r\nb\r\nc\r\nd");

        doc.set_text("");
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn test_foldings_available_after_set_text() {
        let mut doc = Document::new(immediate(), c_like());
        doc.set_text("f {\n  x\n}\n");
        let pairs: Vec<_> = doc
            .foldings()
            .iter()
            .map(|f| (f.start_line, f.end_line))
            .collect();
        assert_eq!(pairs, vec![(0, 2)]);
    }

    #[test]
    fn test_edit_inside_fold_unfolds() {
        let mut doc = Document::new(immediate(), c_like());
        doc.set_text("f {\n  x\n}");
        assert_eq!(doc.toggle_fold(0), Some(true));
        doc.insert_chars(1, 0, &['y']);
        assert!(!doc.foldings().iter().any(|f| f.folded));
    }

    #[test]
    fn test_fold_state_survives_rescan() {
        let mut doc = Document::new(immediate(), c_like());
        doc.set_text("f {\n  x\n}\ng {\n}");
        doc.toggle_fold(3);
        doc.insert_chars(0, 3, &['{']);
        doc.remove_chars(0, 3, 1);
        doc.flush_tokens();
        assert_eq!(doc.folding_at(3).map(|f| f.folded), Some(true));
    }

    #[test]
    fn test_token_change_marks_scan_dirty() {
        let mut doc = Document::new(immediate(), c_like());
        doc.set_text("abc");
        doc.insert_chars(0, 1, &['x']);
        assert!(!doc.is_scan_dirty());
        doc.insert_chars(0, 1, &['{']);
        assert!(doc.is_scan_dirty());
    }

    #[test]
    fn test_resolve_sub_and_layout_invalidation() {
        let font = MonospaceFont::new(1.0, 10.0);
        let mut doc = Document::new(
            Options {
                wrap_mode: WrapMode::BreakWord,
                ..immediate()
            },
            Arc::new(Language::plain_text()),
        );
        doc.set_text("abcdefghij");
        doc.set_text_width(5.0);
        assert_eq!(doc.line_subs(0, &font).len(), 3);
        assert_eq!(doc.resolve_sub(Coordinates::new(0, 7), &font), Some(1));
        assert_eq!(doc.resolve_sub(Coordinates::new(0, 5), &font), Some(0));
        assert_eq!(
            doc.resolve_sub(Coordinates::with_sub(0, 5, 1), &font),
            Some(1)
        );

        doc.set_text_width(100.0);
        assert_eq!(doc.line_subs(0, &font).len(), 1);
    }

    #[test]
    fn test_remove_last_line_refused() {
        let mut doc = Document::new(immediate(), Arc::new(Language::plain_text()));
        assert!(doc.remove_line(0).is_none());
        assert_eq!(doc.line_count(), 1);
    }
}
