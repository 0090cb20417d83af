//! Logical positions and caret movement.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::layout::LineSub;
use crate::metrics::FontSource;

/// A caret movement verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaretMove {
    /// One row up, keeping the horizontal position.
    Up,
    /// One row down, keeping the horizontal position.
    Down,
    /// One char left, wrapping to the previous line.
    Left,
    /// One char right, wrapping to the next line.
    Right,
    /// First char of the document.
    StartOfFile,
    /// Past the last char of the document.
    EndOfFile,
    /// First char of the line.
    StartOfLine,
    /// Past the last char of the line.
    EndOfLine,
    /// Start of the word under the caret.
    StartOfWord,
    /// End of the word under the caret.
    EndOfWord,
    /// Half a page up.
    PageUp,
    /// Half a page down.
    PageDown,
}

/// A logical position: line, char offset within the line, and optionally the sub-line the
/// position is displayed on. The sub-line only matters at a wrap boundary, where the same char
/// index is both the end of one sub-line and the start of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinates {
    /// Line index.
    pub line: usize,
    /// Char index within the line.
    pub char: usize,
    /// Sub-line index, `None` when it should be derived from `char`.
    pub sub: Option<usize>,
}

/// Everything caret movement needs to look at.
pub struct MoveEnv<'a> {
    /// The text.
    pub doc: &'a mut Document,
    /// Glyph metrics for sub-line layout.
    pub src: &'a dyn FontSource,
    /// Rows visible on one page.
    pub lines_per_page: usize,
}

impl Coordinates {
    /// Position without a sub-line.
    pub const fn new(line: usize, char: usize) -> Self {
        Self {
            line,
            char,
            sub: None,
        }
    }

    /// Position on an explicit sub-line.
    pub const fn with_sub(line: usize, char: usize, sub: usize) -> Self {
        Self {
            line,
            char,
            sub: Some(sub),
        }
    }

    /// Whether the line exists and the char index is at most one past the line end.
    pub fn is_valid(&self, doc: &Document) -> bool {
        doc.line_len(self.line)
            .is_some_and(|len| self.char <= len + 1)
    }

    /// Clamp into the document, logging any correction.
    pub fn validate(&mut self, doc: &Document) {
        let count = doc.line_count();
        if self.line >= count {
            tracing::error!(line = self.line, count, "line index out of range, clamped");
            self.line = count.saturating_sub(1);
            self.sub = None;
        }
        let len = doc.line_len(self.line).unwrap_or(0);
        if self.char > len {
            tracing::error!(
                line = self.line,
                char_index = self.char,
                len,
                "char index out of range, clamped"
            );
            self.char = len;
            self.sub = None;
        }
    }

    /// Same line, same displayed sub-line and same char.
    pub fn is_same_as(
        &self,
        other: &Coordinates,
        doc: &mut Document,
        src: &dyn FontSource,
    ) -> bool {
        let sub = doc.resolve_sub(*self, src);
        let other_sub = doc.resolve_sub(*other, src);
        let (Some(sub), Some(other_sub)) = (sub, other_sub) else {
            tracing::error!(coordinates = ?self, ?other, "cannot resolve sub-line for comparison");
            return false;
        };
        self.line == other.line && sub == other_sub && self.char == other.char
    }

    /// Ordering by line, then sub-line, then char.
    pub fn is_bigger_than(
        &self,
        other: &Coordinates,
        doc: &mut Document,
        src: &dyn FontSource,
    ) -> bool {
        let sub = doc.resolve_sub(*self, src);
        let other_sub = doc.resolve_sub(*other, src);
        let (Some(sub), Some(other_sub)) = (sub, other_sub) else {
            tracing::error!(coordinates = ?self, ?other, "cannot resolve sub-line for comparison");
            return false;
        };
        (self.line, sub, self.char) > (other.line, other_sub, other.char)
    }

    /// Ordering by line, then char.
    pub fn is_bigger_than_without_sub(&self, other: &Coordinates) -> bool {
        (self.line, self.char) > (other.line, other.char)
    }

    /// Apply `caret_move` `count` times.
    pub fn find_move(
        &self,
        caret_move: CaretMove,
        count: usize,
        env: &mut MoveEnv<'_>,
    ) -> Coordinates {
        let mut moved = *self;
        for _ in 0..count {
            moved = moved.find_move_single(caret_move, env);
        }
        tracing::trace!(
            ?caret_move,
            count,
            line = moved.line,
            char_index = moved.char,
            "caret move"
        );
        if self.is_valid(env.doc) && self.is_same_as(&moved, env.doc, env.src) {
            tracing::warn!(?caret_move, count, "caret move had no effect");
        }
        moved
    }

    fn find_move_single(mut self, caret_move: CaretMove, env: &mut MoveEnv<'_>) -> Coordinates {
        let Some(len) = env.doc.line_len(self.line) else {
            return self;
        };
        let line_count = env.doc.line_count();

        match caret_move {
            CaretMove::Right => {
                if self.char >= len {
                    if self.line + 1 < line_count {
                        self = Coordinates::new(self.line + 1, 0);
                    }
                    return self;
                }
                if let Some(sub) = env.doc.resolve_sub(self, env.src) {
                    let subs = env.doc.line_subs(self.line, env.src);
                    if let Some(current) = subs.get(sub)
                        && self.char == current.end_char()
                        && sub + 1 < subs.len()
                    {
                        self.sub = Some(sub + 1);
                        return self;
                    }
                }
                self.char += 1;
                self.sub = None;
            }
            CaretMove::Left => {
                if self.char == 0 {
                    if self.line > 0 {
                        let prev_len = env.doc.line_len(self.line - 1).unwrap_or(0);
                        self = Coordinates::new(self.line - 1, prev_len);
                    }
                    return self;
                }
                if let Some(sub) = env.doc.resolve_sub(self, env.src)
                    && sub > 0
                    && env
                        .doc
                        .line_subs(self.line, env.src)
                        .get(sub)
                        .is_some_and(|current| current.start_char == self.char)
                {
                    self.sub = Some(sub - 1);
                    return self;
                }
                self.char -= 1;
                self.sub = None;
            }
            CaretMove::Up => return self.move_vertically(false, env),
            CaretMove::Down => return self.move_vertically(true, env),
            CaretMove::StartOfLine => self = Coordinates::new(self.line, 0),
            CaretMove::EndOfLine => self = Coordinates::new(self.line, len),
            CaretMove::StartOfWord => {
                if let Some(start) = env.doc.line(self.line).and_then(|l| l.word_start(self.char)) {
                    self = Coordinates::new(self.line, start);
                }
            }
            CaretMove::EndOfWord => {
                if let Some(end) = env.doc.line(self.line).and_then(|l| l.word_end(self.char)) {
                    self = Coordinates::new(self.line, end);
                }
            }
            CaretMove::StartOfFile => self = Coordinates::new(0, 0),
            CaretMove::EndOfFile => {
                let last = line_count.saturating_sub(1);
                self = Coordinates::new(last, env.doc.line_len(last).unwrap_or(0));
            }
            CaretMove::PageUp => {
                let line = self.line.saturating_sub(env.lines_per_page / 2);
                self = Coordinates::new(line, 0);
            }
            CaretMove::PageDown => {
                let line = (self.line + env.lines_per_page / 2).min(line_count.saturating_sub(1));
                self = Coordinates::new(line, 0);
            }
        }
        self
    }

    fn move_vertically(self, down: bool, env: &mut MoveEnv<'_>) -> Coordinates {
        let Some(sub) = env.doc.resolve_sub(self, env.src) else {
            tracing::error!(coordinates = ?self, "cannot resolve sub-line for vertical move");
            return self;
        };
        let subs = env.doc.line_subs(self.line, env.src);
        let Some(current) = subs.get(sub).cloned() else {
            return self;
        };
        let x = current.char_position(self.char) + current.indent_width;

        let within = if down {
            (sub + 1 < subs.len()).then(|| sub + 1)
        } else {
            sub.checked_sub(1)
        };
        if let Some(target) = within {
            let Some(target_sub) = subs.get(target) else {
                return self;
            };
            return Self::on_sub(self.line, target_sub, x);
        }

        let Some(line) = self.adjacent_visible_line(down, env.doc) else {
            return self;
        };
        let subs = env.doc.line_subs(line, env.src);
        let target_sub = if down { subs.first() } else { subs.last() };
        match target_sub {
            Some(target_sub) => Self::on_sub(line, target_sub, x),
            None => {
                tracing::error!(line, "line has no sub-lines");
                self
            }
        }
    }

    fn on_sub(line: usize, sub: &LineSub, x: f32) -> Coordinates {
        let offset = sub.char_index_at(x - sub.indent_width);
        Coordinates::with_sub(line, sub.start_char + offset, sub.sub_index)
    }

    fn adjacent_visible_line(&self, down: bool, doc: &Document) -> Option<usize> {
        let foldings = doc.foldings();
        let mut line = self.line;
        loop {
            line = if down {
                Some(line + 1).filter(|&l| l < doc.line_count())?
            } else {
                line.checked_sub(1)?
            };
            if !foldings.is_hidden(line) {
                return Some(line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::metrics::MonospaceFont;
    use crate::options::{Options, WrapMode};
    use std::sync::Arc;

    fn doc(text: &str, wrap: WrapMode, width: f32) -> Document {
        let mut doc = Document::new(
            Options {
                wrap_mode: wrap,
                token_debounce_ms: 0,
                ..Options::default()
            },
            Arc::new(Language::plain_text()),
        );
        doc.set_text(text);
        doc.set_text_width(width);
        doc
    }

    fn mv(doc: &mut Document, from: Coordinates, caret_move: CaretMove) -> Coordinates {
        let font = MonospaceFont::new(1.0, 10.0);
        let mut env = MoveEnv {
            doc,
            src: &font,
            lines_per_page: 10,
        };
        from.find_move(caret_move, 1, &mut env)
    }

    #[test]
    fn test_validity_and_clamping() {
        let doc = doc("abc\nde", WrapMode::None, 100.0);
        assert!(Coordinates::new(0, 4).is_valid(&doc));
        assert!(!Coordinates::new(0, 5).is_valid(&doc));
        assert!(!Coordinates::new(2, 0).is_valid(&doc));

        let mut c = Coordinates::new(5, 9);
        c.validate(&doc);
        assert_eq!(c, Coordinates::new(1, 2));
    }

    #[test]
    fn test_left_right_wrap_across_lines() {
        let mut doc = doc("ab\ncd", WrapMode::None, 100.0);
        assert_eq!(
            mv(&mut doc, Coordinates::new(0, 2), CaretMove::Right),
            Coordinates::new(1, 0)
        );
        assert_eq!(
            mv(&mut doc, Coordinates::new(1, 0), CaretMove::Left),
            Coordinates::new(0, 2)
        );
        assert_eq!(
            mv(&mut doc, Coordinates::new(1, 2), CaretMove::Right),
            Coordinates::new(1, 2)
        );
        assert_eq!(
            mv(&mut doc, Coordinates::new(0, 0), CaretMove::Left),
            Coordinates::new(0, 0)
        );
    }

    #[test]
    fn test_right_at_wrap_boundary_switches_sub() {
        let mut doc = doc("abcdefghij", WrapMode::BreakWord, 5.0);
        let at_boundary = mv(&mut doc, Coordinates::new(0, 4), CaretMove::Right);
        assert_eq!(at_boundary, Coordinates::new(0, 5));
        let next_sub = mv(&mut doc, at_boundary, CaretMove::Right);
        assert_eq!(next_sub, Coordinates::with_sub(0, 5, 1));
        let back = mv(&mut doc, next_sub, CaretMove::Left);
        assert_eq!(back, Coordinates::with_sub(0, 5, 0));
    }

    #[test]
    fn test_up_down_keep_column() {
        let mut doc = doc("hello\nhi\nworld", WrapMode::None, 100.0);
        assert_eq!(
            mv(&mut doc, Coordinates::new(0, 4), CaretMove::Down),
            Coordinates::with_sub(1, 2, 0)
        );
        assert_eq!(
            mv(&mut doc, Coordinates::new(2, 3), CaretMove::Up),
            Coordinates::with_sub(1, 2, 0)
        );
        assert_eq!(
            mv(&mut doc, Coordinates::new(0, 3), CaretMove::Up),
            Coordinates::new(0, 3)
        );
    }

    #[test]
    fn test_down_within_wrapped_line() {
        let mut doc = doc("abcdefghij", WrapMode::BreakWord, 5.0);
        assert_eq!(
            mv(&mut doc, Coordinates::new(0, 2), CaretMove::Down),
            Coordinates::with_sub(0, 7, 1)
        );
    }

    #[test]
    fn test_line_word_and_file_moves() {
        let mut doc = doc("let foo_bar\nx", WrapMode::None, 100.0);
        let c = Coordinates::new(0, 6);
        assert_eq!(mv(&mut doc, c, CaretMove::StartOfWord), Coordinates::new(0, 4));
        assert_eq!(mv(&mut doc, c, CaretMove::EndOfWord), Coordinates::new(0, 11));
        assert_eq!(mv(&mut doc, c, CaretMove::EndOfLine), Coordinates::new(0, 11));
        assert_eq!(mv(&mut doc, c, CaretMove::StartOfLine), Coordinates::new(0, 0));
        assert_eq!(mv(&mut doc, c, CaretMove::EndOfFile), Coordinates::new(1, 1));
        assert_eq!(mv(&mut doc, c, CaretMove::StartOfFile), Coordinates::new(0, 0));
    }

    #[test]
    fn test_page_moves_clamp() {
        let text = vec!["x"; 20].join("\n");
        let mut doc = doc(&text, WrapMode::None, 100.0);
        assert_eq!(
            mv(&mut doc, Coordinates::new(3, 1), CaretMove::PageUp),
            Coordinates::new(0, 0)
        );
        assert_eq!(
            mv(&mut doc, Coordinates::new(3, 1), CaretMove::PageDown),
            Coordinates::new(8, 0)
        );
        assert_eq!(
            mv(&mut doc, Coordinates::new(18, 0), CaretMove::PageDown),
            Coordinates::new(19, 0)
        );
    }

    #[test]
    fn test_comparisons() {
        let font = MonospaceFont::new(1.0, 10.0);
        let mut doc = doc("abcdefghij\nx", WrapMode::BreakWord, 5.0);
        let a = Coordinates::with_sub(0, 5, 0);
        let b = Coordinates::with_sub(0, 5, 1);
        assert!(b.is_bigger_than(&a, &mut doc, &font));
        assert!(!a.is_same_as(&b, &mut doc, &font));
        assert!(a.is_same_as(&Coordinates::new(0, 5), &mut doc, &font));
        assert!(!b.is_bigger_than_without_sub(&a));
        assert!(Coordinates::new(1, 0).is_bigger_than_without_sub(&Coordinates::new(0, 9)));
    }
}
