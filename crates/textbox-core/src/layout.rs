//! Soft Wrapping (Headless Layout)
//!
//! Splits a logical line into [`LineSub`] segments given the available text width, using
//! glyph widths from a [`FontSource`]. Two steps, each cached per line:
//!
//! 1. [`fill_cutoffs`]: the set of char indices after which a new segment starts.
//! 2. [`fill_subs`]: materialized segments with per-char widths and continuation indent.

use std::collections::BTreeSet;

use crate::metrics::{FontManager, FontSource};
use crate::options::{Options, TabMode, WrapMode};

/// How many reference glyphs a word may span before word wrapping gives up and breaks the word.
pub const WORD_WRAP_GIVE_UP: f32 = 10.0;

/// Everything layout needs besides the line itself.
pub struct LayoutEnv<'a> {
    /// Width cache.
    pub fonts: &'a mut FontManager,
    /// Glyph metrics.
    pub src: &'a dyn FontSource,
    /// Wrap mode, tab mode and indentation options.
    pub options: &'a Options,
    /// Width available to text (page width minus gutters).
    pub line_width: f32,
}

impl LayoutEnv<'_> {
    fn width(&mut self, ch: char) -> f32 {
        self.fonts.width(ch, self.src)
    }

    /// Width of a wrapped continuation's indent for a line with these chars.
    pub fn indent_width(&mut self, chars: &[char]) -> f32 {
        if !self.options.word_wrap_indent {
            return 0.0;
        }
        self.options.count_tab_start(chars) as f32 * self.fonts.tab_width(self.src)
    }
}

/// One visually wrapped segment of a line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSub {
    /// Position of the segment within its line.
    pub sub_index: usize,
    /// Char index of the first char of the segment.
    pub start_char: usize,
    /// Leading indent of a continuation segment.
    pub indent_width: f32,
    /// Indent plus the widths of every char.
    pub width: f32,
    /// Chars of the segment.
    pub chars: Vec<char>,
    /// Rendered width of each char.
    pub char_widths: Vec<f32>,
}

impl LineSub {
    fn new(sub_index: usize, start_char: usize, indent_width: f32) -> Self {
        Self {
            sub_index,
            start_char,
            indent_width,
            width: indent_width,
            chars: Vec::new(),
            char_widths: Vec::new(),
        }
    }

    /// Char index one past the segment.
    pub fn end_char(&self) -> usize {
        self.start_char + self.chars.len()
    }

    /// Char offset within the segment closest to horizontal position `x` (excluding indent).
    pub fn char_index_at(&self, x: f32) -> usize {
        let mut current = 0.0;
        for (i, w) in self.char_widths.iter().enumerate() {
            current += w;
            if current > x + w * 0.5 {
                return i;
            }
        }
        self.char_widths.len()
    }

    /// Horizontal position (excluding indent) of line char `char_index`.
    pub fn char_position(&self, char_index: usize) -> f32 {
        let Some(offset) = char_index.checked_sub(self.start_char) else {
            return 0.0;
        };
        self.char_widths.iter().take(offset).sum()
    }
}

/// Compute the wrap cutoffs of a line.
pub fn fill_cutoffs(chars: &[char], env: &mut LayoutEnv<'_>, cutoffs: &mut BTreeSet<usize>) {
    cutoffs.clear();
    let mode = env.options.wrap_mode;
    if mode == WrapMode::None || env.line_width < 1.0 {
        return;
    }

    let reference = env.fonts.reference_width(env.src);
    let indent = env.indent_width(chars);
    let mut accumulated = 0.0;
    let mut segment_start = 0;
    let mut i = 0;

    while i < chars.len() {
        accumulated += env.width(chars[i]);
        if accumulated + reference <= env.line_width {
            i += 1;
            continue;
        }

        let mut cut = i;
        if mode == WrapMode::Word {
            let mut back_width = 0.0;
            let mut found = None;
            let mut j = i;
            while j > segment_start {
                if chars[j].is_whitespace() {
                    found = Some(j);
                    break;
                }
                back_width += env.width(chars[j]);
                if back_width + reference * WORD_WRAP_GIVE_UP > env.line_width {
                    break;
                }
                j -= 1;
            }
            if let Some(j) = found {
                cut = j;
            }
        }

        cutoffs.insert(cut);
        accumulated = indent;
        segment_start = cut + 1;
        i = cut + 1;
    }
}

/// Materialize the segments of a line from its cutoffs. Returns the widest segment width.
pub fn fill_subs(
    chars: &[char],
    cutoffs: &BTreeSet<usize>,
    env: &mut LayoutEnv<'_>,
    subs: &mut Vec<LineSub>,
) -> f32 {
    subs.clear();
    let indent = env.indent_width(chars);
    let tab_width = env.fonts.tab_width(env.src);
    let space_width = env.fonts.whitespace_width(env.src);

    let mut sub = LineSub::new(0, 0, 0.0);
    let mut x = 0.0;
    let mut widest: f32 = 0.0;

    for (i, &ch) in chars.iter().enumerate() {
        let mut w = env.width(ch);
        if ch == '\t' && env.options.tab_mode == TabMode::Tab && tab_width > 0.0 {
            let stop = ((sub.indent_width + x + w) / tab_width).floor() * tab_width;
            w = stop - sub.indent_width - x;
            if w < space_width {
                w += tab_width;
            }
        }

        sub.chars.push(ch);
        sub.char_widths.push(w);
        sub.width += w;
        x += w;

        if cutoffs.contains(&i) {
            widest = widest.max(sub.width);
            let next = LineSub::new(sub.sub_index + 1, i + 1, indent);
            subs.push(std::mem::replace(&mut sub, next));
            x = 0.0;
        }
    }

    widest = widest.max(sub.width);
    subs.push(sub);
    widest
}
