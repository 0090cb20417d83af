//! Font metrics.
//!
//! The core never measures glyphs itself: it asks a [`FontSource`] (normally the backend) for
//! per-character widths and memoizes them per font size in a [`FontManager`].

use std::collections::HashMap;

use unicode_width::UnicodeWidthChar;

/// Supplier of glyph metrics.
pub trait FontSource {
    /// Advance width of `ch` at the current font size.
    fn char_width(&self, ch: char) -> f32;
    /// Current font size.
    fn font_size(&self) -> f32;
}

/// Fixed-pitch metrics derived from UAX #11 cell widths.
///
/// Narrow characters take one cell, wide (CJK, emoji) characters two, and zero-width
/// characters none. Control characters are measured as one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceFont {
    /// Width of one cell.
    pub cell_width: f32,
    /// Reported font size.
    pub font_size: f32,
}

impl MonospaceFont {
    /// Create monospace metrics.
    pub fn new(cell_width: f32, font_size: f32) -> Self {
        Self {
            cell_width,
            font_size,
        }
    }
}

impl Default for MonospaceFont {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl FontSource for MonospaceFont {
    fn char_width(&self, ch: char) -> f32 {
        let cells = UnicodeWidthChar::width(ch).unwrap_or(1);
        cells as f32 * self.cell_width
    }

    fn font_size(&self) -> f32 {
        self.font_size
    }
}

#[derive(Debug, Clone, Default)]
struct Font {
    size: f32,
    widths: HashMap<char, f32>,
}

/// Per-size glyph width cache.
#[derive(Debug, Clone)]
pub struct FontManager {
    fonts: Vec<Font>,
    current: usize,
    tab_size: usize,
    leading_height: f32,
}

impl FontManager {
    /// Create a manager for the given tab size and line leading.
    pub fn new(tab_size: usize, leading_height: f32) -> Self {
        Self {
            fonts: vec![Font {
                size: 10.0,
                widths: HashMap::new(),
            }],
            current: 0,
            tab_size,
            leading_height,
        }
    }

    /// Select the font matching the source's current size. Returns `true` if the size changed,
    /// in which case every width-derived cache must be invalidated.
    pub fn update_reference_size(&mut self, src: &dyn FontSource) -> bool {
        let size = src.font_size();
        if self.fonts[self.current].size == size {
            return false;
        }

        self.current = match self.fonts.iter().position(|f| f.size == size) {
            Some(index) => index,
            None => {
                self.fonts.push(Font {
                    size,
                    widths: HashMap::new(),
                });
                self.fonts.len() - 1
            }
        };
        true
    }

    /// Width of `ch`. A tab measures as `tab_size` spaces.
    pub fn width(&mut self, ch: char, src: &dyn FontSource) -> f32 {
        if ch == '\t' {
            return self.whitespace_width(src) * self.tab_size as f32;
        }
        *self.fonts[self.current]
            .widths
            .entry(ch)
            .or_insert_with(|| src.char_width(ch))
    }

    /// Sum of the widths of every char in `text`.
    pub fn str_width(&mut self, text: &str, src: &dyn FontSource) -> f32 {
        text.chars().map(|ch| self.width(ch, src)).sum()
    }

    /// Width of the reference glyph `'#'`, used as the wrap safety margin.
    pub fn reference_width(&mut self, src: &dyn FontSource) -> f32 {
        self.width('#', src)
    }

    /// Width of a space.
    pub fn whitespace_width(&mut self, src: &dyn FontSource) -> f32 {
        self.width(' ', src)
    }

    /// Width of one tab stop.
    pub fn tab_width(&mut self, src: &dyn FontSource) -> f32 {
        self.whitespace_width(src) * self.tab_size as f32
    }

    /// Width of a digit, used for the line number gutter.
    pub fn number_width(&mut self, src: &dyn FontSource) -> f32 {
        self.width('0', src)
    }

    /// Current font size.
    pub fn font_size(&self) -> f32 {
        self.fonts[self.current].size
    }

    /// Height of one row.
    pub fn line_height(&self) -> f32 {
        self.font_size() * self.leading_height
    }

    /// Vertical offset centering glyphs inside a row.
    pub fn line_height_offset(&self) -> f32 {
        (self.line_height() - self.font_size()) / 2.0
    }

    /// Change the tab size.
    pub fn set_tab_size(&mut self, tab_size: usize) {
        self.tab_size = tab_size;
    }

    /// Change the line leading factor.
    pub fn set_leading_height(&mut self, leading_height: f32) {
        self.leading_height = leading_height;
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new(4, 1.2)
    }
}
