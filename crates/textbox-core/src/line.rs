//! A logical line and its derived caches.

use std::collections::BTreeSet;
use std::ops::Range;
use std::time::{Duration, Instant};

use crate::cache::{Cache, CacheStats};
use crate::language::{Language, StyleTag, Token};
use crate::layout::{LayoutEnv, LineSub, fill_cutoffs, fill_subs};

/// Inputs of the color computation.
#[derive(Debug, Clone, Copy)]
pub struct ColorEnv<'a> {
    /// Token tables and patterns.
    pub language: &'a Language,
    /// Whether highlighting is enabled at all.
    pub highlight: bool,
    /// Lines longer than this get no colors.
    pub give_up_threshold: usize,
}

/// One logical line of text.
///
/// Every mutation goes through [`insert_chars`](Line::insert_chars) or
/// [`remove_chars`](Line::remove_chars), which dirty the string, color and layout caches and
/// re-tokenize the line.
#[derive(Debug, Clone)]
pub struct Line {
    chars: Vec<char>,
    width: f32,
    string: Cache<String>,
    colors: Cache<Vec<Option<StyleTag>>>,
    cutoffs: Cache<BTreeSet<usize>>,
    subs: Cache<Vec<LineSub>>,
    tokens: Vec<Token>,
    pub(crate) comment_ranges: Vec<Range<usize>>,
    pub(crate) comment_start: Option<usize>,
    pub(crate) string_ranges: Vec<Range<usize>>,
    pub(crate) string_start: Option<usize>,
}

impl Line {
    /// An empty line whose colors recompute at most once per `color_debounce`.
    pub fn new(color_debounce: Duration) -> Self {
        Self {
            chars: Vec::new(),
            width: 0.0,
            string: Cache::new("String"),
            colors: Cache::with_debounce("Colors", color_debounce),
            cutoffs: Cache::new("Cutoffs"),
            subs: Cache::new("Line Subs"),
            tokens: Vec::new(),
            comment_ranges: Vec::new(),
            comment_start: None,
            string_ranges: Vec::new(),
            string_start: None,
        }
    }

    /// Chars of the line.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of chars.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the line has no chars.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Literal tokens found in the line.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Widest sub-line, valid after [`subs`](Line::subs).
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Text of the line.
    pub fn string(&mut self) -> &str {
        let chars = &self.chars;
        self.string.force_with(|mut s| {
            s.clear();
            s.extend(chars.iter());
            s
        })
    }

    /// Chars `start..=end`, clamped to the line.
    pub fn sub_string(&self, start: usize, end: usize) -> String {
        if self.chars.is_empty() || start >= self.chars.len() {
            return String::new();
        }
        let end = end.min(self.chars.len() - 1);
        if end < start {
            return String::new();
        }
        self.chars[start..=end].iter().collect()
    }

    /// Start of the word touching `char_index`, or `None` when `char_index` is past the end.
    /// Word chars are alphanumeric or `'_'`.
    pub fn word_start(&self, char_index: usize) -> Option<usize> {
        if char_index >= self.chars.len() {
            return None;
        }
        let start = self.chars[..=char_index]
            .iter()
            .rposition(|&c| !is_word_char(c))
            .map_or(0, |i| i + 1);
        Some(start.min(char_index))
    }

    /// End (exclusive) of the word touching `char_index`, or `None` when `char_index` is past
    /// the end.
    pub fn word_end(&self, char_index: usize) -> Option<usize> {
        if char_index >= self.chars.len() {
            return None;
        }
        let end = self.chars[char_index..]
            .iter()
            .position(|&c| !is_word_char(c))
            .map_or(self.chars.len(), |i| char_index + i);
        Some(end)
    }

    /// Insert `chars` at `at`. Returns whether the line's tokens changed.
    pub fn insert_chars(&mut self, at: usize, chars: &[char], language: &Language) -> bool {
        let at = at.min(self.chars.len());
        self.chars.splice(at..at, chars.iter().copied());

        let colors = self.colors.peek_mut();
        let previous = at.checked_sub(1).and_then(|i| colors.get(i).copied().flatten());
        if colors.len() < at {
            colors.resize(at, previous);
        }
        colors.splice(at..at, std::iter::repeat_n(previous, chars.len()));

        self.set_chars_dirty();
        self.update_tokens(language)
    }

    /// Remove up to `count` chars at `at`, returning them together with whether the line's
    /// tokens changed.
    pub fn remove_chars(
        &mut self,
        at: usize,
        count: usize,
        language: &Language,
    ) -> (Vec<char>, bool) {
        let at = at.min(self.chars.len());
        let end = (at + count).min(self.chars.len());
        let removed: Vec<char> = self.chars.drain(at..end).collect();

        let colors = self.colors.peek_mut();
        if colors.len() < end {
            colors.resize(end, None);
        }
        colors.drain(at..end);

        self.set_chars_dirty();
        let changed = self.update_tokens(language);
        (removed, changed)
    }

    /// Invalidate everything derived from the chars.
    pub fn set_chars_dirty(&mut self) {
        self.string.set_dirty();
        self.colors.set_dirty();
        self.set_layout_dirty();
    }

    /// Invalidate colors only.
    pub fn set_colors_dirty(&mut self) {
        self.colors.set_dirty();
    }

    /// Invalidate wrap cutoffs and sub-lines.
    pub fn set_layout_dirty(&mut self) {
        self.cutoffs.set_dirty();
        self.subs.set_dirty();
    }

    /// Change how long colors wait after an invalidation.
    pub fn set_color_debounce(&mut self, debounce: Duration) {
        self.colors.set_debounce(debounce);
    }

    /// Re-tokenize. Returns whether the token list changed.
    pub fn update_tokens(&mut self, language: &Language) -> bool {
        let tokens = language.tokenize_line(&self.chars);
        if tokens == self.tokens {
            return false;
        }
        self.tokens = tokens;
        true
    }

    /// Sub-lines, recomputing cutoffs and segments when dirty.
    pub fn subs(&mut self, env: &mut LayoutEnv<'_>) -> &[LineSub] {
        let chars = &self.chars;
        if self.subs.is_dirty() {
            let cutoffs = self.cutoffs.force_with(|mut cutoffs| {
                fill_cutoffs(chars, env, &mut cutoffs);
                cutoffs
            });
            let width = &mut self.width;
            self.subs.force_with(|mut subs| {
                *width = fill_subs(chars, cutoffs, env, &mut subs);
                subs
            });
        }
        self.subs.peek().as_slice()
    }

    /// Per-char styles, recomputed when dirty and the debounce window has passed at `now`.
    pub fn colors(&mut self, now: Instant, env: ColorEnv<'_>) -> &[Option<StyleTag>] {
        self.colors_at(Some(now), env)
    }

    /// Per-char styles, recomputed when dirty regardless of debounce.
    pub fn colors_forced(&mut self, env: ColorEnv<'_>) -> &[Option<StyleTag>] {
        self.colors_at(None, env)
    }

    fn colors_at(&mut self, now: Option<Instant>, env: ColorEnv<'_>) -> &[Option<StyleTag>] {
        let highlight = Highlight {
            chars: &self.chars,
            comment_ranges: &self.comment_ranges,
            comment_start: self.comment_start,
            string_ranges: &self.string_ranges,
            string_start: self.string_start,
        };
        let update = |colors| highlight.fill(colors, env);
        match now {
            Some(now) => self.colors.get_with(now, update).as_slice(),
            None => self.colors.force_with(update).as_slice(),
        }
    }

    /// Current colors without recomputing.
    pub fn peek_colors(&self) -> &[Option<StyleTag>] {
        self.colors.peek()
    }

    /// Accumulated counters of the line's caches.
    pub fn stats(&self) -> [(&'static str, CacheStats); 4] {
        [
            (self.string.name(), self.string.stats()),
            (self.colors.name(), self.colors.stats()),
            (self.cutoffs.name(), self.cutoffs.stats()),
            (self.subs.name(), self.subs.stats()),
        ]
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

struct Highlight<'a> {
    chars: &'a [char],
    comment_ranges: &'a [Range<usize>],
    comment_start: Option<usize>,
    string_ranges: &'a [Range<usize>],
    string_start: Option<usize>,
}

impl Highlight<'_> {
    fn fill(self, mut colors: Vec<Option<StyleTag>>, env: ColorEnv<'_>) -> Vec<Option<StyleTag>> {
        colors.clear();
        if !env.highlight || self.chars.len() > env.give_up_threshold {
            return colors;
        }
        colors.resize(self.chars.len(), None);

        let text: String = self.chars.iter().collect();
        env.language.apply_patterns(&text, &mut colors);

        let len = colors.len();
        let mut paint = |range: Range<usize>, tag: StyleTag| {
            for color in &mut colors[range.start.min(len)..range.end.min(len)] {
                *color = Some(tag);
            }
        };
        for range in self.comment_ranges {
            paint(range.clone(), StyleTag::Comment);
        }
        if let Some(start) = self.comment_start {
            paint(start..len, StyleTag::Comment);
        }
        for range in self.string_ranges {
            paint(range.clone(), StyleTag::String);
        }
        if let Some(start) = self.string_start {
            paint(start..len, StyleTag::String);
        }
        colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{FontManager, MonospaceFont};
    use crate::options::{Options, WrapMode};

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn c_like() -> Language {
        let mut lang = Language::new("C");
        lang.add_line_comment("//")
            .and_then(|l| l.add_string("\""))
            .and_then(|l| l.add_folding("{", "}"))
            .and_then(|l| l.add_pattern(r"\b(?P<range>int)\b", StyleTag::Type))
            .expect("valid tables");
        lang
    }

    #[test]
    fn test_insert_remove_and_tokens() {
        let lang = c_like();
        let mut line = Line::new(Duration::ZERO);
        assert!(!line.insert_chars(0, &chars("ab"), &lang));
        assert!(line.insert_chars(1, &chars("{"), &lang));
        assert_eq!(line.string(), "a{b");
        assert_eq!(line.tokens().len(), 1);

        let (removed, changed) = line.remove_chars(1, 1, &lang);
        assert_eq!(removed, vec!['{']);
        assert!(changed);
        assert_eq!(line.string(), "ab");
    }

    #[test]
    fn test_sub_string_is_inclusive_and_clamped() {
        let lang = Language::plain_text();
        let mut line = Line::new(Duration::ZERO);
        line.insert_chars(0, &chars("hello"), &lang);
        assert_eq!(line.sub_string(1, 3), "ell");
        assert_eq!(line.sub_string(3, 99), "lo");
        assert_eq!(line.sub_string(9, 12), "");
    }

    #[test]
    fn test_word_bounds() {
        let lang = Language::plain_text();
        let mut line = Line::new(Duration::ZERO);
        line.insert_chars(0, &chars("let foo_bar = 1;"), &lang);
        assert_eq!(line.word_start(6), Some(4));
        assert_eq!(line.word_end(6), Some(11));
        assert_eq!(line.word_start(3), Some(3));
        assert_eq!(line.word_end(3), Some(3));
        assert_eq!(line.word_start(0), Some(0));
        assert_eq!(line.word_start(16), None);
    }

    #[test]
    fn test_colors_apply_patterns_and_ranges() {
        let lang = c_like();
        let mut line = Line::new(Duration::ZERO);
        line.insert_chars(0, &chars("int x // c"), &lang);
        line.comment_start = Some(6);
        let env = ColorEnv {
            language: &lang,
            highlight: true,
            give_up_threshold: 100,
        };
        let colors = line.colors_forced(env).to_vec();
        assert_eq!(colors[0], Some(StyleTag::Type));
        assert_eq!(colors[3], None);
        assert_eq!(colors[9], Some(StyleTag::Comment));
    }

    #[test]
    fn test_colors_give_up_on_long_lines() {
        let lang = c_like();
        let mut line = Line::new(Duration::ZERO);
        line.insert_chars(0, &chars("int int int"), &lang);
        let env = ColorEnv {
            language: &lang,
            highlight: true,
            give_up_threshold: 4,
        };
        assert!(line.colors_forced(env).is_empty());
    }

    #[test]
    fn test_inserted_chars_inherit_previous_style() {
        let lang = c_like();
        let mut line = Line::new(Duration::from_secs(60));
        line.insert_chars(0, &chars("int"), &lang);
        let env = ColorEnv {
            language: &lang,
            highlight: true,
            give_up_threshold: 100,
        };
        line.colors_forced(env);
        line.insert_chars(3, &chars("eger"), &lang);
        assert_eq!(line.peek_colors().len(), 7);
        assert_eq!(line.peek_colors()[6], Some(StyleTag::Type));
    }

    #[test]
    fn test_subs_follow_wrap_width() {
        let lang = Language::plain_text();
        let options = Options {
            wrap_mode: WrapMode::BreakWord,
            ..Options::default()
        };
        let font = MonospaceFont::new(1.0, 10.0);
        let mut fonts = FontManager::default();
        let mut line = Line::new(Duration::ZERO);
        line.insert_chars(0, &chars("abcdefgh"), &lang);

        let mut env = LayoutEnv {
            fonts: &mut fonts,
            src: &font,
            options: &options,
            line_width: 5.0,
        };
        assert_eq!(line.subs(&mut env).len(), 2);
        assert_eq!(line.width(), 5.0);

        line.set_layout_dirty();
        env.line_width = 100.0;
        assert_eq!(line.subs(&mut env).len(), 1);
        assert_eq!(line.width(), 8.0);
    }
}
