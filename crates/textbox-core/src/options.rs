//! Editor configuration.
//!
//! [`Options`] is plain data owned by the `TextBox`; changing a field through the box's setters
//! invalidates exactly the caches that depend on it.

use serde::{Deserialize, Serialize};

/// Soft wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrapMode {
    /// No soft wrapping (each logical line is a single row).
    #[default]
    None,
    /// Wrap at the last whitespace before the edge, falling back to `BreakWord` for long words.
    Word,
    /// Wrap at the character that crosses the edge.
    BreakWord,
}

/// End-of-line sequence used by `text()` and copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EolMode {
    /// `"\r\n"`
    Crlf,
    /// `"\n"`
    #[default]
    Lf,
    /// `"\r"`
    Cr,
}

impl EolMode {
    /// The line terminator for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            EolMode::Crlf => "\r\n",
            EolMode::Lf => "\n",
            EolMode::Cr => "\r",
        }
    }
}

/// What the Tab key inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TabMode {
    /// `tab_size` spaces.
    Space,
    /// A single `'\t'`.
    #[default]
    Tab,
}

/// Editor options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Re-insert the leading indentation of the split line on Enter.
    pub auto_indent: bool,
    /// Typed characters replace the characters after the caret.
    pub overwrite: bool,
    /// Refuse every editing action.
    pub read_only: bool,
    /// Soft wrapping mode.
    pub wrap_mode: WrapMode,
    /// Indent wrapped continuations by the line's leading indentation.
    pub word_wrap_indent: bool,
    /// End-of-line sequence.
    pub eol_mode: EolMode,
    /// Apply regex and comment/string colorization.
    pub syntax_highlight: bool,
    /// Derive fold regions from folding tokens.
    pub syntax_folding: bool,
    /// Draw markers for spaces and tabs.
    pub show_whitespace: bool,
    /// What the Tab key inserts.
    pub tab_mode: TabMode,
    /// Number of spaces a tab stands for.
    pub tab_size: usize,
    /// Row height as a multiple of the font size.
    pub leading_height: f32,
    /// Capture and verify full text snapshots around every action.
    pub debug_mode: bool,
    /// Maximum number of undoable actions kept.
    pub history_capacity: usize,
    /// Lines longer than this are not colorized.
    pub syntax_give_up_threshold: usize,
    /// Minimum delay between color recomputations of a line.
    pub color_debounce_ms: u64,
    /// Minimum delay between full tokenizer passes.
    pub token_debounce_ms: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            auto_indent: true,
            overwrite: false,
            read_only: false,
            wrap_mode: WrapMode::None,
            word_wrap_indent: true,
            eol_mode: EolMode::Lf,
            syntax_highlight: true,
            syntax_folding: true,
            show_whitespace: true,
            tab_mode: TabMode::Tab,
            tab_size: 4,
            leading_height: 1.2,
            debug_mode: false,
            history_capacity: 1000,
            syntax_give_up_threshold: 3000,
            color_debounce_ms: 300,
            token_debounce_ms: 100,
        }
    }
}

impl Options {
    /// The string inserted for one level of indentation.
    pub fn tab_string(&self) -> String {
        match self.tab_mode {
            TabMode::Space => " ".repeat(self.tab_size),
            TabMode::Tab => "\t".to_string(),
        }
    }

    /// The configured line terminator.
    pub fn eol_str(&self) -> &'static str {
        self.eol_mode.as_str()
    }

    /// Expand tabs to spaces (`Space` mode) or contract runs of `tab_size` spaces to tabs
    /// (`Tab` mode).
    pub fn replace_tab(&self, text: &str) -> String {
        let spaces = " ".repeat(self.tab_size);
        match self.tab_mode {
            TabMode::Space if text.contains('\t') => text.replace('\t', &spaces),
            TabMode::Tab if self.tab_size > 0 && text.contains(&spaces) => {
                text.replace(&spaces, "\t")
            }
            _ => text.to_string(),
        }
    }

    /// Count leading repetitions of the tab string in `chars`.
    pub fn count_tab_start(&self, chars: &[char]) -> usize {
        let tab: Vec<char> = self.tab_string().chars().collect();
        if tab.is_empty() {
            return 0;
        }
        chars
            .chunks(tab.len())
            .take_while(|chunk| *chunk == tab.as_slice())
            .count()
    }

    /// Canonical form of `text` as `set_text` followed by `text` would return it.
    pub fn normalize(&self, text: &str) -> String {
        replace_eol(&self.replace_tab(text)).replace('\n', self.eol_str())
    }
}

/// Convert `"\r\n"` and lone `'\r'` to `'\n'`.
pub fn replace_eol(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}
