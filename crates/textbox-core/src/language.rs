//! Declarative language tables.
//!
//! A [`Language`] is data only: ordered literal token lists per [`TokenKind`] plus a list of
//! `(regex, StyleTag)` colorization patterns. There is no grammar. The cross-line scan that
//! turns per-line tokens into comment/string ranges and fold regions lives in
//! [`tokenizer`](crate::tokenizer).
//!
//! # Example
//!
//! ```rust
//! use textbox_core::{Language, StyleTag};
//!
//! let mut lang = Language::new("C-like");
//! lang.add_line_comment("//")?
//!     .add_block_comment("/*", "*/")?
//!     .add_string("\"")?
//!     .add_folding("{", "}")?
//!     .add_pattern(r"\b(if|else|return)\b", StyleTag::KeywordControl)?;
//!
//! let chars: Vec<char> = "a /* b */".chars().collect();
//! let tokens = lang.tokenize_line(&chars);
//! assert_eq!(tokens.len(), 2);
//! # Ok::<(), textbox_core::TextBoxError>(())
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TextBoxError;

/// Semantic class of a colorized span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleTag {
    /// Comments.
    Comment,
    /// Literal constants (`true`, `null`).
    Constant,
    /// Attributes and annotations.
    Attribute,
    /// Invalid or deprecated constructs.
    Invalid,
    /// String literals.
    String,
    /// Declaration keywords.
    Keyword,
    /// Control-flow keywords.
    KeywordControl,
    /// Function names.
    Function,
    /// Namespaces and packages.
    Namespace,
    /// Type names.
    Type,
    /// Numeric literals.
    Numeric,
    /// Variables and fields.
    Variable,
}

impl StyleTag {
    /// Number of tags.
    pub const COUNT: usize = 12;

    /// Every tag in declaration order.
    pub const ALL: [StyleTag; StyleTag::COUNT] = [
        StyleTag::Comment,
        StyleTag::Constant,
        StyleTag::Attribute,
        StyleTag::Invalid,
        StyleTag::String,
        StyleTag::Keyword,
        StyleTag::KeywordControl,
        StyleTag::Function,
        StyleTag::Namespace,
        StyleTag::Type,
        StyleTag::Numeric,
        StyleTag::Variable,
    ];

    /// Position of the tag in [`StyleTag::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Literal token category. Declaration order is matching priority: comment and string
/// delimiters are tried before folding delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Starts a comment running to the end of the line.
    LineComment,
    /// Opens a block comment.
    BlockCommentStart,
    /// Closes the block comment with the same index.
    BlockCommentEnd,
    /// Opens a multiline string.
    MultilineStringStart,
    /// Closes the multiline string with the same index.
    MultilineStringEnd,
    /// Opens or closes a single-line string.
    String,
    /// Opens a fold region.
    FoldingStart,
    /// Closes the fold region with the same index.
    FoldingEnd,
}

impl TokenKind {
    /// Every kind in matching priority order.
    pub const PRIORITY: [TokenKind; 8] = [
        TokenKind::LineComment,
        TokenKind::BlockCommentStart,
        TokenKind::BlockCommentEnd,
        TokenKind::MultilineStringStart,
        TokenKind::MultilineStringEnd,
        TokenKind::String,
        TokenKind::FoldingStart,
        TokenKind::FoldingEnd,
    ];
}

/// A literal token found in a line.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Token {
    /// Category.
    pub kind: TokenKind,
    /// Index of the literal within its category (pairs start/end literals).
    pub index: usize,
    /// Char offset of the token start, including any multiline prefix.
    pub char_index: usize,
    /// Length of the matched span, including any multiline prefix.
    pub len: usize,
    /// A string token preceded by a multiline prefix.
    pub is_multiline: bool,
}

impl Token {
    /// Char offset just past the matched literal.
    pub fn end(&self) -> usize {
        self.char_index + self.len
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.index == other.index && self.char_index == other.char_index
    }
}

/// A colorization rule.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    style: StyleTag,
}

impl Pattern {
    /// Compiled regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Style applied to matches.
    pub fn style(&self) -> StyleTag {
        self.style
    }
}

type Literal = Vec<char>;

/// Declarative token tables for one language.
#[derive(Debug, Clone, Default)]
pub struct Language {
    name: String,
    line_comments: Vec<Literal>,
    block_comment_starts: Vec<Literal>,
    block_comment_ends: Vec<Literal>,
    multiline_string_starts: Vec<Literal>,
    multiline_string_ends: Vec<Literal>,
    strings: Vec<Literal>,
    folding_starts: Vec<Literal>,
    folding_ends: Vec<Literal>,
    multiline_prefixes: Vec<Literal>,
    multiline_postfixes: Vec<Literal>,
    patterns: Vec<Pattern>,
}

fn literal(kind: &'static str, s: &str) -> Result<Literal, TextBoxError> {
    if s.is_empty() {
        return Err(TextBoxError::EmptyToken(kind));
    }
    Ok(s.chars().collect())
}

impl Language {
    /// Empty language with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Language without any token or pattern.
    pub fn plain_text() -> Self {
        Self::new("Plain Text")
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a line comment literal (e.g. `//`).
    pub fn add_line_comment(&mut self, s: &str) -> Result<&mut Self, TextBoxError> {
        self.line_comments.push(literal("line comment", s)?);
        Ok(self)
    }

    /// Register a block comment pair (e.g. `/*`, `*/`).
    pub fn add_block_comment(&mut self, start: &str, end: &str) -> Result<&mut Self, TextBoxError> {
        let start = literal("block comment start", start)?;
        let end = literal("block comment end", end)?;
        self.block_comment_starts.push(start);
        self.block_comment_ends.push(end);
        Ok(self)
    }

    /// Register a single-line string delimiter (e.g. `"`).
    pub fn add_string(&mut self, delimiter: &str) -> Result<&mut Self, TextBoxError> {
        self.strings.push(literal("string", delimiter)?);
        Ok(self)
    }

    /// Register a multiline string pair. `start` may equal `end` (e.g. `"""`).
    pub fn add_multiline_string(
        &mut self,
        start: &str,
        end: &str,
    ) -> Result<&mut Self, TextBoxError> {
        let start = literal("multiline string start", start)?;
        let end = literal("multiline string end", end)?;
        self.multiline_string_starts.push(start);
        self.multiline_string_ends.push(end);
        Ok(self)
    }

    /// Register a prefix that turns the following string delimiter into a multiline
    /// (verbatim) string, e.g. `@` for C# `@"..."`.
    pub fn add_multiline_prefix(&mut self, prefix: &str) -> Result<&mut Self, TextBoxError> {
        self.multiline_prefixes.push(literal("multiline prefix", prefix)?);
        Ok(self)
    }

    /// Register a line ending that continues an open string on the next line, e.g. `\`.
    pub fn add_multiline_postfix(&mut self, postfix: &str) -> Result<&mut Self, TextBoxError> {
        self.multiline_postfixes
            .push(literal("multiline postfix", postfix)?);
        Ok(self)
    }

    /// Register a folding pair (e.g. `{`, `}`).
    pub fn add_folding(&mut self, start: &str, end: &str) -> Result<&mut Self, TextBoxError> {
        let start = literal("folding start", start)?;
        let end = literal("folding end", end)?;
        self.folding_starts.push(start);
        self.folding_ends.push(end);
        Ok(self)
    }

    /// Register a colorization regex. A capture group named `range` restricts the styled span
    /// to that group.
    pub fn add_pattern(
        &mut self,
        pattern: &str,
        style: StyleTag,
    ) -> Result<&mut Self, TextBoxError> {
        let regex = Regex::new(pattern).map_err(|source| TextBoxError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.patterns.push(Pattern { regex, style });
        Ok(self)
    }

    /// Colorization rules in registration order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Number of folding pairs.
    pub fn folding_kinds(&self) -> usize {
        self.folding_starts.len()
    }

    fn literals(&self, kind: TokenKind) -> &[Literal] {
        match kind {
            TokenKind::LineComment => &self.line_comments,
            TokenKind::BlockCommentStart => &self.block_comment_starts,
            TokenKind::BlockCommentEnd => &self.block_comment_ends,
            TokenKind::MultilineStringStart => &self.multiline_string_starts,
            TokenKind::MultilineStringEnd => &self.multiline_string_ends,
            TokenKind::String => &self.strings,
            TokenKind::FoldingStart => &self.folding_starts,
            TokenKind::FoldingEnd => &self.folding_ends,
        }
    }

    /// First literal token starting exactly at `char_index`, tried in [`TokenKind::PRIORITY`]
    /// order. A string delimiter directly preceded by a multiline prefix is reported as
    /// multiline, with its start moved back over the prefix.
    pub fn find_matching(&self, chars: &[char], char_index: usize) -> Option<Token> {
        for kind in TokenKind::PRIORITY {
            for (index, lit) in self.literals(kind).iter().enumerate() {
                if !chars[char_index.min(chars.len())..].starts_with(lit) {
                    continue;
                }

                let mut token = Token {
                    kind,
                    index,
                    char_index,
                    len: lit.len(),
                    is_multiline: false,
                };

                if kind == TokenKind::String
                    && let Some(prefix) = self
                        .multiline_prefixes
                        .iter()
                        .find(|p| chars[..char_index.min(chars.len())].ends_with(p))
                {
                    token.is_multiline = true;
                    token.char_index -= prefix.len();
                    token.len += prefix.len();
                }
                return Some(token);
            }
        }
        None
    }

    /// Every literal token of a line, scanning left to right and skipping over each match.
    pub fn tokenize_line(&self, chars: &[char]) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            match self.find_matching(chars, i) {
                Some(token) => {
                    i = token.end().max(i + 1);
                    tokens.push(token);
                }
                None => i += 1,
            }
        }
        tokens
    }

    /// Whether `token` closes a multiline string opened by the literal pair `open_index`.
    pub fn closes_multiline_string(&self, open_index: usize, token: &Token) -> bool {
        if token.index != open_index {
            return false;
        }
        match token.kind {
            TokenKind::MultilineStringEnd => true,
            TokenKind::MultilineStringStart => {
                self.multiline_string_starts.get(open_index)
                    == self.multiline_string_ends.get(open_index)
            }
            _ => false,
        }
    }

    /// Whether `chars` ends with a multiline postfix, continuing an open string.
    pub fn ends_with_multiline_postfix(&self, chars: &[char]) -> bool {
        self.multiline_postfixes
            .iter()
            .any(|postfix| chars.ends_with(postfix))
    }

    /// Apply every pattern to `text`, writing styles into `styles` (indexed by char).
    pub fn apply_patterns(&self, text: &str, styles: &mut [Option<StyleTag>]) {
        if self.patterns.is_empty() {
            return;
        }
        let char_starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        let byte_to_char = |byte: usize| match char_starts.binary_search(&byte) {
            Ok(idx) | Err(idx) => idx,
        };

        for pattern in &self.patterns {
            for caps in pattern.regex.captures_iter(text) {
                let Some(m) = caps.name("range").or_else(|| caps.get(0)) else {
                    continue;
                };
                let start = byte_to_char(m.start());
                let end = byte_to_char(m.end()).min(styles.len());
                for style in styles.iter_mut().take(end).skip(start) {
                    *style = Some(pattern.style);
                }
            }
        }
    }
}
