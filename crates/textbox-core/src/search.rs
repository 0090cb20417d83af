//! Find-in-text.
//!
//! Every line is scanned for every non-overlapping occurrence of the query. Matching runs on a
//! regex built from the escaped query, so case-insensitive matching follows Unicode simple case
//! folding; match bounds are reported in chars, not bytes.

use regex::{Regex, RegexBuilder};

use crate::coordinates::Coordinates;
use crate::document::Document;
use crate::error::TextBoxError;

/// How a query is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

/// One occurrence, from `start` (inclusive) to `end` (exclusive) on the same line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// First char of the occurrence.
    pub start: Coordinates,
    /// One past the last char.
    pub end: Coordinates,
}

/// Byte to char offset mapping of one line.
struct CharIndex {
    char_starts: Vec<usize>,
}

impl CharIndex {
    fn new(text: &str) -> Self {
        let mut char_starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_starts.push(text.len());
        Self { char_starts }
    }

    fn byte_to_char(&self, byte_offset: usize) -> usize {
        match self.char_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx,
        }
    }
}

fn compile(query: &str, options: SearchOptions) -> Result<Regex, TextBoxError> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(!options.case_sensitive)
        .build()
        .map_err(|source| TextBoxError::InvalidPattern {
            pattern: query.to_string(),
            source,
        })
}

/// Every occurrence of `query` in `doc`, ordered by line then column.
pub fn find_all(
    doc: &Document,
    query: &str,
    options: SearchOptions,
) -> Result<Vec<SearchMatch>, TextBoxError> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let re = compile(query, options)?;

    let mut matches = Vec::new();
    for (line_index, line) in doc.lines().iter().enumerate() {
        let text: String = line.chars().iter().collect();
        let index = CharIndex::new(&text);
        for m in re.find_iter(&text) {
            if m.is_empty() {
                continue;
            }
            matches.push(SearchMatch {
                start: Coordinates::new(line_index, index.byte_to_char(m.start())),
                end: Coordinates::new(line_index, index.byte_to_char(m.end())),
            });
        }
    }
    Ok(matches)
}

/// Search state of one editor: the last query, its matches and the selected one.
#[derive(Debug, Clone, Default)]
pub struct Search {
    query: String,
    options: SearchOptions,
    matches: Vec<SearchMatch>,
    selected: Option<usize>,
    version: u64,
}

impl Search {
    /// Run a new search and select the first match. Returns the number of matches.
    pub fn run(
        &mut self,
        doc: &Document,
        query: &str,
        options: SearchOptions,
    ) -> Result<usize, TextBoxError> {
        self.matches = find_all(doc, query, options)?;
        self.query = query.to_string();
        self.options = options;
        self.selected = (!self.matches.is_empty()).then_some(0);
        self.version += 1;
        tracing::debug!(query, matches = self.matches.len(), "search");
        Ok(self.matches.len())
    }

    /// Re-run the current query after the text changed, keeping the selection index when it
    /// is still in range.
    pub fn refresh(&mut self, doc: &Document) -> Result<(), TextBoxError> {
        if self.query.is_empty() {
            return Ok(());
        }
        self.matches = find_all(doc, &self.query, self.options)?;
        self.selected = self
            .selected
            .filter(|&i| i < self.matches.len())
            .or((!self.matches.is_empty()).then_some(0));
        self.version += 1;
        Ok(())
    }

    /// Select the following match, wrapping to the first.
    pub fn next(&mut self) -> Option<SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        let index = match self.selected {
            Some(i) if i + 1 < self.matches.len() => i + 1,
            _ => 0,
        };
        self.select(index)
    }

    /// Select the preceding match, wrapping to the last.
    pub fn previous(&mut self) -> Option<SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        let index = match self.selected {
            Some(i) if i > 0 => i - 1,
            _ => self.matches.len() - 1,
        };
        self.select(index)
    }

    /// Select match `index`.
    pub fn select(&mut self, index: usize) -> Option<SearchMatch> {
        let found = *self.matches.get(index)?;
        self.selected = Some(index);
        self.version += 1;
        Some(found)
    }

    /// Forget the query and its matches.
    pub fn reset(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.selected = None;
        self.version += 1;
    }

    /// The current query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Matches of the current query.
    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    /// Index of the selected match.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The selected match.
    pub fn selected_match(&self) -> Option<SearchMatch> {
        self.matches.get(self.selected?).copied()
    }

    /// Increases whenever matches or the selection change.
    pub fn version(&self) -> u64 {
        self.version
    }
}
