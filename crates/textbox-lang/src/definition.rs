//! Serializable language definitions.
//!
//! A [`LanguageDefinition`] mirrors the registration calls of [`Language`] as plain data, so
//! hosts can ship user-authored languages as JSON files:
//!
//! ```rust
//! use textbox_lang::LanguageDefinition;
//!
//! let json = r#"{
//!     "name": "ini",
//!     "line_comments": [";"],
//!     "foldings": [{ "start": "[", "end": "]" }],
//!     "patterns": [{ "pattern": "^\\w+", "style": "Variable" }]
//! }"#;
//! let language = LanguageDefinition::from_json(json)?.build()?;
//! assert_eq!(language.name(), "ini");
//! # Ok::<(), textbox_lang::LangError>(())
//! ```

use serde::{Deserialize, Serialize};
use textbox_core::{Language, StyleTag, TextBoxError};

use crate::error::LangError;

/// A start/end literal pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    /// Opening literal.
    pub start: String,
    /// Closing literal.
    pub end: String,
}

impl Delimiters {
    /// Pair `start` with `end`.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// One colorization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDefinition {
    /// Regex source. A capture group named `range` restricts the styled span.
    pub pattern: String,
    /// Style applied to matches.
    pub style: StyleTag,
    /// Match without regard to case.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore_case: bool,
}

impl PatternDefinition {
    /// Case-sensitive rule.
    pub fn new(pattern: impl Into<String>, style: StyleTag) -> Self {
        Self {
            pattern: pattern.into(),
            style,
            ignore_case: false,
        }
    }

    /// Case-insensitive rule.
    pub fn ignore_case(pattern: impl Into<String>, style: StyleTag) -> Self {
        Self {
            ignore_case: true,
            ..Self::new(pattern, style)
        }
    }

    fn source(&self) -> String {
        if self.ignore_case {
            format!("(?i){}", self.pattern)
        } else {
            self.pattern.clone()
        }
    }
}

/// Declarative token tables of one language. Later patterns override earlier ones where
/// they overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LanguageDefinition {
    /// Display name; must not be blank.
    pub name: String,
    /// Line comment literals.
    pub line_comments: Vec<String>,
    /// Block comment pairs.
    pub block_comments: Vec<Delimiters>,
    /// Single-line string delimiters.
    pub strings: Vec<String>,
    /// Multiline string pairs; start may equal end.
    pub multiline_strings: Vec<Delimiters>,
    /// Prefixes turning the following string delimiter into a multiline string.
    pub multiline_prefixes: Vec<String>,
    /// Line endings that continue an open string on the next line.
    pub multiline_postfixes: Vec<String>,
    /// Folding pairs.
    pub foldings: Vec<Delimiters>,
    /// Colorization rules.
    pub patterns: Vec<PatternDefinition>,
}

impl LanguageDefinition {
    /// Empty definition named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a definition from JSON.
    pub fn from_json(json: &str) -> Result<Self, LangError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String, LangError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Register every table on a fresh [`Language`].
    pub fn build(&self) -> Result<Language, LangError> {
        if self.name.trim().is_empty() {
            return Err(TextBoxError::LanguageDefinition("language name is blank".into()).into());
        }

        let mut language = Language::new(self.name.clone());
        for comment in &self.line_comments {
            language.add_line_comment(comment)?;
        }
        for pair in &self.block_comments {
            language.add_block_comment(&pair.start, &pair.end)?;
        }
        for delimiter in &self.strings {
            language.add_string(delimiter)?;
        }
        for pair in &self.multiline_strings {
            language.add_multiline_string(&pair.start, &pair.end)?;
        }
        for prefix in &self.multiline_prefixes {
            language.add_multiline_prefix(prefix)?;
        }
        for postfix in &self.multiline_postfixes {
            language.add_multiline_postfix(postfix)?;
        }
        for pair in &self.foldings {
            language.add_folding(&pair.start, &pair.end)?;
        }
        for pattern in &self.patterns {
            language.add_pattern(&pattern.source(), pattern.style)?;
        }

        tracing::debug!(
            name = %self.name,
            patterns = self.patterns.len(),
            foldings = self.foldings.len(),
            "language built"
        );
        Ok(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        let err = LanguageDefinition::new("  ").build().unwrap_err();
        assert!(matches!(
            err,
            LangError::Core(TextBoxError::LanguageDefinition(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = LanguageDefinition::from_json(r#"{ "name": "x", "keywords": [] }"#).unwrap_err();
        assert!(matches!(err, LangError::Json(_)));
    }

    #[test]
    fn test_ignore_case_prefixes_flag() {
        let rule = PatternDefinition::ignore_case(r"\bselect\b", StyleTag::Keyword);
        assert_eq!(rule.source(), r"(?i)\bselect\b");
        assert_eq!(PatternDefinition::new("a", StyleTag::Keyword).source(), "a");
    }
}
