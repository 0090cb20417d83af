//! Error types returned by the language definition API.
//!
//! Editing operations never fail: out-of-range indices are clamped and logged through
//! `tracing`, and lookups return `Option`. Only building a [`Language`](crate::Language)
//! can produce a [`TextBoxError`].

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while registering tokens and patterns on a language.
pub enum TextBoxError {
    #[error("invalid pattern `{pattern}`: {source}")]
    /// A colorization regex failed to compile.
    InvalidPattern {
        /// The pattern as supplied by the caller.
        pattern: String,
        /// Underlying regex compile error.
        #[source]
        source: regex::Error,
    },

    #[error("empty {0} token")]
    /// A literal token (comment, string or folding delimiter) was registered as `""`.
    EmptyToken(&'static str),

    #[error("invalid language definition: {0}")]
    /// A declarative language definition is structurally invalid.
    LanguageDefinition(String),
}
