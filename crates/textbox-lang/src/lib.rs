#![warn(missing_docs)]
//! `textbox-lang` - built-in language tables for `textbox-core`.
//!
//! Languages are data: literal token lists and colorization regexes handed to
//! [`textbox_core::Language`]. This crate ships the tables for C#, .NET stack traces, JSON,
//! SQL and Protocol Buffers, and loads user-authored tables from JSON through
//! [`LanguageDefinition`].
//!
//! ```rust
//! use std::sync::Arc;
//! use textbox_core::{HeadlessBackend, MonospaceFont, Options, TextBox};
//!
//! let language = textbox_lang::by_name("json")?;
//! let backend = HeadlessBackend::new(MonospaceFont::new(8.0, 14.0));
//! let mut text_box = TextBox::with_language(backend, Options::default(), Arc::new(language));
//! text_box.set_text("{\n  \"a\": [1, 2]\n}");
//! assert_eq!(text_box.foldings().len(), 1);
//! # Ok::<(), textbox_lang::LangError>(())
//! ```

pub mod builtin;
pub mod definition;
mod error;

use textbox_core::Language;

pub use definition::{Delimiters, LanguageDefinition, PatternDefinition};
pub use error::LangError;

/// Names accepted by [`by_name`], one per built-in table.
pub const NAMES: [&str; 6] = ["csharp", "csharp-stack-trace", "json", "sql", "proto", "plain"];

/// Definition of the built-in language called `name` (case-insensitive). Common aliases such
/// as `c#`, `cs` and `protobuf` are accepted.
pub fn definition(name: &str) -> Option<LanguageDefinition> {
    let definition = match name.to_ascii_lowercase().as_str() {
        "csharp" | "c#" | "cs" => builtin::csharp(),
        "csharp-stack-trace" | "stacktrace" | "stack-trace" => builtin::csharp_stack_trace(),
        "json" => builtin::json(),
        "sql" => builtin::sql(),
        "proto" | "protobuf" => builtin::proto(),
        "plain" | "text" | "plain text" => builtin::plain_text(),
        _ => return None,
    };
    Some(definition)
}

/// Build the built-in language called `name`.
pub fn by_name(name: &str) -> Result<Language, LangError> {
    let Some(definition) = definition(name) else {
        tracing::warn!(name, "unknown language requested");
        return Err(LangError::UnknownLanguage(name.to_string()));
    };
    definition.build()
}
