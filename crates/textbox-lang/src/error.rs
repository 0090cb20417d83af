use thiserror::Error;

/// Errors produced while loading or building a language.
#[derive(Debug, Error)]
pub enum LangError {
    /// A table entry was rejected by the core (empty literal, bad regex, blank name).
    #[error(transparent)]
    Core(#[from] textbox_core::TextBoxError),

    /// The JSON text is not a valid definition.
    #[error("invalid language JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No built-in language has this name.
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
}
