#![warn(missing_docs)]
//! Textbox Core - Headless Editing Core for Syntax-Aware Text Boxes
//!
//! # Overview
//!
//! `textbox-core` is the editing core of a code text box: line storage, tokenizing, folding,
//! soft wrapping, multi-caret editing with undo/redo and search. It never touches a window or a
//! device. A host implements [`Backend`] (input snapshots, draw primitives, clipboard, scroll
//! and glyph metrics) and calls [`TextBox::render`] once per frame.
//!
//! # Core Features
//!
//! - **Line Store**: generational arena of lines with per-line derived caches
//! - **Cross-Line Tokenizer**: comments, strings and fold markers from declarative tables
//! - **Code Folding**: nested regions detected during the token scan
//! - **Soft Wrapping**: word or break-word wrapping with optional hanging indent
//! - **Multiple Carets**: independent selections, rectangle selection, structural fixups
//! - **Undo/Redo**: bounded history with typing coalescing
//! - **Search**: literal, optionally case-insensitive, with per-row highlights
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextBox (per-frame input, render, API)     │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Rows & Scroll (visible sub-lines)          │  ← Rendering Data
//! ├─────────────────────────────────────────────┤
//! │  Actions & History (undoable intents)       │  ← Editing
//! ├─────────────────────────────────────────────┤
//! │  Carets & Coordinates                       │  ← Positions
//! ├─────────────────────────────────────────────┤
//! │  Layout (cutoffs, sub-lines, metrics)       │  ← Text Layout
//! ├─────────────────────────────────────────────┤
//! │  Tokenizer & Folding                        │  ← Syntax
//! ├─────────────────────────────────────────────┤
//! │  Document (line arena + caches)             │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Driving a text box headlessly
//!
//! ```rust
//! use textbox_core::{HeadlessBackend, HotKeys, MonospaceFont, TextBox, Vec2};
//!
//! let mut text_box = TextBox::new(HeadlessBackend::new(MonospaceFont::new(8.0, 14.0)));
//! text_box.set_text("fn main() {\n}");
//!
//! // Each queued snapshot is consumed by one frame.
//! text_box.backend_mut().press(HotKeys::CTRL | HotKeys::END);
//! text_box.backend_mut().type_text("x");
//! for _ in 0..2 {
//!     text_box.render(Vec2::new(0.0, 0.0), Vec2::new(640.0, 480.0));
//! }
//!
//! assert_eq!(text_box.text(), "fn main() {\n}x");
//! ```
//!
//! ## Folding with a custom language
//!
//! ```rust
//! use std::sync::Arc;
//! use textbox_core::{HeadlessBackend, Language, MonospaceFont, Options, TextBox};
//!
//! let mut language = Language::new("braces");
//! language.add_folding("{", "}").unwrap();
//!
//! let backend = HeadlessBackend::new(MonospaceFont::new(8.0, 14.0));
//! let mut text_box = TextBox::with_language(backend, Options::default(), Arc::new(language));
//! text_box.set_text("a {\n    b\n}");
//!
//! text_box.fold_all();
//! assert_eq!(text_box.row_count(), 2);
//! ```
//!
//! # Module Description
//!
//! - [`document`] - line arena and document-wide derived state
//! - [`tokenizer`] - cross-line token scan producing fold regions
//! - [`layout`] - wrap cutoffs and sub-lines
//! - [`caret`] - caret set and structural fixups
//! - [`actions`] - undoable intents built from [`commands`]
//! - [`history`] - bounded undo/redo stacks
//! - [`rows`] - visible row projection with per-row highlight caches
//! - [`textbox`] - the editor instance
//!
//! # Unicode Support
//!
//! - Positions count Unicode scalar values
//! - East Asian wide characters measured through `unicode-width` in [`MonospaceFont`]

pub mod actions;
pub mod arena;
pub mod backend;
pub mod cache;
pub mod caret;
pub mod commands;
pub mod coordinates;
pub mod document;
pub mod error;
pub mod folding;
pub mod headless;
pub mod history;
pub mod input;
pub mod language;
pub mod layout;
pub mod line;
pub mod metrics;
pub mod options;
pub mod rows;
pub mod scroll;
pub mod search;
pub mod textbox;
pub mod theme;
pub mod tokenizer;

pub use actions::{Action, ActionKind};
pub use backend::{Backend, Icon};
pub use cache::{Cache, CacheStats};
pub use caret::{Caret, CaretId, CaretManager};
pub use commands::{EditContext, EditDirection};
pub use coordinates::{CaretMove, Coordinates};
pub use document::Document;
pub use error::TextBoxError;
pub use folding::{Folding, FoldingList};
pub use headless::{DrawCall, HeadlessBackend};
pub use history::History;
pub use input::{HotKeys, KeyboardInput, MouseAction, MouseCursor, MouseInput, Vec2};
pub use language::{Language, StyleTag, Token, TokenKind};
pub use layout::LineSub;
pub use metrics::{FontManager, FontSource, MonospaceFont};
pub use options::{EolMode, Options, TabMode, WrapMode};
pub use rows::{Row, RowManager, RowSearch, RowSelection, RowSpan};
pub use scroll::ScrollManager;
pub use search::{Search, SearchMatch, SearchOptions};
pub use textbox::TextBox;
pub use theme::{Color, Theme};
