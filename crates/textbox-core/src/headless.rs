//! An in-memory [`Backend`] for tests and headless hosts.
//!
//! Input is scripted by queueing per-frame snapshots; every draw call of the latest frame is
//! recorded so callers can inspect what would have been painted.

use std::collections::VecDeque;

use crate::backend::{Backend, Icon};
use crate::input::{HotKeys, KeyboardInput, MouseAction, MouseCursor, MouseInput, Vec2};
use crate::metrics::{FontSource, MonospaceFont};
use crate::theme::Color;

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// [`Backend::render_page`].
    Page {
        /// Page size.
        size: Vec2,
        /// Clear color.
        color: Color,
    },
    /// [`Backend::render_text`].
    Text {
        /// Top-left corner.
        pos: Vec2,
        /// Drawn text.
        text: String,
        /// Text color.
        color: Color,
    },
    /// [`Backend::render_icon`].
    Icon {
        /// Center.
        pos: Vec2,
        /// Which icon.
        icon: Icon,
        /// Icon color.
        color: Color,
        /// Size relative to the line height.
        scale: f32,
    },
    /// [`Backend::render_line`].
    Line {
        /// First end.
        start: Vec2,
        /// Second end.
        end: Vec2,
        /// Line color.
        color: Color,
        /// Stroke width.
        thickness: f32,
    },
    /// [`Backend::render_rectangle`].
    Rectangle {
        /// First corner.
        start: Vec2,
        /// Opposite corner.
        end: Vec2,
        /// Fill color.
        color: Color,
    },
}

/// Scripted input, recorded output and monospace metrics.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    font: MonospaceFont,
    keyboard: VecDeque<KeyboardInput>,
    mouse: VecDeque<MouseInput>,
    calls: Vec<DrawCall>,
    clipboard: String,
    scroll: Vec2,
    cursor: MouseCursor,
    frames: usize,
}

impl HeadlessBackend {
    /// Backend measuring every narrow char as `font.cell_width`.
    pub fn new(font: MonospaceFont) -> Self {
        Self {
            font,
            ..Self::default()
        }
    }

    /// Queue a keyboard snapshot for a later frame.
    pub fn push_keyboard(&mut self, input: KeyboardInput) {
        self.keyboard.push_back(input);
    }

    /// Queue typed chars for the next unclaimed frame.
    pub fn type_text(&mut self, text: &str) {
        self.push_keyboard(KeyboardInput {
            chars: text.chars().collect(),
            ..KeyboardInput::default()
        });
    }

    /// Queue a hot-key press for the next unclaimed frame.
    pub fn press(&mut self, hotkeys: HotKeys) {
        self.push_keyboard(KeyboardInput {
            hotkeys,
            ..KeyboardInput::default()
        });
    }

    /// Queue a mouse snapshot for a later frame.
    pub fn push_mouse(&mut self, input: MouseInput) {
        self.mouse.push_back(input);
    }

    /// Queue a left click at `position`.
    pub fn click(&mut self, position: Vec2) {
        self.push_mouse(MouseInput {
            left: MouseAction::Click,
            position,
            ..MouseInput::default()
        });
    }

    /// Whether scripted input is still waiting.
    pub fn has_pending_input(&self) -> bool {
        !self.keyboard.is_empty() || !self.mouse.is_empty()
    }

    /// Draw calls of the latest frame.
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Concatenation of every text draw call of the latest frame, in call order.
    pub fn rendered_text(&self) -> String {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of frames started.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Last requested pointer shape.
    pub fn cursor(&self) -> MouseCursor {
        self.cursor
    }

    /// Clipboard contents without going through the trait.
    pub fn clipboard_text(&self) -> &str {
        &self.clipboard
    }
}

impl FontSource for HeadlessBackend {
    fn char_width(&self, ch: char) -> f32 {
        self.font.char_width(ch)
    }

    fn font_size(&self) -> f32 {
        self.font.font_size()
    }
}

impl Backend for HeadlessBackend {
    fn keyboard_input(&mut self) -> KeyboardInput {
        self.keyboard.pop_front().unwrap_or_default()
    }

    fn mouse_input(&mut self) -> MouseInput {
        self.mouse.pop_front().unwrap_or_default()
    }

    fn render_page(&mut self, size: Vec2, color: Color) {
        self.frames += 1;
        self.calls.clear();
        self.calls.push(DrawCall::Page { size, color });
    }

    fn render_text(&mut self, pos: Vec2, text: &str, color: Color) {
        self.calls.push(DrawCall::Text {
            pos,
            text: text.to_string(),
            color,
        });
    }

    fn render_icon(&mut self, pos: Vec2, icon: Icon, color: Color, scale: f32) {
        self.calls.push(DrawCall::Icon {
            pos,
            icon,
            color,
            scale,
        });
    }

    fn render_line(&mut self, start: Vec2, end: Vec2, color: Color, thickness: f32) {
        self.calls.push(DrawCall::Line {
            start,
            end,
            color,
            thickness,
        });
    }

    fn render_rectangle(&mut self, start: Vec2, end: Vec2, color: Color) {
        self.calls
            .push(DrawCall::Rectangle { start, end, color });
    }

    fn set_clipboard(&mut self, text: &str) {
        self.clipboard = text.to_string();
    }

    fn clipboard(&mut self) -> String {
        self.clipboard.clone()
    }

    fn scroll_x(&self) -> f32 {
        self.scroll.x
    }

    fn set_scroll_x(&mut self, x: f32) {
        self.scroll.x = x.max(0.0);
    }

    fn scroll_y(&self) -> f32 {
        self.scroll.y
    }

    fn set_scroll_y(&mut self, y: f32) {
        self.scroll.y = y.max(0.0);
    }

    fn set_mouse_cursor(&mut self, cursor: MouseCursor) {
        self.cursor = cursor;
    }
}
