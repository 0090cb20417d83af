//! The host contract.
//!
//! The engine draws nothing and reads no devices itself. Once per frame it pulls a keyboard
//! and a mouse snapshot from its [`Backend`], then issues primitive draw calls in page
//! coordinates (the backend applies its own scroll offset). Clipboard, scroll position, cursor
//! shape and glyph metrics are also owned by the backend; metrics come through the
//! [`FontSource`] supertrait so layout code only ever needs the narrower trait.

use crate::input::{KeyboardInput, MouseCursor, MouseInput, Vec2};
use crate::metrics::FontSource;
use crate::theme::Color;

/// Gutter and inline icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    /// Folded region marker in the fold gutter.
    Fold,
    /// Unfolded region marker in the fold gutter.
    Unfold,
    /// Trailing marker after a folded line.
    Ellipsis,
}

/// Everything a host toolkit provides to a text box.
pub trait Backend: FontSource {
    /// Keyboard input since the previous frame.
    fn keyboard_input(&mut self) -> KeyboardInput;
    /// Mouse input of this frame.
    fn mouse_input(&mut self) -> MouseInput;
    /// Called once both snapshots have been consumed.
    fn on_input_end(&mut self) {}

    /// Start a frame on a page of `size`, cleared to `color`.
    fn render_page(&mut self, size: Vec2, color: Color);
    /// Draw `text` with its top-left corner at `pos`.
    fn render_text(&mut self, pos: Vec2, text: &str, color: Color);
    /// Draw `icon` centered at `pos`, `scale` times the line height.
    fn render_icon(&mut self, pos: Vec2, icon: Icon, color: Color, scale: f32);
    /// Draw a line segment.
    fn render_line(&mut self, start: Vec2, end: Vec2, color: Color, thickness: f32);
    /// Fill the axis-aligned rectangle spanned by two corners.
    fn render_rectangle(&mut self, start: Vec2, end: Vec2, color: Color);

    /// Put `text` on the clipboard.
    fn set_clipboard(&mut self, text: &str);
    /// Clipboard contents.
    fn clipboard(&mut self) -> String;

    /// Horizontal scroll offset.
    fn scroll_x(&self) -> f32;
    /// Set the horizontal scroll offset.
    fn set_scroll_x(&mut self, x: f32);
    /// Vertical scroll offset.
    fn scroll_y(&self) -> f32;
    /// Set the vertical scroll offset.
    fn set_scroll_y(&mut self, y: f32);

    /// Change the pointer shape.
    fn set_mouse_cursor(&mut self, cursor: MouseCursor);
}
