//! Per-frame input snapshots handed over by the backend.

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Modifier and special keys held or pressed during a frame, as a bit set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HotKeys(u32);

impl HotKeys {
    /// No key.
    pub const NONE: HotKeys = HotKeys(0);

    /// Shift modifier.
    pub const SHIFT: HotKeys = HotKeys(1 << 0);
    /// Control modifier.
    pub const CTRL: HotKeys = HotKeys(1 << 1);
    /// Alt modifier.
    pub const ALT: HotKeys = HotKeys(1 << 2);

    /// The A key.
    pub const A: HotKeys = HotKeys(1 << 3);
    /// The C key.
    pub const C: HotKeys = HotKeys(1 << 4);
    /// The V key.
    pub const V: HotKeys = HotKeys(1 << 5);
    /// The X key.
    pub const X: HotKeys = HotKeys(1 << 6);
    /// The Y key.
    pub const Y: HotKeys = HotKeys(1 << 7);
    /// The Z key.
    pub const Z: HotKeys = HotKeys(1 << 8);

    /// Up arrow.
    pub const UP: HotKeys = HotKeys(1 << 9);
    /// Down arrow.
    pub const DOWN: HotKeys = HotKeys(1 << 10);
    /// Left arrow.
    pub const LEFT: HotKeys = HotKeys(1 << 11);
    /// Right arrow.
    pub const RIGHT: HotKeys = HotKeys(1 << 12);

    /// Page Up.
    pub const PAGE_UP: HotKeys = HotKeys(1 << 13);
    /// Page Down.
    pub const PAGE_DOWN: HotKeys = HotKeys(1 << 14);
    /// Home.
    pub const HOME: HotKeys = HotKeys(1 << 15);
    /// End.
    pub const END: HotKeys = HotKeys(1 << 16);
    /// Insert.
    pub const INSERT: HotKeys = HotKeys(1 << 17);

    /// Delete.
    pub const DELETE: HotKeys = HotKeys(1 << 18);
    /// Backspace.
    pub const BACKSPACE: HotKeys = HotKeys(1 << 19);
    /// Enter.
    pub const ENTER: HotKeys = HotKeys(1 << 20);
    /// Tab.
    pub const TAB: HotKeys = HotKeys(1 << 21);

    /// F3.
    pub const F3: HotKeys = HotKeys(1 << 22);
    /// Escape.
    pub const ESCAPE: HotKeys = HotKeys(1 << 23);

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every key of `other` is set.
    #[inline]
    pub const fn contains(self, other: HotKeys) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no key is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether Shift is held.
    #[inline]
    pub const fn shift(self) -> bool {
        self.contains(Self::SHIFT)
    }

    /// Whether Control is held.
    #[inline]
    pub const fn ctrl(self) -> bool {
        self.contains(Self::CTRL)
    }

    /// Whether Alt is held.
    #[inline]
    pub const fn alt(self) -> bool {
        self.contains(Self::ALT)
    }
}

impl BitOr for HotKeys {
    type Output = HotKeys;

    fn bitor(self, rhs: HotKeys) -> HotKeys {
        HotKeys(self.0 | rhs.0)
    }
}

impl BitOrAssign for HotKeys {
    fn bitor_assign(&mut self, rhs: HotKeys) {
        self.0 |= rhs.0;
    }
}

/// Keyboard state of one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardInput {
    /// Keys pressed this frame.
    pub hotkeys: HotKeys,
    /// Typed chars in order. `'\n'` and `'\t'` arrive here as well.
    pub chars: Vec<char>,
    /// Current IME composition string; empty when nothing is being composed.
    pub ime_composition: String,
}

/// What a mouse button did this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseAction {
    /// Nothing happened.
    #[default]
    None,
    /// Pressed this frame.
    Click,
    /// Second press in quick succession.
    DoubleClick,
    /// Held down while moving.
    Dragging,
}

/// Mouse pointer shape requested from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseCursor {
    /// Default pointer.
    #[default]
    Arrow,
    /// Text insertion beam.
    Beam,
    /// Pointing hand over clickable gutter items.
    Hand,
}

/// Mouse state of one frame. `position` is in page coordinates (scroll already applied).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseInput {
    /// Left button.
    pub left: MouseAction,
    /// Middle button.
    pub middle: MouseAction,
    /// Pointer position.
    pub position: Vec2,
}

/// A 2D point or size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vec2 {
    /// Create a vector.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotkeys_combination() {
        let keys = HotKeys::CTRL | HotKeys::SHIFT | HotKeys::Z;
        assert!(keys.contains(HotKeys::CTRL | HotKeys::Z));
        assert!(keys.shift());
        assert!(!keys.alt());
        assert!(!keys.contains(HotKeys::Y));
        assert!(HotKeys::default().is_empty());
    }
}
