//! Turning one frame of keyboard and mouse input into edits, caret moves and scrolling.

use crate::actions::ActionKind;
use crate::backend::Backend;
use crate::commands::EditDirection;
use crate::coordinates::{CaretMove, Coordinates, MoveEnv};
use crate::input::{HotKeys, KeyboardInput, MouseAction, MouseCursor, MouseInput, Vec2};
use crate::options::WrapMode;

use super::TextBox;

/// Pixels scrolled per frame while dragging outside the view.
const SCROLL_SPEED: f32 = 10.0;
/// Extra page space past the last row and the widest line.
const PAGE_PADDING: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitArea {
    Text,
    LineNumber,
    Fold,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    coordinates: Coordinates,
    area: HitArea,
}

impl<B: Backend> TextBox<B> {
    pub(super) fn process_input(&mut self, view_pos: Vec2, view_size: Vec2) {
        let keyboard = self.backend.keyboard_input();
        let mouse = self.backend.mouse_input();

        self.process_view(view_pos, view_size);
        self.process_mouse(mouse, keyboard.hotkeys);
        self.process_keyboard(keyboard);
        self.update_page_size();

        self.backend.on_input_end();
    }

    fn process_view(&mut self, view_pos: Vec2, view_size: Vec2) {
        self.view_pos = view_pos;
        if self.view_size != view_size {
            self.view_size = view_size;
            self.carets.clear_subs();
        }
        let text_width = view_size.x - self.line_number_width - self.fold_width;
        self.doc.set_text_width(text_width.max(0.0));
    }

    fn update_page_size(&mut self) {
        // Building the rows lays out every visible line, which the widest-line query reads.
        let rows = self.row_count();
        self.page_size.y = rows as f32 * self.line_height() + PAGE_PADDING;

        let gutter = self.line_number_width + self.fold_width;
        self.page_size.x = if self.doc.options().wrap_mode == WrapMode::None {
            self.doc.max_line_width() + gutter + PAGE_PADDING
        } else {
            self.view_size.x
        };
    }

    fn process_keyboard(&mut self, input: KeyboardInput) {
        let hotkeys = input.hotkeys;
        let before = (self.doc.version(), self.carets.version());

        for &ch in &input.chars {
            match ch {
                '\n' => {
                    self.execute(ActionKind::Enter);
                }
                '\t' if hotkeys.shift() => {
                    self.execute(ActionKind::UnTab);
                }
                '\t' => {
                    self.execute(ActionKind::Tab);
                }
                c if c.is_control() => {}
                c => {
                    self.input_chars(&[c]);
                }
            }
        }

        if !input.ime_composition.is_empty() {
            self.delete_selection();
        }
        if self.ime_composition != input.ime_composition {
            // Hot keys belong to the IME while the composition changes.
            self.ime_composition = input.ime_composition;
        } else {
            self.process_hotkeys(hotkeys);
        }

        if before != (self.doc.version(), self.carets.version()) {
            self.focus_first_caret();
            self.caret_blink = std::time::Instant::now();
        }
    }

    fn process_hotkeys(&mut self, hotkeys: HotKeys) {
        let shift = hotkeys.shift();
        if hotkeys.contains(HotKeys::CTRL | HotKeys::SHIFT | HotKeys::Z) {
            self.redo();
        } else if hotkeys.contains(HotKeys::CTRL | HotKeys::Z) {
            self.undo();
        } else if hotkeys.contains(HotKeys::CTRL | HotKeys::Y) {
            self.redo();
        } else if hotkeys.contains(HotKeys::CTRL | HotKeys::C) {
            self.copy();
        } else if hotkeys.contains(HotKeys::CTRL | HotKeys::V) {
            self.paste();
        } else if hotkeys.contains(HotKeys::CTRL | HotKeys::X) {
            self.cut();
        } else if hotkeys.contains(HotKeys::CTRL | HotKeys::A) {
            self.select_all();
        } else if hotkeys.contains(HotKeys::DELETE) {
            if shift {
                self.select_all();
                self.delete_selection();
            } else {
                self.delete_char(EditDirection::Forward);
            }
        } else if hotkeys.contains(HotKeys::BACKSPACE) {
            if hotkeys.alt() {
                self.undo();
            } else {
                self.delete_char(EditDirection::Backward);
            }
        } else if hotkeys.contains(HotKeys::ENTER) {
            self.delete_selection();
            self.execute(ActionKind::Enter);
        } else if hotkeys.contains(HotKeys::TAB) {
            self.execute(if shift {
                ActionKind::UnTab
            } else {
                ActionKind::Tab
            });
        } else if let Some(caret_move) = caret_move_for(hotkeys) {
            self.move_carets(caret_move, shift);
        } else if hotkeys.contains(HotKeys::INSERT) {
            self.update_options(|options| options.overwrite = !options.overwrite);
        } else if hotkeys.contains(HotKeys::F3) {
            if shift {
                self.search_previous();
            } else {
                self.search_next();
            }
        } else if hotkeys.contains(HotKeys::ESCAPE) {
            self.clear_extra_carets();
        }
    }

    fn process_mouse(&mut self, mouse: MouseInput, hotkeys: HotKeys) {
        if !self.ime_composition.is_empty() {
            return;
        }
        let Some(hit) = self.hit_test(mouse.position) else {
            return;
        };

        if matches!(mouse.left, MouseAction::Click | MouseAction::DoubleClick) {
            match hit.area {
                HitArea::Fold => {
                    self.doc.toggle_fold(hit.coordinates.line);
                    return;
                }
                HitArea::LineNumber => return,
                HitArea::Text => {}
            }
        }

        if self.view_contains(mouse.position) {
            self.backend.set_mouse_cursor(match hit.area {
                HitArea::Fold => MouseCursor::Hand,
                HitArea::LineNumber => MouseCursor::Arrow,
                HitArea::Text => MouseCursor::Beam,
            });
        }

        if mouse.left == MouseAction::Click || mouse.middle == MouseAction::Click {
            self.mouse_drag_start = mouse.position;
        }

        match mouse.left {
            MouseAction::Click if hotkeys.shift() => {
                self.carets.set_first_position(hit.coordinates);
            }
            MouseAction::Click if hotkeys.alt() => {
                self.carets.add_caret(hit.coordinates, &self.doc);
            }
            MouseAction::Click => {
                self.carets.clear();
                self.carets.add_caret(hit.coordinates, &self.doc);
            }
            MouseAction::DoubleClick => {
                self.carets.clear();
                self.carets.add_caret(hit.coordinates, &self.doc);
                let (to, from) = if hotkeys.shift() {
                    (CaretMove::EndOfLine, CaretMove::StartOfLine)
                } else {
                    (CaretMove::EndOfWord, CaretMove::StartOfWord)
                };
                let lines_per_page = self.lines_per_page();
                let mut env = MoveEnv {
                    doc: &mut self.doc,
                    src: &self.backend,
                    lines_per_page,
                };
                self.carets.move_positions(to, 1, &mut env);
                self.carets.move_anchors(from, 1, &mut env);
            }
            MouseAction::Dragging if hotkeys.alt() => self.select_rectangle(mouse.position),
            MouseAction::Dragging => self.carets.set_first_position(hit.coordinates),
            MouseAction::None => {}
        }
        if mouse.middle == MouseAction::Dragging {
            self.select_rectangle(mouse.position);
        }

        if mouse.left == MouseAction::Dragging || mouse.middle == MouseAction::Dragging {
            self.auto_scroll(mouse.position);
        }
    }

    fn view_contains(&self, position: Vec2) -> bool {
        position.x > self.view_pos.x
            && position.x < self.view_pos.x + self.view_size.x
            && position.y > self.view_pos.y
            && position.y < self.view_pos.y + self.view_size.y
    }

    fn auto_scroll(&mut self, position: Vec2) {
        let relative_y = position.y - self.view_pos.y;
        if relative_y < 0.0 {
            let y = self.backend.scroll_y() - SCROLL_SPEED;
            self.backend.set_scroll_y(y);
        } else if relative_y > self.view_size.y {
            let y = self.backend.scroll_y() + SCROLL_SPEED;
            self.backend.set_scroll_y(y);
        }

        let relative_x = position.x - self.view_pos.x;
        if relative_x < 0.0 {
            let x = self.backend.scroll_x() - SCROLL_SPEED;
            self.backend.set_scroll_x(x);
        } else if relative_x > self.view_size.x {
            let x = self.backend.scroll_x() + SCROLL_SPEED;
            self.backend.set_scroll_x(x);
        }
    }

    /// Row under page y, clamped to the row list.
    fn row_at(&mut self, y: f32) -> Option<usize> {
        let count = self.row_count();
        let line_height = self.line_height();
        if count == 0 || line_height <= 0.0 {
            return None;
        }
        Some(((y / line_height).max(0.0) as usize).min(count - 1))
    }

    /// Char of row `index` under text-area x.
    fn char_at(&mut self, index: usize, x: f32) -> Option<Coordinates> {
        let row = self.rows.row(index, &mut self.doc, &self.backend)?;
        let sub = self.doc.line_subs(row.line, &self.backend).get(row.sub)?;
        let char_index = sub.start_char + sub.char_index_at(x - sub.indent_width);
        Some(Coordinates::with_sub(row.line, char_index, row.sub))
    }

    fn hit_test(&mut self, position: Vec2) -> Option<Hit> {
        let index = self.row_at(position.y)?;
        let x = position.x - self.line_number_width - self.fold_width;
        let coordinates = self.char_at(index, x)?;

        let area = if x < -self.fold_width {
            HitArea::LineNumber
        } else if x < -self.doc.fonts_mut().whitespace_width(&self.backend)
            && self.doc.options().syntax_folding
            && self
                .rows
                .row(index, &mut self.doc, &self.backend)
                .is_some_and(|row| row.folding.is_some())
        {
            HitArea::Fold
        } else {
            HitArea::Text
        };
        Some(Hit { coordinates, area })
    }

    /// Replace the carets with one selection per row between the drag start and `to`.
    fn select_rectangle(&mut self, to: Vec2) {
        let from = self.mouse_drag_start;
        let reversed = to.x < from.x;
        let (Some(first), Some(last)) = (
            self.row_at(from.y.min(to.y)),
            self.row_at(from.y.max(to.y)),
        ) else {
            return;
        };
        let gutter = self.line_number_width + self.fold_width;
        let left = from.x.min(to.x) - gutter;
        let right = from.x.max(to.x) - gutter;

        let mut ranges = Vec::with_capacity(last - first + 1);
        for index in first..=last {
            let start = self.char_at(index, left);
            let end = self.char_at(index, right);
            if let (Some(start), Some(end)) = (start, end) {
                ranges.push((start, end));
            }
        }
        self.carets.select_rectangle(&ranges, reversed);
    }
}

fn caret_move_for(hotkeys: HotKeys) -> Option<CaretMove> {
    let ctrl = hotkeys.ctrl();
    let caret_move = if hotkeys.contains(HotKeys::UP) {
        CaretMove::Up
    } else if hotkeys.contains(HotKeys::DOWN) {
        CaretMove::Down
    } else if hotkeys.contains(HotKeys::LEFT) {
        CaretMove::Left
    } else if hotkeys.contains(HotKeys::RIGHT) {
        CaretMove::Right
    } else if hotkeys.contains(HotKeys::PAGE_UP) {
        CaretMove::PageUp
    } else if hotkeys.contains(HotKeys::PAGE_DOWN) {
        CaretMove::PageDown
    } else if hotkeys.contains(HotKeys::HOME) {
        if ctrl {
            CaretMove::StartOfFile
        } else {
            CaretMove::StartOfLine
        }
    } else if hotkeys.contains(HotKeys::END) {
        if ctrl {
            CaretMove::EndOfFile
        } else {
            CaretMove::EndOfLine
        }
    } else {
        return None;
    };
    Some(caret_move)
}
