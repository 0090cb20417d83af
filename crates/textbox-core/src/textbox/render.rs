//! Drawing one frame through the backend.

use std::time::Instant;

use crate::backend::{Backend, Icon};
use crate::input::Vec2;
use crate::language::StyleTag;
use crate::rows::{RowSearch, RowSelection, RowSpan};
use crate::theme::{Color, Theme};

use super::TextBox;

/// Rows drawn above and below the view.
const ROW_MARGIN: usize = 3;
/// Caret blink period in milliseconds; the caret is shown for the first half.
const BLINK_PERIOD_MS: u128 = 1000;
const ICON_SCALE: f32 = 0.6;
const CARET_THICKNESS: f32 = 2.0;

/// Caret drawn on a row: x (excluding indent) and the text under it.
struct CaretMark {
    x: f32,
    text: String,
    width: f32,
}

impl<B: Backend> TextBox<B> {
    /// Run one frame: consume input, rescan, scroll and draw every row near the view.
    ///
    /// `view_pos` and `view_size` describe the visible part of the page in page coordinates.
    pub fn render(&mut self, view_pos: Vec2, view_size: Vec2) {
        self.doc.update_font(&self.backend);
        self.update_gutter();
        self.process_input(view_pos, view_size);

        let now = Instant::now();
        self.doc.refresh_tokens(now);
        self.resolve_scroll();

        let page = Vec2::new(
            self.page_size.x.max(self.view_size.x),
            self.page_size.y.max(self.view_size.y),
        );
        let background = if self.doc.options().read_only {
            self.theme.background_dimmed
        } else {
            self.theme.background
        };
        self.backend.render_page(page, background);

        let Some((first, last)) = self.visible_rows() else {
            return;
        };
        let caret_visible = self.caret_visible(now);
        for index in first..=last {
            self.render_row(index, caret_visible, now);
        }
    }

    fn update_gutter(&mut self) {
        let digits = self.doc.line_count().to_string().len();
        let fonts = self.doc.fonts_mut();
        self.fold_width = fonts.reference_width(&self.backend) * 2.0;
        self.line_number_width = (digits + 1) as f32 * fonts.number_width(&self.backend);
    }

    fn resolve_scroll(&mut self) {
        let line_height = self.line_height();
        let rows = self.rows.rows(&mut self.doc, &self.backend);
        if let Some(y) = self
            .scroll
            .resolve(rows, line_height, self.view_pos.y, self.view_size.y)
        {
            self.backend.set_scroll_y(y);
        }
    }

    fn visible_rows(&mut self) -> Option<(usize, usize)> {
        let count = self.row_count();
        let line_height = self.line_height();
        if count == 0 || line_height <= 0.0 {
            return None;
        }
        let top = (self.view_pos.y / line_height).max(0.0) as usize;
        let bottom = ((self.view_pos.y + self.view_size.y) / line_height).max(0.0) as usize;
        Some((
            top.saturating_sub(ROW_MARGIN).min(count - 1),
            (bottom + ROW_MARGIN).min(count - 1),
        ))
    }

    fn caret_visible(&self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.caret_blink).as_millis();
        elapsed < BLINK_PERIOD_MS || elapsed % BLINK_PERIOD_MS < BLINK_PERIOD_MS / 2
    }

    fn render_row(&mut self, index: usize, caret_visible: bool, now: Instant) {
        let Some(row) = self.rows.row(index, &mut self.doc, &self.backend) else {
            return;
        };
        let Some(sub) = self
            .doc
            .line_subs(row.line, &self.backend)
            .get(row.sub)
            .cloned()
        else {
            self.doc.internal_error("row without a sub-line");
            return;
        };
        let colors: Vec<Option<StyleTag>> = self.doc.colors(row.line, now).to_vec();
        let selection = self
            .rows
            .selection(index, &mut self.doc, &self.carets, &self.backend)
            .cloned()
            .unwrap_or_default();
        let search = self
            .rows
            .search(index, &mut self.doc, &self.search, &self.backend)
            .cloned()
            .unwrap_or_default();

        let options = self.doc.options();
        let show_whitespace = options.show_whitespace;
        let overwrite = options.overwrite;
        let folding = row
            .folding
            .filter(|_| options.syntax_folding && row.sub == 0);
        let ime = if options.read_only {
            ""
        } else {
            self.ime_composition.as_str()
        };
        let has_caret = self.carets.line_has_caret(row.line);

        let line_height = self.line_height();
        let offset = self.doc.fonts().line_height_offset().floor();
        let row_y = index as f32 * line_height;
        let top = row_y + offset;
        let bottom = row_y + line_height - offset;
        let middle = row_y + line_height / 2.0;
        let text_x = self.line_number_width + self.fold_width + sub.indent_width;

        let fonts = self.doc.fonts_mut();
        let whitespace_width = fonts.whitespace_width(&self.backend);
        let ime_width = fonts.str_width(ime, &self.backend);
        let number = (row.line + 1).to_string();
        let number_width = fonts.str_width(&number, &self.backend);
        let marks: Vec<CaretMark> = selection
            .carets
            .iter()
            .map(|caret| {
                let text = if !ime.is_empty() {
                    ime.to_string()
                } else {
                    caret
                        .char
                        .checked_sub(sub.start_char)
                        .and_then(|i| sub.chars.get(i))
                        .map_or_else(|| " ".to_string(), char::to_string)
                };
                let width = fonts.str_width(&text, &self.backend);
                CaretMark {
                    x: sub.char_position(caret.char),
                    text,
                    width,
                }
            })
            .collect();

        let theme = &self.theme;
        let backend = &mut self.backend;

        draw_highlights(
            backend,
            theme,
            &search,
            self.search.selected(),
            &selection,
            text_x,
            top,
            bottom,
        );

        let ime_at = |char_index: usize| {
            !ime.is_empty() && selection.carets.iter().any(|c| c.char == char_index)
        };
        let mut x = 0.0;
        let mut utf8 = [0u8; 4];
        for (i, (&ch, &width)) in sub.chars.iter().zip(&sub.char_widths).enumerate() {
            let char_index = sub.start_char + i;
            if ime_at(char_index) {
                let pos = Vec2::new(text_x + x, top);
                draw_ime(backend, theme.foreground, pos, ime, ime_width, bottom);
                x += ime_width;
            }
            let color = theme.style_color(colors.get(char_index).copied().flatten());
            backend.render_text(Vec2::new(text_x + x, top), ch.encode_utf8(&mut utf8), color);
            if show_whitespace {
                match ch {
                    ' ' => backend.render_text(
                        Vec2::new(text_x + x, top),
                        "·",
                        theme.foreground_dimmed,
                    ),
                    '\t' => backend.render_line(
                        Vec2::new(text_x + x + whitespace_width / 2.0, middle),
                        Vec2::new(text_x + x + width - whitespace_width / 2.0, middle),
                        theme.foreground_dimmed,
                        1.0,
                    ),
                    _ => {}
                }
            }
            x += width;
        }
        if ime_at(sub.end_char()) {
            let pos = Vec2::new(text_x + x, top);
            draw_ime(backend, theme.foreground, pos, ime, ime_width, bottom);
            x += ime_width;
        }

        if row.sub == 0 {
            let color = if has_caret {
                theme.foreground
            } else {
                theme.foreground_dimmed
            };
            let pos = Vec2::new(self.line_number_width - number_width, top);
            backend.render_text(pos, &number, color);
        }

        if let Some(folding) = folding {
            let icon_pos = Vec2::new(self.line_number_width + self.fold_width / 2.0, middle);
            if folding.folded {
                backend.render_icon(icon_pos, Icon::Fold, theme.foreground, ICON_SCALE);
                backend.render_icon(
                    Vec2::new(text_x + x + whitespace_width * 2.0, middle),
                    Icon::Ellipsis,
                    theme.foreground_dimmed,
                    ICON_SCALE,
                );
            } else {
                backend.render_icon(icon_pos, Icon::Unfold, theme.foreground_dimmed, ICON_SCALE);
            }
        }

        if caret_visible {
            for mark in &marks {
                let caret_x = text_x + mark.x - 1.0;
                if overwrite {
                    backend.render_rectangle(
                        Vec2::new(caret_x, top),
                        Vec2::new(caret_x + mark.width, bottom),
                        theme.foreground,
                    );
                    backend.render_text(Vec2::new(caret_x, top), &mark.text, theme.background);
                } else {
                    backend.render_line(
                        Vec2::new(caret_x, top),
                        Vec2::new(caret_x, bottom),
                        theme.foreground,
                        CARET_THICKNESS,
                    );
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_highlights<B: Backend>(
    backend: &mut B,
    theme: &Theme,
    search: &RowSearch,
    selected_match: Option<usize>,
    selection: &RowSelection,
    text_x: f32,
    top: f32,
    bottom: f32,
) {
    let mut fill = |span: &RowSpan, color: Color| {
        backend.render_rectangle(
            Vec2::new(text_x + span.start_x, top),
            Vec2::new(text_x + span.end_x, bottom),
            color,
        );
    };
    for (match_index, span) in &search.spans {
        let color = if selected_match == Some(*match_index) {
            theme.background_search_selection
        } else {
            theme.background_search
        };
        fill(span, color);
    }
    for span in &selection.spans {
        fill(span, theme.background_selection);
    }
}

/// Uncommitted IME text, underlined.
fn draw_ime<B: Backend>(
    backend: &mut B,
    color: Color,
    pos: Vec2,
    ime: &str,
    width: f32,
    bottom: f32,
) {
    backend.render_text(pos, ime, color);
    let end = Vec2::new(pos.x + width, bottom);
    backend.render_line(Vec2::new(pos.x, bottom), end, color, 1.0);
}
