//! Colors and the default dark theme.

use serde::{Deserialize, Serialize};

use crate::language::StyleTag;

/// RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Fully transparent black.
    pub const NONE: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Construct from components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`. Missing or malformed components read as zero, a missing
    /// alpha as opaque.
    pub fn from_hex(hex: &str) -> Self {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let component = |i: usize| -> Option<f32> {
            let pair = hex.get(i * 2..i * 2 + 2)?;
            u8::from_str_radix(pair, 16).ok().map(|v| v as f32 / 255.0)
        };
        Self {
            r: component(0).unwrap_or(0.0),
            g: component(1).unwrap_or(0.0),
            b: component(2).unwrap_or(0.0),
            a: component(3).unwrap_or(1.0),
        }
    }

    /// Parse a hex color authored in sRGB and re-encode it with `gamma` for a linear
    /// blending pipeline.
    pub fn from_srgb_hex(hex: &str, gamma: f32) -> Self {
        let color = Self::from_hex(hex);
        let convert = |c: f32| -> f32 {
            let linear = if c > 0.04045 {
                ((c + 0.055) / 1.055).powf(2.4)
            } else {
                c / 12.92
            };
            linear.powf(1.0 / gamma).clamp(0.0, 1.0)
        };
        Self {
            r: convert(color.r),
            g: convert(color.g),
            b: convert(color.b),
            a: color.a,
        }
    }
}

const SRGB_GAMMA: f32 = 1.8;

fn srgb(hex: &str) -> Color {
    Color::from_srgb_hex(hex, SRGB_GAMMA)
}

/// Colors used by the frame renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// Page background.
    pub background: Color,
    /// Folded-region and gutter background.
    pub background_dimmed: Color,
    /// Selection rectangles.
    pub background_selection: Color,
    /// Search match rectangles.
    pub background_search: Color,
    /// The current search match.
    pub background_search_selection: Color,
    /// Default text.
    pub foreground: Color,
    /// Line numbers, whitespace markers, fold icons.
    pub foreground_dimmed: Color,
    /// Color per style tag, indexed by [`StyleTag::index`].
    pub token_colors: [Color; StyleTag::COUNT],
}

impl Theme {
    /// Dark theme.
    pub fn dark() -> Self {
        let mut token_colors = [Color::NONE; StyleTag::COUNT];
        for (tag, hex) in [
            (StyleTag::Comment, "#6A9955"),
            (StyleTag::Constant, "#569CD6"),
            (StyleTag::Attribute, "#D7BA7D"),
            (StyleTag::Invalid, "#F44747"),
            (StyleTag::String, "#CE9178"),
            (StyleTag::Keyword, "#569CD6"),
            (StyleTag::KeywordControl, "#C586C0"),
            (StyleTag::Function, "#DCDCAA"),
            (StyleTag::Namespace, "#4EC9B0"),
            (StyleTag::Type, "#4EC9B0"),
            (StyleTag::Numeric, "#B5CEA8"),
            (StyleTag::Variable, "#9CDCFE"),
        ] {
            token_colors[tag.index()] = srgb(hex);
        }

        Self {
            background: srgb("#1E1E1E"),
            background_dimmed: srgb("#2B2B2B"),
            background_selection: srgb("#ADD6FF26"),
            background_search: srgb("#613214"),
            background_search_selection: srgb("#EEEEEE"),
            foreground: srgb("#D4D4D4"),
            foreground_dimmed: srgb("#767676"),
            token_colors,
        }
    }

    /// Color for a character with the given style, falling back to the foreground.
    pub fn style_color(&self, style: Option<StyleTag>) -> Color {
        match style {
            Some(tag) => self.token_colors[tag.index()],
            None => self.foreground,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let c = Color::from_hex("#FF000080");
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(Color::from_hex("00FF00").a, 1.0);
    }

    #[test]
    fn test_srgb_extremes_are_preserved() {
        let white = Color::from_srgb_hex("#FFFFFF", 1.8);
        assert!((white.r - 1.0).abs() < 1e-6);
        let black = Color::from_srgb_hex("#000000", 1.8);
        assert_eq!(black.g, 0.0);
    }

    #[test]
    fn test_style_color_fallback() {
        let theme = Theme::dark();
        assert_eq!(theme.style_color(None), theme.foreground);
        assert_eq!(
            theme.style_color(Some(StyleTag::Keyword)),
            theme.token_colors[StyleTag::Keyword.index()]
        );
    }
}
