use crossterm::style::Color;
use tracing::warn;

pub const DEFAULT_BACKGROUND: &str = "#0d222b";
pub const DEFAULT_TEXT: &str = "#8fa4c7";
pub const DEFAULT_VISRAAM: &str = "#457cd3";
pub const DEFAULT_VISRAAM_YAMKI: &str = "#6c6551";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub visraam_main: Color,
    pub visraam_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_hex(
            DEFAULT_BACKGROUND,
            DEFAULT_TEXT,
            DEFAULT_VISRAAM,
            DEFAULT_VISRAAM_YAMKI,
        )
    }
}

impl Theme {
    /// Build a theme from `#rrggbb` strings; an unparsable colour keeps its default.
    pub fn from_hex(background: &str, text: &str, visraam_main: &str, visraam_secondary: &str) -> Self {
        Self {
            background: color_or(background, DEFAULT_BACKGROUND),
            text: color_or(text, DEFAULT_TEXT),
            visraam_main: color_or(visraam_main, DEFAULT_VISRAAM),
            visraam_secondary: color_or(visraam_secondary, DEFAULT_VISRAAM_YAMKI),
        }
    }
}

fn color_or(value: &str, fallback: &str) -> Color {
    parse_hex(value).unwrap_or_else(|| {
        warn!(target: "render.theme", value, "invalid_color");
        parse_hex(fallback).unwrap_or(Color::Reset)
    })
}

/// Parse `#rrggbb` or `#rgb`.
pub fn parse_hex(value: &str) -> Option<Color> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb {
            r: channel(&hex[0..2])?,
            g: channel(&hex[2..4])?,
            b: channel(&hex[4..6])?,
        }),
        3 => {
            let double = |s: &str| channel(s).map(|v| v * 17);
            Some(Color::Rgb {
                r: double(&hex[0..1])?,
                g: double(&hex[1..2])?,
                b: double(&hex[2..3])?,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(parse_hex("#0d222b"), Some(Color::Rgb { r: 13, g: 34, b: 43 }));
        assert_eq!(parse_hex("#fff"), Some(Color::Rgb { r: 255, g: 255, b: 255 }));
        assert_eq!(parse_hex("0d222b"), None);
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#gg0000"), None);
    }

    #[test]
    fn invalid_colour_falls_back_to_default() {
        let theme = Theme::from_hex("nope", DEFAULT_TEXT, DEFAULT_VISRAAM, DEFAULT_VISRAAM_YAMKI);
        assert_eq!(theme, Theme::default());
    }
}
