//! Theme configuration for the TUI.
//!
//! Supports light and dark palettes with automatic terminal detection. The
//! configured theme (background, text, accent, font size) is laid over the
//! palette; anything it leaves unset or that fails to parse keeps the
//! palette value.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::AlarmStatus;
use crate::settings::ThemeConfig;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic palette selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Accent color for the heart-rate number, chart line and highlights.
    pub accent: Color,
    /// Foreground for regular text.
    pub text: Color,
    /// Panel background. `Color::Reset` leaves the terminal background alone.
    pub background: Color,
    /// Color for the low-alarm state and caution text.
    pub warning: Color,
    /// Color for the high-alarm state.
    pub critical: Color,
    /// Color for the normal state.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for section headers.
    pub header: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
    /// Nominal number size; large sizes switch to block digits.
    pub font_size: u16,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            accent: Color::Cyan,
            text: Color::White,
            background: Color::Reset,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
            font_size: 72,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            accent: Color::Blue,
            text: Color::Black,
            background: Color::Reset,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
            font_size: 72,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// This palette with the configured theme laid over it.
    pub fn with_config(&self, config: &ThemeConfig) -> Self {
        let mut theme = self.clone();
        if let Some(color) = config.accent.as_deref().and_then(parse_color) {
            theme.accent = color.into();
            theme.header = theme.header.fg(theme.accent);
        }
        if let Some(color) = config.text.as_deref().and_then(parse_color) {
            theme.text = color.into();
        }
        if let Some(color) = config.bg.as_deref().and_then(parse_color) {
            theme.background = color.into();
        }
        if let Some(size) = config.font_size {
            theme.font_size = size;
        }
        theme
    }

    /// Base style for panel content.
    pub fn panel(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    /// Whether the heart-rate number is drawn with block digits.
    pub fn big_digits(&self) -> bool {
        self.font_size >= 48
    }

    /// Get style for an alarm status
    pub fn status_style(&self, status: AlarmStatus) -> Style {
        match status {
            AlarmStatus::Normal => Style::default().fg(self.healthy),
            AlarmStatus::Low => Style::default().fg(self.warning).add_modifier(Modifier::BOLD),
            AlarmStatus::High => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
            AlarmStatus::NoData | AlarmStatus::Disabled => {
                Style::default().add_modifier(Modifier::DIM)
            }
        }
    }
}

/// A parsed CSS-style colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `0.0..=1.0`.
    pub alpha: f32,
}

impl From<ParsedColor> for Color {
    /// Terminals cannot blend, so anything translucent keeps the terminal's own colour.
    fn from(c: ParsedColor) -> Self {
        if c.alpha < 1.0 {
            Color::Reset
        } else {
            Color::Rgb(c.r, c.g, c.b)
        }
    }
}

/// Parse `#rgb`, `#rrggbb`, `rgb(r,g,b)` or `rgba(r,g,b,a)`.
pub fn parse_color(s: &str) -> Option<ParsedColor> {
    let s = s.trim();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = s.to_ascii_lowercase();
    let (args, with_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
        (rest.strip_suffix(')')?, true)
    } else if let Some(rest) = lower.strip_prefix("rgb(") {
        (rest.strip_suffix(')')?, false)
    } else {
        return None;
    };

    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let expected = if with_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }

    let channel = |p: &str| p.parse::<u8>().ok();
    let alpha = if with_alpha {
        let a: f32 = parts[3].parse().ok()?;
        if !(0.0..=1.0).contains(&a) {
            return None;
        }
        a
    } else {
        1.0
    };

    Some(ParsedColor {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        alpha,
    })
}

fn parse_hex(hex: &str) -> Option<ParsedColor> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let (r, g, b) = match hex.len() {
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            (digit(0)?, digit(1)?, digit(2)?)
        }
        6 => {
            let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            (pair(0)?, pair(2)?, pair(4)?)
        }
        _ => return None,
    };
    Some(ParsedColor { r, g, b, alpha: 1.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(
            parse_color("#ff4d4f"),
            Some(ParsedColor { r: 255, g: 77, b: 79, alpha: 1.0 })
        );
        assert_eq!(
            parse_color("#fff"),
            Some(ParsedColor { r: 255, g: 255, b: 255, alpha: 1.0 })
        );
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#gggggg"), None);
    }

    #[test]
    fn test_parse_rgb_functions() {
        assert_eq!(
            parse_color("rgb(1, 2, 3)"),
            Some(ParsedColor { r: 1, g: 2, b: 3, alpha: 1.0 })
        );
        assert_eq!(
            parse_color("rgba(0,0,0,0.4)"),
            Some(ParsedColor { r: 0, g: 0, b: 0, alpha: 0.4 })
        );
        assert_eq!(parse_color("rgba(0,0,0)"), None);
        assert_eq!(parse_color("rgb(300,0,0)"), None);
        assert_eq!(parse_color("tomato"), None);
    }

    #[test]
    fn test_translucent_colors_keep_terminal_background() {
        let color: Color = parse_color("rgba(0,0,0,0.4)").unwrap().into();
        assert_eq!(color, Color::Reset);
        let color: Color = parse_color("rgba(10,20,30,1)").unwrap().into();
        assert_eq!(color, Color::Rgb(10, 20, 30));
    }

    #[test]
    fn test_default_config_over_dark_palette() {
        let theme = Theme::dark().with_config(&ThemeConfig::default());
        assert_eq!(theme.accent, Color::Rgb(255, 77, 79));
        assert_eq!(theme.text, Color::Rgb(255, 255, 255));
        assert_eq!(theme.background, Color::Reset);
        assert_eq!(theme.font_size, 72);
        assert!(theme.big_digits());
    }

    #[test]
    fn test_partial_config_falls_back_to_palette() {
        let config = ThemeConfig {
            bg: None,
            text: None,
            accent: Some("not a colour".to_string()),
            font_size: Some(40),
        };
        let theme = Theme::light().with_config(&config);
        assert_eq!(theme.accent, Color::Blue);
        assert_eq!(theme.text, Color::Black);
        assert!(!theme.big_digits());
    }
}
