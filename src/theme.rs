pub use colored::{Color, Colorize};
use crate::models::Priority;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorScheme {
    pub foreground: Option<ColorWrapper>,
    pub bold: bool,
    pub dimmed: bool,
}

// Wrapper type for Color that implements Serialize/Deserialize
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ColorWrapper(Color);

impl From<ColorWrapper> for String {
    fn from(wrapper: ColorWrapper) -> Self {
        color_name(wrapper.0)
    }
}

impl From<String> for ColorWrapper {
    fn from(s: String) -> Self {
        ColorWrapper(Color::from_str(&s).unwrap_or(Color::White))
    }
}

impl From<Color> for ColorWrapper {
    fn from(color: Color) -> Self {
        ColorWrapper(color)
    }
}

// Names accepted back by `Color::from_str`.
fn color_name(color: Color) -> String {
    match color {
        Color::Black => "black",
        Color::Red => "red",
        Color::Green => "green",
        Color::Yellow => "yellow",
        Color::Blue => "blue",
        Color::Magenta => "magenta",
        Color::Cyan => "cyan",
        Color::White => "white",
        Color::BrightBlack => "bright black",
        Color::BrightRed => "bright red",
        Color::BrightGreen => "bright green",
        Color::BrightYellow => "bright yellow",
        Color::BrightBlue => "bright blue",
        Color::BrightMagenta => "bright magenta",
        Color::BrightCyan => "bright cyan",
        Color::BrightWhite => "bright white",
        _ => "white",
    }
    .to_string()
}

fn scheme(color: Color, bold: bool) -> ColorScheme {
    ColorScheme {
        foreground: Some(ColorWrapper(color)),
        bold,
        dimmed: false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub header: ColorScheme,
    pub label: ColorScheme,
    pub command: ColorScheme,
    pub success: ColorScheme,
    pub muted: ColorScheme,
    pub critical: ColorScheme,
    pub high: ColorScheme,
    pub medium: ColorScheme,
    pub low: ColorScheme,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header: scheme(Color::Blue, true),
            label: scheme(Color::Cyan, false),
            command: scheme(Color::Green, false),
            success: scheme(Color::Green, true),
            muted: ColorScheme {
                foreground: None,
                bold: false,
                dimmed: true,
            },
            critical: scheme(Color::Red, true),
            high: scheme(Color::Red, false),
            medium: scheme(Color::Yellow, false),
            low: scheme(Color::White, false),
        }
    }
}

impl Theme {
    pub fn monochrome() -> Self {
        let plain = ColorScheme::default();
        let bold = ColorScheme {
            bold: true,
            ..Default::default()
        };
        Self {
            header: bold.clone(),
            label: plain.clone(),
            command: plain.clone(),
            success: bold.clone(),
            muted: plain.clone(),
            critical: bold,
            high: plain.clone(),
            medium: plain.clone(),
            low: plain,
        }
    }

    pub fn priority(&self, priority: Priority) -> &ColorScheme {
        match priority {
            Priority::Critical => &self.critical,
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }
}

impl ColorScheme {
    pub fn apply(&self, text: &str) -> colored::ColoredString {
        let mut colored_text: colored::ColoredString = text.into();

        if let Some(fg) = &self.foreground {
            colored_text = colored_text.color(fg.0);
        }
        if self.bold {
            colored_text = colored_text.bold();
        }
        if self.dimmed {
            colored_text = colored_text.dimmed();
        }

        colored_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_survives_toml() {
        let theme = Theme::default();
        let text = toml::to_string(&theme).unwrap();
        let back: Theme = toml::from_str(&text).unwrap();
        assert!(matches!(back.critical.foreground, Some(ColorWrapper(Color::Red))));
        assert!(matches!(back.medium.foreground, Some(ColorWrapper(Color::Yellow))));
        assert!(back.muted.foreground.is_none());
    }

    #[test]
    fn test_priority_lookup() {
        let theme = Theme::monochrome();
        assert!(theme.priority(Priority::Critical).bold);
        assert!(!theme.priority(Priority::Low).bold);
    }
}
