//! Background theming: a hex color, a background mode, and the preset
//! palette the theme buttons cycle through.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// 24-bit Red-Green-Blue color. Serializes/deserializes as HTML format
/// (#rrggbb), to match the persisted string values.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// Preset swatches from the theme picker
    pub const LIGHT_GRAY: Self = Self::rgb(0xEB, 0xEB, 0xEB);
    pub const GREEN: Self = Self::rgb(0xDF, 0xF0, 0xC4);
    pub const YELLOW: Self = Self::rgb(0xFF, 0xF7, 0x88);
    /// Flat background used by dark mode
    pub const DARK: Self = Self::rgb(0x1A, 0x1A, 0x1A);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

// This is lossy, since we throw away the first 8 bits. Hope it wasn't RGBA!
impl From<u32> for Color {
    fn from(value: u32) -> Self {
        // Casting will truncate the 24 most significant bits
        let red = (value >> 16) as u8;
        let green = (value >> 8) as u8;
        let blue = value as u8;
        Self { red, green, blue }
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 7 && s.starts_with('#') {
            let value = u32::from_str_radix(&s[1..], 16)?;
            Ok(value.into())
        } else {
            Err(anyhow!("Invalid color string: {}", s))
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:0>2x}{:0>2x}{:0>2x}", self.red, self.green, self.blue)
    }
}

// These impls are needed for serde
impl TryFrom<String> for Color {
    type Error = <Color as FromStr>::Err;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// How the background gets painted
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BackgroundMode {
    #[default]
    Solid,
    Gradient,
    Dark,
}

impl BackgroundMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Gradient => "gradient",
            Self::Dark => "dark",
        }
    }

    fn from_str_lossy(s: &str) -> Self {
        match s {
            "gradient" => Self::Gradient,
            "dark" => Self::Dark,
            _ => Self::Solid,
        }
    }
}

/// User-selected theme. Set by the theme buttons, persisted immediately by
/// the app layer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Theme {
    pub color: Color,
    pub mode: BackgroundMode,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            color: Color::GREEN,
            mode: BackgroundMode::Solid,
        }
    }
}

impl Theme {
    /// Rebuild from persisted strings; anything unparseable falls back to
    /// the default green solid.
    pub fn restore(color: Option<&str>, mode: Option<&str>) -> Self {
        Self {
            color: color
                .and_then(|value| value.parse().ok())
                .unwrap_or(Color::GREEN),
            mode: mode
                .map(BackgroundMode::from_str_lossy)
                .unwrap_or_default(),
        }
    }

    pub fn solid(color: Color) -> Self {
        Self {
            color,
            mode: BackgroundMode::Solid,
        }
    }

    pub fn gradient() -> Self {
        Self {
            mode: BackgroundMode::Gradient,
            ..Self::default()
        }
    }

    pub fn dark() -> Self {
        Self {
            mode: BackgroundMode::Dark,
            ..Self::default()
        }
    }

    /// Gradient and dark backgrounds take light foreground text; solid
    /// swatches are all light enough for dark text.
    pub fn light_text(self) -> bool {
        matches!(self.mode, BackgroundMode::Gradient | BackgroundMode::Dark)
    }

    /// The flat color actually painted behind the widget. Gradients are the
    /// renderer's business; this is their darkest stop.
    pub fn background(self) -> Color {
        match self.mode {
            BackgroundMode::Solid => self.color,
            BackgroundMode::Gradient => Color::rgb(0x34, 0x77, 0xDF),
            BackgroundMode::Dark => Color::DARK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!("#dff0c4".parse::<Color>().unwrap(), Color::GREEN);
        assert_eq!(Color::LIGHT_GRAY.to_string(), "#ebebeb");
        assert!("dff0c4".parse::<Color>().is_err());
        assert!("#dff0c".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn test_theme_restore() {
        let theme = Theme::restore(Some("#fff788"), Some("solid"));
        assert_eq!(theme, Theme::solid(Color::YELLOW));

        // Garbage falls back to the defaults
        let theme = Theme::restore(Some("chartreuse"), Some("plaid"));
        assert_eq!(theme, Theme::default());

        let theme = Theme::restore(None, Some("dark"));
        assert_eq!(theme.mode, BackgroundMode::Dark);
        assert!(theme.light_text());
        assert_eq!(theme.background(), Color::DARK);
    }
}
