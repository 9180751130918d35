//! Neon theme: colors, palettes and the chart style configuration.
//!
//! Colors are written as `#RRGGBB` everywhere a human touches them (JSON theme
//! files, CLI flags) and converted to plotters colors at draw time.

use crate::error::NeonError;
use anyhow::Result;
use plotters::style::{RGBAColor, RGBColor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self, NeonError> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(NeonError::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| NeonError::InvalidColor(s.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn rgb(self) -> RGBColor {
        RGBColor(self.r, self.g, self.b)
    }

    pub fn with_alpha(self, alpha: f64) -> RGBAColor {
        RGBAColor(self.r, self.g, self.b, alpha.clamp(0.0, 1.0))
    }
}

impl TryFrom<String> for Rgb8 {
    type Error = NeonError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rgb8::from_hex(&s)
    }
}

impl From<Rgb8> for String {
    fn from(c: Rgb8) -> Self {
        c.to_hex()
    }
}

// ------------------------ Neon color table ------------------------

pub const ROSE: Rgb8 = Rgb8::new(0xFE, 0x53, 0xBB);
pub const LEMON: Rgb8 = Rgb8::new(0xFE, 0xFF, 0xAC);
pub const ICE: Rgb8 = Rgb8::new(0x97, 0xFE, 0xED);
pub const VIOLET: Rgb8 = Rgb8::new(0xE3, 0x84, 0xFF);
pub const ORANGE: Rgb8 = Rgb8::new(0xFF, 0x84, 0x00);
pub const MINT: Rgb8 = Rgb8::new(0x45, 0xFF, 0xCA);
pub const TEAL: Rgb8 = Rgb8::new(0x0B, 0x66, 0x6A);
pub const ULTRAMARINE: Rgb8 = Rgb8::new(0x3E, 0x00, 0xFF);

pub const NIGHT: Rgb8 = Rgb8::new(0x21, 0x29, 0x46);
pub const DEEP_NIGHT: Rgb8 = Rgb8::new(0x14, 0x19, 0x2B);
pub const PAPER: Rgb8 = Rgb8::new(0xFD, 0xF0, 0xF0);
pub const WHITE: Rgb8 = Rgb8::new(0xFF, 0xFF, 0xFF);
pub const BLACK: Rgb8 = Rgb8::new(0x00, 0x00, 0x00);
/// Text color inside pie wedges.
pub const INK: Rgb8 = Rgb8::new(0x17, 0x00, 0x55);
/// Inner box of violins (matplotlib gray ".2").
pub const CHARCOAL: Rgb8 = Rgb8::new(0x33, 0x33, 0x33);
/// Dotted grid of pair plots.
pub const DUSK: Rgb8 = Rgb8::new(0x2A, 0x36, 0x5E);

/// Ordered color tokens, picked cyclically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette(pub Vec<Rgb8>);

impl Palette {
    /// Five-color palette used by most charts.
    pub fn neon() -> Self {
        Palette(vec![ROSE, LEMON, ICE, VIOLET, ORANGE])
    }

    /// Eight-color palette used by pie, box, joint and pair plots.
    pub fn neon_extended() -> Self {
        Palette(vec![ROSE, LEMON, ICE, VIOLET, ORANGE, MINT, TEAL, ULTRAMARINE])
    }

    /// Histogram order swaps the second and third colors.
    pub fn neon_histogram() -> Self {
        Palette(vec![ROSE, ICE, LEMON, VIOLET, ORANGE])
    }

    /// Used by violins when the hue column has exactly two values.
    pub fn neon_pair() -> Self {
        Palette(vec![ROSE, ICE])
    }

    /// `palette[idx mod len]`. An empty palette falls back to rose.
    pub fn pick(&self, idx: usize) -> Rgb8 {
        if self.0.is_empty() {
            return ROSE;
        }
        self.0[idx % self.0.len()]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::neon()
    }
}

/// Marker drawn on line charts and pair plots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    Circle,
    Square,
    Triangle,
    Diamond,
    Cross,
    X,
}

/// Stroke pattern of line charts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDash {
    #[default]
    Solid,
    Dash,
    Dot,
}

/// Chart style configuration. Never mutated by the chart functions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub font_family: String,
    /// Font file to register under `font_family`.
    pub font_path: Option<PathBuf>,
    pub font_color: Rgb8,
    /// Axis description size in pixels.
    pub font_size: u32,
    pub title_size: u32,
    pub title_pad: u32,
    pub bg_color: Rgb8,
    pub grid_color: Rgb8,
    pub palette: Palette,
    /// Tick label rotation in degrees; 90, 180 and 270 are honored.
    pub rotation: u16,
    /// Figure size in pixels.
    pub figsize: (u32, u32),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font_family: "Sangha".to_string(),
            font_path: None,
            font_color: PAPER,
            font_size: 20,
            title_size: 24,
            title_pad: 15,
            bg_color: NIGHT,
            grid_color: ROSE,
            palette: Palette::neon(),
            rotation: 0,
            figsize: (1000, 800),
        }
    }
}

impl Theme {
    /// Default theme with the eight-color palette.
    pub fn extended() -> Self {
        Self {
            palette: Palette::neon_extended(),
            ..Self::default()
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_figsize(mut self, width: u32, height: u32) -> Self {
        self.figsize = (width, height);
        self
    }

    /// Load a JSON theme; absent fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| NeonError::Theme {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let theme = serde_json::from_str(&raw).map_err(|e| NeonError::Theme {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_and_errors() {
        assert_eq!(Rgb8::from_hex("#FE53BB").unwrap(), ROSE);
        assert_eq!(Rgb8::from_hex("212946").unwrap(), NIGHT);
        assert_eq!(ROSE.to_hex(), "#FE53BB");
        assert!(Rgb8::from_hex("#FE53B").is_err());
        assert!(Rgb8::from_hex("#GG0000").is_err());
    }

    #[test]
    fn palette_wraps() {
        let p = Palette::neon_pair();
        assert_eq!(p.pick(0), ROSE);
        assert_eq!(p.pick(1), ICE);
        assert_eq!(p.pick(2), ROSE);
        assert_eq!(Palette(vec![]).pick(7), ROSE);
    }

    #[test]
    fn theme_json_overrides_only_given_fields() {
        let t: Theme =
            serde_json::from_str(r##"{"bg_color":"#000000","palette":["#FFFFFF","#FE53BB"]}"##)
                .unwrap();
        assert_eq!(t.bg_color, BLACK);
        assert_eq!(t.palette.len(), 2);
        assert_eq!(t.font_color, PAPER);
        assert_eq!(t.figsize, (1000, 800));
    }

    #[test]
    fn bad_color_in_theme_is_rejected() {
        let r: Result<Theme, _> = serde_json::from_str(r#"{"grid_color":"pink"}"#);
        assert!(r.is_err());
    }
}
