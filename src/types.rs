// Core types shared by the reducer, the collaborators and the window loop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::Error;

/// One sample from the depth camera, in meters relative to the reference surface.
/// `z` is the height above the surface when the source reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Point {
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

/// One batch of points delivered per camera tick. Consumed and dropped each frame.
pub type Frame = Vec<Point>;

/// Per-axis mean of a frame, rounded to 3 significant digits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Centroid {
    /// Map surface coordinates to a canvas pixel.
    /// The surface x-axis is mirrored relative to the camera, hence the sign flip.
    pub fn to_screen(&self, width: usize, height: usize) -> ScreenPoint {
        ScreenPoint {
            x: (-self.x * width as f64) as f32,
            y: (self.y * height as f64) as f32,
        }
    }
}

/// A position on the projected canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// 24-bit paint color. Parses and prints as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack as 0x00RRGGBB, the layout minifb expects.
    pub fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn from_u32(px: u32) -> Self {
        Self {
            r: ((px >> 16) & 0xFF) as u8,
            g: ((px >> 8) & 0xFF) as u8,
            b: (px & 0xFF) as u8,
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::Config(format!("bad color {s:?}, expected #RRGGBB")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| Error::Config(format!("bad color {s:?}: {e}")))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which screen the user is looking at. Decides what a stable cursor means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Canvas,
    ColorMenu,
    MainMenu,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canvas => "CANVAS",
            Self::ColorMenu => "COLORS",
            Self::MainMenu => "MENU",
        }
    }
}

/// Every widget the UI layer knows about. Swatches carry their own color value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Canvas,
    ColorMenu,
    MainMenu,
    ColorMenuButton,
    MainMenuButton,
    BackButton,
    SaveButton,
    LoadButton,
    ClearButton,
    EraserButton,
    Swatch(Color),
}

/// One round dab on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintStroke {
    pub at: ScreenPoint,
    pub radius: f32,
    pub color: Color,
    pub opacity: f32,
}

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A buffer filled with one color.
    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        Self { width, height, pixels: vec![color.to_u32(); width * height] }
    }

    /// Pixel at (x,y), or None outside the buffer.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors_with_and_without_hash() {
        assert_eq!("#FF8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
        assert_eq!("00ff00".parse::<Color>().unwrap(), Color::rgb(0, 255, 0));
        assert!("#F80".parse::<Color>().is_err());
        assert!("#GG0000".parse::<Color>().is_err());
    }

    #[test]
    fn color_display_is_uppercase_hex() {
        assert_eq!(Color::rgb(0xab, 0x01, 0xff).to_string(), "#AB01FF");
    }

    #[test]
    fn screen_mapping_mirrors_x() {
        let c = Centroid { x: -0.25, y: 0.5, z: None };
        assert_eq!(c.to_screen(800, 600), ScreenPoint { x: 200.0, y: 300.0 });
    }
}
