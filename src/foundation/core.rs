use serde::{Deserialize, Serialize};

use crate::foundation::error::{LyricError, LyricResult};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Full HD, the render default.
    pub const FULL_HD: Canvas = Canvas {
        width: 1920,
        height: 1080,
    };

    /// Create a validated canvas.
    ///
    /// Both dimensions must be non-zero and even (yuv420p output).
    pub fn new(width: u32, height: u32) -> LyricResult<Self> {
        let c = Self { width, height };
        c.validate()?;
        Ok(c)
    }

    /// Validate dimensions for encoding.
    pub fn validate(&self) -> LyricResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LyricError::config("canvas width/height must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(LyricError::config(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }

    /// Size of one straight RGBA8 frame in bytes.
    pub fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::FULL_HD
    }
}

/// Straight-alpha RGBA8 color.
///
/// Deserializes from `#RGB`, `#RRGGBB`, `#RRGGBBAA` or a small set of CSS color names, and
/// serializes back to lowercase hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black.
    pub const BLACK: Rgba8 = Rgba8::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);

    /// Opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a hex or named color.
    pub fn parse(s: &str) -> LyricResult<Self> {
        parse_color(s).map_err(LyricError::invalid_request)
    }

    /// `#rrggbb` form, alpha dropped.
    pub fn to_hex_rgb(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `0xRRGGBB` form understood by ffmpeg color options.
    pub fn to_ffmpeg(self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Alpha as a `0..=1` opacity.
    pub fn opacity(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    /// Return `true` when fully opaque.
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::BLACK
    }
}

impl std::fmt::Display for Rgba8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_opaque() {
            write!(f, "{}", self.to_hex_rgb())
        } else {
            write!(f, "{}{:02x}", self.to_hex_rgb(), self.a)
        }
    }
}

impl Serialize for Rgba8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_color(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_color(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    if let Some(named) = named_color(s) {
        return Ok(named);
    }
    let hex = s
        .strip_prefix('#')
        .ok_or_else(|| format!("unsupported color \"{s}\" (expected #RRGGBB or a color name)"))?;
    if !hex.is_ascii() {
        return Err(format!("invalid hex color \"{s}\""));
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c
                    .to_digit(16)
                    .ok_or_else(|| format!("invalid hex digit '{c}'"))? as u8;
                out[i] = v * 17;
            }
            Ok(Rgba8::rgb(out[0], out[1], out[2]))
        }
        6 => Ok(Rgba8::rgb(
            hex_byte(&hex[0..2])?,
            hex_byte(&hex[2..4])?,
            hex_byte(&hex[4..6])?,
        )),
        8 => Ok(Rgba8 {
            r: hex_byte(&hex[0..2])?,
            g: hex_byte(&hex[2..4])?,
            b: hex_byte(&hex[4..6])?,
            a: hex_byte(&hex[6..8])?,
        }),
        _ => Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA".to_owned()),
    }
}

fn named_color(s: &str) -> Option<Rgba8> {
    let c = match s.to_ascii_lowercase().as_str() {
        "black" => Rgba8::BLACK,
        "white" => Rgba8::WHITE,
        "red" => Rgba8::rgb(255, 0, 0),
        "green" => Rgba8::rgb(0, 128, 0),
        "blue" => Rgba8::rgb(0, 0, 255),
        "yellow" => Rgba8::rgb(255, 255, 0),
        "gray" | "grey" => Rgba8::rgb(128, 128, 128),
        "transparent" => Rgba8 {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        },
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
