//! RGB color type and hex conversion.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{HappyMapError, Result};

/// A 24-bit color with one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Build a color from its channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a packed `0xRRGGBB` value
    pub const fn from_u32(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: (packed & 0xFF) as u8,
        }
    }

    /// Parse `RRGGBB` or `#RRGGBB` (either case).
    pub fn from_hex(input: &str) -> Result<Self> {
        let digits = input.strip_prefix('#').unwrap_or(input);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HappyMapError::InvalidColor {
                input: input.to_string(),
            });
        }
        let packed = u32::from_str_radix(digits, 16).map_err(|_| HappyMapError::InvalidColor {
            input: input.to_string(),
        })?;
        Ok(Self::from_u32(packed))
    }

    /// Format as `#RRGGBB` with uppercase digits
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Channels as an array
    pub fn to_array(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for RgbColor {
    type Err = HappyMapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for RgbColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RgbColor::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// Linear interpolation between two colors.
///
/// `t = 0` yields `from`, `t = 1` yields `to`. Each channel is rounded to the
/// nearest integer.
pub fn lerp_color(from: RgbColor, to: RgbColor, t: f64) -> RgbColor {
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| ((1.0 - t) * a as f64 + t * b as f64).round() as u8;
    RgbColor {
        r: channel(from.r, to.r),
        g: channel(from.g, to.g),
        b: channel(from.b, to.b),
    }
}
