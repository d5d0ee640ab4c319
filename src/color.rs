use anyhow::{bail, Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB color from a packed `0xRRGGBB` value, components in [0, 1].
pub fn rgb_from_hex(hex: u32) -> Vec3 {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    Vec3::new(r, g, b)
}

pub fn rgb_to_hex(color: Vec3) -> u32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(color.x) << 16) | (channel(color.y) << 8) | channel(color.z)
}

/// Parses `#rrggbb`, `#rgb` or the same without the leading `#`.
pub fn parse_hex_color(raw: &str) -> Result<Vec3> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Invalid color '{raw}': expected hex digits");
    }
    let expanded = match digits.len() {
        6 => digits.to_string(),
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        _ => bail!("Invalid color '{raw}': expected #rgb or #rrggbb"),
    };
    let packed = u32::from_str_radix(&expanded, 16).with_context(|| format!("Invalid color '{raw}'"))?;
    Ok(rgb_from_hex(packed))
}

pub fn srgb_to_linear(color: Vec3) -> Vec3 {
    let convert = |c: f32| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(convert(color.x), convert(color.y), convert(color.z))
}

/// Hex-string color as it appears in config files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub Vec3);

impl HexColor {
    pub fn from_hex(hex: u32) -> Self {
        Self(rgb_from_hex(hex))
    }

    pub fn rgb(self) -> Vec3 {
        self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        parse_hex_color(&value).map(HexColor)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", rgb_to_hex(self.0))
    }
}
