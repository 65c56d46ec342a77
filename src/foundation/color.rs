use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{TokenforgeError, TokenforgeResult};

/// Straight-alpha RGBA color with four 8-bit channels.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (0 = fully transparent, 255 = fully opaque).
    pub alpha: u8,
}

impl Color {
    /// Fully opaque black.
    pub const OPAQUE_BLACK: Self = Self::new(0, 0, 0, 255);

    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Build a color from channel values.
    pub const fn new(r: u8, g: u8, b: u8, alpha: u8) -> Self {
        Self { r, g, b, alpha }
    }

    /// Build a fully opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Whether the color is exactly opaque (alpha = 255).
    pub fn is_opaque(self) -> bool {
        self.is_opaque_at(u8::MAX)
    }

    /// Whether alpha is at least `threshold`.
    pub fn is_opaque_at(self, threshold: u8) -> bool {
        self.alpha >= threshold
    }

    /// Whether the color is exactly transparent (alpha = 0).
    pub fn is_transparent(self) -> bool {
        self.is_transparent_at(0)
    }

    /// Whether alpha is at most `threshold`.
    pub fn is_transparent_at(self, threshold: u8) -> bool {
        self.alpha <= threshold
    }

    /// Channel-wise average of `colors`, fully opaque. `None` when empty.
    pub fn average(colors: &[Color]) -> Option<Color> {
        if colors.is_empty() {
            return None;
        }
        let mut sum = [0u64; 3];
        for c in colors {
            sum[0] += u64::from(c.r);
            sum[1] += u64::from(c.g);
            sum[2] += u64::from(c.b);
        }
        let n = colors.len() as f64;
        let avg = |v: u64| (v as f64 / n).round() as u8;
        Some(Color::opaque(avg(sum[0]), avg(sum[1]), avg(sum[2])))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.alpha
        )
    }
}

impl FromStr for Color {
    type Err = TokenforgeError;

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (case-insensitive).
    fn from_str(s: &str) -> TokenforgeResult<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| TokenforgeError::validation(format!("color '{s}' must start with '#'")))?;

        let channel = |part: &str| -> TokenforgeResult<u8> {
            u8::from_str_radix(part, 16)
                .map_err(|_| TokenforgeError::validation(format!("color '{s}' has invalid hex")))
        };

        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, ch) in hex.chars().enumerate() {
                    let v = channel(&ch.to_string())?;
                    out[i] = v << 4 | v;
                }
                Ok(Color::opaque(out[0], out[1], out[2]))
            }
            6 | 8 => {
                let mut out = [0u8; 4];
                out[3] = 255;
                for (i, part) in hex.as_bytes().chunks(2).enumerate() {
                    let part = std::str::from_utf8(part)
                        .map_err(|_| TokenforgeError::validation("color is not valid UTF-8"))?;
                    out[i] = channel(part)?;
                }
                Ok(Color::new(out[0], out[1], out[2], out[3]))
            }
            _ => Err(TokenforgeError::validation(format!(
                "color '{s}' must be #rgb, #rrggbb or #rrggbbaa"
            ))),
        }
    }
}
