//! Colors as they appear in viewer configuration
//!
//! A color can be written either as a hex number (`0xb1e1ff`) or as a CSS-style
//! hex string (`"#FFF"`, `"#fff2e6"`).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// sRGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "ColorRepr")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Creates a color from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Parses `#RGB`, `#RRGGBB`, `0xRRGGBB` or the same digits without a prefix.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .unwrap_or(trimmed);

        let invalid = || ConfigError::InvalidColor(value.to_string());
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        match digits.len() {
            3 => {
                // #RGB expands each nibble: #FA0 == #FFAA00
                let short = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
                let r = (short >> 8) & 0xf;
                let g = (short >> 4) & 0xf;
                let b = short & 0xf;
                Ok(Self::from_hex((r * 0x11) << 16 | (g * 0x11) << 8 | (b * 0x11)))
            }
            6 => u32::from_str_radix(digits, 16)
                .map(Self::from_hex)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    /// Packs the color back into `0xRRGGBB`.
    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        channel(self.r) << 16 | channel(self.g) << 8 | channel(self.b)
    }

    /// Converts the sRGB components to linear space for lighting math.
    pub fn to_linear(self) -> [f32; 3] {
        let convert = |c: f32| {
            if c < 0.04045 {
                c * 0.0773993808
            } else {
                (c * 0.9478672986 + 0.0521327014).powf(2.4)
            }
        };
        [convert(self.r), convert(self.g), convert(self.b)]
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Wire representation accepted in JSON overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(u32),
    Css(String),
}

impl TryFrom<ColorRepr> for Color {
    type Error = ConfigError;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(hex) => Ok(Color::from_hex(hex)),
            ColorRepr::Css(css) => Color::parse(&css),
        }
    }
}

impl From<Color> for ColorRepr {
    fn from(color: Color) -> Self {
        ColorRepr::Css(format!("#{:06x}", color.to_hex()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hex_expands() {
        assert_eq!(Color::parse("#FFF").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("#fa0").unwrap().to_hex(), 0xffaa00);
    }

    #[test]
    fn test_long_hex_and_number_agree() {
        let from_str = Color::parse("#fff2e6").unwrap();
        let from_num = Color::from_hex(0xfff2e6);
        assert_eq!(from_str, from_num);
        assert_eq!(from_num.to_hex(), 0xfff2e6);
    }

    #[test]
    fn test_invalid_color_rejected() {
        assert!(Color::parse("#12").is_err());
        assert!(Color::parse("orange").is_err());
        assert!(Color::parse("#gggggg").is_err());
    }

    #[test]
    fn test_json_accepts_number_or_string() {
        let a: Color = serde_json::from_str("11657727").unwrap();
        let b: Color = serde_json::from_str("\"#b1e1ff\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }

    #[test]
    fn test_linear_conversion_endpoints() {
        assert_eq!(Color::BLACK.to_linear(), [0.0, 0.0, 0.0]);
        let white = Color::WHITE.to_linear();
        assert!((white[0] - 1.0).abs() < 1e-5);
    }
}
