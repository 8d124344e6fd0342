use serde::{de, Deserialize, Deserializer, Serialize};
use std::hash::{Hash, Hasher};

/// A device colour. Components are in the `0.0..=1.0` range PDF expects.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "space", rename_all = "camelCase")]
pub enum Color {
    Gray { value: f32 },
    Rgb { r: f32, g: f32, b: f32 },
    Cmyk { c: f32, m: f32, y: f32, k: f32 },
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.components() {
            c.to_bits().hash(state);
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color::Gray { value: 0.0 };
    pub const WHITE: Color = Color::Gray { value: 1.0 };

    pub fn gray(value: f32) -> Self {
        Color::Gray { value }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub fn components(&self) -> Vec<f32> {
        match *self {
            Color::Gray { value } => vec![value],
            Color::Rgb { r, g, b } => vec![r, g, b],
            Color::Cmyk { c, m, y, k } => vec![c, m, y, k],
        }
    }

    /// Content-stream operator that sets this colour for filling.
    pub fn fill_operator(&self) -> &'static str {
        match self {
            Color::Gray { .. } => "g",
            Color::Rgb { .. } => "rg",
            Color::Cmyk { .. } => "k",
        }
    }

    /// Content-stream operator that sets this colour for stroking.
    pub fn stroke_operator(&self) -> &'static str {
        match self {
            Color::Gray { .. } => "G",
            Color::Rgb { .. } => "RG",
            Color::Cmyk { .. } => "K",
        }
    }

    /// Parse a hex color string (#RGB or #RRGGBB format)
    pub fn parse_hex(s: &str) -> Result<Color, String> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("Color must start with #, got: {}", s))?;

        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            n => return Err(format!("Invalid hex color length: expected 3 or 6, got {}", n)),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|e| format!("Invalid color component '{}': {}", &expanded[i..i + 2], e))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ColorDef {
            Str(String),
            Gray { value: f32 },
            Rgb { r: f32, g: f32, b: f32 },
            Cmyk { c: f32, m: f32, y: f32, k: f32 },
        }

        match ColorDef::deserialize(deserializer)? {
            ColorDef::Str(s) => Self::parse_hex(&s).map_err(de::Error::custom),
            ColorDef::Gray { value } => Ok(Color::Gray { value }),
            ColorDef::Rgb { r, g, b } => Ok(Color::Rgb { r, g, b }),
            ColorDef::Cmyk { c, m, y, k } => Ok(Color::Cmyk { c, m, y, k }),
        }
    }
}

/// A colour paired with an opacity, as used by backgrounds and borders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransparentColor {
    pub color: Color,
    pub opacity: f32,
}

impl TransparentColor {
    pub fn new(color: Color, opacity: f32) -> Self {
        Self { color, opacity }
    }

    pub fn opaque(color: Color) -> Self {
        Self::new(color, 1.0)
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(Color::parse_hex("#fff").unwrap(), Color::rgb(255, 255, 255));
        assert_eq!(Color::parse_hex("#FF0000").unwrap(), Color::rgb(255, 0, 0));
        assert!(Color::parse_hex("123456").is_err());
        assert!(Color::parse_hex("#12345").is_err());
    }

    #[test]
    fn operators_follow_color_space() {
        assert_eq!(Color::BLACK.fill_operator(), "g");
        assert_eq!(Color::rgb(1, 2, 3).stroke_operator(), "RG");
        assert_eq!(Color::Cmyk { c: 0.0, m: 0.0, y: 0.0, k: 1.0 }.components().len(), 4);
    }
}
