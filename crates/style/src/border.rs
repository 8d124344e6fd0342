//! Border and outline specifications.
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use vellum_types::Color;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Double,
}

/// The side a border segment is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Index into a `[top, right, bottom, left]` array.
    pub fn index(self) -> usize {
        match self {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Border {
    pub width: f32,
    #[serde(default)]
    pub style: BorderStyle,
    #[serde(default)]
    pub color: Color,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_opacity() -> f32 {
    1.0
}

impl Eq for Border {}

impl Hash for Border {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.to_bits().hash(state);
        self.style.hash(state);
        self.color.hash(state);
        self.opacity.to_bits().hash(state);
    }
}

impl Border {
    pub fn solid(width: f32, color: Color) -> Self {
        Self { width, style: BorderStyle::Solid, color, opacity: 1.0 }
    }

    pub fn new(width: f32, style: BorderStyle, color: Color) -> Self {
        Self { width, style, color, opacity: 1.0 }
    }

    /// Dash array for the stroke operator `d`, empty for continuous lines.
    pub fn dash_pattern(&self) -> Vec<f32> {
        match self.style {
            BorderStyle::Solid | BorderStyle::Double => Vec::new(),
            BorderStyle::Dashed => vec![self.width * 3.0, self.width * 3.0],
            BorderStyle::Dotted => vec![0.0, self.width * 2.0],
        }
    }
}
