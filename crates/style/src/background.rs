use serde::{Deserialize, Serialize};
use vellum_types::{Color, TransparentColor};

/// A background fill. The `extra_*` values let the painted area bleed past
/// the margin-excluded box on each side.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub color: Color,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub extra_top: f32,
    #[serde(default)]
    pub extra_right: f32,
    #[serde(default)]
    pub extra_bottom: f32,
    #[serde(default)]
    pub extra_left: f32,
}

fn default_opacity() -> f32 {
    1.0
}

impl Background {
    pub fn new(color: Color) -> Self {
        Self::with_opacity(color, 1.0)
    }

    pub fn with_opacity(color: Color, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            extra_top: 0.0,
            extra_right: 0.0,
            extra_bottom: 0.0,
            extra_left: 0.0,
        }
    }

    pub fn with_extras(mut self, top: f32, right: f32, bottom: f32, left: f32) -> Self {
        self.extra_top = top;
        self.extra_right = right;
        self.extra_bottom = bottom;
        self.extra_left = left;
        self
    }

    pub fn transparent_color(&self) -> TransparentColor {
        TransparentColor::new(self.color, self.opacity)
    }
}
