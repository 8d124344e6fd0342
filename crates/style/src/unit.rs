//! Point and percent lengths.
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A length that is either absolute (points) or relative to some base
/// dimension (percent). Percent values must be resolved before they are
/// used in absolute geometry.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum UnitValue {
    Point(f32),
    Percent(f32),
}

impl Hash for UnitValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            UnitValue::Point(v) => {
                0u8.hash(state);
                v.to_bits().hash(state);
            }
            UnitValue::Percent(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
        }
    }
}

impl Eq for UnitValue {}

impl UnitValue {
    pub fn points(value: f32) -> Self {
        UnitValue::Point(value)
    }

    pub fn percent(value: f32) -> Self {
        UnitValue::Percent(value)
    }

    pub fn value(&self) -> f32 {
        match *self {
            UnitValue::Point(v) | UnitValue::Percent(v) => v,
        }
    }

    pub fn is_point_value(&self) -> bool {
        matches!(self, UnitValue::Point(_))
    }

    pub fn is_percent_value(&self) -> bool {
        matches!(self, UnitValue::Percent(_))
    }

    /// Resolves against `base`; a percent value yields `value * base / 100`.
    pub fn resolve(&self, base: f32) -> f32 {
        match *self {
            UnitValue::Point(v) => v,
            UnitValue::Percent(v) => v * base / 100.0,
        }
    }

    /// A copy with the same unit and a new magnitude.
    pub fn with_value(&self, value: f32) -> Self {
        match self {
            UnitValue::Point(_) => UnitValue::Point(value),
            UnitValue::Percent(_) => UnitValue::Percent(value),
        }
    }
}

impl From<f32> for UnitValue {
    fn from(value: f32) -> Self {
        UnitValue::Point(value)
    }
}
