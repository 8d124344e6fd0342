//! CSS-like transform lists.
use crate::unit::UnitValue;
use serde::{Deserialize, Serialize};
use vellum_types::AffineTransform;

/// One `matrix(a, b, c, d, tx, ty)` step. The translation may be given in
/// percent of the transformed box.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SingleTransform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: UnitValue,
    pub ty: UnitValue,
}

impl SingleTransform {
    pub fn new(a: f32, b: f32, c: f32, d: f32, tx: UnitValue, ty: UnitValue) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub fn translate(tx: UnitValue, ty: UnitValue) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn rotate(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, sin, -sin, cos, UnitValue::Point(0.0), UnitValue::Point(0.0))
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, UnitValue::Point(0.0), UnitValue::Point(0.0))
    }
}

/// Transform steps, applied in list order.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Transform {
    pub steps: Vec<SingleTransform>,
}

impl Transform {
    pub fn new(steps: Vec<SingleTransform>) -> Self {
        Self { steps }
    }

    pub fn single(step: SingleTransform) -> Self {
        Self { steps: vec![step] }
    }

    /// Folds the list into one affine matrix, resolving percent translations
    /// against the box size.
    pub fn to_affine(&self, width: f32, height: f32) -> AffineTransform {
        let mut result = AffineTransform::identity();
        for step in &self.steps {
            let t = AffineTransform::new(
                step.a as f64,
                step.b as f64,
                step.c as f64,
                step.d as f64,
                step.tx.resolve(width) as f64,
                step.ty.resolve(height) as f64,
            );
            result.concatenate(&t);
        }
        result
    }
}
