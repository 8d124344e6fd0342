//! Text-space math: a 3x3 row-vector matrix, homogeneous vectors and line
//! segments, as used when reconstructing glyph positions from a content
//! stream.

use crate::geometry::Rectangle;
use std::ops::{Index, Mul};

/// A 3x3 matrix stored row-major. Vectors are multiplied from the left,
/// so `a.multiply(&b)` applies `a` first and then `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    vals: [f32; 9],
}

impl Matrix {
    pub const I11: usize = 0;
    pub const I12: usize = 1;
    pub const I13: usize = 2;
    pub const I21: usize = 3;
    pub const I22: usize = 4;
    pub const I23: usize = 5;
    pub const I31: usize = 6;
    pub const I32: usize = 7;
    pub const I33: usize = 8;

    pub fn identity() -> Self {
        Self { vals: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] }
    }

    /// Builds the matrix of a PDF `[a b c d e f]` operand.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { vals: [a, b, 0.0, c, d, 0.0, e, f, 1.0] }
    }

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn get(&self, index: usize) -> f32 {
        self.vals[index]
    }

    pub fn multiply(&self, by: &Matrix) -> Matrix {
        let a = &self.vals;
        let b = &by.vals;
        let mut rslt = [0f32; 9];
        for row in 0..3 {
            for col in 0..3 {
                rslt[row * 3 + col] = a[row * 3] * b[col]
                    + a[row * 3 + 1] * b[3 + col]
                    + a[row * 3 + 2] * b[6 + col];
            }
        }
        Matrix { vals: rslt }
    }

    pub fn determinant(&self) -> f32 {
        let v = &self.vals;
        v[0] * v[4] * v[8] + v[1] * v[5] * v[6] + v[2] * v[3] * v[7]
            - v[0] * v[5] * v[7]
            - v[1] * v[3] * v[8]
            - v[2] * v[4] * v[6]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Index<usize> for Matrix {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.vals[index]
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        self.multiply(&rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Homogeneous point `(x, y, 1)`.
    pub fn point(x: f32, y: f32) -> Self {
        Self::new(x, y, 1.0)
    }

    /// Row vector times matrix.
    pub fn cross(&self, m: &Matrix) -> Vector {
        Vector::new(
            self.x * m[Matrix::I11] + self.y * m[Matrix::I21] + self.z * m[Matrix::I31],
            self.x * m[Matrix::I12] + self.y * m[Matrix::I22] + self.z * m[Matrix::I32],
            self.x * m[Matrix::I13] + self.y * m[Matrix::I23] + self.z * m[Matrix::I33],
        )
    }

    pub fn subtract(&self, other: &Vector) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Vector,
    pub end: Vector,
}

impl LineSegment {
    pub fn new(start: Vector, end: Vector) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        self.end.subtract(&self.start).length()
    }

    pub fn transform_by(&self, m: &Matrix) -> LineSegment {
        LineSegment::new(self.start.cross(m), self.end.cross(m))
    }

    pub fn bounding_rectangle(&self) -> Rectangle {
        let x = self.start.x.min(self.end.x);
        let y = self.start.y.min(self.end.y);
        Rectangle::new(
            x,
            y,
            (self.start.x - self.end.x).abs(),
            (self.start.y - self.end.y).abs(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_applies_left_operand_first() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translation(10.0, 5.0);
        let p = Vector::point(1.0, 1.0).cross(&scale.multiply(&shift));
        assert_eq!(p, Vector::point(12.0, 7.0));
        let p = Vector::point(1.0, 1.0).cross(&shift.multiply(&scale));
        assert_eq!(p, Vector::point(22.0, 12.0));
    }

    #[test]
    fn segment_length_follows_transform() {
        let seg = LineSegment::new(Vector::point(0.0, 0.0), Vector::point(3.0, 0.0));
        let m = Matrix::new(0.0, 2.0, -2.0, 0.0, 1.0, 1.0);
        let moved = seg.transform_by(&m);
        assert!((moved.length() - 6.0).abs() < 1e-5);
        assert_eq!(moved.start, Vector::point(1.0, 1.0));
    }
}
