//! Rectangles, points and affine transforms in PDF user space.
//!
//! `Rectangle` is mutable in place: the `move_*`, `set_*` and
//! `apply_margins` methods return `&mut Self` so calls can be chained.
//! Clone before mutating a rectangle that is shared with someone else.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Tolerance used by [`Rectangle::equals_with_epsilon`].
pub const EPS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Hash for Rectangle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
        self.width.to_bits().hash(state);
        self.height.to_bits().hash(state);
    }
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// A rectangle anchored at the origin.
    pub fn with_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn set_x(&mut self, x: f32) -> &mut Self {
        self.x = x;
        self
    }

    pub fn set_y(&mut self, y: f32) -> &mut Self {
        self.y = y;
        self
    }

    pub fn set_width(&mut self, width: f32) -> &mut Self {
        self.width = width;
        self
    }

    pub fn set_height(&mut self, height: f32) -> &mut Self {
        self.height = height;
        self
    }

    pub fn move_right(&mut self, dx: f32) -> &mut Self {
        self.x += dx;
        self
    }

    pub fn move_left(&mut self, dx: f32) -> &mut Self {
        self.x -= dx;
        self
    }

    pub fn move_up(&mut self, dy: f32) -> &mut Self {
        self.y += dy;
        self
    }

    pub fn move_down(&mut self, dy: f32) -> &mut Self {
        self.y -= dy;
        self
    }

    /// Grows the rectangle upwards, keeping the bottom edge in place.
    pub fn increase_height(&mut self, dh: f32) -> &mut Self {
        self.height += dh;
        self
    }

    /// Shrinks the rectangle from the top, keeping the bottom edge in place.
    pub fn decrease_height(&mut self, dh: f32) -> &mut Self {
        self.height -= dh;
        self
    }

    /// Shrinks (or, when `reverse` is set, grows) the rectangle by per-side
    /// offsets. Used identically for margins, border widths and paddings.
    pub fn apply_margins(
        &mut self,
        top: f32,
        right: f32,
        bottom: f32,
        left: f32,
        reverse: bool,
    ) -> &mut Self {
        let sign = if reverse { -1.0 } else { 1.0 };
        self.x += left * sign;
        self.width -= (left + right) * sign;
        self.y += bottom * sign;
        self.height -= (top + bottom) * sign;
        self
    }

    /// Same as [`Rectangle::apply_margins`] with a `[top, right, bottom, left]` array.
    pub fn apply_sides(&mut self, sides: [f32; 4], reverse: bool) -> &mut Self {
        self.apply_margins(sides[0], sides[1], sides[2], sides[3], reverse)
    }

    pub fn contains(&self, other: &Rectangle) -> bool {
        self.left() <= other.left() + EPS
            && self.right() + EPS >= other.right()
            && self.bottom() <= other.bottom() + EPS
            && self.top() + EPS >= other.top()
    }

    pub fn overlaps(&self, other: &Rectangle) -> bool {
        !(self.left() >= other.right()
            || self.right() <= other.left()
            || self.bottom() >= other.top()
            || self.top() <= other.bottom())
    }

    pub fn equals_with_epsilon(&self, other: &Rectangle) -> bool {
        (self.x - other.x).abs() < EPS
            && (self.y - other.y).abs() < EPS
            && (self.width - other.width).abs() < EPS
            && (self.height - other.height).abs() < EPS
    }

    /// Corner points in counter-clockwise order, starting bottom-left.
    pub fn to_points(&self) -> [Point; 4] {
        let (l, b, r, t) = (
            self.left() as f64,
            self.bottom() as f64,
            self.right() as f64,
            self.top() as f64,
        );
        [Point::new(l, b), Point::new(r, b), Point::new(r, t), Point::new(l, t)]
    }

    /// Smallest axis-aligned rectangle enclosing all `points`.
    pub fn bbox_of(points: &[Point]) -> Option<Rectangle> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rectangle::new(
            min_x as f32,
            min_y as f32,
            (max_x - min_x) as f32,
            (max_y - min_y) as f32,
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A 2D affine transform `[m00 m10 m01 m11 m02 m12]`, the same layout as a
/// PDF `cm` operand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m11: f64,
    pub m02: f64,
    pub m12: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub fn new(m00: f64, m10: f64, m01: f64, m11: f64, m02: f64, m12: f64) -> Self {
        Self { m00, m10, m01, m11, m02, m12 }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translate_instance(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale_instance(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Counter-clockwise rotation by `theta` radians.
    pub fn rotate_instance(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// `self = self × other`: `other` is applied first.
    pub fn concatenate(&mut self, other: &AffineTransform) -> &mut Self {
        let m00 = self.m00 * other.m00 + self.m01 * other.m10;
        let m01 = self.m00 * other.m01 + self.m01 * other.m11;
        let m02 = self.m00 * other.m02 + self.m01 * other.m12 + self.m02;
        let m10 = self.m10 * other.m00 + self.m11 * other.m10;
        let m11 = self.m10 * other.m01 + self.m11 * other.m11;
        let m12 = self.m10 * other.m02 + self.m11 * other.m12 + self.m12;
        *self = Self::new(m00, m10, m01, m11, m02, m12);
        self
    }

    /// `self = other × self`: `other` is applied last.
    pub fn pre_concatenate(&mut self, other: &AffineTransform) -> &mut Self {
        let mut result = *other;
        result.concatenate(self);
        *self = result;
        self
    }

    pub fn translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        self.concatenate(&Self::translate_instance(tx, ty))
    }

    pub fn rotate(&mut self, theta: f64) -> &mut Self {
        self.concatenate(&Self::rotate_instance(theta))
    }

    pub fn transform(&self, p: Point) -> Point {
        Point::new(
            p.x * self.m00 + p.y * self.m01 + self.m02,
            p.x * self.m10 + p.y * self.m11 + self.m12,
        )
    }

    pub fn transform_all(&self, points: &mut [Point]) {
        for p in points.iter_mut() {
            *p = self.transform(*p);
        }
    }

    /// The six `cm` operands.
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.m00 as f32,
            self.m10 as f32,
            self.m01 as f32,
            self.m11 as f32,
            self.m02 as f32,
            self.m12 as f32,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_margins_round_trips() {
        let original = Rectangle::new(10.0, 20.0, 200.0, 100.0);
        let mut rect = original;
        rect.apply_margins(5.0, 7.5, 3.0, 1.25, false);
        assert_eq!(rect.x, 11.25);
        assert_eq!(rect.y, 23.0);
        assert_eq!(rect.width, 191.25);
        assert_eq!(rect.height, 92.0);
        rect.apply_margins(5.0, 7.5, 3.0, 1.25, true);
        assert!(rect.equals_with_epsilon(&original));
    }

    #[test]
    fn bbox_of_rotated_square() {
        let rect = Rectangle::new(-1.0, -1.0, 2.0, 2.0);
        let mut points = rect.to_points();
        AffineTransform::rotate_instance(std::f64::consts::FRAC_PI_4).transform_all(&mut points);
        let bbox = Rectangle::bbox_of(&points).unwrap();
        let half_diag = 2f32.sqrt();
        assert!((bbox.width - 2.0 * half_diag).abs() < 1e-4);
        assert!((bbox.x + half_diag).abs() < 1e-4);
    }

    #[test]
    fn concatenate_applies_argument_first() {
        let mut t = AffineTransform::translate_instance(10.0, 0.0);
        t.concatenate(&AffineTransform::scale_instance(2.0, 2.0));
        let p = t.transform(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(12.0, 2.0));

        let mut t = AffineTransform::translate_instance(10.0, 0.0);
        t.pre_concatenate(&AffineTransform::scale_instance(2.0, 2.0));
        let p = t.transform(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(22.0, 2.0));
    }
}
