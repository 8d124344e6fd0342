pub mod color;
pub mod geometry;
pub mod matrix;

pub use color::{Color, TransparentColor};
pub use geometry::{AffineTransform, Point, Rectangle};
pub use matrix::{LineSegment, Matrix, Vector};
