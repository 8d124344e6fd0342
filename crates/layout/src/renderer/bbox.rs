//! Page-space geometry of renderers under rotated or transformed ancestors.
use super::{RendererId, RendererTree};
use crate::property::Property;
use crate::LayoutError;
use vellum_types::{AffineTransform, Point, Rectangle};

impl RendererTree {
    /// The occupied area of `id` as it ends up on the page, after every
    /// rotation and transform on the way to the root. The root itself is
    /// never transformed.
    pub fn calculate_absolute_pdf_bbox(&self, id: RendererId) -> Result<Rectangle, LayoutError> {
        let mut points = self.occupied_area_bbox(id)?.to_points();
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            let kind = self.nodes[current].kind;
            if kind.is_block() {
                if let Some(rotation) = self.create_rotation_transform_inside_occupied_area(current)? {
                    rotation.transform_all(&mut points);
                }
            }
            if kind.is_transformable() {
                if let Some(transform) = self.create_transformation_inside_occupied_area(current)? {
                    transform.transform_all(&mut points);
                }
            }
            current = parent;
        }
        Rectangle::bbox_of(&points).ok_or(LayoutError::MissingOccupiedArea(id))
    }

    /// Rotation about the origin, shifted so the rotated box's top-left
    /// corner sits on the occupied area's top-left corner.
    pub fn create_rotation_transform_inside_occupied_area(
        &self,
        id: RendererId,
    ) -> Result<Option<AffineTransform>, LayoutError> {
        let Some(angle) = self.property_as_float(id, Property::RotationAngle) else {
            return Ok(None);
        };
        let bbox = self.occupied_area_bbox(id)?;
        let mut transform = AffineTransform::rotate_instance(angle as f64);
        let mut rotated = bbox.to_points();
        transform.transform_all(&mut rotated);
        let (dx, dy) = calculate_shift_to_position_bbox_of_points_at(bbox.left(), bbox.top(), &rotated);
        transform.pre_concatenate(&AffineTransform::translate_instance(dx as f64, dy as f64));
        Ok(Some(transform))
    }

    /// The transform property applied about the centre of the margin box.
    pub fn create_transformation_inside_occupied_area(
        &self,
        id: RendererId,
    ) -> Result<Option<AffineTransform>, LayoutError> {
        let Some(transform) = self.property_as_transform(id) else {
            return Ok(None);
        };
        let mut area = self.occupied_area_bbox(id)?;
        self.apply_margins(id, &mut area, false);
        let cx = (area.x + area.width / 2.0) as f64;
        let cy = (area.y + area.height / 2.0) as f64;

        let mut result = AffineTransform::translate_instance(-cx, -cy);
        result.pre_concatenate(&transform.to_affine(area.width, area.height));
        result.pre_concatenate(&AffineTransform::translate_instance(cx, cy));
        Ok(Some(result))
    }
}

/// Offset that moves the bounding box of `points` so its top-left corner
/// lands on `(left, top)`.
pub fn calculate_shift_to_position_bbox_of_points_at(left: f32, top: f32, points: &[Point]) -> (f32, f32) {
    let min_x = points.iter().map(|p| p.x).fold(f64::MAX, f64::min);
    let max_y = points.iter().map(|p| p.y).fold(f64::MIN, f64::max);
    ((left as f64 - min_x) as f32, (top as f64 - max_y) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementPropertyContainer};
    use crate::test_utils::*;
    use std::f32::consts::FRAC_PI_2;
    use vellum_style::{SingleTransform, Transform, UnitValue};

    #[test]
    fn child_of_a_rotated_block_turns_with_it() {
        let element = Element::div().set_rotation_angle(FRAC_PI_2).add(Element::div().set_height(10.0));
        let (mut tree, _, id) = tree_with(element);
        layout_in(&mut tree, id, page_area()).unwrap();
        let child = tree.node(id).children()[0];
        assert_eq!(bbox(&tree, child), Rectangle::new(0.0, 590.0, 400.0, 10.0));

        // a quarter turn stands the 400x10 strip on end, top-left corner kept
        let absolute = tree.calculate_absolute_pdf_bbox(child).unwrap();
        assert_close(absolute.x, 0.0);
        assert_close(absolute.y, 200.0);
        assert_close(absolute.width, 10.0);
        assert_close(absolute.height, 400.0);
    }

    #[test]
    fn child_of_a_transformed_block_follows_the_transform() {
        let transform = Transform::single(SingleTransform::translate(UnitValue::Point(15.0), UnitValue::Point(-5.0)));
        let element = Element::div()
            .set_transform(transform)
            .add(Element::div().set_width(UnitValue::Point(100.0)).set_height(10.0));
        let (mut tree, _, id) = tree_with(element);
        layout_in(&mut tree, id, page_area()).unwrap();
        let child = tree.node(id).children()[0];

        let absolute = tree.calculate_absolute_pdf_bbox(child).unwrap();
        assert_close(absolute.x, 15.0);
        assert_close(absolute.y, 585.0);
        assert_close(absolute.width, 100.0);
        assert_close(absolute.height, 10.0);
    }

    #[test]
    fn shift_aligns_top_left_corner() {
        let points = [Point::new(-5.0, 2.0), Point::new(3.0, 8.0), Point::new(1.0, -4.0)];
        let (dx, dy) = calculate_shift_to_position_bbox_of_points_at(10.0, 20.0, &points);
        assert_eq!((dx, dy), (15.0, 12.0));
    }
}
