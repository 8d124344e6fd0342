//! Backgrounds and rounded-corner clipping for a renderer's box.
//!
//! These functions are stateless: they only append operators to the canvas.
//! Resolving properties and allocating resources is left to the caller.
use lopdf::ObjectId;
use vellum_kernel::PdfCanvas;
use vellum_style::Background;
use vellum_types::Rectangle;

/// Corner geometry of a rounded box. Each radius is clamped to half the
/// matching box dimension so opposite corners never overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedCorners {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
    pub vertical_radius: f32,
    pub horizontal_radius: f32,
}

impl RoundedCorners {
    pub fn new(outer: &Rectangle, radius: f32) -> Self {
        Self {
            top: outer.top(),
            right: outer.right(),
            bottom: outer.bottom(),
            left: outer.left(),
            vertical_radius: (outer.height / 2.0).min(radius),
            horizontal_radius: (outer.width / 2.0).min(radius),
        }
    }

    /// Inner ends of the four corner arcs, clockwise from top-right:
    /// `(x1, y1)` top-right, `(x2, y2)` bottom-right, `(x3, y3)`
    /// bottom-left, `(x4, y4)` top-left.
    fn arc_points(&self) -> [(f32, f32); 4] {
        let (hr, vr) = (self.horizontal_radius, self.vertical_radius);
        [
            (self.right - hr, self.top - vr),
            (self.right - hr, self.bottom + vr),
            (self.left + hr, self.bottom + vr),
            (self.left + hr, self.top - vr),
        ]
    }
}

/// Saves the graphics state and intersects the clip with the rounded box,
/// one corner at a time. The caller restores the state.
pub fn clip_rounded_box(canvas: &mut PdfCanvas, corners: &RoundedCorners, curvature: f32) {
    let RoundedCorners { top, right, bottom, left, vertical_radius: vr, horizontal_radius: hr } = *corners;
    let [(x1, y1), (x2, y2), (x3, y3), (x4, y4)] = corners.arc_points();
    let curv = curvature;

    canvas.save_state();

    // right top corner
    canvas
        .move_to(left, top)
        .line_to(x1, top)
        .curve_to(x1 + hr * curv, top, right, y1 + vr * curv, right, y1)
        .line_to(right, bottom)
        .line_to(left, bottom)
        .line_to(left, top)
        .clip();

    // right bottom corner
    canvas
        .move_to(right, top)
        .line_to(right, y2)
        .curve_to(right, y2 - vr * curv, x2 + hr * curv, bottom, x2, bottom)
        .line_to(left, bottom)
        .line_to(left, top)
        .line_to(right, top)
        .clip();

    // left bottom corner
    canvas
        .move_to(right, bottom)
        .line_to(x3, bottom)
        .curve_to(x3 - hr * curv, bottom, left, y3 - vr * curv, left, y3)
        .line_to(left, top)
        .line_to(right, top)
        .line_to(right, bottom)
        .clip();

    // left top corner
    canvas
        .move_to(left, bottom)
        .line_to(left, y4)
        .curve_to(left, y4 + vr * curv, x4 - hr * curv, top, x4, top)
        .line_to(right, top)
        .line_to(right, bottom)
        .line_to(left, bottom)
        .clip();
}

/// Further clips a rounded box to the band its borders occupy. The inner
/// corner arcs shrink by the border widths, `[top, right, bottom, left]`.
/// Must follow [`clip_rounded_box`] on the same corners.
pub fn clip_border_band(canvas: &mut PdfCanvas, corners: &RoundedCorners, widths: [f32; 4], curvature: f32) {
    let RoundedCorners { mut top, mut right, mut bottom, mut left, vertical_radius, horizontal_radius } = *corners;
    let [(mut x1, mut y1), (mut x2, y2), (mut x3, y3), (mut x4, mut y4)] = corners.arc_points();
    let [top_width, right_width, bottom_width, left_width] = widths;
    let curv = curvature;

    let mut radius_top = vertical_radius;
    let mut radius_right = horizontal_radius;
    let mut radius_bottom = vertical_radius;
    let mut radius_left = horizontal_radius;

    if top_width > 0.0 {
        top -= top_width;
        if y1 > top {
            y1 = top;
            y4 = top;
        }
        radius_top = (radius_top - top_width).max(0.0);
    }
    if right_width > 0.0 {
        right -= right_width;
        if x1 > right {
            x1 = right;
            x2 = right;
        }
        radius_right = (radius_right - right_width).max(0.0);
    }
    if bottom_width > 0.0 {
        bottom += bottom_width;
        if x3 < left {
            x3 = left;
            x4 = left;
        }
        radius_bottom = (radius_bottom - bottom_width).max(0.0);
    }
    if left_width > 0.0 {
        left += left_width;
        radius_left = (radius_left - left_width).max(0.0);
    }

    let outer_top = top + top_width;
    let outer_right = right + right_width;
    let outer_bottom = bottom - bottom_width;
    let outer_left = left - left_width;

    let r = radius_top.min(radius_right) * curv;
    canvas
        .move_to(x1, top)
        .curve_to(x1 + r, top, right, y1 + r, right, y1)
        .line_to(right, y2)
        .line_to(x3, y2)
        .line_to(x3, top)
        .line_to(x1, top)
        .line_to(x1, outer_top)
        .line_to(outer_left, outer_top)
        .line_to(outer_left, outer_bottom)
        .line_to(outer_right, outer_bottom)
        .line_to(outer_right, outer_top)
        .line_to(x1, outer_top)
        .clip();

    let r = radius_right.min(radius_bottom) * curv;
    canvas
        .move_to(right, y2)
        .curve_to(right, y2 - r, x2 + r, bottom, x2, bottom)
        .line_to(x3, bottom)
        .line_to(x3, y4)
        .line_to(right, y4)
        .line_to(right, y2)
        .line_to(outer_right, y2)
        .line_to(outer_right, outer_top)
        .line_to(outer_left, outer_top)
        .line_to(outer_left, outer_bottom)
        .line_to(outer_right, outer_bottom)
        .line_to(outer_right, y2)
        .clip();

    let r = radius_bottom.min(radius_left) * curv;
    canvas
        .move_to(x3, bottom)
        .curve_to(x3 - r, bottom, left, y3 - r, left, y3)
        .line_to(left, y4)
        .line_to(x1, y4)
        .line_to(x1, bottom)
        .line_to(x3, bottom)
        .line_to(x3, outer_bottom)
        .line_to(outer_right, outer_bottom)
        .line_to(outer_right, outer_top)
        .line_to(outer_left, outer_top)
        .line_to(outer_left, outer_bottom)
        .line_to(x3, outer_bottom)
        .clip();

    let r = radius_left.min(radius_top) * curv;
    canvas
        .move_to(left, y4)
        .curve_to(left, y4 + r, x4 - r, top, x4, top)
        .line_to(x1, top)
        .line_to(x1, y2)
        .line_to(left, y2)
        .line_to(left, y4)
        .line_to(outer_left, y4)
        .line_to(outer_left, outer_bottom)
        .line_to(outer_right, outer_bottom)
        .line_to(outer_right, outer_top)
        .line_to(outer_left, outer_top)
        .line_to(outer_left, y4)
        .clip();
}

/// Fills `area` grown by the background's extra offsets.
pub fn fill_background(canvas: &mut PdfCanvas, area: &Rectangle, background: &Background, gstate: Option<ObjectId>) {
    let fill_rect = Rectangle::new(
        area.x - background.extra_left,
        area.y - background.extra_bottom,
        area.width + background.extra_left + background.extra_right,
        area.height + background.extra_top + background.extra_bottom,
    );
    canvas.save_state().set_fill_color(&background.color);
    if let Some(gstate) = gstate {
        canvas.set_ext_gstate(gstate);
    }
    canvas.rectangle(&fill_rect).fill().restore_state();
}

/// Tiles an image XObject over `area`, clipped to it. The first tile hangs
/// from `origin` (its top-left corner). Repetition along an axis starts one
/// tile earlier so the pattern covers the area edge to edge.
pub fn tile_background_image(
    canvas: &mut PdfCanvas,
    xobject: ObjectId,
    tile: (f32, f32),
    origin: (f32, f32),
    area: &Rectangle,
    repeat_x: bool,
    repeat_y: bool,
) {
    let (width, height) = tile;
    let mut image_rect = Rectangle::new(origin.0, origin.1 - height, width, height);
    let initial_x = if repeat_x { image_rect.x - width } else { image_rect.x };
    let initial_y = if repeat_y { image_rect.top() } else { image_rect.y };

    canvas.save_state().rectangle(area).clip();
    image_rect.set_y(initial_y);
    loop {
        image_rect.set_x(initial_x);
        loop {
            canvas.add_xobject(xobject, &image_rect);
            image_rect.move_right(width);
            if !(repeat_x && image_rect.left() < area.right()) {
                break;
            }
        }
        image_rect.move_down(height);
        if !(repeat_y && image_rect.top() > area.bottom()) {
            break;
        }
    }
    canvas.restore_state();
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Object;

    fn operators(canvas: &PdfCanvas) -> Vec<&str> {
        canvas.operations().iter().map(|op| op.operator.as_str()).collect()
    }

    #[test]
    fn radius_is_clamped_to_half_the_box() {
        let corners = RoundedCorners::new(&Rectangle::new(0.0, 0.0, 100.0, 20.0), 50.0);
        assert_eq!(corners.vertical_radius, 10.0);
        assert_eq!(corners.horizontal_radius, 50.0);
    }

    #[test]
    fn rounded_clip_emits_one_curve_per_corner() {
        let mut canvas = PdfCanvas::new();
        let corners = RoundedCorners::new(&Rectangle::new(0.0, 0.0, 100.0, 20.0), 50.0);
        clip_rounded_box(&mut canvas, &corners, 0.4477);
        let ops = operators(&canvas);
        assert_eq!(ops.first(), Some(&"q"));
        assert_eq!(ops.iter().filter(|op| **op == "c").count(), 4);
        assert_eq!(ops.iter().filter(|op| **op == "W").count(), 4);

        // top-right arc ends on the right edge, 10pt below the top
        let curve = canvas.operations().iter().find(|op| op.operator == "c").map(|op| op.operands.clone());
        let end = curve.map(|operands| (operands[4].clone(), operands[5].clone()));
        assert_eq!(end, Some((Object::Real(100.0), Object::Real(10.0))));
    }

    #[test]
    fn non_repeating_image_is_drawn_once() {
        let mut canvas = PdfCanvas::new();
        let area = Rectangle::new(0.0, 0.0, 50.0, 50.0);
        tile_background_image(&mut canvas, (9, 0), (10.0, 10.0), (0.0, 50.0), &area, false, false);
        assert_eq!(operators(&canvas).iter().filter(|op| **op == "Do").count(), 1);
    }

    #[test]
    fn repeating_image_covers_the_area() {
        let mut canvas = PdfCanvas::new();
        let area = Rectangle::new(0.0, 0.0, 20.0, 20.0);
        tile_background_image(&mut canvas, (9, 0), (10.0, 10.0), (0.0, 20.0), &area, true, true);
        // x tiles start at -10: -10, 0, 10; y rows start at the top: 20, 10, 0
        assert_eq!(operators(&canvas).iter().filter(|op| **op == "Do").count(), 9);
    }
}
