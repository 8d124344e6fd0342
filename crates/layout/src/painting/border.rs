//! Drawing one border side.
//!
//! A side runs from `(x1, y1)` to `(x2, y2)` along the border box, clockwise
//! around it. The border grows outward from that line; `before` and `after`
//! are the widths of the adjacent sides, used to mitre the corners.
use lopdf::ObjectId;
use vellum_kernel::PdfCanvas;
use vellum_style::{Border, BorderStyle, Side};

/// Direction of travel along a side, and the outward normal.
fn side_vectors(side: Side) -> ((f32, f32), (f32, f32)) {
    match side {
        Side::Top => ((1.0, 0.0), (0.0, 1.0)),
        Side::Right => ((0.0, -1.0), (1.0, 0.0)),
        Side::Bottom => ((-1.0, 0.0), (0.0, -1.0)),
        Side::Left => ((0.0, 1.0), (-1.0, 0.0)),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SideGeometry {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub side: Side,
    pub before: f32,
    pub after: f32,
}

impl SideGeometry {
    /// The line at `depth` (as a fraction of `width`) outside the border box,
    /// stretched by the same fraction of the adjacent widths.
    fn offset_line(&self, width: f32, depth: f32) -> [(f32, f32); 2] {
        let ((tx, ty), (nx, ny)) = side_vectors(self.side);
        let out = width * depth;
        let start = (
            self.x1 - tx * self.before * depth + nx * out,
            self.y1 - ty * self.before * depth + ny * out,
        );
        let end = (
            self.x2 + tx * self.after * depth + nx * out,
            self.y2 + ty * self.after * depth + ny * out,
        );
        [start, end]
    }

    /// Fills the band between two depths as a quadrilateral.
    fn fill_band(&self, canvas: &mut PdfCanvas, width: f32, from: f32, to: f32) {
        let [inner_start, inner_end] = self.offset_line(width, from);
        let [outer_start, outer_end] = self.offset_line(width, to);
        canvas
            .move_to(inner_start.0, inner_start.1)
            .line_to(inner_end.0, inner_end.1)
            .line_to(outer_end.0, outer_end.1)
            .line_to(outer_start.0, outer_start.1)
            .line_to(inner_start.0, inner_start.1)
            .fill();
    }
}

/// Draws a side with square corners.
pub fn draw_border_side(canvas: &mut PdfCanvas, border: &Border, geometry: &SideGeometry, gstate: Option<ObjectId>) {
    canvas.save_state();
    if let Some(gstate) = gstate {
        canvas.set_ext_gstate(gstate);
    }
    match border.style {
        BorderStyle::Solid => {
            canvas.set_fill_color(&border.color);
            geometry.fill_band(canvas, border.width, 0.0, 1.0);
        }
        BorderStyle::Double => {
            canvas.set_fill_color(&border.color);
            geometry.fill_band(canvas, border.width, 0.0, 1.0 / 3.0);
            geometry.fill_band(canvas, border.width, 2.0 / 3.0, 1.0);
        }
        BorderStyle::Dashed | BorderStyle::Dotted => {
            stroke_center_line(canvas, border, geometry);
        }
    }
    canvas.restore_state();
}

/// Draws a side of a rounded box. The caller has clipped to the border band,
/// so stroking the full-length centre line leaves exactly the rounded ring.
pub fn draw_rounded_border_side(
    canvas: &mut PdfCanvas,
    border: &Border,
    geometry: &SideGeometry,
    gstate: Option<ObjectId>,
) {
    canvas.save_state();
    if let Some(gstate) = gstate {
        canvas.set_ext_gstate(gstate);
    }
    let widened = SideGeometry { before: geometry.before.max(border.width), after: geometry.after.max(border.width), ..*geometry };
    stroke_center_line(canvas, border, &widened);
    canvas.restore_state();
}

fn stroke_center_line(canvas: &mut PdfCanvas, border: &Border, geometry: &SideGeometry) {
    let [start, end] = geometry.offset_line(border.width, 0.5);
    canvas.set_stroke_color(&border.color).set_line_width(border.width);
    let dash = border.dash_pattern();
    if !dash.is_empty() {
        if border.style == BorderStyle::Dotted {
            canvas.set_line_cap(1);
        }
        canvas.set_line_dash(&dash, 0.0);
    }
    canvas.move_to(start.0, start.1).line_to(end.0, end.1).stroke();
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Object;
    use vellum_types::Color;

    fn points(canvas: &PdfCanvas, operator: &str) -> Vec<(Object, Object)> {
        canvas
            .operations()
            .iter()
            .filter(|op| op.operator == operator)
            .map(|op| (op.operands[0].clone(), op.operands[1].clone()))
            .collect()
    }

    #[test]
    fn solid_top_side_extends_outward_over_the_corners() {
        let mut canvas = PdfCanvas::new();
        let geometry = SideGeometry { x1: 0.0, y1: 50.0, x2: 100.0, y2: 50.0, side: Side::Top, before: 1.0, after: 3.0 };
        draw_border_side(&mut canvas, &Border::solid(2.0, Color::BLACK), &geometry, None);

        let lines = points(&canvas, "l");
        assert_eq!(lines[0], (Object::Real(100.0), Object::Real(50.0)));
        assert_eq!(lines[1], (Object::Real(103.0), Object::Real(52.0)));
        assert_eq!(lines[2], (Object::Real(-1.0), Object::Real(52.0)));
    }

    #[test]
    fn right_side_grows_to_the_right() {
        let mut canvas = PdfCanvas::new();
        let geometry = SideGeometry { x1: 100.0, y1: 50.0, x2: 100.0, y2: 0.0, side: Side::Right, before: 2.0, after: 4.0 };
        draw_border_side(&mut canvas, &Border::solid(1.0, Color::BLACK), &geometry, None);

        let lines = points(&canvas, "l");
        assert_eq!(lines[1], (Object::Real(101.0), Object::Real(-4.0)));
        assert_eq!(lines[2], (Object::Real(101.0), Object::Real(52.0)));
    }

    #[test]
    fn dashed_side_is_stroked_with_a_dash_array() {
        let mut canvas = PdfCanvas::new();
        let geometry = SideGeometry { x1: 0.0, y1: 0.0, x2: 10.0, y2: 0.0, side: Side::Top, before: 0.0, after: 0.0 };
        draw_border_side(&mut canvas, &Border::new(2.0, BorderStyle::Dashed, Color::BLACK), &geometry, None);
        let ops: Vec<&str> = canvas.operations().iter().map(|op| op.operator.as_str()).collect();
        assert!(ops.contains(&"d"));
        assert!(ops.contains(&"S"));
        assert!(!ops.contains(&"f"));
    }
}
