use crate::interface::{LayoutContext, LayoutResult};
use crate::renderer::{LayoutArea, RendererContent, RendererId, RendererTree};
use crate::LayoutError;
use vellum_types::Rectangle;

impl RendererTree {
    /// Size of the image at 72 dpi, or `None` when the renderer carries no
    /// image data.
    pub(crate) fn image_natural_size(&self, id: RendererId) -> Option<(f32, f32)> {
        match self.node(id).content() {
            RendererContent::Image(image) => Some((image.width_pt(), image.height_pt())),
            _ => None,
        }
    }

    /// Places the image at the top-left of the area. A missing dimension
    /// follows the other one at the image's aspect ratio. Images never
    /// split: one that does not fit is pushed to the next area whole.
    pub(crate) fn layout_image(&mut self, id: RendererId, ctx: &LayoutContext) -> Result<LayoutResult, LayoutError> {
        let Some((natural_width, natural_height)) = self.image_natural_size(id) else {
            return Err(LayoutError::Generic(format!("image renderer {id} carries no image data")));
        };
        let area = ctx.area.bbox;
        self.override_height_properties(id);

        let width = self.retrieve_width(id, area.width);
        let height = self.retrieve_height(id);
        let (width, mut height) = match (width, height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if natural_width > 0.0 => (w, natural_height * w / natural_width),
            (None, Some(h)) if natural_height > 0.0 => (natural_width * h / natural_height, h),
            (Some(w), None) => (w, natural_height),
            (None, Some(h)) => (natural_width, h),
            (None, None) => (natural_width, natural_height),
        };
        if let Some(max_height) = self.retrieve_max_height(id) {
            height = height.min(max_height);
        }
        if let Some(min_height) = self.retrieve_min_height(id) {
            height = height.max(min_height);
        }

        let mut bbox = Rectangle::new(area.x, area.top() - height, width, height);
        self.apply_paddings(id, &mut bbox, true);
        self.apply_border_box(id, &mut bbox, true);
        self.apply_margins(id, &mut bbox, true);
        let (dx, dy) = (area.x - bbox.x, bbox.top() - area.top());
        bbox.move_right(dx).move_down(dy);
        self.node_mut(id).occupied_area = Some(LayoutArea::new(ctx.area.page_number, bbox));

        if self.is_not_fitting_height(id, &ctx.area) || self.is_not_fitting_width(id, &ctx.area) {
            return Ok(LayoutResult::nothing(id, id));
        }
        self.apply_absolute_position_if_needed(id, ctx);
        let area = self.node(id).occupied_area.ok_or(LayoutError::MissingOccupiedArea(id))?;
        Ok(LayoutResult::full(area, id))
    }
}
