//! The layout pass, one module per renderer kind.
//!
//! Every container runs the same frame: strip margins, borders and paddings
//! off the offered area, stack its content downwards, then grow the result
//! back out. Splitting produces two fresh copies of the renderer: the split
//! holds what fit, the overflow carries the rest to the next area.
mod block;
mod image;
mod paragraph;
mod table;

use crate::interface::{LayoutContext, LayoutResult, LayoutStatus, MinMaxWidth};
use crate::property::{Property, PropertyValue};
use crate::renderer::{LayoutArea, RendererId, RendererKind, RendererTree};
use crate::LayoutError;
use log::warn;
use vellum_types::Rectangle;

/// What [`RendererTree::begin_container_layout`] worked out about the
/// offered area.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContainerFrame {
    pub page: usize,
    /// The content box children are laid out in.
    pub content_box: Rectangle,
    /// A max height fits in the area, so anything beyond it is clipped
    /// rather than split.
    pub height_clipped: bool,
}

/// Smallest rectangle covering both.
pub(crate) fn common_rectangle(a: &Rectangle, b: &Rectangle) -> Rectangle {
    let x = a.left().min(b.left());
    let y = a.bottom().min(b.bottom());
    Rectangle::new(x, y, a.right().max(b.right()) - x, a.top().max(b.top()) - y)
}

impl RendererTree {
    /// Lays `id` out in the offered area.
    pub fn layout(&mut self, id: RendererId, ctx: &LayoutContext) -> Result<LayoutResult, LayoutError> {
        let result = match self.node(id).kind() {
            RendererKind::Block | RendererKind::Cell => self.layout_block(id, ctx)?,
            RendererKind::Paragraph => self.layout_paragraph(id, ctx)?,
            RendererKind::Image => self.layout_image(id, ctx)?,
            RendererKind::Table => self.layout_table(id, ctx)?,
            RendererKind::Text => {
                return Err(LayoutError::Generic(format!(
                    "text renderer {id} can only be laid out by its paragraph"
                )));
            }
            RendererKind::Root => {
                return Err(LayoutError::Generic(format!(
                    "root renderer {id} is laid out by pagination"
                )));
            }
        };

        if result.status == LayoutStatus::Partial && self.is_keep_together(id) && !self.is_first_on_root_area(id) {
            return Ok(LayoutResult::nothing(id, id));
        }
        Ok(result)
    }

    // --- Intrinsic widths ---

    pub fn min_max_width(&self, id: RendererId) -> MinMaxWidth {
        let additional = self.calculate_additional_width(id);
        if self.has_absolute_unit_value(id, Property::Width) {
            if let Some(width) = self.retrieve_width(id, 0.0) {
                return MinMaxWidth::new(width, width, additional);
            }
        }
        let (min, max) = match self.node(id).kind() {
            RendererKind::Text => self.text_min_max_width(id),
            RendererKind::Paragraph => self.paragraph_min_max_width(id),
            RendererKind::Image => {
                let width = self.image_natural_size(id).map_or(0.0, |(w, _)| w);
                (width, width)
            }
            RendererKind::Table => {
                let columns = self.table_columns(id) as f32;
                let (min, max) = self.children_min_max_width(id);
                (min * columns, max * columns)
            }
            _ => self.children_min_max_width(id),
        };
        MinMaxWidth::new(min, max, additional)
    }

    /// The widest of each bound over the normal-flow children.
    fn children_min_max_width(&self, id: RendererId) -> (f32, f32) {
        self.node(id).children().iter().fold((0.0f32, 0.0f32), |(min, max), child| {
            let child = self.min_max_width(*child);
            (min.max(child.min_width), max.max(child.max_width))
        })
    }

    // --- Fit checks ---

    pub fn is_not_fitting_height(&self, id: RendererId, area: &LayoutArea) -> bool {
        !self.is_positioned(id)
            && self
                .occupied_area_bbox(id)
                .is_ok_and(|bbox| bbox.height > area.bbox.height)
    }

    pub fn is_not_fitting_width(&self, id: RendererId, area: &LayoutArea) -> bool {
        !self.is_positioned(id)
            && self
                .occupied_area_bbox(id)
                .is_ok_and(|bbox| bbox.width > area.bbox.width)
    }

    // --- Container frame ---

    /// Resolves the box model against the offered area and resets the
    /// occupied area to a zero-height strip at the top of the content box.
    pub(crate) fn begin_container_layout(&mut self, id: RendererId, ctx: &LayoutContext) -> ContainerFrame {
        let page = ctx.area.page_number;
        let mut bbox = ctx.area.bbox;
        self.override_height_properties(id);
        let width = self.retrieve_width(id, bbox.width);

        self.apply_margins(id, &mut bbox, false);
        self.apply_border_box(id, &mut bbox, false);
        self.apply_paddings(id, &mut bbox, false);

        let mut height_clipped = false;
        if let Some(max_height) = self.retrieve_max_height(id) {
            if max_height <= bbox.height {
                height_clipped = true;
                let excess = bbox.height - max_height;
                bbox.move_up(excess).set_height(max_height);
            }
        }
        if let Some(width) = width {
            if width < bbox.width || self.is_positioned(id) {
                bbox.set_width(width);
            }
        }

        let node = self.node_mut(id);
        node.occupied_area = Some(LayoutArea::new(page, Rectangle::new(bbox.x, bbox.top(), bbox.width, 0.0)));
        node.y_line = None;
        let children = node.children.clone();
        for child in children {
            self.node_mut(child).parent = Some(id);
        }
        self.shrink_occupied_area_for_absolute_position(id);

        ContainerFrame { page, content_box: bbox, height_clipped }
    }

    /// Margins, borders and paddings alone overrun the offered area.
    pub(crate) fn box_edges_do_not_fit(&self, id: RendererId, frame: &ContainerFrame) -> bool {
        !self.is_positioned(id) && frame.content_box.height < -self.config().epsilon
    }

    /// Grows the occupied content box of `id` to cover `area`.
    pub(crate) fn extend_occupied_area(&mut self, id: RendererId, area: &Rectangle) {
        if let Some(occupied) = self.node_mut(id).occupied_area.as_mut() {
            occupied.bbox = common_rectangle(&occupied.bbox, area);
        }
    }

    /// Stores the placed content of a fragment: lines for paragraphs,
    /// children for everything else.
    fn set_laid_out_content(&mut self, id: RendererId, placed: Vec<RendererId>) {
        if self.node(id).kind() == RendererKind::Paragraph {
            for child in &placed {
                self.node_mut(*child).parent = Some(id);
            }
            self.node_mut(id).lines = placed;
        } else {
            self.set_children(id, placed);
        }
    }

    /// Everything fit. `placed` becomes the content of `id` itself.
    pub(crate) fn finish_full(
        &mut self,
        id: RendererId,
        frame: &ContainerFrame,
        ctx: &LayoutContext,
        placed: Vec<RendererId>,
    ) -> Result<LayoutResult, LayoutError> {
        let mut bbox = self.occupied_area_bbox(id)?;
        if let Some(min_height) = self.retrieve_min_height(id) {
            if min_height > bbox.height {
                let block_bottom = (bbox.bottom() - (min_height - bbox.height)).max(frame.content_box.bottom());
                let grow = bbox.bottom() - block_bottom;
                bbox.increase_height(grow).set_y(block_bottom);
                self.set_occupied_bbox(id, bbox);

                let remaining = min_height - bbox.height;
                if remaining > self.config().epsilon {
                    // the min height carries over to the next area
                    let split = self.create_split_renderer(id, placed);
                    let overflow = self.create_overflow_renderer(id, Vec::new());
                    self.set_occupied_bbox(split, bbox);
                    self.update_heights_on_split(id, bbox.height, false, split, Some(overflow));
                    let area = self.close_fragment(split, frame.page, ctx)?;
                    return Ok(LayoutResult::partial(area, split, overflow, None));
                }
            }
        }

        self.set_laid_out_content(id, placed);
        let area = self.close_fragment(id, frame.page, ctx)?;
        Ok(LayoutResult::full(area, id))
    }

    /// Content ran past a max height that fit in the area: keep what was
    /// placed, cut off at the max height, and report everything as placed.
    pub(crate) fn finish_clipped(
        &mut self,
        id: RendererId,
        frame: &ContainerFrame,
        ctx: &LayoutContext,
        placed: Vec<RendererId>,
    ) -> Result<LayoutResult, LayoutError> {
        warn!("Element content was clipped because some height properties are set.");
        let mut bbox = self.occupied_area_bbox(id)?;
        let top = bbox.top();
        bbox.set_height(frame.content_box.height).set_y(top - frame.content_box.height);
        self.set_occupied_bbox(id, bbox);
        self.set_laid_out_content(id, placed);
        let area = self.close_fragment(id, frame.page, ctx)?;
        Ok(LayoutResult::full(area, id))
    }

    /// Some content fit. `placed` goes to a new split fragment, `rest` to a
    /// new overflow renderer.
    pub(crate) fn finish_partial(
        &mut self,
        id: RendererId,
        frame: &ContainerFrame,
        ctx: &LayoutContext,
        placed: Vec<RendererId>,
        rest: Vec<RendererId>,
        cause: Option<RendererId>,
    ) -> Result<LayoutResult, LayoutError> {
        let bbox = self.occupied_area_bbox(id)?;
        let split = self.create_split_renderer(id, placed);
        let overflow = self.create_overflow_renderer(id, rest);
        self.set_occupied_bbox(split, bbox);
        self.update_heights_on_split(id, bbox.height, frame.height_clipped, split, Some(overflow));
        let area = self.close_fragment(split, frame.page, ctx)?;
        Ok(LayoutResult::partial(area, split, overflow, cause))
    }

    fn set_occupied_bbox(&mut self, id: RendererId, bbox: Rectangle) {
        let page = self.node(id).occupied_area.map_or(0, |area| area.page_number);
        self.node_mut(id).occupied_area = Some(LayoutArea::new(page, bbox));
    }

    /// Grows the content box of a finished fragment back out to its margin
    /// box, then applies absolute offsets and lays out positioned children.
    fn close_fragment(&mut self, id: RendererId, page: usize, ctx: &LayoutContext) -> Result<LayoutArea, LayoutError> {
        let mut bbox = self.occupied_area_bbox(id)?;
        self.apply_paddings(id, &mut bbox, true);
        self.apply_border_box(id, &mut bbox, true);
        self.apply_margins(id, &mut bbox, true);
        self.node_mut(id).occupied_area = Some(LayoutArea::new(page, bbox));

        self.apply_absolute_position_if_needed(id, ctx);
        self.layout_positioned_children(id)?;
        self.node(id).occupied_area.ok_or(LayoutError::MissingOccupiedArea(id))
    }

    // --- Splitting ---

    /// The part of `id` that fit. Never the last fragment of its element and
    /// never carries a bottom margin.
    pub fn create_split_renderer(&mut self, id: RendererId, placed: Vec<RendererId>) -> RendererId {
        let split = self.copy_renderer(id);
        self.set_laid_out_content(split, placed);
        let positioned = self.node(id).positioned.clone();
        for child in &positioned {
            self.node_mut(*child).parent = Some(split);
        }
        let node = self.node_mut(split);
        node.positioned = positioned;
        node.is_last_for_model = false;
        self.set_property(split, Property::MarginBottom, PropertyValue::Float(0.0));
        split
    }

    /// The rest of `id`, laid out again from scratch in the next area. Never
    /// carries a top margin.
    pub fn create_overflow_renderer(&mut self, id: RendererId, rest: Vec<RendererId>) -> RendererId {
        let overflow = self.copy_renderer(id);
        self.set_children(overflow, rest);
        self.set_property(overflow, Property::MarginTop, PropertyValue::Float(0.0));
        overflow
    }

    /// Distributes height constraints between the fragments of a split.
    /// `used` is the content height placed in this area. The overflow keeps
    /// what is left of each constraint; a clipped split is stretched to its
    /// max height.
    pub fn update_heights_on_split(
        &mut self,
        id: RendererId,
        used: f32,
        was_height_clipped: bool,
        split: RendererId,
        overflow: Option<RendererId>,
    ) {
        if let Some(overflow) = overflow {
            if let Some(max_height) = self.retrieve_max_height(id) {
                self.update_max_height(overflow, (max_height - used).max(0.0));
            }
            if let Some(min_height) = self.retrieve_min_height(id) {
                self.update_min_height(overflow, (min_height - used).max(0.0));
            }
            if let Some(height) = self.retrieve_height(id) {
                self.update_height(overflow, (height - used).max(0.0));
            }
        }

        if was_height_clipped {
            warn!("Element content was clipped because some height properties are set.");
            if let Some(max_height) = self.retrieve_max_height(id) {
                if let Some(area) = self.node_mut(split).occupied_area.as_mut() {
                    let grow = max_height - area.bbox.height;
                    area.bbox.move_down(grow).set_height(max_height);
                }
            }
        }
    }

    // --- Positioned renderers ---

    /// Moves an absolutely positioned renderer to its offsets within the
    /// containing block, or within the page area for a fixed one.
    pub fn apply_absolute_position_if_needed(&mut self, id: RendererId, ctx: &LayoutContext) {
        if self.is_absolute(id) || self.is_fixed(id) {
            let parent_rect = ctx.parent_occupied.unwrap_or(ctx.area.bbox);
            self.apply_absolute_position(id, parent_rect);
        }
    }

    /// Lays out the positioned children of a laid-out container against its
    /// padding box. The available height is effectively unbounded, so the
    /// result does not depend on where the container sits on the page.
    pub fn layout_positioned_children(&mut self, container: RendererId) -> Result<(), LayoutError> {
        let positioned = self.node(container).positioned.clone();
        if positioned.is_empty() {
            return Ok(());
        }
        let area = self.node(container).occupied_area.ok_or(LayoutError::MissingOccupiedArea(container))?;
        let mut parent_bbox = area.bbox;
        self.apply_margins(container, &mut parent_bbox, false);
        self.apply_border_box(container, &mut parent_bbox, false);

        let infinity = self.config().infinity;
        let mut placed = Vec::with_capacity(positioned.len());
        for child in positioned {
            self.node_mut(child).parent = Some(container);
            let mut full_bbox = parent_bbox;
            full_bbox.move_down(infinity).set_height(infinity + parent_bbox.height);
            self.prepare_positioned_renderer_and_area_for_layout(child, &mut full_bbox, parent_bbox);

            let ctx = LayoutContext::positioned(LayoutArea::new(area.page_number, full_bbox), parent_bbox);
            let result = self.layout(child, &ctx)?;
            match (result.status, result.split) {
                (LayoutStatus::Nothing, _) | (_, None) => {
                    warn!("Positioned renderer {child} could not be laid out and is skipped.");
                }
                (_, Some(split)) => {
                    self.node_mut(split).parent = Some(container);
                    placed.push(split);
                }
            }
        }
        self.node_mut(container).positioned = placed;
        Ok(())
    }
}
