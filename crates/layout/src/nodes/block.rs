use crate::interface::{LayoutContext, LayoutResult, LayoutStatus};
use crate::renderer::{LayoutArea, RendererId, RendererTree};
use crate::LayoutError;

impl RendererTree {
    /// Stacks the children of a block or cell from the top of its content
    /// box. A child that only partly fits splits the block there.
    pub(crate) fn layout_block(&mut self, id: RendererId, ctx: &LayoutContext) -> Result<LayoutResult, LayoutError> {
        let frame = self.begin_container_layout(id, ctx);
        if self.box_edges_do_not_fit(id, &frame) {
            return Ok(LayoutResult::nothing(id, id));
        }
        let mut layout_box = frame.content_box;
        let children = self.node(id).children().to_vec();
        let mut placed = Vec::with_capacity(children.len());

        for (index, child) in children.iter().copied().enumerate() {
            let child_ctx = LayoutContext::new(LayoutArea::new(frame.page, layout_box));
            let result = self.layout(child, &child_ctx)?;
            match result.status {
                LayoutStatus::Full => {
                    let fragment = result.split.unwrap_or(child);
                    placed.push(fragment);
                    let Some(area) = result.occupied_area else {
                        continue;
                    };
                    // out of flow: drawn here, takes no space
                    if self.is_absolute(child) {
                        continue;
                    }
                    self.extend_occupied_area(id, &area.bbox);
                    layout_box.set_height(area.bbox.y - layout_box.y);
                    self.align_child_horizontally(fragment, layout_box);
                }
                LayoutStatus::Partial => {
                    if let Some(area) = result.occupied_area {
                        self.extend_occupied_area(id, &area.bbox);
                    }
                    if let Some(split) = result.split {
                        self.align_child_horizontally(split, layout_box);
                        placed.push(split);
                    }
                    if frame.height_clipped {
                        return self.finish_clipped(id, &frame, ctx, placed);
                    }
                    let mut rest: Vec<RendererId> = result.overflow.into_iter().collect();
                    rest.extend_from_slice(&children[index + 1..]);
                    return self.finish_partial(id, &frame, ctx, placed, rest, result.cause);
                }
                LayoutStatus::Nothing => {
                    if frame.height_clipped {
                        return self.finish_clipped(id, &frame, ctx, placed);
                    }
                    let cause = result.cause.unwrap_or(child);
                    if placed.is_empty() {
                        return Ok(LayoutResult::nothing(id, cause));
                    }
                    let mut rest = vec![result.overflow.unwrap_or(child)];
                    rest.extend_from_slice(&children[index + 1..]);
                    return self.finish_partial(id, &frame, ctx, placed, rest, Some(cause));
                }
            }
        }

        self.finish_full(id, &frame, ctx, placed)
    }
}
