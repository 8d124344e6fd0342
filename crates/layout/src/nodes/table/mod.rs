//! Grid layout for tables: equal-width columns, rows as tall as their
//! tallest cell. Tables split between rows, never inside one.
use crate::interface::{LayoutContext, LayoutResult};
use crate::renderer::{LayoutArea, RendererContent, RendererId, RendererTree};
use crate::LayoutError;
use vellum_types::Rectangle;

impl RendererTree {
    pub(crate) fn table_columns(&self, id: RendererId) -> usize {
        match self.node(id).content() {
            RendererContent::Table { columns } => (*columns).max(1),
            _ => 1,
        }
    }

    pub(crate) fn layout_table(&mut self, id: RendererId, ctx: &LayoutContext) -> Result<LayoutResult, LayoutError> {
        let frame = self.begin_container_layout(id, ctx);
        if self.box_edges_do_not_fit(id, &frame) {
            return Ok(LayoutResult::nothing(id, id));
        }
        let content = frame.content_box;
        let columns = self.table_columns(id);
        let column_width = content.width / columns as f32;
        let cells = self.node(id).children().to_vec();

        let mut cursor = content.top();
        let mut placed = Vec::with_capacity(cells.len());
        for (row_index, row) in cells.chunks(columns).enumerate() {
            let available = cursor - content.bottom();
            let mut fragments = Vec::with_capacity(row.len());
            let mut row_height = 0.0f32;
            let mut cause = None;

            for (column, cell) in row.iter().copied().enumerate() {
                let area = Rectangle::new(
                    content.x + column as f32 * column_width,
                    content.bottom(),
                    column_width,
                    available,
                );
                let result = self.layout(cell, &LayoutContext::new(LayoutArea::new(frame.page, area)))?;
                if !result.is_full() {
                    cause = Some(result.cause.unwrap_or(cell));
                    break;
                }
                if let Some(occupied) = result.occupied_area {
                    row_height = row_height.max(occupied.bbox.height);
                }
                fragments.push(result.split.unwrap_or(cell));
            }

            if let Some(cause) = cause {
                if frame.height_clipped {
                    return self.finish_clipped(id, &frame, ctx, placed);
                }
                if placed.is_empty() {
                    return Ok(LayoutResult::nothing(id, cause));
                }
                let rest = cells[row_index * columns..].to_vec();
                return self.finish_partial(id, &frame, ctx, placed, rest, Some(cause));
            }

            // every cell in a row reaches down to the row's bottom
            for fragment in &fragments {
                if let Some(area) = self.node_mut(*fragment).occupied_area.as_mut() {
                    area.bbox.set_y(cursor - row_height).set_height(row_height);
                }
            }
            let row_width = column_width * row.len() as f32;
            self.extend_occupied_area(id, &Rectangle::new(content.x, cursor - row_height, row_width, row_height));
            cursor -= row_height;
            placed.extend(fragments);
        }

        self.finish_full(id, &frame, ctx, placed)
    }
}
