//! Distributes the root's children over pages and draws the result.
use crate::interface::{LayoutContext, LayoutStatus};
use crate::property::Property;
use crate::renderer::{DrawContext, LayoutArea, RendererId, RendererTree};
use crate::LayoutError;
use log::{debug, warn};
use lopdf::ObjectId;
use std::collections::VecDeque;
use vellum_kernel::{PdfCanvas, PdfDocument};
use vellum_types::Rectangle;

/// Where content goes on every page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// The whole page. Fixed renderers are positioned against it.
    pub page: Rectangle,
    /// The page minus its margins.
    pub content: Rectangle,
}

/// The top-level fragments placed on one page, in drawing order.
#[derive(Debug, Clone, Default)]
pub struct LaidOutPage {
    pub number: usize,
    pub renderers: Vec<RendererId>,
}

/// Lays out the children of `root` page after page. A child that only
/// partly fits continues on the next page; one that does not fit even on an
/// empty page is an error.
pub fn paginate(
    tree: &mut RendererTree,
    root: RendererId,
    geometry: &PageGeometry,
) -> Result<Vec<LaidOutPage>, LayoutError> {
    let max_pages = tree.config().max_pages;
    // (index of the root child a fragment came from, fragment)
    let mut queue: VecDeque<(usize, RendererId)> =
        tree.node(root).children().iter().copied().enumerate().collect();
    let mut reached = vec![None; queue.len()];
    let mut pages = Vec::new();
    let mut page = LaidOutPage { number: 1, renderers: Vec::new() };
    let mut remaining = geometry.content;
    tree.root_area_empty = true;

    while let Some((index, id)) = queue.pop_front() {
        let ctx = LayoutContext::new(LayoutArea::new(page.number, remaining));
        let result = tree.layout(id, &ctx)?;
        if result.status != LayoutStatus::Nothing && reached[index].is_none() {
            reached[index] = Some(page.number);
        }
        let next = match result.status {
            LayoutStatus::Full => {
                if let Some(split) = result.split {
                    page.renderers.push(split);
                }
                if let Some(area) = result.occupied_area {
                    if !tree.is_absolute(id) {
                        remaining.set_height(area.bbox.y - remaining.y);
                    }
                }
                tree.root_area_empty = false;
                continue;
            }
            LayoutStatus::Partial => {
                page.renderers.extend(result.split);
                result.overflow.unwrap_or(id)
            }
            LayoutStatus::Nothing => {
                if tree.root_area_empty {
                    return Err(LayoutError::ElementTooLarge(
                        result.cause.unwrap_or(id),
                        geometry.content.height,
                    ));
                }
                result.overflow.unwrap_or(id)
            }
        };

        queue.push_front((index, next));
        debug!("Page {} is full with {} renderers", page.number, page.renderers.len());
        let number = page.number + 1;
        pages.push(std::mem::replace(&mut page, LaidOutPage { number, renderers: Vec::new() }));
        if pages.len() >= max_pages {
            warn!(
                "Reached the limit of {max_pages} pages; {} renderers were not laid out.",
                queue.len()
            );
            place_positioned_renderers(tree, root, geometry, &mut pages, &reached)?;
            return Ok(pages);
        }
        remaining = geometry.content;
        tree.root_area_empty = true;
    }

    pages.push(page);
    place_positioned_renderers(tree, root, geometry, &mut pages, &reached)?;
    Ok(pages)
}

/// Lays out the renderers the root owns against the full page. Fixed ones go
/// to the page they name, page 1 by default. Absolute ones go to the page
/// the flow had reached where they were added, the last page when the flow
/// never got there.
fn place_positioned_renderers(
    tree: &mut RendererTree,
    root: RendererId,
    geometry: &PageGeometry,
    pages: &mut [LaidOutPage],
    reached: &[Option<usize>],
) -> Result<(), LayoutError> {
    let positioned = tree.node(root).positioned_children().to_vec();
    for id in positioned {
        let number = if tree.is_fixed(id) {
            tree.get_property(id, Property::PageNumber)
                .and_then(|value| value.as_integer())
                .map_or(1, |n| n.max(1) as usize)
        } else {
            let anchor = tree.flow_anchor(id).unwrap_or(reached.len());
            reached
                .iter()
                .skip(anchor)
                .find_map(|page| *page)
                .unwrap_or(pages.len())
        };
        let Some(page) = pages.get_mut(number - 1) else {
            warn!("Positioned renderer {id} targets page {number}, but the document only has {} pages.", pages.len());
            continue;
        };

        let mut full_bbox = geometry.page;
        tree.prepare_positioned_renderer_and_area_for_layout(id, &mut full_bbox, geometry.page);
        let ctx = LayoutContext::positioned(LayoutArea::new(number, full_bbox), geometry.page);
        let result = tree.layout(id, &ctx)?;
        match (result.status, result.split) {
            (LayoutStatus::Nothing, _) | (_, None) => {
                warn!("Positioned renderer {id} does not fit on page {number} and is skipped.");
            }
            (_, Some(split)) => page.renderers.push(split),
        }
    }
    Ok(())
}

/// Adds a page per laid-out page to `document` and draws its renderers,
/// deferred floats and transformed boxes last. Returns the new page ids.
pub fn draw_pages(
    tree: &mut RendererTree,
    pages: &[LaidOutPage],
    document: &mut PdfDocument,
    page_size: Rectangle,
) -> Result<Vec<ObjectId>, LayoutError> {
    let mut page_ids = Vec::with_capacity(pages.len());
    for page in pages {
        let page_id = document.add_page(page_size.width, page_size.height)?;
        let mut canvas = PdfCanvas::new();
        {
            let mut ctx = DrawContext::new(document, &mut canvas, page_id).with_root_waiting_list();
            tree.draw_renderers(&page.renderers, &mut ctx)?;
            tree.draw_waiting(&mut ctx)?;
        }
        canvas.finish(document, page_id)?;
        page_ids.push(page_id);
    }
    Ok(page_ids)
}
