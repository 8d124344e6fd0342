//! Static, relative, absolute and fixed positioning.
use super::{RendererId, RendererKind, RendererTree};
use crate::property::{Property, PropertyValue};
use crate::LayoutError;
use log::error;
use vellum_style::{BaseDirection, HorizontalAlignment, Position};
use vellum_types::Rectangle;

impl RendererTree {
    /// Attaches `child` below `parent`, or below the containing block it
    /// belongs to when it is absolutely or fixed positioned.
    ///
    /// A fixed renderer always ends up in the root's positioned list. An
    /// absolute renderer with offsets climbs to the nearest positioned
    /// ancestor (or the root). Without offsets it stays in normal flow.
    pub fn add_child(&mut self, parent: RendererId, child: RendererId) {
        match self.position(child) {
            Position::Fixed => {
                let root = self.root_of(parent);
                self.attach_positioned(root, child);
            }
            Position::Absolute if !self.no_absolute_position_info(child) => {
                let mut container = parent;
                while !self.is_positioned(container) {
                    match self.nodes[container].parent {
                        Some(up) => container = up,
                        None => break,
                    }
                }
                if self.nodes[container].kind == RendererKind::Root {
                    let index = self.root_flow_index(container, parent);
                    self.set_flow_anchor(child, index);
                }
                self.attach_positioned(container, child);
            }
            _ => {
                self.nodes[child].parent = Some(parent);
                self.nodes[parent].children.push(child);
                self.promote_positioned_descendants(parent, child);
            }
        }
    }

    /// Index of the root child `parent` lives in, or the end of the flow
    /// when `parent` is the root itself.
    fn root_flow_index(&self, root: RendererId, parent: RendererId) -> usize {
        let mut current = parent;
        while let Some(up) = self.nodes[current].parent {
            if up == root {
                break;
            }
            current = up;
        }
        let children = &self.nodes[root].children;
        children.iter().position(|id| *id == current).unwrap_or(children.len())
    }

    fn attach_positioned(&mut self, container: RendererId, child: RendererId) {
        self.nodes[child].parent = Some(container);
        self.nodes[container].positioned.push(child);
    }

    /// Positioned renderers queued on `child` while it had no parent are
    /// re-added from `parent`, so they can reach their real containing block.
    fn promote_positioned_descendants(&mut self, parent: RendererId, child: RendererId) {
        if self.is_positioned(child) || self.nodes[child].positioned.is_empty() {
            return;
        }
        let queued = std::mem::take(&mut self.nodes[child].positioned);
        let (promoted, kept): (Vec<_>, Vec<_>) = queued.into_iter().partition(|id| {
            self.position(*id) == Position::Fixed || !self.no_absolute_position_info(*id)
        });
        self.nodes[child].positioned = kept;
        for id in promoted {
            self.add_child(parent, id);
        }
    }

    // --- Classification ---

    pub fn position(&self, id: RendererId) -> Position {
        match self.get_property(id, Property::Position) {
            Some(PropertyValue::Position(position)) => position,
            _ => Position::Static,
        }
    }

    /// Anything but static establishes a containing block.
    pub fn is_positioned(&self, id: RendererId) -> bool {
        !self.is_static(id)
    }

    pub fn is_static(&self, id: RendererId) -> bool {
        self.position(id) == Position::Static
    }

    pub fn is_relative(&self, id: RendererId) -> bool {
        self.position(id) == Position::Relative
    }

    pub fn is_absolute(&self, id: RendererId) -> bool {
        self.position(id) == Position::Absolute
    }

    pub fn is_fixed(&self, id: RendererId) -> bool {
        self.position(id) == Position::Fixed
    }

    pub fn is_keep_together(&self, id: RendererId) -> bool {
        self.property_as_bool(id, Property::KeepTogether) == Some(true)
    }

    pub fn no_absolute_position_info(&self, id: RendererId) -> bool {
        [Property::Top, Property::Bottom, Property::Left, Property::Right]
            .iter()
            .all(|p| !self.has_property(id, *p))
    }

    fn base_direction(&self, id: RendererId) -> Option<BaseDirection> {
        match self.get_property(id, Property::BaseDirection) {
            Some(PropertyValue::BaseDirection(direction)) => Some(direction),
            _ => None,
        }
    }

    // --- Offsets ---

    /// Moves a laid-out renderer so its offset edges land on the matching
    /// edges of `parent_rect`. Missing offsets default to `top: 0`, and to
    /// `right: 0` under right-to-left text.
    pub fn apply_absolute_position(&mut self, id: RendererId, parent_rect: Rectangle) {
        let top = self.property_as_float(id, Property::Top);
        let bottom = self.property_as_float(id, Property::Bottom);
        let left = self.property_as_float(id, Property::Left);
        let mut right = self.property_as_float(id, Property::Right);
        let top = if top.is_none() && bottom.is_none() { Some(0.0) } else { top };
        if left.is_none() && right.is_none() && self.base_direction(id) == Some(BaseDirection::RightToLeft) {
            right = Some(0.0);
        }

        let result = (|| -> Result<(), LayoutError> {
            if let Some(right) = right {
                let bbox = self.occupied_area_bbox(id)?;
                self.move_renderer(id, parent_rect.right() - right - bbox.right(), 0.0)?;
            }
            if let Some(left) = left {
                let bbox = self.occupied_area_bbox(id)?;
                self.move_renderer(id, parent_rect.left() + left - bbox.left(), 0.0)?;
            }
            if let Some(top) = top {
                let bbox = self.occupied_area_bbox(id)?;
                self.move_renderer(id, 0.0, parent_rect.top() - top - bbox.top())?;
            }
            if let Some(bottom) = bottom {
                let bbox = self.occupied_area_bbox(id)?;
                self.move_renderer(id, 0.0, parent_rect.bottom() + bottom - bbox.bottom())?;
            }
            Ok(())
        })();
        if result.is_err() {
            error!("Occupied area has not been initialized. Absolute positioning might be applied incorrectly.");
        }
    }

    /// Shifts a relatively positioned renderer by its offsets. Left and top
    /// take priority over right and bottom.
    pub fn apply_relative_positioning_translation(
        &mut self,
        id: RendererId,
        reverse: bool,
    ) -> Result<(), LayoutError> {
        let top = self.property_as_float_or(id, Property::Top, 0.0);
        let bottom = self.property_as_float_or(id, Property::Bottom, 0.0);
        let left = self.property_as_float_or(id, Property::Left, 0.0);
        let right = self.property_as_float_or(id, Property::Right, 0.0);

        let mut dx = if left != 0.0 { left } else { -right };
        let mut dy = if top != 0.0 { -top } else { bottom };
        if reverse {
            dx = -dx;
            dy = -dy;
        }
        if dx != 0.0 || dy != 0.0 {
            self.move_renderer(id, dx, dy)?;
        }
        Ok(())
    }

    // --- Positioned layout ---

    /// Narrows `full_bbox` to the space a positioned child may lay out in,
    /// and derives its min-height from a top/bottom pair.
    pub fn prepare_positioned_renderer_and_area_for_layout(
        &mut self,
        id: RendererId,
        full_bbox: &mut Rectangle,
        parent_bbox: Rectangle,
    ) {
        let left = self.property_as_float(id, Property::Left);
        let right = self.property_as_float(id, Property::Right);
        let top = self.property_as_float(id, Property::Top);
        let bottom = self.property_as_float(id, Property::Bottom);

        self.adjust_positioned_renderer_layout_box_width(id, full_bbox, left, right);
        if self.is_absolute(id) {
            self.update_min_height_for_absolutely_positioned_renderer(id, parent_bbox, top, bottom);
        }
    }

    fn adjust_positioned_renderer_layout_box_width(
        &self,
        id: RendererId,
        full_bbox: &mut Rectangle,
        left: Option<f32>,
        right: Option<f32>,
    ) {
        if let Some(left) = left {
            let x = full_bbox.x;
            full_bbox.set_width(full_bbox.width - left).set_x(x + left);
        }
        if let Some(right) = right {
            full_bbox.set_width(full_bbox.width - right);
        }
        if left.is_none() && right.is_none() && !self.has_property(id, Property::Width) {
            // only block flow can stretch to the full width
            if self.nodes[id].kind.is_block() {
                let max_width = self.min_max_width(id).max_width;
                if max_width < full_bbox.width {
                    full_bbox.set_width(max_width + self.config.epsilon);
                }
            }
        }
    }

    fn update_min_height_for_absolutely_positioned_renderer(
        &mut self,
        id: RendererId,
        parent_box: Rectangle,
        top: Option<f32>,
        bottom: Option<f32>,
    ) {
        let (Some(top), Some(bottom)) = (top, bottom) else {
            return;
        };
        if self.has_property(id, Property::Height) {
            return;
        }
        let current_max = self.property_as_float(id, Property::MaxHeight);
        let current_min = self.property_as_float(id, Property::MinHeight);

        let mut resolved = (parent_box.top() - top - parent_box.bottom() - bottom).max(0.0);
        let mut dummy = Rectangle::with_size(0.0, 0.0);
        if !self.is_border_box_sizing(id) {
            self.apply_paddings(id, &mut dummy, true);
            self.apply_border_box(id, &mut dummy, true);
        }
        self.apply_margins(id, &mut dummy, true);
        resolved -= dummy.height;
        if let Some(min) = current_min {
            resolved = resolved.max(min);
        }
        if let Some(max) = current_max {
            resolved = resolved.min(max);
        }
        self.set_property(id, Property::MinHeight, PropertyValue::Float(resolved));
    }

    /// An absolute box with no horizontal offsets and no width takes no
    /// horizontal space in its parent.
    pub fn shrink_occupied_area_for_absolute_position(&mut self, id: RendererId) {
        if !self.is_absolute(id) {
            return;
        }
        let unconstrained = [Property::Left, Property::Right, Property::Width]
            .iter()
            .all(|p| self.property_as_unit(id, *p).is_none());
        if unconstrained {
            if let Some(area) = self.nodes[id].occupied_area.as_mut() {
                area.bbox.set_width(0.0);
            }
        }
    }

    pub fn align_child_horizontally(&mut self, child: RendererId, current_area: Rectangle) {
        let alignment = match self.get_property(child, Property::HorizontalAlignment) {
            Some(PropertyValue::HorizontalAlignment(alignment)) => alignment,
            _ => return,
        };
        if alignment == HorizontalAlignment::Left {
            return;
        }
        let Ok(bbox) = self.occupied_area_bbox(child) else {
            error!("Occupied area has not been initialized. Horizontal alignment was not applied.");
            return;
        };
        let free_space = current_area.width - bbox.width;
        if free_space <= 0.0 {
            return;
        }
        let dx = match alignment {
            HorizontalAlignment::Right => free_space,
            HorizontalAlignment::Center => free_space / 2.0,
            HorizontalAlignment::Left => 0.0,
        };
        if self.move_renderer(child, dx, 0.0).is_err() {
            error!("Occupied area has not been initialized. Horizontal alignment was not applied.");
        }
    }

    /// Whether nothing has been placed above `id` on the current page. Stops
    /// at the first ancestor that has not started layout.
    pub fn is_first_on_root_area(&self, id: RendererId) -> bool {
        let mut first = true;
        let mut ancestor = id;
        while first {
            let Some(parent) = self.nodes[ancestor].parent else {
                break;
            };
            if self.nodes[parent].kind == RendererKind::Root {
                first = self.root_area_empty;
            } else {
                match &self.nodes[parent].occupied_area {
                    Some(area) => first = area.bbox.height < self.config.epsilon,
                    None => break,
                }
            }
            ancestor = parent;
        }
        first
    }
}
