//! Margins, borders and paddings, and the resolution of width and height
//! constraints into content-box sizes.
use super::{RendererId, RendererTree};
use crate::property::{Property, PropertyValue};
use crate::LayoutError;
use vellum_style::{Border, BoxSizing, UnitValue};
use vellum_types::Rectangle;

impl RendererTree {
    // --- Box edges ---

    /// `[top, right, bottom, left]`.
    pub fn margins(&self, id: RendererId) -> [f32; 4] {
        Property::MARGINS.map(|p| self.property_as_float_or(id, p, 0.0))
    }

    pub fn paddings(&self, id: RendererId) -> [f32; 4] {
        Property::PADDINGS.map(|p| self.property_as_float_or(id, p, 0.0))
    }

    /// Per-side borders. A side set on the renderer or its model element
    /// (even to "no border") wins over the shorthand.
    pub fn borders(&self, id: RendererId) -> [Option<Border>; 4] {
        let shorthand = self.property_as_border(id, Property::Border);
        Property::BORDERS.map(|side| {
            if self.has_own_or_model_property(id, side) {
                self.property_as_border(id, side)
            } else {
                shorthand.clone()
            }
        })
    }

    pub fn border_widths(&self, id: RendererId) -> [f32; 4] {
        self.borders(id).map(|b| b.map_or(0.0, |b| b.width))
    }

    pub fn apply_margins(&self, id: RendererId, rect: &mut Rectangle, reverse: bool) {
        rect.apply_sides(self.margins(id), reverse);
    }

    pub fn apply_border_box(&self, id: RendererId, rect: &mut Rectangle, reverse: bool) {
        rect.apply_sides(self.border_widths(id), reverse);
    }

    pub fn apply_paddings(&self, id: RendererId, rect: &mut Rectangle, reverse: bool) {
        rect.apply_sides(self.paddings(id), reverse);
    }

    // --- Occupied area boxes ---

    pub fn occupied_area_bbox(&self, id: RendererId) -> Result<Rectangle, LayoutError> {
        self.nodes[id]
            .occupied_area
            .map(|area| area.bbox)
            .ok_or(LayoutError::MissingOccupiedArea(id))
    }

    /// The box borders are drawn around: occupied area minus margins and
    /// border widths.
    pub fn border_area_bbox(&self, id: RendererId) -> Result<Rectangle, LayoutError> {
        let mut rect = self.occupied_area_bbox(id)?;
        self.apply_margins(id, &mut rect, false);
        self.apply_border_box(id, &mut rect, false);
        Ok(rect)
    }

    pub fn inner_area_bbox(&self, id: RendererId) -> Result<Rectangle, LayoutError> {
        let mut rect = self.border_area_bbox(id)?;
        self.apply_paddings(id, &mut rect, false);
        Ok(rect)
    }

    // --- Width ---

    pub fn is_border_box_sizing(&self, id: RendererId) -> bool {
        matches!(
            self.get_property(id, Property::BoxSizing),
            Some(PropertyValue::BoxSizing(BoxSizing::BorderBox))
        )
    }

    fn padding_border_size(&self, id: RendererId) -> Rectangle {
        let mut dummy = Rectangle::with_size(0.0, 0.0);
        self.apply_border_box(id, &mut dummy, true);
        self.apply_paddings(id, &mut dummy, true);
        dummy
    }

    pub fn calculate_padding_border_width(&self, id: RendererId) -> f32 {
        self.padding_border_size(id).width
    }

    pub fn calculate_padding_border_height(&self, id: RendererId) -> f32 {
        self.padding_border_size(id).height
    }

    /// Horizontal space taken by margins, borders and paddings together.
    pub fn calculate_additional_width(&self, id: RendererId) -> f32 {
        let mut dummy = Rectangle::with_size(0.0, 0.0);
        self.apply_margins(id, &mut dummy, true);
        self.apply_border_box(id, &mut dummy, true);
        self.apply_paddings(id, &mut dummy, true);
        dummy.width
    }

    pub fn retrieve_unit_value(&self, id: RendererId, base: f32, property: Property) -> Option<f32> {
        self.property_as_unit(id, property).map(|v| v.resolve(base))
    }

    pub fn has_absolute_unit_value(&self, id: RendererId, property: Property) -> bool {
        self.property_as_unit(id, property)
            .is_some_and(|v| v.is_point_value())
    }

    /// Fixed content-box width, clamped by min and max width. A max width
    /// narrower than the parent acts as the width when none is set. When
    /// min exceeds max, max is raised to min.
    pub fn retrieve_width(&self, id: RendererId, parent_box_width: f32) -> Option<f32> {
        let min_width = self.retrieve_unit_value(id, parent_box_width, Property::MinWidth);
        let mut max_width = self.retrieve_unit_value(id, parent_box_width, Property::MaxWidth);
        if let (Some(min), Some(max)) = (min_width, max_width) {
            if min > max {
                max_width = Some(min);
            }
        }

        let mut width = self.retrieve_unit_value(id, parent_box_width, Property::Width);
        match width.as_mut() {
            Some(w) => {
                if let Some(max) = max_width {
                    *w = w.min(max);
                }
                if let Some(min) = min_width {
                    *w = w.max(min);
                }
            }
            None => {
                width = max_width.filter(|max| *max < parent_box_width);
            }
        }

        width.map(|w| {
            let w = if self.is_border_box_sizing(id) {
                w - self.calculate_padding_border_width(id)
            } else {
                w
            };
            w.max(0.0)
        })
    }

    pub fn retrieve_max_width(&self, id: RendererId, parent_box_width: f32) -> Option<f32> {
        let mut max_width = self.retrieve_unit_value(id, parent_box_width, Property::MaxWidth)?;
        if let Some(min) = self.retrieve_unit_value(id, parent_box_width, Property::MinWidth) {
            max_width = max_width.max(min);
        }
        if self.is_border_box_sizing(id) {
            max_width -= self.calculate_padding_border_width(id);
        }
        Some(max_width.max(0.0))
    }

    pub fn retrieve_min_width(&self, id: RendererId, parent_box_width: f32) -> Option<f32> {
        let mut min_width = self.retrieve_unit_value(id, parent_box_width, Property::MinWidth)?;
        if self.is_border_box_sizing(id) {
            min_width -= self.calculate_padding_border_width(id);
        }
        Some(min_width.max(0.0))
    }

    /// Stores a new content-box width, converting back to a border-box value
    /// when needed.
    pub fn update_width(&mut self, id: RendererId, width: UnitValue) {
        let width = if width.is_point_value() && self.is_border_box_sizing(id) {
            width.with_value(width.value() + self.calculate_padding_border_width(id))
        } else {
            width
        };
        self.set_property(id, Property::Width, PropertyValue::Unit(width));
    }

    // --- Height ---

    fn content_box_height(&self, id: RendererId, property: Property) -> Option<f32> {
        let value = self.property_as_float(id, property)?;
        if self.is_border_box_sizing(id) {
            Some((value - self.calculate_padding_border_height(id)).max(0.0))
        } else {
            Some(value)
        }
    }

    fn update_content_box_height(&mut self, id: RendererId, property: Property, value: f32) {
        let value = if self.is_border_box_sizing(id) {
            value + self.calculate_padding_border_height(id)
        } else {
            value
        };
        self.set_property(id, property, PropertyValue::Float(value));
    }

    pub fn retrieve_height(&self, id: RendererId) -> Option<f32> {
        self.content_box_height(id, Property::Height)
    }

    pub fn retrieve_max_height(&self, id: RendererId) -> Option<f32> {
        self.content_box_height(id, Property::MaxHeight)
    }

    pub fn retrieve_min_height(&self, id: RendererId) -> Option<f32> {
        self.content_box_height(id, Property::MinHeight)
    }

    pub fn update_height(&mut self, id: RendererId, height: f32) {
        self.update_content_box_height(id, Property::Height, height);
    }

    pub fn update_max_height(&mut self, id: RendererId, height: f32) {
        self.update_content_box_height(id, Property::MaxHeight, height);
    }

    pub fn update_min_height(&mut self, id: RendererId, height: f32) {
        self.update_content_box_height(id, Property::MinHeight, height);
    }

    /// Folds a fixed height into min and max height, so layout only has to
    /// look at those two. Min wins when the two conflict.
    pub fn override_height_properties(&mut self, id: RendererId) {
        let mut height = self.property_as_float(id, Property::Height);
        let mut max_height = self.property_as_float(id, Property::MaxHeight);
        let mut min_height = self.property_as_float(id, Property::MinHeight);

        if let Some(h) = height.as_mut() {
            match max_height {
                Some(max) if *h >= max => *h = max,
                _ => max_height = Some(*h),
            }
            match min_height {
                Some(min) if *h <= min => {}
                _ => min_height = Some(*h),
            }
        }
        if let (Some(max), Some(min)) = (max_height, min_height) {
            if min > max {
                max_height = Some(min);
            }
        }
        if let Some(max) = max_height {
            self.set_property(id, Property::MaxHeight, PropertyValue::Float(max));
        }
        if let Some(min) = min_height {
            self.set_property(id, Property::MinHeight, PropertyValue::Float(min));
        }
    }
}
