use crate::renderer::{LayoutArea, RendererId};
use vellum_types::Rectangle;

// --- Layout request ---

/// The space offered to a renderer.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext {
    pub area: LayoutArea,
    /// Set when laying out a positioned renderer: the box its offsets are
    /// measured against.
    pub parent_occupied: Option<Rectangle>,
}

impl LayoutContext {
    pub fn new(area: LayoutArea) -> Self {
        Self { area, parent_occupied: None }
    }

    pub fn positioned(area: LayoutArea, parent_occupied: Rectangle) -> Self {
        Self { area, parent_occupied: Some(parent_occupied) }
    }
}

// --- Layout outcome ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStatus {
    /// Everything fit.
    Full,
    /// Some content fit; the rest is carried by the overflow renderer.
    Partial,
    /// Nothing could be placed.
    Nothing,
}

#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub status: LayoutStatus,
    pub occupied_area: Option<LayoutArea>,
    /// The fragment to draw for this area.
    pub split: Option<RendererId>,
    /// What remains for the next area.
    pub overflow: Option<RendererId>,
    /// The renderer that ultimately did not fit.
    pub cause: Option<RendererId>,
}

impl LayoutResult {
    pub fn full(occupied_area: LayoutArea, split: RendererId) -> Self {
        Self {
            status: LayoutStatus::Full,
            occupied_area: Some(occupied_area),
            split: Some(split),
            overflow: None,
            cause: None,
        }
    }

    pub fn partial(
        occupied_area: LayoutArea,
        split: RendererId,
        overflow: RendererId,
        cause: Option<RendererId>,
    ) -> Self {
        Self {
            status: LayoutStatus::Partial,
            occupied_area: Some(occupied_area),
            split: Some(split),
            overflow: Some(overflow),
            cause,
        }
    }

    pub fn nothing(overflow: RendererId, cause: RendererId) -> Self {
        Self {
            status: LayoutStatus::Nothing,
            occupied_area: None,
            split: None,
            overflow: Some(overflow),
            cause: Some(cause),
        }
    }

    pub fn is_full(&self) -> bool {
        self.status == LayoutStatus::Full
    }
}

// --- Intrinsic widths ---

/// Narrowest and widest widths a renderer can usefully take, margins,
/// borders and paddings included.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MinMaxWidth {
    pub min_width: f32,
    pub max_width: f32,
    pub additional_width: f32,
}

impl MinMaxWidth {
    /// Builds from content widths, adding `additional_width` to both.
    pub fn new(min_content: f32, max_content: f32, additional_width: f32) -> Self {
        Self {
            min_width: min_content + additional_width,
            max_width: max_content.max(min_content) + additional_width,
            additional_width,
        }
    }
}
