//! Per-kind default property tables, consulted only after own, model and
//! inherited values have all come up empty.
use crate::element::ElementKind;
use crate::property::{Property, PropertyValue};
use crate::renderer::RendererKind;
use std::rc::Rc;
use vellum_kernel::font::SimpleFont;
use vellum_kernel::SharedFont;
use vellum_style::{Border, Position};
use vellum_types::Color;

pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Line height as a multiple of the largest font size on the line.
pub const DEFAULT_LEADING: f32 = 1.35;

thread_local! {
    static DEFAULT_FONT: SharedFont = Rc::new(SimpleFont::helvetica());
}

/// Standard Helvetica, shared so that every use registers the same font
/// resource.
pub fn default_font() -> SharedFont {
    DEFAULT_FONT.with(|font| font.clone())
}

fn text_default(property: Property) -> Option<PropertyValue> {
    match property {
        Property::Font => Some(PropertyValue::Font(default_font())),
        Property::FontSize => Some(PropertyValue::Float(DEFAULT_FONT_SIZE)),
        Property::FontColor => Some(PropertyValue::Color(Color::BLACK)),
        Property::Leading => Some(PropertyValue::Float(DEFAULT_LEADING)),
        _ => None,
    }
}

pub fn element_default(kind: ElementKind, property: Property) -> Option<PropertyValue> {
    match (kind, property) {
        (ElementKind::Paragraph, Property::MarginTop | Property::MarginBottom) => {
            Some(PropertyValue::Float(4.0))
        }
        (
            ElementKind::Cell,
            Property::PaddingTop | Property::PaddingRight | Property::PaddingBottom | Property::PaddingLeft,
        ) => Some(PropertyValue::Float(2.0)),
        (ElementKind::Cell, Property::Border) => {
            Some(PropertyValue::Border(Some(Border::solid(0.5, Color::BLACK))))
        }
        (_, p) if Property::MARGINS.contains(&p) || Property::PADDINGS.contains(&p) => {
            Some(PropertyValue::Float(0.0))
        }
        (_, Property::Position) => Some(PropertyValue::Position(Position::Static)),
        (_, p) => text_default(p),
    }
}

pub fn renderer_default(kind: RendererKind, property: Property) -> Option<PropertyValue> {
    match kind {
        RendererKind::Root => text_default(property),
        _ => None,
    }
}
