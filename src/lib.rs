//! vellum lays out box-model elements over pages and draws them as PDF.
//!
//! Build [`Element`]s, add them to a [`Document`] and render it. The lower
//! layers are re-exported for callers that need to work with renderers or
//! PDF objects directly.

pub mod config;
pub mod document;
pub mod error;

pub use config::DocumentConfig;
pub use document::Document;
pub use error::VellumError;

pub use vellum_layout::{
    Action, BackgroundImage, Element, ElementKind, ElementPropertyContainer, ElementRef, ImageData,
    LayoutConfig, Property, PropertyValue, Style,
};
pub use vellum_style::{
    Background, BaseDirection, Border, BorderStyle, BoxSizing, FloatProperty, HorizontalAlignment, Margins,
    PageSize, Position, Transform, UnitValue,
};
pub use vellum_types::Color;

pub use vellum_kernel as kernel;
pub use vellum_layout as layout;

/// Routes `log` output to stderr, filtered by `RUST_LOG`. Safe to call more
/// than once.
pub fn init_logging() {
    let _ = env_logger::builder().try_init();
}
