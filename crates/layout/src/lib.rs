use thiserror::Error;
use vellum_kernel::KernelError;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("PDF error: {0}")]
    Kernel(#[from] KernelError),
    #[error("Renderer {0} has already been drawn and flushed.")]
    RendererFlushed(usize),
    #[error("Occupied area of renderer {0} has not been initialized.")]
    MissingOccupiedArea(usize),
    #[error("Renderer {0} does not fit on an empty page with a content height of {1:.2}.")]
    ElementTooLarge(usize, f32),
    #[error("Generic layout error: {0}")]
    Generic(String),
}

pub mod algorithms;
pub mod config;
pub mod defaults;
pub mod element;
pub mod interface;
pub mod nodes;
pub mod painting;
pub mod property;
pub mod renderer;

pub use self::config::LayoutConfig;
pub use self::element::{Element, ElementKind, ElementPropertyContainer, ElementRef, ImageData, Style};
pub use self::interface::{LayoutContext, LayoutResult, LayoutStatus, MinMaxWidth};
pub use self::property::{Action, BackgroundImage, Property, PropertyValue};
pub use self::renderer::{DrawContext, LayoutArea, RendererId, RendererKind, RendererTree};

#[cfg(test)]
mod test_utils;
