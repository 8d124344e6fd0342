//! Low-level PDF support for the vellum layout engine.
//!
//! Wraps an `lopdf` document with flush-once object semantics, page-level
//! drawing through [`canvas::PdfCanvas`], cross-document copying with
//! structure-tree handling, content-stream text extraction, and CID font
//! encoding.

mod error;

pub mod canvas;
pub mod copier;
pub mod document;
pub mod font;
pub mod parser;
pub mod tagging;

#[cfg(test)]
mod test_utils;

pub use canvas::PdfCanvas;
pub use document::{FontHandle, PdfDocument};
pub use error::KernelError;
pub use font::{PdfFont, SharedFont};
