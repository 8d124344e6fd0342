//! Fonts as the PDF layer sees them.
//!
//! A [`FontProgram`] is the parsed font file (metrics, glyphs, names). A
//! [`PdfFont`] wraps a program together with an encoding and knows how to
//! turn text into content-stream bytes and back, and how to write itself
//! into a document once all pages are done.

pub mod cmap;
pub mod program;
#[cfg(feature = "system-fonts")]
pub mod provider;
pub mod sfnt;
pub mod simple;
pub mod subset;
pub mod type0;

pub use cmap::CMapEncoding;
pub use program::{FontMetrics, FontNames, FontProgram, TrueTypeProgram};
pub use simple::SimpleFont;
pub use type0::{CidFontType, Type0Font};

use crate::KernelError;
use lopdf::{Document, ObjectId};
use std::fmt;
use std::rc::Rc;

/// Width used by CID fonts for glyphs missing from the `W` array.
pub const DEFAULT_WIDTH: i32 = 1000;

/// Glyph space to text space for every font we produce.
pub const FONT_MATRIX: [f64; 6] = [0.001, 0.0, 0.0, 0.001, 0.0, 0.0];

/// A single glyph of a font program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    /// Glyph index (TrueType) or CID. `-1` for a synthesized `.notdef`.
    pub code: i32,
    /// Advance in 1000-unit glyph space.
    pub width: i32,
    pub unicode: Option<u32>,
    pub chars: Option<String>,
}

impl Glyph {
    pub fn new(code: i32, width: i32, unicode: Option<u32>) -> Self {
        let chars = unicode.and_then(char::from_u32).map(String::from);
        Self { code, width, unicode, chars }
    }

    /// Copy of `base` standing in for `unicode`.
    pub fn with_unicode(base: &Glyph, unicode: u32) -> Self {
        Self::new(base.code, base.width, Some(unicode))
    }

    pub fn has_valid_unicode(&self) -> bool {
        self.unicode.is_some_and(|u| u > 0)
    }
}

/// A font that can appear in a content stream.
pub trait PdfFont: fmt::Debug {
    /// The `/BaseFont` name, without subset prefix.
    fn font_name(&self) -> String;

    fn font_matrix(&self) -> [f64; 6] {
        FONT_MATRIX
    }

    /// Typographic ascender in glyph space.
    fn ascent(&self) -> f32;

    /// Typographic descender in glyph space. Usually negative.
    fn descent(&self) -> f32;

    fn avg_width(&self) -> i32;

    /// Advance of the glyph for `unicode`, in glyph space.
    fn width(&self, unicode: u32) -> i32;

    /// Encodes text into content-stream bytes and records the glyphs used.
    fn convert_to_bytes(&self, text: &str) -> Vec<u8>;

    /// Decodes content-stream bytes into Unicode text.
    fn decode(&self, bytes: &[u8]) -> String;

    /// Sum of the glyph advances of `bytes`, in glyph space.
    fn content_width(&self, bytes: &[u8]) -> f32;

    /// Writes the font dictionary (and descendant objects) into `doc` under
    /// the pre-allocated `font_id`.
    fn flush(&self, doc: &mut Document, font_id: ObjectId) -> Result<(), KernelError>;

    fn text_width(&self, text: &str) -> i32 {
        text.chars().map(|c| self.width(c as u32)).sum()
    }

    /// Width of `text` set at `font_size`, in text space units.
    fn width_point(&self, text: &str, font_size: f32) -> f32 {
        self.text_width(text) as f32 * font_size / 1000.0
    }
}

pub type SharedFont = Rc<dyn PdfFont>;
